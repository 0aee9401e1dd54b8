//! Exit status codes for the tuneup binary

/// Exit code for success
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code when a maintenance or configuration pipeline aborted
pub const EXIT_PIPELINE_FAILED: i32 = 1;

/// Exit code when no credential could be obtained
pub const EXIT_NO_CREDENTIAL: i32 = 64;
