//! Run history for tuneup invocations
//!
//! One JSON line per pipeline run, appended under the XDG state directory.
//! History is diagnostics, not a feature: a failed append never disturbs the
//! interactive flow.

use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use tracing::debug;

use crate::pipeline::{PipelineOutcome, PipelineRun};

/// Log entry for one pipeline invocation
#[derive(Debug, Serialize, Deserialize)]
pub struct RunEntry {
    /// ISO 8601 timestamp
    pub ts: String,

    /// Which pipeline ran ("update" or "config")
    pub action: String,

    /// Whether the pipeline completed
    pub ok: bool,

    /// Number of steps attempted
    pub steps_run: usize,

    /// Step that aborted the run, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted_step: Option<String>,

    /// Error details if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl RunEntry {
    /// Build an entry from a finished pipeline run
    pub fn from_run(action: &str, run: &PipelineRun, duration_ms: u64) -> Self {
        let (aborted_step, error) = match &run.outcome {
            PipelineOutcome::Completed => (None, None),
            PipelineOutcome::Aborted { step, error } => {
                (Some(step.to_string()), Some(error.to_string()))
            }
        };

        Self {
            ts: Self::now(),
            action: action.to_string(),
            ok: run.succeeded(),
            steps_run: run.records.len(),
            aborted_step,
            error,
            duration_ms,
        }
    }

    /// Discover log file path with fallback chain
    ///
    /// Priority:
    /// 1. $TUNEUP_LOG_FILE environment variable (explicit override)
    /// 2. $XDG_STATE_HOME/tuneup/runs.jsonl (XDG standard)
    /// 3. ~/.local/state/tuneup/runs.jsonl (XDG fallback)
    fn discover_log_path() -> Option<String> {
        if let Ok(path) = std::env::var("TUNEUP_LOG_FILE") {
            return Some(path);
        }

        if let Ok(xdg_state) = std::env::var("XDG_STATE_HOME") {
            return Some(format!("{}/tuneup/runs.jsonl", xdg_state));
        }

        if let Ok(home) = std::env::var("HOME") {
            return Some(format!("{}/.local/state/tuneup/runs.jsonl", home));
        }

        None
    }

    /// Append the entry to the run log; failures are logged and swallowed
    pub fn write(&self) {
        let json = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(err) => {
                debug!(error = %err, "could not serialize run entry");
                return;
            }
        };

        let Some(path) = Self::discover_log_path() else {
            debug!("no run log path available");
            return;
        };

        if let Err(err) = Self::append_line(&json, &path) {
            debug!(path = %path, error = %err, "could not append run entry");
        }
    }

    fn append_line(json: &str, path: &str) -> Result<(), std::io::Error> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;

        writeln!(file, "{}", json)?;
        Ok(())
    }

    /// Current timestamp in ISO 8601 format
    pub fn now() -> String {
        chrono::Utc::now().to_rfc3339()
    }
}
