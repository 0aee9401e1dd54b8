//! Privileged command execution
//!
//! Every system mutation this tool performs goes through one path: spawn
//! `sudo -S sh -c <command>`, feed the password on stdin, capture stdout and
//! stderr to completion, and judge the exit code against the command's
//! acceptable set.
//!
//! The `CommandRunner` trait abstracts that path so pipelines can be tested
//! deterministically:
//! - Production code uses `SudoRunner`, which spawns real processes.
//! - Test code uses `FakeRunner` with scripted exit codes per command line.

use async_trait::async_trait;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::credential::Credential;

// ============================================================================
// Command specification
// ============================================================================

/// One privileged shell operation.
///
/// The command line is handed to `sh -c` verbatim; callers own any quoting
/// inside it. Exit codes outside `acceptable_exit_codes` are failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Shell command line, run as `sudo -S sh -c <command_line>`
    pub command_line: String,
    /// Exit codes treated as success (just 0 unless stated otherwise)
    pub acceptable_exit_codes: Vec<i32>,
}

impl CommandSpec {
    /// Command that must exit 0 to count as success
    pub fn new(command_line: impl Into<String>) -> Self {
        Self {
            command_line: command_line.into(),
            acceptable_exit_codes: vec![0],
        }
    }

    /// Command with an explicit set of acceptable exit codes
    ///
    /// Some tools signal benign conditions with non-zero codes (fwupdmgr
    /// exits 2 when there is nothing to update).
    pub fn with_exit_codes(command_line: impl Into<String>, codes: &[i32]) -> Self {
        Self {
            command_line: command_line.into(),
            acceptable_exit_codes: codes.to_vec(),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Failure of a single privileged command
#[derive(Debug, Error)]
pub enum ExecError {
    /// The command ran but exited with a code outside the acceptable set
    #[error("exit code {code}: {detail}")]
    UnexpectedExit { code: i32, detail: String },

    /// The command was terminated by a signal and produced no exit code
    #[error("terminated by signal: {detail}")]
    Killed { detail: String },

    /// The sudo process could not be spawned or awaited
    #[error("failed to run sudo: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Judge a finished command against its spec.
///
/// The diagnostic detail prefers stderr and falls back to stdout, so it is
/// non-empty whenever the child wrote anything at all.
fn resolve(
    spec: &CommandSpec,
    exit_code: Option<i32>,
    stdout: &str,
    stderr: &str,
) -> Result<(), ExecError> {
    match exit_code {
        Some(code) if spec.acceptable_exit_codes.contains(&code) => Ok(()),
        Some(code) => Err(ExecError::UnexpectedExit {
            code,
            detail: failure_detail(stdout, stderr),
        }),
        None => Err(ExecError::Killed {
            detail: failure_detail(stdout, stderr),
        }),
    }
}

fn failure_detail(stdout: &str, stderr: &str) -> String {
    let text = if stderr.trim().is_empty() {
        stdout
    } else {
        stderr
    };
    text.trim().to_string()
}

// ============================================================================
// Command Runner Trait
// ============================================================================

/// Trait abstraction over privileged command execution
///
/// Pipelines only ever see this interface; whether a real subprocess runs
/// behind it is an implementation detail.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run one command to completion and judge its exit code
    async fn run(&self, spec: &CommandSpec, credential: &Credential) -> Result<(), ExecError>;
}

// ============================================================================
// Sudo Runner (Production)
// ============================================================================

/// Production runner that elevates through `sudo -S`
pub struct SudoRunner;

impl SudoRunner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SudoRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for SudoRunner {
    async fn run(&self, spec: &CommandSpec, credential: &Credential) -> Result<(), ExecError> {
        debug!(command = %spec.command_line, "running privileged command");

        let mut command = Command::new("sudo");
        command.args(["-S", "sh", "-c", spec.command_line.as_str()]);

        let (exit_code, stdout, stderr) = run_with_stdin(command, credential.expose()).await?;

        let outcome = resolve(spec, exit_code, &stdout, &stderr);
        if let Err(ref err) = outcome {
            warn!(command = %spec.command_line, error = %err, "privileged command failed");
        }
        outcome
    }
}

/// Spawn a command with all three stdio streams piped, write one line to its
/// stdin, close the stream, and collect output until the child exits.
///
/// Write errors on stdin are ignored: sudo exits without reading the password
/// when its credential cache is still warm, and the exit status alone decides
/// the outcome. There is no timeout; a hung child blocks the caller.
async fn run_with_stdin(
    mut command: Command,
    stdin_line: &str,
) -> Result<(Option<i32>, String, String), std::io::Error> {
    command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command.spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        let _ = stdin.write_all(stdin_line.as_bytes()).await;
        let _ = stdin.write_all(b"\n").await;
        // stdin drops here, closing the pipe so the child sees EOF
    }

    let output = child.wait_with_output().await?;

    Ok((
        output.status.code(),
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
    ))
}

// ============================================================================
// Fake Runner (Testing)
// ============================================================================

/// Scripted result for one command line
#[derive(Debug, Clone)]
struct ScriptedResult {
    exit_code: Option<i32>,
    stdout: String,
    stderr: String,
}

/// Fake runner for deterministic tests
///
/// Commands resolve through the same exit-code rule as `SudoRunner`, against
/// scripted results instead of real subprocesses. Unscripted commands exit 0.
/// Every invocation is recorded in order for assertions.
///
/// ## Example
///
/// ```rust,ignore
/// let runner = FakeRunner::new().with_exit_code("apt update", 100);
/// // run a pipeline against it, then:
/// assert!(runner.ran("apt update"));
/// ```
pub struct FakeRunner {
    script: HashMap<String, ScriptedResult>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeRunner {
    /// Create a fake where every command succeeds with exit code 0
    pub fn new() -> Self {
        Self {
            script: HashMap::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Script an exit code for one command line
    pub fn with_exit_code(mut self, command_line: &str, exit_code: i32) -> Self {
        self.script.insert(
            command_line.to_string(),
            ScriptedResult {
                exit_code: Some(exit_code),
                stdout: String::new(),
                stderr: format!("scripted failure for: {}", command_line),
            },
        );
        self
    }

    /// Script an exit code together with captured output
    pub fn with_output(
        mut self,
        command_line: &str,
        exit_code: i32,
        stdout: &str,
        stderr: &str,
    ) -> Self {
        self.script.insert(
            command_line.to_string(),
            ScriptedResult {
                exit_code: Some(exit_code),
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            },
        );
        self
    }

    /// Script a signal-terminated command (no exit code)
    pub fn with_kill(mut self, command_line: &str) -> Self {
        self.script.insert(
            command_line.to_string(),
            ScriptedResult {
                exit_code: None,
                stdout: String::new(),
                stderr: String::new(),
            },
        );
        self
    }

    /// All command lines run so far, in invocation order
    pub fn commands_run(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Whether a specific command line was run
    pub fn ran(&self, command_line: &str) -> bool {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .any(|c| c == command_line)
    }

    /// Number of times a specific command line was run
    pub fn call_count(&self, command_line: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| *c == command_line)
            .count()
    }

    /// Total number of commands run
    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for FakeRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, spec: &CommandSpec, _credential: &Credential) -> Result<(), ExecError> {
        self.calls.lock().unwrap().push(spec.command_line.clone());

        match self.script.get(&spec.command_line) {
            Some(scripted) => resolve(spec, scripted.exit_code, &scripted.stdout, &scripted.stderr),
            None => resolve(spec, Some(0), "", ""),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn credential() -> Credential {
        Credential::new("hunter2").unwrap()
    }

    #[test]
    fn test_spec_defaults_to_exit_zero() {
        let spec = CommandSpec::new("apt update");
        assert_eq!(spec.acceptable_exit_codes, vec![0]);
    }

    #[test]
    fn test_resolve_accepts_zero() {
        let spec = CommandSpec::new("true");
        assert!(resolve(&spec, Some(0), "", "").is_ok());
    }

    #[test]
    fn test_resolve_accepts_alternate_codes() {
        let spec = CommandSpec::with_exit_codes("fwupdmgr update -y --force", &[0, 2]);
        assert!(resolve(&spec, Some(0), "", "").is_ok());
        assert!(resolve(&spec, Some(2), "no updates", "").is_ok());
        assert!(resolve(&spec, Some(1), "", "boom").is_err());
    }

    #[test]
    fn test_resolve_rejects_unexpected_code() {
        let spec = CommandSpec::new("apt update");
        let err = resolve(&spec, Some(100), "", "E: lock held").unwrap_err();
        match err {
            ExecError::UnexpectedExit { code, detail } => {
                assert_eq!(code, 100);
                assert_eq!(detail, "E: lock held");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_resolve_prefers_stderr_over_stdout() {
        let spec = CommandSpec::new("x");
        let err = resolve(&spec, Some(1), "stdout text", "stderr text").unwrap_err();
        assert!(err.to_string().contains("stderr text"));
        assert!(!err.to_string().contains("stdout text"));
    }

    #[test]
    fn test_resolve_falls_back_to_stdout() {
        let spec = CommandSpec::new("x");
        let err = resolve(&spec, Some(1), "stdout text", "   \n").unwrap_err();
        assert!(err.to_string().contains("stdout text"));
    }

    #[test]
    fn test_resolve_signal_termination() {
        let spec = CommandSpec::new("x");
        let err = resolve(&spec, None, "", "").unwrap_err();
        assert!(matches!(err, ExecError::Killed { .. }));
    }

    #[tokio::test]
    async fn test_run_with_stdin_captures_stdout() {
        let mut command = Command::new("sh");
        command.args(["-c", "echo out; exit 0"]);

        let (code, stdout, stderr) = run_with_stdin(command, "").await.unwrap();
        assert_eq!(code, Some(0));
        assert_eq!(stdout.trim(), "out");
        assert!(stderr.is_empty());
    }

    #[tokio::test]
    async fn test_run_with_stdin_captures_stderr_and_code() {
        let mut command = Command::new("sh");
        command.args(["-c", "echo boom >&2; exit 3"]);

        let (code, _stdout, stderr) = run_with_stdin(command, "").await.unwrap();
        assert_eq!(code, Some(3));
        assert_eq!(stderr.trim(), "boom");
    }

    #[tokio::test]
    async fn test_run_with_stdin_feeds_one_line() {
        let mut command = Command::new("sh");
        command.args(["-c", "read line; echo got:$line"]);

        let (code, stdout, _stderr) = run_with_stdin(command, "swordfish").await.unwrap();
        assert_eq!(code, Some(0));
        assert_eq!(stdout.trim(), "got:swordfish");
    }

    #[tokio::test]
    async fn test_run_with_stdin_signal_kill_has_no_code() {
        let mut command = Command::new("sh");
        command.args(["-c", "kill -9 $$"]);

        let (code, _stdout, _stderr) = run_with_stdin(command, "").await.unwrap();
        assert_eq!(code, None);
    }

    #[tokio::test]
    async fn test_run_with_stdin_spawn_failure() {
        let command = Command::new("/nonexistent/tuneup-test-binary");
        assert!(run_with_stdin(command, "").await.is_err());
    }

    #[tokio::test]
    async fn test_fake_runner_defaults_to_success() {
        let runner = FakeRunner::new();
        let spec = CommandSpec::new("snap refresh");

        assert!(runner.run(&spec, &credential()).await.is_ok());
        assert_eq!(runner.call_count("snap refresh"), 1);
    }

    #[tokio::test]
    async fn test_fake_runner_scripted_failure() {
        let runner = FakeRunner::new().with_exit_code("apt update", 100);
        let spec = CommandSpec::new("apt update");

        let err = runner.run(&spec, &credential()).await.unwrap_err();
        assert!(matches!(err, ExecError::UnexpectedExit { code: 100, .. }));
    }

    #[tokio::test]
    async fn test_fake_runner_honors_acceptable_codes() {
        let runner = FakeRunner::new().with_exit_code("fwupdmgr refresh --force", 2);
        let spec = CommandSpec::with_exit_codes("fwupdmgr refresh --force", &[0, 2]);

        assert!(runner.run(&spec, &credential()).await.is_ok());
    }

    #[tokio::test]
    async fn test_fake_runner_records_order() {
        let runner = FakeRunner::new();
        let cred = credential();

        runner.run(&CommandSpec::new("first"), &cred).await.unwrap();
        runner
            .run(&CommandSpec::new("second"), &cred)
            .await
            .unwrap();

        assert_eq!(runner.commands_run(), vec!["first", "second"]);
        assert_eq!(runner.total_calls(), 2);
        assert!(runner.ran("first"));
        assert!(!runner.ran("third"));
    }

    #[tokio::test]
    async fn test_fake_runner_scripted_kill() {
        let runner = FakeRunner::new().with_kill("journalctl --vacuum-size=100M");
        let spec = CommandSpec::new("journalctl --vacuum-size=100M");

        let err = runner.run(&spec, &credential()).await.unwrap_err();
        assert!(matches!(err, ExecError::Killed { .. }));
    }
}
