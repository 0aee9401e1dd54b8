//! Step sequencing with per-step failure policy
//!
//! A pipeline is an ordered list of named steps; each step is an ordered
//! list of privileged commands with short-circuit semantics. Steps run
//! strictly one after another, never in parallel, because the package
//! managers behind them take conflicting system locks.
//!
//! Failure handling is a per-step policy: most steps abort the rest of the
//! sequence, a few are best-effort and only report. Progress rendering is
//! not this module's job; it emits one event per step transition through
//! the `StepObserver` collaborator.

use tracing::{debug, warn};

use crate::credential::Credential;
use crate::exec::{CommandRunner, CommandSpec, ExecError};

// ============================================================================
// Steps
// ============================================================================

/// What a step failure does to the rest of its sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop the sequence at this step
    Abort,
    /// Report the failure and keep going
    ReportAndContinue,
}

/// One named unit of pipeline work
#[derive(Debug, Clone)]
pub struct Step {
    /// Short name used in records, outcomes and logs
    pub label: &'static str,
    /// Progress line while the step runs
    pub running: &'static str,
    /// Progress line once the step succeeds
    pub success: &'static str,
    /// Commands run in order; the first failure fails the step
    pub commands: Vec<CommandSpec>,
    pub on_failure: FailurePolicy,
}

impl Step {
    /// Step that aborts the sequence on failure
    pub fn new(
        label: &'static str,
        running: &'static str,
        success: &'static str,
        commands: Vec<CommandSpec>,
    ) -> Self {
        Self {
            label,
            running,
            success,
            commands,
            on_failure: FailurePolicy::Abort,
        }
    }

    /// Downgrade the step to best-effort
    pub fn best_effort(mut self) -> Self {
        self.on_failure = FailurePolicy::ReportAndContinue;
        self
    }
}

// ============================================================================
// Run results
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Succeeded,
    Failed,
}

/// Per-step entry in a pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub label: &'static str,
    pub status: StepStatus,
}

/// Terminal outcome of a whole pipeline invocation
#[derive(Debug)]
pub enum PipelineOutcome {
    Completed,
    /// The sequence stopped at `step` with the error that failed it
    Aborted {
        step: &'static str,
        error: ExecError,
    },
}

/// Everything one pipeline invocation produced
#[derive(Debug)]
pub struct PipelineRun {
    pub records: Vec<StepRecord>,
    pub outcome: PipelineOutcome,
}

impl PipelineRun {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, PipelineOutcome::Completed)
    }

    pub fn aborted_step(&self) -> Option<&'static str> {
        match &self.outcome {
            PipelineOutcome::Completed => None,
            PipelineOutcome::Aborted { step, .. } => Some(*step),
        }
    }
}

// ============================================================================
// Observer
// ============================================================================

/// Receives step transitions as a sequence runs
///
/// Implementations render spinners, collect events for tests, or do nothing.
pub trait StepObserver {
    fn step_started(&mut self, step: &Step);
    fn step_succeeded(&mut self, step: &Step);
    fn step_failed(&mut self, step: &Step, error: &ExecError);

    /// A milestone between phases of a larger pipeline
    fn phase_completed(&mut self, _message: &str) {}
}

/// Observer that ignores every event
pub struct NullObserver;

impl StepObserver for NullObserver {
    fn step_started(&mut self, _step: &Step) {}
    fn step_succeeded(&mut self, _step: &Step) {}
    fn step_failed(&mut self, _step: &Step, _error: &ExecError) {}
}

/// Observer that records events as strings, for assertions in tests
#[derive(Default)]
pub struct RecordingObserver {
    pub events: Vec<String>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StepObserver for RecordingObserver {
    fn step_started(&mut self, step: &Step) {
        self.events.push(format!("started:{}", step.label));
    }

    fn step_succeeded(&mut self, step: &Step) {
        self.events.push(format!("succeeded:{}", step.label));
    }

    fn step_failed(&mut self, step: &Step, error: &ExecError) {
        self.events.push(format!("failed:{}:{}", step.label, error));
    }

    fn phase_completed(&mut self, message: &str) {
        self.events.push(format!("phase:{}", message));
    }
}

// ============================================================================
// Sequencing
// ============================================================================

/// Result of running one step sequence
#[derive(Debug)]
pub struct SequenceResult {
    pub records: Vec<StepRecord>,
    /// The step that stopped the sequence, if any
    pub aborted: Option<(&'static str, ExecError)>,
}

impl From<SequenceResult> for PipelineRun {
    fn from(sequence: SequenceResult) -> Self {
        let outcome = match sequence.aborted {
            None => PipelineOutcome::Completed,
            Some((step, error)) => PipelineOutcome::Aborted { step, error },
        };
        PipelineRun {
            records: sequence.records,
            outcome,
        }
    }
}

/// Run steps in order, honoring each step's failure policy
pub async fn run_sequence(
    steps: &[Step],
    runner: &dyn CommandRunner,
    credential: &Credential,
    observer: &mut dyn StepObserver,
) -> SequenceResult {
    let mut records = Vec::new();

    for step in steps {
        debug!(step = step.label, "step started");
        observer.step_started(step);

        match run_step(step, runner, credential).await {
            Ok(()) => {
                debug!(step = step.label, "step succeeded");
                observer.step_succeeded(step);
                records.push(StepRecord {
                    label: step.label,
                    status: StepStatus::Succeeded,
                });
            }
            Err(error) => {
                warn!(step = step.label, error = %error, "step failed");
                observer.step_failed(step, &error);
                records.push(StepRecord {
                    label: step.label,
                    status: StepStatus::Failed,
                });

                match step.on_failure {
                    FailurePolicy::Abort => {
                        return SequenceResult {
                            records,
                            aborted: Some((step.label, error)),
                        };
                    }
                    FailurePolicy::ReportAndContinue => {
                        debug!(step = step.label, "best-effort step failed, continuing");
                    }
                }
            }
        }
    }

    SequenceResult {
        records,
        aborted: None,
    }
}

/// Run one step's commands in order, stopping at the first failure
async fn run_step(
    step: &Step,
    runner: &dyn CommandRunner,
    credential: &Credential,
) -> Result<(), ExecError> {
    for spec in &step.commands {
        runner.run(spec, credential).await?;
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::FakeRunner;

    fn credential() -> Credential {
        Credential::new("hunter2").unwrap()
    }

    fn step(label: &'static str, commands: &[&str]) -> Step {
        Step::new(
            label,
            "running",
            "done",
            commands.iter().map(|c| CommandSpec::new(*c)).collect(),
        )
    }

    #[tokio::test]
    async fn test_all_steps_succeed_in_order() {
        let runner = FakeRunner::new();
        let steps = vec![step("one", &["cmd-a"]), step("two", &["cmd-b"])];
        let mut observer = RecordingObserver::new();

        let result = run_sequence(&steps, &runner, &credential(), &mut observer).await;

        assert!(result.aborted.is_none());
        assert_eq!(result.records.len(), 2);
        assert!(result
            .records
            .iter()
            .all(|r| r.status == StepStatus::Succeeded));
        assert_eq!(
            observer.events,
            vec!["started:one", "succeeded:one", "started:two", "succeeded:two"]
        );
        assert_eq!(runner.commands_run(), vec!["cmd-a", "cmd-b"]);
    }

    #[tokio::test]
    async fn test_abort_stops_remaining_steps() {
        let runner = FakeRunner::new().with_exit_code("cmd-a", 1);
        let steps = vec![step("one", &["cmd-a"]), step("two", &["cmd-b"])];
        let mut observer = RecordingObserver::new();

        let result = run_sequence(&steps, &runner, &credential(), &mut observer).await;

        let (label, _error) = result.aborted.expect("sequence should abort");
        assert_eq!(label, "one");
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].status, StepStatus::Failed);
        assert!(!runner.ran("cmd-b"));
    }

    #[tokio::test]
    async fn test_best_effort_failure_continues() {
        let runner = FakeRunner::new().with_exit_code("cmd-a", 1);
        let steps = vec![
            step("one", &["cmd-a"]).best_effort(),
            step("two", &["cmd-b"]),
        ];
        let mut observer = RecordingObserver::new();

        let result = run_sequence(&steps, &runner, &credential(), &mut observer).await;

        assert!(result.aborted.is_none());
        assert_eq!(result.records[0].status, StepStatus::Failed);
        assert_eq!(result.records[1].status, StepStatus::Succeeded);
        assert!(runner.ran("cmd-b"));
    }

    #[tokio::test]
    async fn test_step_commands_short_circuit() {
        let runner = FakeRunner::new().with_exit_code("cmd-b", 1);
        let steps = vec![step("one", &["cmd-a", "cmd-b", "cmd-c"])];

        let result = run_sequence(&steps, &runner, &credential(), &mut NullObserver).await;

        assert!(result.aborted.is_some());
        assert!(runner.ran("cmd-a"));
        assert!(runner.ran("cmd-b"));
        assert!(!runner.ran("cmd-c"));
    }

    #[tokio::test]
    async fn test_pipeline_run_from_sequence() {
        let runner = FakeRunner::new();
        let steps = vec![step("only", &["cmd"])];

        let result = run_sequence(&steps, &runner, &credential(), &mut NullObserver).await;
        let run = PipelineRun::from(result);

        assert!(run.succeeded());
        assert_eq!(run.aborted_step(), None);
    }

    #[tokio::test]
    async fn test_pipeline_run_reports_aborted_step() {
        let runner = FakeRunner::new().with_exit_code("cmd", 9);
        let steps = vec![step("only", &["cmd"])];

        let result = run_sequence(&steps, &runner, &credential(), &mut NullObserver).await;
        let run = PipelineRun::from(result);

        assert!(!run.succeeded());
        assert_eq!(run.aborted_step(), Some("only"));
    }
}
