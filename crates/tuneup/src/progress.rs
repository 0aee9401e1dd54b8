//! Per-step progress rendering
//!
//! Implements `StepObserver` with one indicatif spinner at a time. Pure UX
//! layer: rendering problems never affect pipeline execution. The spinner is
//! only animated on a TTY with color allowed; piped output gets plain lines.

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::time::{Duration, Instant};

use crate::exec::ExecError;
use crate::pipeline::{FailurePolicy, Step, StepObserver};

/// Renders step transitions on stdout
pub struct ProgressReporter {
    spinner: Option<ProgressBar>,
    step_started_at: Instant,
    animate: bool,
}

impl ProgressReporter {
    pub fn new() -> Self {
        let is_tty = std::io::stdout().is_terminal();
        let no_color = std::env::var("NO_COLOR").is_ok();

        Self {
            spinner: None,
            step_started_at: Instant::now(),
            animate: is_tty && !no_color,
        }
    }

    fn clear_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl StepObserver for ProgressReporter {
    fn step_started(&mut self, step: &Step) {
        self.step_started_at = Instant::now();

        if !self.animate {
            println!("{} ...", step.running);
            return;
        }

        let pb = ProgressBar::new_spinner();
        let style = if supports_unicode() {
            ProgressStyle::default_spinner()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
                .template("{spinner} {msg}")
        } else {
            ProgressStyle::default_spinner()
                .tick_strings(&["|", "/", "-", "\\"])
                .template("{spinner} {msg}")
        };
        if let Ok(style) = style {
            pb.set_style(style);
        }
        pb.set_message(step.running.to_string());
        pb.enable_steady_tick(Duration::from_millis(80));
        self.spinner = Some(pb);
    }

    fn step_succeeded(&mut self, step: &Step) {
        let elapsed = self.step_started_at.elapsed().as_secs_f64();
        self.clear_spinner();
        println!("{} {} ({:.1}s)", "✓".green(), step.success, elapsed);
    }

    fn step_failed(&mut self, step: &Step, error: &ExecError) {
        self.clear_spinner();
        match step.on_failure {
            FailurePolicy::ReportAndContinue => {
                println!(
                    "{} {} failed, continuing: {}",
                    "!".yellow(),
                    step.label,
                    error
                );
            }
            FailurePolicy::Abort => {
                println!("{} {} failed: {}", "✗".red(), step.label, error);
            }
        }
    }

    fn phase_completed(&mut self, message: &str) {
        self.clear_spinner();
        println!();
        println!("{}", message.green().bold());
        println!();
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        // Never leave a live spinner on the terminal
        self.clear_spinner();
    }
}

/// Check if the terminal takes Unicode, via the LANG/LC_ALL heuristic
fn supports_unicode() -> bool {
    std::env::var("LANG")
        .or_else(|_| std::env::var("LC_ALL"))
        .map(|val| val.to_lowercase().contains("utf"))
        .unwrap_or(true)
}
