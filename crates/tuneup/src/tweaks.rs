//! Configuration pipeline: kernel tunables and firewall hardening
//!
//! Two steps, both fatal on failure. The tunables step is all-or-nothing as
//! far as this tool can make it: back up the live file, replace it, reload.
//! There is no rollback; if the firewall step fails afterwards, the tunables
//! stay applied.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::credential::Credential;
use crate::exec::{CommandRunner, CommandSpec};
use crate::pipeline::{run_sequence, PipelineRun, Step, StepObserver};
use crate::tunables;

/// Build the configuration steps around a staged tunables file
pub fn steps(staged_tunables: &Path) -> Vec<Step> {
    vec![
        Step::new(
            "kernel tunables",
            "Applying kernel tunables",
            "Kernel tunables applied",
            vec![
                CommandSpec::new("cp /etc/sysctl.conf /etc/sysctl.conf.bak"),
                CommandSpec::new(format!(
                    "cp '{}' /etc/sysctl.conf",
                    staged_tunables.display()
                )),
                CommandSpec::new("sysctl -p"),
            ],
        ),
        Step::new(
            "firewall",
            "Hardening UFW firewall",
            "UFW firewall hardened and enabled",
            vec![
                CommandSpec::new("ufw --force reset"),
                CommandSpec::new("ufw default deny incoming"),
                CommandSpec::new("ufw default allow outgoing"),
                CommandSpec::new("ufw allow 22/tcp"),
                CommandSpec::new("ufw allow 80/tcp"),
                CommandSpec::new("ufw allow 443/tcp"),
                CommandSpec::new("ufw limit 22/tcp"),
                CommandSpec::new("ufw logging on"),
                CommandSpec::new("ufw --force enable"),
            ],
        ),
    ]
}

/// Run the configuration pipeline
pub async fn run(
    runner: &dyn CommandRunner,
    credential: &Credential,
    observer: &mut dyn StepObserver,
) -> Result<PipelineRun> {
    // The staged file must outlive the sequence; root's cp reads it in place.
    let staged = stage_tunables().context("failed to stage sysctl configuration")?;

    let steps = steps(staged.path());
    let sequence = run_sequence(&steps, runner, credential, observer).await;
    Ok(PipelineRun::from(sequence))
}

/// Write the rendered tunables table to a scratch file
fn stage_tunables() -> std::io::Result<NamedTempFile> {
    let mut staged = NamedTempFile::new()?;
    staged.write_all(tunables::render(tunables::TUNABLES).as_bytes())?;
    staged.flush()?;
    Ok(staged)
}
