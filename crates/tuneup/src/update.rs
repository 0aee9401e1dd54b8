//! Maintenance pipeline: updates across every package source, then cleanup
//!
//! The step tables are the tool's contract with the system: literal Ubuntu
//! command lines in a fixed order, no package-manager abstraction. The
//! cleanup phase only starts once every update step has succeeded.

use crate::credential::Credential;
use crate::exec::{CommandRunner, CommandSpec};
use crate::pipeline::{run_sequence, PipelineOutcome, PipelineRun, Step, StepObserver};

/// Exit code fwupdmgr uses for "nothing to do"
const FWUPD_NOTHING_TO_DO: i32 = 2;

/// Removes every disabled snap revision still on disk
const SNAP_PRUNE: &str = r#"snap list --all | awk '/disabled/{print $1, $3}' | while read snapname revision; do snap remove "$snapname" --revision="$revision"; done"#;

/// Message rendered between the update phase and the cleanup phase
pub const UPDATE_PHASE_DONE: &str = "System fully updated";

/// The five update steps, in execution order. Any failure aborts the rest.
pub fn primary_steps() -> Vec<Step> {
    vec![
        Step::new(
            "firmware",
            "Checking for firmware updates",
            "Firmware updated",
            vec![
                CommandSpec::with_exit_codes(
                    "fwupdmgr refresh --force",
                    &[0, FWUPD_NOTHING_TO_DO],
                ),
                CommandSpec::with_exit_codes(
                    "fwupdmgr update -y --force",
                    &[0, FWUPD_NOTHING_TO_DO],
                ),
            ],
        ),
        Step::new(
            "APT packages",
            "Updating APT packages",
            "APT packages updated",
            vec![
                CommandSpec::new("apt update"),
                CommandSpec::new("apt upgrade -y"),
                CommandSpec::new("apt autoremove -y"),
            ],
        ),
        Step::new(
            "Snap packages",
            "Updating Snap packages",
            "Snaps updated",
            vec![CommandSpec::new("snap refresh")],
        ),
        Step::new(
            "Flatpak packages",
            "Updating Flatpak packages",
            "Flatpaks updated",
            vec![CommandSpec::new("flatpak update -y")],
        ),
        Step::new(
            "kernel",
            "Checking for kernel updates",
            "Kernel checked and updated where applicable",
            vec![CommandSpec::new(
                "apt install --install-recommends linux-generic -y",
            )],
        ),
    ]
}

/// Cleanup steps run after a fully successful update phase.
///
/// Thumbnail and stale-log removal are cosmetic and best-effort; the other
/// steps reclaim disk from package managers and abort the phase on failure.
pub fn cleanup_steps() -> Vec<Step> {
    vec![
        Step::new(
            "package caches",
            "Cleaning APT and Flatpak caches",
            "APT and Flatpak caches cleaned",
            vec![
                CommandSpec::new("apt clean"),
                CommandSpec::new("apt autoremove -y"),
                CommandSpec::new("apt autoclean"),
                CommandSpec::new("flatpak uninstall --unused -y"),
            ],
        ),
        Step::new(
            "old snap revisions",
            "Removing disabled Snap revisions",
            "Disabled Snap revisions removed",
            vec![CommandSpec::new(SNAP_PRUNE)],
        ),
        Step::new(
            "journal logs",
            "Vacuuming systemd journal down to 100M",
            "Systemd journal vacuumed",
            vec![CommandSpec::new("journalctl --vacuum-size=100M")],
        ),
        Step::new(
            "old kernels",
            "Removing old kernels and unused packages",
            "Old kernels removed",
            vec![CommandSpec::new("apt-get autoremove --purge -y")],
        ),
        Step::new(
            "thumbnail cache",
            "Clearing cached thumbnails",
            "Cached thumbnails cleared",
            vec![CommandSpec::new("rm -rf ~/.cache/thumbnails/*")],
        )
        .best_effort(),
        Step::new(
            "stale logs",
            "Removing system logs older than 30 days",
            "Old system logs removed",
            vec![CommandSpec::new(
                "find /var/log -type f -mtime +30 -exec rm -f {} +",
            )],
        )
        .best_effort(),
        Step::new(
            "orphaned packages",
            "Removing orphaned packages",
            "Orphaned packages removed",
            vec![CommandSpec::new(
                "deborphan | xargs -r sudo apt-get -y remove --purge",
            )],
        ),
    ]
}

/// Run the whole maintenance pipeline
///
/// Updates run first; an abort there skips cleanup entirely. Cleanup then
/// runs with its own policies and decides the final outcome.
pub async fn run(
    runner: &dyn CommandRunner,
    credential: &Credential,
    observer: &mut dyn StepObserver,
) -> PipelineRun {
    let primary = run_sequence(&primary_steps(), runner, credential, observer).await;
    if let Some((step, error)) = primary.aborted {
        return PipelineRun {
            records: primary.records,
            outcome: PipelineOutcome::Aborted { step, error },
        };
    }

    observer.phase_completed(UPDATE_PHASE_DONE);

    let mut records = primary.records;
    let cleanup = run_sequence(&cleanup_steps(), runner, credential, observer).await;
    records.extend(cleanup.records);

    let outcome = match cleanup.aborted {
        None => PipelineOutcome::Completed,
        Some((step, error)) => PipelineOutcome::Aborted { step, error },
    };

    PipelineRun { records, outcome }
}
