//! Interactive main menu
//!
//! Numbered choices, re-prompt on anything unparseable, back to the menu
//! after every action. EOF on stdin behaves like choosing Exit.

use anyhow::Result;
use owo_colors::OwoColorize;
use std::io::{self, BufRead, Write};
use std::time::Instant;

use crate::credential::Credential;
use crate::exec::CommandRunner;
use crate::history::RunEntry;
use crate::pipeline::{PipelineOutcome, PipelineRun};
use crate::progress::ProgressReporter;
use crate::{tweaks, update};

/// Menu actions in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Update,
    Config,
    InstallSoftware,
    RunAll,
    Exit,
}

const CHOICES: &[MenuChoice] = &[
    MenuChoice::Update,
    MenuChoice::Config,
    MenuChoice::InstallSoftware,
    MenuChoice::RunAll,
    MenuChoice::Exit,
];

impl MenuChoice {
    fn label(&self) -> &'static str {
        match self {
            MenuChoice::Update => "Update the system",
            MenuChoice::Config => "Apply recommended settings",
            MenuChoice::InstallSoftware => "Install software",
            MenuChoice::RunAll => "Run everything",
            MenuChoice::Exit => "Exit",
        }
    }
}

/// Map a typed line to a menu choice
pub fn parse_choice(input: &str) -> Option<MenuChoice> {
    let number: usize = input.trim().parse().ok()?;
    CHOICES.get(number.checked_sub(1)?).copied()
}

/// Show the menu until the user exits
pub async fn run_loop(runner: &dyn CommandRunner, credential: &Credential) -> Result<()> {
    loop {
        print_menu();

        let Some(line) = read_choice_line()? else {
            println!();
            return Ok(());
        };

        match parse_choice(&line) {
            None => {
                println!(
                    "   {}  Please enter a number between 1 and {}",
                    "!".yellow(),
                    CHOICES.len()
                );
            }
            Some(MenuChoice::Exit) => {
                println!("   {}", "Bye.".dimmed());
                return Ok(());
            }
            Some(MenuChoice::InstallSoftware) => {
                println!(
                    "   {}  Software install is not supported yet",
                    "!".yellow()
                );
            }
            Some(MenuChoice::Update) => {
                update_action(runner, credential).await;
            }
            Some(MenuChoice::Config) => {
                config_action(runner, credential).await;
            }
            Some(MenuChoice::RunAll) => {
                all_action(runner, credential).await;
            }
        }
    }
}

fn print_menu() {
    println!();
    println!("{}", "What do you want to do?".bright_white().bold());
    println!();
    for (i, choice) in CHOICES.iter().enumerate() {
        println!("   {}  {}", format!("[{}]", i + 1).cyan(), choice.label());
    }
    println!();
}

/// Read one menu line; `None` means EOF
fn read_choice_line() -> io::Result<Option<String>> {
    print!("   {}  ", "Enter number:".bright_magenta());
    io::stdout().flush()?;

    let mut input = String::new();
    let bytes = io::stdin().lock().read_line(&mut input)?;
    if bytes == 0 {
        return Ok(None);
    }
    Ok(Some(input))
}

/// Run the maintenance pipeline with progress rendering and history
pub async fn update_action(runner: &dyn CommandRunner, credential: &Credential) -> bool {
    let started = Instant::now();
    let mut reporter = ProgressReporter::new();

    let run = update::run(runner, credential, &mut reporter).await;

    RunEntry::from_run("update", &run, started.elapsed().as_millis() as u64).write();
    report_outcome(&run, "Maintenance complete", "Update process failed");
    run.succeeded()
}

/// Run the configuration pipeline with progress rendering and history
pub async fn config_action(runner: &dyn CommandRunner, credential: &Credential) -> bool {
    let started = Instant::now();
    let mut reporter = ProgressReporter::new();

    match tweaks::run(runner, credential, &mut reporter).await {
        Ok(run) => {
            RunEntry::from_run("config", &run, started.elapsed().as_millis() as u64).write();
            report_outcome(&run, "Recommended settings applied", "Applying settings failed");
            run.succeeded()
        }
        Err(err) => {
            println!();
            println!("{} {:#}", "✗".red(), err);
            println!();
            false
        }
    }
}

/// Run maintenance, then configuration regardless of the maintenance outcome
pub async fn all_action(runner: &dyn CommandRunner, credential: &Credential) -> bool {
    let update_ok = update_action(runner, credential).await;
    let config_ok = config_action(runner, credential).await;
    update_ok && config_ok
}

fn report_outcome(run: &PipelineRun, success_message: &str, failure_message: &str) {
    println!();
    match &run.outcome {
        PipelineOutcome::Completed => {
            println!("{}", success_message.green().bold());
        }
        PipelineOutcome::Aborted { step, error } => {
            println!("{}", failure_message.red().bold());
            println!("{}", format!("  {} failed: {}", step, error).red());
        }
    }
    println!();
}
