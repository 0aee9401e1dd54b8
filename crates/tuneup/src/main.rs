//! tuneup - interactive Ubuntu maintenance
//!
//! Collects the sudo credential once, then drives the update and
//! configuration pipelines from a menu or a subcommand.

use anyhow::Result;
use clap::Parser;

use tuneup::banner;
use tuneup::cli::{Cli, Command};
use tuneup::credential::Credential;
use tuneup::errors::{EXIT_NO_CREDENTIAL, EXIT_PIPELINE_FAILED, EXIT_SUCCESS};
use tuneup::exec::SudoRunner;
use tuneup::logging;
use tuneup::menu;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let cli = Cli::parse();
    let runner = SudoRunner::new();

    let code = match cli.command {
        None => {
            banner::print();
            let credential = acquire_credential();
            menu::run_loop(&runner, &credential).await?;
            EXIT_SUCCESS
        }
        Some(Command::Update) => {
            let credential = acquire_credential();
            exit_code(menu::update_action(&runner, &credential).await)
        }
        Some(Command::Config) => {
            let credential = acquire_credential();
            exit_code(menu::config_action(&runner, &credential).await)
        }
        Some(Command::All) => {
            let credential = acquire_credential();
            exit_code(menu::all_action(&runner, &credential).await)
        }
    };

    std::process::exit(code)
}

/// Get the sudo credential or leave with a dedicated exit code
fn acquire_credential() -> Credential {
    match Credential::acquire() {
        Ok(credential) => credential,
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(EXIT_NO_CREDENTIAL);
        }
    }
}

fn exit_code(ok: bool) -> i32 {
    if ok {
        EXIT_SUCCESS
    } else {
        EXIT_PIPELINE_FAILED
    }
}
