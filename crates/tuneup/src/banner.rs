//! Startup banner

use owo_colors::OwoColorize;

const HR: &str = "──────────────────────────────────────────────────";

/// Print the welcome header with version
pub fn print() {
    println!();
    println!(
        "{}  {}",
        "tuneup".bright_white().bold(),
        format!("v{}", env!("TUNEUP_VERSION")).dimmed()
    );
    println!(
        "{}",
        "Ubuntu maintenance: updates, cleanup and system tweaks".dimmed()
    );
    println!("{}", HR.dimmed());
}
