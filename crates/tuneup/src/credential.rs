//! Sudo credential acquisition
//!
//! The password is collected once per process: from `TUNEUP_SUDO_PASSWORD`
//! when set and non-empty, otherwise from a hidden terminal prompt that
//! re-prompts while the input is empty. It lives in memory for the process
//! lifetime only and is fed to privileged commands over stdin.

use anyhow::{Context, Result};
use console::Term;
use owo_colors::OwoColorize;
use std::fmt;

/// Environment variable consulted before prompting
pub const PASSWORD_ENV_VAR: &str = "TUNEUP_SUDO_PASSWORD";

/// The sudo password. Non-empty by construction.
///
/// There is no `Display` impl and `Debug` is redacted, so the secret cannot
/// reach logs or error messages through formatting.
pub struct Credential(String);

impl Credential {
    /// Wrap a secret, rejecting empty input
    pub fn new(secret: impl Into<String>) -> Option<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            None
        } else {
            Some(Self(secret))
        }
    }

    /// Obtain the credential: environment variable first, prompt as fallback
    pub fn acquire() -> Result<Self> {
        if let Some(credential) = Self::from_env(std::env::var(PASSWORD_ENV_VAR).ok()) {
            return Ok(credential);
        }
        Self::prompt()
    }

    /// Environment path: set and non-empty wins, anything else falls through
    fn from_env(value: Option<String>) -> Option<Self> {
        value.and_then(Self::new)
    }

    /// Hidden prompt on the terminal, looping while the input is empty
    fn prompt() -> Result<Self> {
        let term = Term::stderr();
        if !term.is_term() {
            anyhow::bail!(
                "no terminal available for the password prompt; set {}",
                PASSWORD_ENV_VAR
            );
        }

        loop {
            term.write_str(&format!("{} ", "Sudo password:".bright_magenta()))?;
            let secret = term
                .read_secure_line()
                .context("failed to read password from terminal")?;

            match Self::new(secret) {
                Some(credential) => return Ok(credential),
                None => {
                    term.write_line(&format!("{}  Password cannot be empty", "!".yellow()))?;
                }
            }
        }
    }

    /// Access the secret to feed a subprocess stdin. Never log this.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_empty_secret() {
        assert!(Credential::new("").is_none());
        assert!(Credential::new("p").is_some());
    }

    #[test]
    fn test_from_env_takes_non_empty_value() {
        let credential = Credential::from_env(Some("hunter2".to_string())).unwrap();
        assert_eq!(credential.expose(), "hunter2");
    }

    #[test]
    fn test_from_env_falls_through_on_empty_or_unset() {
        assert!(Credential::from_env(Some(String::new())).is_none());
        assert!(Credential::from_env(None).is_none());
    }

    #[test]
    fn test_debug_never_contains_secret() {
        let credential = Credential::new("hunter2").unwrap();
        let rendered = format!("{:?}", credential);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("redacted"));
    }

    #[test]
    fn test_whitespace_secret_is_kept_verbatim() {
        // sudo decides what a valid password is, not this tool
        let credential = Credential::new("  spaced  ").unwrap();
        assert_eq!(credential.expose(), "  spaced  ");
    }
}
