//! Passphrase prompts and note text input.

use std::io::{self, IsTerminal, Read};

use dialoguer::Password;
use zeroize::Zeroizing;

use crate::constants::PASSPHRASE_ENV;
use crate::errors::CliError;

/// Passphrase supplied through the environment, if any.
pub fn env_passphrase() -> Option<Zeroizing<String>> {
    std::env::var(PASSPHRASE_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(Zeroizing::new)
}

/// Prompt for the passphrase of an existing note.
pub fn prompt_passphrase(interactive: bool) -> anyhow::Result<Zeroizing<String>> {
    if !interactive {
        return Err(CliError::invalid_input(format!(
            "No passphrase provided and no TTY available. Set {}.",
            PASSPHRASE_ENV
        ))
        .into());
    }
    Password::new()
        .with_prompt("Passphrase")
        .interact()
        .map(Zeroizing::new)
        .map_err(|e| anyhow::anyhow!("Failed to read passphrase: {}", e))
}

/// Prompt for a new passphrase with confirmation, or read it from the
/// environment.
pub fn prompt_new_passphrase(interactive: bool) -> anyhow::Result<Zeroizing<String>> {
    if let Some(value) = env_passphrase() {
        return Ok(value);
    }
    if !interactive {
        return Err(CliError::invalid_input(format!(
            "No passphrase provided and no TTY available. Set {}.",
            PASSPHRASE_ENV
        ))
        .into());
    }
    Password::new()
        .with_prompt("New passphrase")
        .with_confirmation("Confirm passphrase", "Passphrases do not match")
        .interact()
        .map(Zeroizing::new)
        .map_err(|e| anyhow::anyhow!("Failed to read passphrase: {}", e))
}

/// Read replacement note text from stdin.
///
/// Refuses to block on a terminal; an explicit `--body` is needed there.
pub fn read_stdin_text() -> anyhow::Result<Zeroizing<String>> {
    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        return Err(
            CliError::invalid_input("No note text given. Use --body or pipe text via stdin.").into(),
        );
    }
    let mut buffer = Zeroizing::new(String::new());
    stdin
        .read_to_string(&mut buffer)
        .map_err(|e| anyhow::anyhow!("Failed to read stdin: {}", e))?;
    Ok(buffer)
}
