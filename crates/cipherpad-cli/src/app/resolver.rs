//! Path resolution for config and note files.

use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::config::{default_note_path, CipherpadConfig};
use crate::errors::CliError;

/// Resolve the note path: `--path`/`CIPHERPAD_PATH`, then the config, then
/// the XDG default.
pub fn resolve_note_path(cli: &Cli, config: Option<&CipherpadConfig>) -> anyhow::Result<PathBuf> {
    if let Some(path) = cli.path.as_deref() {
        return Ok(PathBuf::from(path));
    }
    if let Some(config) = config {
        return Ok(PathBuf::from(&config.note.path));
    }
    default_note_path()
}

/// Error for commands that need an existing note.
pub fn missing_note_error(path: &Path) -> CliError {
    CliError::not_found(
        format!("No note found at {}", path.display()),
        "\nRun:\n  cipherpad init\n\nOr specify a note path:\n  CIPHERPAD_PATH=/path/to/note.cpad cipherpad init",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UnlockMethod;
    use clap::Parser;
    use std::time::Duration;

    #[test]
    fn test_flag_beats_config() {
        let cli = Cli::try_parse_from(["cipherpad", "--path", "/a/flag.cpad", "status"])
            .expect("parse");
        let config = CipherpadConfig::new(
            PathBuf::from("/a/config.cpad"),
            UnlockMethod::Passphrase,
            Duration::from_secs(60),
        );
        let path = resolve_note_path(&cli, Some(&config)).expect("path");
        assert_eq!(path, PathBuf::from("/a/flag.cpad"));
    }

    #[test]
    fn test_missing_note_hint_mentions_init() {
        let err = missing_note_error(Path::new("/nowhere/note.cpad"));
        let text = err.to_string();
        assert!(text.contains("/nowhere/note.cpad"));
        assert!(text.contains("cipherpad init"));
    }
}
