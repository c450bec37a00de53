//! Constants used throughout the CLI.

use std::time::Duration;

/// Exit codes for the CLI.
///
/// These follow common Unix conventions:
/// - 0: Success
/// - 1: General error (used by anyhow for unhandled errors)
/// - 2: Misuse of shell command (reserved by shells)
/// - 3+: Application-specific errors
pub mod exit_codes {
    /// Resource not found (config, note).
    pub const NOT_FOUND: i32 = 3;

    /// Invalid user input or arguments.
    pub const INVALID_INPUT: i32 = 4;

    /// Authentication failed (wrong passphrase, too many attempts).
    pub const AUTH_FAILED: i32 = 5;
}

/// Environment variable holding a non-interactive passphrase.
pub const PASSPHRASE_ENV: &str = "CIPHERPAD_PASSPHRASE";

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "CIPHERPAD_CONFIG";

/// Keychain service name for platform secrets.
pub const KEYCHAIN_SERVICE: &str = "cipherpad";

/// Passphrase attempts allowed on a terminal.
pub const MAX_INTERACTIVE_ATTEMPTS: u32 = 3;

/// Shortest time a key is held after unlocking; applies to `immediately`.
pub const MIN_UNLOCK_HOLD: Duration = Duration::from_secs(10);
