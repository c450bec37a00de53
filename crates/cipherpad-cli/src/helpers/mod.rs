//! Input and parsing helper functions for the CLI.
//!
//! This module provides utilities for:
//! - Passphrase prompting and note text reading (`input`)
//! - Launching an external editor on the note (`editor`)
//! - Timeout parsing (`parsing`)

mod editor;
mod input;
mod parsing;

// Re-export public API
pub use editor::edit_text;
pub use input::{env_passphrase, prompt_new_passphrase, prompt_passphrase, read_stdin_text};
pub use parsing::parse_timeout;
