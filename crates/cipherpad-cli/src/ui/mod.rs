//! Terminal presentation for the Cipherpad CLI.
//!
//! - **Context**: TTY, color and unicode detection
//! - **Theme**: status badges
//! - **Render**: badge lines and key/value tables
//! - **Progress**: a spinner for slow key derivation and writes

mod context;
pub mod progress;
pub mod render;
pub mod theme;

pub use context::UiContext;
pub use progress::Spinner;
pub use render::{badge, kv_table};
pub use theme::Badge;
