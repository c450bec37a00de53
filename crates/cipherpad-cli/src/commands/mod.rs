//! Command handlers for the Cipherpad CLI.

mod init;
mod misc;
mod note;
mod session;
mod status;

pub use init::handle_init;
pub use misc::handle_completions;
pub use note::{handle_edit, handle_show, handle_write};
pub use session::handle_session;
pub use status::handle_status;
