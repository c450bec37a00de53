use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use cipherpad_core::VERSION;

/// Cipherpad - a single encrypted note, unlocked on demand
#[derive(Parser)]
#[command(name = "cipherpad")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the note file
    #[arg(short, long, global = true, env = "CIPHERPAD_PATH")]
    pub path: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose logging on stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Arguments for the `init` command
#[derive(Args)]
pub struct InitArgs {
    /// Protect the note with a random secret kept in the OS keychain
    #[arg(long)]
    pub keychain: bool,

    /// Unlock timeout preset (immediately, 1m, 5m, 1h, 6h, 1d, 1w, never)
    #[arg(long, value_name = "PRESET")]
    pub timeout: Option<String>,

    /// Default editor recorded in the config
    #[arg(long)]
    pub editor: Option<String>,

    /// Disable interactive prompts
    #[arg(long)]
    pub no_input: bool,
}

/// Unlock options shared by commands that open the note
#[derive(Args, Clone, Default)]
pub struct UnlockArgs {
    /// Unlock timeout preset for this run (remembered in the config)
    #[arg(long, value_name = "PRESET")]
    pub timeout: Option<String>,

    /// Disable interactive prompts
    #[arg(long)]
    pub no_input: bool,
}

/// Arguments for the `write` command
#[derive(Args)]
pub struct WriteArgs {
    /// New note text (read from stdin when omitted)
    #[arg(long)]
    pub body: Option<String>,

    #[command(flatten)]
    pub unlock: UnlockArgs,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new encrypted note
    Init(InitArgs),

    /// Decrypt and print the note
    Show(UnlockArgs),

    /// Replace the note with new text
    Write(WriteArgs),

    /// Edit the note in $EDITOR
    Edit(UnlockArgs),

    /// Interactive session: lines typed are appended and saved after a quiet period
    Session(UnlockArgs),

    /// Show note and unlock settings
    Status,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_name = "SHELL")]
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_write_accepts_body_and_timeout() {
        let cli = Cli::try_parse_from([
            "cipherpad",
            "write",
            "--body",
            "hello",
            "--timeout",
            "5m",
        ])
        .expect("parse");
        match cli.command {
            Some(Commands::Write(args)) => {
                assert_eq!(args.body.as_deref(), Some("hello"));
                assert_eq!(args.unlock.timeout.as_deref(), Some("5m"));
            }
            _ => panic!("expected write command"),
        }
    }

    #[test]
    fn test_global_path_after_subcommand() {
        let cli = Cli::try_parse_from(["cipherpad", "show", "--path", "/tmp/n.cpad"])
            .expect("parse");
        assert_eq!(cli.path.as_deref(), Some("/tmp/n.cpad"));
    }
}
