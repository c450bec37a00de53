//! Cipherpad CLI - a single encrypted note, unlocked on demand
//!
//! This is the composition root: it parses arguments, installs logging,
//! builds the engine, secret cache and note controller, and dispatches to
//! the command handlers.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod helpers;
mod logging;
mod security;
mod ui;

use clap::{CommandFactory, Parser};

use app::AppContext;
use cli::{Cli, Commands};
use errors::exit_code_for;
use ui::UiContext;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let ui = UiContext::from_env(cli.quiet, cli.no_color);
    logging::init(cli.verbose, ui.color);

    if let Err(err) = run(&cli, ui).await {
        tracing::debug!(error = ?err, "command failed");
        eprintln!("Error: {:#}", err);
        std::process::exit(exit_code_for(&err));
    }
}

async fn run(cli: &Cli, ui: UiContext) -> anyhow::Result<()> {
    let Some(command) = cli.command.as_ref() else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    if let Commands::Completions { shell } = command {
        return commands::handle_completions(*shell);
    }

    let mut ctx = AppContext::load(cli, ui)?;
    match command {
        Commands::Init(args) => commands::handle_init(&ctx, args).await,
        Commands::Show(args) => commands::handle_show(&mut ctx, args).await,
        Commands::Write(args) => commands::handle_write(&mut ctx, args).await,
        Commands::Edit(args) => commands::handle_edit(&mut ctx, args).await,
        Commands::Session(args) => commands::handle_session(&mut ctx, args).await,
        Commands::Status => commands::handle_status(&ctx),
        Commands::Completions { .. } => Ok(()),
    }
}
