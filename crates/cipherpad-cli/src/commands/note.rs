//! One-shot note commands: `show`, `write` and `edit`.
//!
//! Each unlocks the note with its own short-lived cache, does one thing
//! and flushes before exiting.

use std::io::Write;

use cipherpad_core::PersistOutcome;

use crate::app::{unlock_note, AppContext, Note};
use crate::cli::{UnlockArgs, WriteArgs};
use crate::errors::from_core;
use crate::helpers::{edit_text, read_stdin_text};
use crate::ui::{badge, Badge, Spinner};

pub async fn handle_show(ctx: &mut AppContext<'_>, args: &UnlockArgs) -> anyhow::Result<()> {
    let note = open_unlocked(ctx, args).await?;
    let content = load(&note).await?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(content.as_bytes())?;
    if !content.is_empty() && !content.ends_with('\n') {
        stdout.write_all(b"\n")?;
    }
    stdout.flush()?;
    Ok(())
}

pub async fn handle_write(ctx: &mut AppContext<'_>, args: &WriteArgs) -> anyhow::Result<()> {
    let text = match args.body.as_ref() {
        Some(body) => zeroize::Zeroizing::new(body.clone()),
        None => read_stdin_text()?,
    };

    let note = open_unlocked(ctx, &args.unlock).await?;
    load(&note).await?;
    note.edit(text.as_str());
    save(ctx, &note, &args.unlock).await
}

pub async fn handle_edit(ctx: &mut AppContext<'_>, args: &UnlockArgs) -> anyhow::Result<()> {
    let note = open_unlocked(ctx, args).await?;
    let content = load(&note).await?;

    let edited = edit_text(ctx.editor(), &content)?;
    note.edit(edited.as_str());
    save(ctx, &note, args).await
}

async fn open_unlocked(ctx: &mut AppContext<'_>, args: &UnlockArgs) -> anyhow::Result<Note> {
    let preset = ctx.timeout(args)?;
    let note = ctx.open_existing_note()?;
    unlock_note(ctx, &note, preset, args.no_input).await?;
    Ok(note)
}

async fn load(note: &Note) -> anyhow::Result<zeroize::Zeroizing<String>> {
    note.load()
        .await
        .map_err(from_core)?
        .ok_or_else(|| anyhow::anyhow!("Note locked before it could be read"))
}

/// Flush the latest edit. If the key expired meanwhile (a long editor
/// session), unlock again and retry; the edit is held until then.
async fn save(ctx: &AppContext<'_>, note: &Note, args: &UnlockArgs) -> anyhow::Result<()> {
    let mut outcome = flush(ctx, note).await?;
    if outcome == PersistOutcome::Locked {
        if !ctx.quiet() {
            eprintln!(
                "{}",
                badge(ctx.ui(), Badge::Warn, "Note locked while editing; unlock to save.")
            );
        }
        let preset = ctx.settings().timeout_preset();
        unlock_note(ctx, note, preset, args.no_input).await?;
        outcome = flush(ctx, note).await?;
    }

    if outcome == PersistOutcome::Locked {
        return Err(anyhow::anyhow!("Note is locked; not saved"));
    }
    if !ctx.quiet() {
        let line = if outcome == PersistOutcome::Persisted {
            badge(ctx.ui(), Badge::Ok, "Note saved")
        } else {
            badge(ctx.ui(), Badge::Info, "Note unchanged")
        };
        eprintln!("{}", line);
    }
    Ok(())
}

async fn flush(ctx: &AppContext<'_>, note: &Note) -> anyhow::Result<PersistOutcome> {
    let spinner = Spinner::start(ctx.ui(), "Saving");
    let outcome = note.flush().await;
    spinner.finish();
    outcome.map_err(from_core)
}
