//! `cipherpad session`: a long-lived editing loop.
//!
//! Every line read from stdin is appended to the note and handed to the
//! controller, which writes after the quiet period. Lines starting with `:`
//! are commands. The process-wide cache expires on its own; the next line
//! typed after that asks to unlock again.

use cipherpad_core::cache::CacheStatus;
use cipherpad_core::{PersistEvent, PersistOutcome, TtlPreset};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

use crate::app::{unlock_note, AppContext, Note};
use crate::cli::UnlockArgs;
use crate::errors::from_core;
use crate::ui::{badge, Badge};

const HELP: &str = "Commands: :flush :show :lock :status :quit";

/// A line of session input.
#[derive(Debug, PartialEq, Eq)]
enum SessionInput<'a> {
    Text(&'a str),
    Flush,
    Show,
    Lock,
    Status,
    Quit,
    Help,
    Unknown(&'a str),
}

impl<'a> SessionInput<'a> {
    fn parse(line: &'a str) -> Self {
        let Some(command) = line.strip_prefix(':') else {
            return SessionInput::Text(line);
        };
        match command.trim() {
            "flush" | "w" => SessionInput::Flush,
            "show" | "p" => SessionInput::Show,
            "lock" => SessionInput::Lock,
            "status" => SessionInput::Status,
            "quit" | "q" => SessionInput::Quit,
            "help" | "h" => SessionInput::Help,
            // `::text` escapes a literal leading colon.
            other if other.starts_with(':') => SessionInput::Text(&line[1..]),
            other => SessionInput::Unknown(other),
        }
    }
}

/// Append one typed line to the note text.
fn append_line(content: &str, line: &str) -> String {
    let mut next = String::with_capacity(content.len() + line.len() + 1);
    next.push_str(content);
    if !next.is_empty() && !next.ends_with('\n') {
        next.push('\n');
    }
    next.push_str(line);
    next.push('\n');
    next
}

pub async fn handle_session(ctx: &mut AppContext<'_>, args: &UnlockArgs) -> anyhow::Result<()> {
    let preset = ctx.timeout(args)?;
    let note = ctx.open_existing_note()?;
    unlock_note(ctx, &note, preset, args.no_input).await?;
    note.load()
        .await
        .map_err(from_core)?
        .ok_or_else(|| anyhow::anyhow!("Note locked before it could be read"))?;

    let session = Session {
        ctx: &*ctx,
        note: note.clone(),
        preset,
        no_input: args.no_input,
    };
    session.info(&format!(
        "Session open (unlock timeout: {}). {}",
        preset.description, HELP
    ));

    let mut events = note.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !session.handle_line(&line).await? {
                    break;
                }
            }
            event = events.recv() => match event {
                Ok(event) => session.report_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "persist events dropped");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    session.finish().await
}

struct Session<'c, 'a> {
    ctx: &'c AppContext<'a>,
    note: Note,
    preset: &'static TtlPreset,
    no_input: bool,
}

impl Session<'_, '_> {
    /// Returns false when the session should end.
    async fn handle_line(&self, line: &str) -> anyhow::Result<bool> {
        match SessionInput::parse(line) {
            SessionInput::Text(text) => {
                self.ensure_unlocked().await?;
                let next = append_line(&self.note.content(), text);
                self.note.edit(next);
            }
            SessionInput::Flush => {
                self.ensure_unlocked().await?;
                let outcome = self.note.flush().await.map_err(from_core)?;
                self.report_outcome(outcome);
            }
            SessionInput::Show => {
                self.ensure_unlocked().await?;
                print!("{}", self.note.content().as_str());
            }
            SessionInput::Lock => {
                self.note.cache().clear();
                self.info("Locked. Unsaved lines are held until you unlock.");
            }
            SessionInput::Status => self.print_status(),
            SessionInput::Quit => return Ok(false),
            SessionInput::Help => self.info(HELP),
            SessionInput::Unknown(command) => {
                self.warn(&format!("Unknown command :{}. {}", command, HELP));
            }
        }
        Ok(true)
    }

    async fn ensure_unlocked(&self) -> anyhow::Result<()> {
        if self.note.cache().is_unlocked() {
            return Ok(());
        }
        self.info("Note is locked.");
        unlock_note(self.ctx, &self.note, self.preset, self.no_input).await
    }

    /// Flush on the way out, unlocking once more if edits are held.
    async fn finish(&self) -> anyhow::Result<()> {
        if !self.note.has_pending_changes() {
            return Ok(());
        }
        self.ensure_unlocked().await?;
        let outcome = self.note.flush().await.map_err(from_core)?;
        self.report_outcome(outcome);
        if outcome == PersistOutcome::Locked {
            return Err(anyhow::anyhow!("Note is locked; unsaved lines were lost"));
        }
        Ok(())
    }

    fn report_outcome(&self, outcome: PersistOutcome) {
        match outcome {
            PersistOutcome::Persisted => self.ok("Saved"),
            PersistOutcome::Unchanged => self.info("Nothing to save"),
            PersistOutcome::Locked => self.warn("Note is locked; changes held"),
        }
    }

    fn report_event(&self, event: &PersistEvent) {
        match event {
            PersistEvent::Persisted => self.ok("Saved"),
            PersistEvent::Locked => {
                self.warn("Note locked before saving; changes held until you unlock")
            }
            PersistEvent::Failed(message) => self.warn(&format!("Save failed: {}", message)),
        }
    }

    fn print_status(&self) {
        let lock = match self.note.cache().status() {
            CacheStatus::Empty => "locked".to_string(),
            CacheStatus::Active {
                expires_in: Some(left),
            } => format!("unlocked, {}s left", left.as_secs()),
            CacheStatus::Active { expires_in: None } => "unlocked".to_string(),
        };
        let changes = if self.note.is_busy() {
            "saving"
        } else if self.note.has_pending_changes() {
            "unsaved changes"
        } else {
            "saved"
        };
        self.info(&format!("{}; {}", lock, changes));
    }

    fn ok(&self, message: &str) {
        if !self.ctx.quiet() {
            eprintln!("{}", badge(self.ctx.ui(), Badge::Ok, message));
        }
    }

    fn info(&self, message: &str) {
        if !self.ctx.quiet() {
            eprintln!("{}", badge(self.ctx.ui(), Badge::Info, message));
        }
    }

    fn warn(&self, message: &str) {
        eprintln!("{}", badge(self.ctx.ui(), Badge::Warn, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(SessionInput::parse(":quit"), SessionInput::Quit);
        assert_eq!(SessionInput::parse(":q"), SessionInput::Quit);
        assert_eq!(SessionInput::parse(":flush"), SessionInput::Flush);
        assert_eq!(SessionInput::parse(":lock"), SessionInput::Lock);
        assert_eq!(SessionInput::parse(":status "), SessionInput::Status);
        assert_eq!(SessionInput::parse(":nope"), SessionInput::Unknown("nope"));
    }

    #[test]
    fn test_parse_text_and_escape() {
        assert_eq!(SessionInput::parse("hello"), SessionInput::Text("hello"));
        assert_eq!(SessionInput::parse("::) smile"), SessionInput::Text(":) smile"));
        assert_eq!(SessionInput::parse(""), SessionInput::Text(""));
    }

    #[test]
    fn test_append_line() {
        assert_eq!(append_line("", "one"), "one\n");
        assert_eq!(append_line("one\n", "two"), "one\ntwo\n");
        assert_eq!(append_line("no newline", "two"), "no newline\ntwo\n");
    }
}
