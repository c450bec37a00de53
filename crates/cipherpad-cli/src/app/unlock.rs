//! Unlocking an existing note.
//!
//! The label in the stored blob decides the flow: keychain-protected notes
//! read their platform secret, everything else asks for a passphrase. The
//! key is only cached once it has opened the stored note.

use std::time::Duration;

use chrono::{DateTime, Utc};
use cipherpad_core::{BlobStore, CipherpadError, Engine, KeyMaterial, Label, SecretInput, TtlPreset};

use crate::constants::{MAX_INTERACTIVE_ATTEMPTS, MIN_UNLOCK_HOLD};
use crate::errors::{from_core, CliError};
use crate::helpers::{env_passphrase, prompt_passphrase};
use crate::security::{keychain_load_secret, note_account};
use crate::ui::{badge, Badge, Spinner};

use super::context::{AppContext, Note};
use super::resolver::missing_note_error;

/// How long the key stays cached for `preset`.
pub fn unlock_ttl(preset: &TtlPreset) -> Duration {
    preset.ttl.max(MIN_UNLOCK_HOLD)
}

/// Unlock `note` and cache its key for the preset's duration.
pub async fn unlock_note(
    ctx: &AppContext<'_>,
    note: &Note,
    preset: &TtlPreset,
    no_input: bool,
) -> anyhow::Result<()> {
    let blob = note
        .store()
        .get()
        .map_err(from_core)?
        .ok_or_else(|| missing_note_error(ctx.note_path()))?;
    let label = Engine::peek_label(&blob).unwrap_or_default();
    let ttl = unlock_ttl(preset);
    tracing::debug!(label = %label, ttl_ms = ttl.as_millis() as u64, "unlocking note");

    match label {
        Label::Biometric { created_at } => unlock_with_keychain(ctx, note, created_at, ttl).await,
        Label::Passphrase { .. } => unlock_with_passphrase(ctx, note, ttl, no_input).await,
    }
}

async fn unlock_with_keychain(
    ctx: &AppContext<'_>,
    note: &Note,
    created_at: DateTime<Utc>,
    ttl: Duration,
) -> anyhow::Result<()> {
    let account = note_account(ctx.note_path());
    let secret = keychain_load_secret(&account)?.ok_or_else(|| {
        CliError::auth_failed_with_hint(
            "No keychain secret found for this note.",
            "The keychain entry was removed or the note was created on another machine.",
        )
    })?;
    let key = ctx
        .engine()?
        .derive(SecretInput::biometric(created_at, secret.to_vec()))
        .map_err(from_core)?;

    match try_unlock(ctx, note, key, ttl).await {
        Ok(()) => Ok(()),
        Err(err) if err.is_authentication_failure() => {
            Err(CliError::auth_failed("Keychain secret does not open this note.").into())
        }
        Err(err) => Err(from_core(err)),
    }
}

async fn unlock_with_passphrase(
    ctx: &AppContext<'_>,
    note: &Note,
    ttl: Duration,
    no_input: bool,
) -> anyhow::Result<()> {
    let engine = ctx.engine()?;

    if let Some(passphrase) = env_passphrase() {
        let key = engine
            .derive(SecretInput::passphrase(passphrase.as_str()))
            .map_err(from_core)?;
        return try_unlock(ctx, note, key, ttl).await.map_err(from_core);
    }

    let interactive = ctx.ui().interactive && !no_input;
    let max_attempts = if interactive {
        MAX_INTERACTIVE_ATTEMPTS
    } else {
        1
    };
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        let passphrase = prompt_passphrase(interactive)?;
        let result = match engine.derive(SecretInput::passphrase(passphrase.as_str())) {
            Ok(key) => try_unlock(ctx, note, key, ttl).await,
            Err(err) => Err(err),
        };

        let message = match result {
            Ok(()) => return Ok(()),
            Err(CipherpadError::AuthenticationFailure) => "Incorrect passphrase.",
            Err(CipherpadError::InvalidInput(_)) => "Passphrase cannot be blank.",
            Err(err) => return Err(from_core(err)),
        };

        let remaining = max_attempts.saturating_sub(attempts);
        if remaining == 0 {
            if max_attempts > 1 {
                return Err(
                    CliError::auth_failed_with_hint(message, "Too many failed attempts.").into(),
                );
            }
            return Err(CliError::auth_failed(message).into());
        }
        eprintln!(
            "{}",
            badge(
                ctx.ui(),
                Badge::Warn,
                &format!("{} {} attempt(s) remaining.", message, remaining)
            )
        );
    }
}

async fn try_unlock(
    ctx: &AppContext<'_>,
    note: &Note,
    key: KeyMaterial,
    ttl: Duration,
) -> cipherpad_core::Result<()> {
    let spinner = Spinner::start(ctx.ui(), "Unlocking");
    let result = note.unlock(key, ttl).await;
    spinner.finish();
    result
}
