//! `cipherpad init`: create the encrypted note and its config.

use chrono::Utc;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;

use cipherpad_core::{BlobStore, KeyMaterial, PersistOutcome, SecretInput, TtlPreset};

use crate::app::{unlock_ttl, AppContext};
use crate::cli::InitArgs;
use crate::config::{default_timeout, write_config, CipherpadConfig, UnlockMethod};
use crate::errors::{from_core, CliError};
use crate::helpers::{parse_timeout, prompt_new_passphrase};
use crate::security::{generate_key_bytes, keychain_clear, keychain_store_secret, note_account};
use crate::ui::{badge, Badge, Spinner};

pub async fn handle_init(ctx: &AppContext<'_>, args: &InitArgs) -> anyhow::Result<()> {
    let interactive = ctx.ui().interactive && !args.no_input;
    let note_path = ctx.note_path().to_path_buf();
    let note = ctx.open_note()?;

    if note.store().exists().map_err(from_core)? {
        return Err(CliError::invalid_input(format!(
            "A note already exists at {}",
            note_path.display()
        ))
        .into());
    }

    let method = if args.keychain {
        UnlockMethod::Keychain
    } else if interactive && !ctx.ui().quiet {
        choose_method()?
    } else {
        UnlockMethod::Passphrase
    };
    let timeout = match args.timeout.as_deref() {
        Some(value) => parse_timeout(value)?,
        None if interactive && !ctx.ui().quiet => choose_timeout()?,
        None => default_timeout(),
    };

    let engine = ctx.engine()?;
    let key: KeyMaterial = match method {
        UnlockMethod::Passphrase => {
            let passphrase = prompt_new_passphrase(interactive)?;
            engine
                .derive(SecretInput::passphrase(passphrase.as_str()))
                .map_err(from_core)?
        }
        UnlockMethod::Keychain => {
            let secret = generate_key_bytes()?;
            let account = note_account(&note_path);
            keychain_store_secret(&account, &secret)?;
            engine
                .derive(SecretInput::biometric(Utc::now(), secret.to_vec()))
                .map_err(from_core)?
        }
    };

    let spinner = Spinner::start(ctx.ui(), "Creating note");
    let created = async {
        note.unlock(key, unlock_ttl(timeout)).await?;
        note.flush().await
    }
    .await;
    spinner.finish();

    match created {
        Ok(PersistOutcome::Persisted) => {}
        Ok(outcome) => {
            return Err(anyhow::anyhow!("Note was not written ({:?})", outcome));
        }
        Err(err) => {
            if method == UnlockMethod::Keychain {
                let _ = keychain_clear(&note_account(&note_path));
            }
            return Err(from_core(err));
        }
    }

    let mut config = ctx
        .config()
        .cloned()
        .unwrap_or_else(|| CipherpadConfig::new(note_path.clone(), method, timeout.ttl));
    config.note.path = note_path.to_string_lossy().to_string();
    config.security.unlock = method;
    config.remember_timeout(timeout);
    if let Some(editor) = args.editor.as_ref() {
        config.ui.editor = Some(editor.clone());
    }
    write_config(ctx.config_path(), &config)?;

    if !ctx.quiet() {
        println!(
            "{}",
            badge(
                ctx.ui(),
                Badge::Ok,
                &format!("Initialized new note at {}", note_path.display())
            )
        );
        println!(
            "{}",
            badge(
                ctx.ui(),
                Badge::Info,
                &format!("Config written to {}", ctx.config_path().display())
            )
        );
    }
    Ok(())
}

fn choose_method() -> anyhow::Result<UnlockMethod> {
    let items = ["Passphrase", "OS keychain (no passphrase)"];
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Protect the note with")
        .items(&items)
        .default(0)
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to read selection: {}", e))?;
    Ok(if selection == 1 {
        UnlockMethod::Keychain
    } else {
        UnlockMethod::Passphrase
    })
}

fn choose_timeout() -> anyhow::Result<&'static TtlPreset> {
    let presets = TtlPreset::all();
    let items: Vec<&str> = presets.iter().map(|p| p.description).collect();
    let default_index = presets
        .iter()
        .position(|p| p == default_timeout())
        .unwrap_or(0);
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Stay unlocked for")
        .items(&items)
        .default(default_index)
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to read selection: {}", e))?;
    Ok(&presets[selection])
}
