//! `cipherpad status`: note and unlock settings, without unlocking.

use cipherpad_core::{BlobStore, Engine, Label};

use crate::app::AppContext;
use crate::config::UnlockMethod;
use crate::errors::from_core;
use crate::ui::kv_table;

pub fn handle_status(ctx: &AppContext<'_>) -> anyhow::Result<()> {
    let settings = ctx.settings();
    let store = ctx.store();
    let blob = store.get().map_err(from_core)?;

    let protection = match blob.as_deref().map(Engine::peek_label) {
        None => "-".to_string(),
        Some(None) => "unreadable header".to_string(),
        Some(Some(label)) => describe_label(&label),
    };
    let configured = match settings.security.unlock {
        UnlockMethod::Passphrase => "passphrase",
        UnlockMethod::Keychain => "keychain",
    };
    let config = if ctx.config().is_some() {
        ctx.config_path().display().to_string()
    } else {
        format!("{} (not created)", ctx.config_path().display())
    };

    let rows = [
        ("Note", ctx.note_path().display().to_string()),
        ("Exists", if blob.is_some() { "yes" } else { "no" }.to_string()),
        ("Protection", protection),
        ("Unlock method", configured.to_string()),
        ("Timeout", settings.timeout_preset().description.to_string()),
        (
            "Save after",
            format!("{} ms idle", settings.persist.quiet_period_ms),
        ),
        ("Config", config),
    ];

    if ctx.quiet() {
        for (key, value) in rows.iter() {
            println!("{}: {}", key.to_lowercase(), value);
        }
    } else {
        println!("{}", kv_table(ctx.ui(), &rows));
    }
    Ok(())
}

fn describe_label(label: &Label) -> String {
    match label {
        Label::Passphrase { digest } => format!("passphrase ({})", digest),
        Label::Biometric { created_at } => {
            format!("keychain secret (created {})", created_at.format("%Y-%m-%d %H:%M UTC"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use cipherpad_core::DigestAlgorithm;

    #[test]
    fn test_describe_labels() {
        let pass = Label::Passphrase {
            digest: DigestAlgorithm::Sha512,
        };
        assert_eq!(describe_label(&pass), "passphrase (SHA_512)");

        let created = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).single().expect("date");
        assert_eq!(
            describe_label(&Label::biometric(created)),
            "keychain secret (created 2024-03-01 09:30 UTC)"
        );
    }
}
