//! Composition root for the Cipherpad CLI.
//!
//! [`AppContext`] loads the config once per invocation and builds the
//! engine, the process-wide [`SecretCache`] and the note controller from it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cipherpad_core::storage::FileBlobStore;
use cipherpad_core::{BlobStore, Engine, NoteController, SecretCache, TtlPreset};

use crate::cli::{Cli, UnlockArgs};
use crate::config::{
    default_config_path, default_timeout, read_config, write_config, CipherpadConfig,
    UnlockMethod,
};
use crate::errors::from_core;
use crate::helpers::parse_timeout;
use crate::ui::UiContext;

use super::resolver::{missing_note_error, resolve_note_path};

/// The controller type every command drives.
pub type Note = NoteController<FileBlobStore>;

/// Application context that bundles CLI args with the loaded configuration.
pub struct AppContext<'a> {
    cli: &'a Cli,
    ui: UiContext,
    config_path: PathBuf,
    config: Option<CipherpadConfig>,
    note_path: PathBuf,
}

impl<'a> AppContext<'a> {
    pub fn load(cli: &'a Cli, ui: UiContext) -> anyhow::Result<Self> {
        let config_path = default_config_path()?;
        let config = if config_path.exists() {
            Some(read_config(&config_path)?)
        } else {
            None
        };
        let note_path = resolve_note_path(cli, config.as_ref())?;
        tracing::debug!(
            config = %config_path.display(),
            note = %note_path.display(),
            "paths resolved"
        );
        Ok(Self {
            cli,
            ui,
            config_path,
            config,
            note_path,
        })
    }

    pub fn ui(&self) -> &UiContext {
        &self.ui
    }

    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// The loaded config, if a config file exists.
    pub fn config(&self) -> Option<&CipherpadConfig> {
        self.config.as_ref()
    }

    pub fn note_path(&self) -> &Path {
        &self.note_path
    }

    /// Config to use for settings; defaults when no file exists.
    pub fn settings(&self) -> CipherpadConfig {
        self.config.clone().unwrap_or_else(|| {
            CipherpadConfig::new(
                self.note_path.clone(),
                UnlockMethod::Passphrase,
                default_timeout().ttl,
            )
        })
    }

    pub fn editor(&self) -> Option<&str> {
        self.config.as_ref().and_then(|c| c.ui.editor.as_deref())
    }

    pub fn engine(&self) -> anyhow::Result<Engine> {
        Engine::new(self.settings().kdf_params()).map_err(from_core)
    }

    pub fn store(&self) -> FileBlobStore {
        FileBlobStore::new(self.note_path.clone())
    }

    /// Build the cache and controller for this process.
    pub fn open_note(&self) -> anyhow::Result<Note> {
        let cache = SecretCache::new().map_err(from_core)?;
        self.note_with_cache(cache)
    }

    pub fn note_with_cache(&self, cache: Arc<SecretCache>) -> anyhow::Result<Note> {
        NoteController::new(
            self.store(),
            self.engine()?,
            cache,
            self.settings().quiet_period(),
        )
        .map_err(from_core)
    }

    /// Like [`AppContext::open_note`] but fails if there is no note yet.
    pub fn open_existing_note(&self) -> anyhow::Result<Note> {
        let note = self.open_note()?;
        if !note.store().exists().map_err(from_core)? {
            return Err(missing_note_error(&self.note_path).into());
        }
        Ok(note)
    }

    /// The unlock timeout for this run: `--timeout` if given, else the
    /// remembered one. A new choice is written back to the config.
    pub fn timeout(&mut self, args: &UnlockArgs) -> anyhow::Result<&'static TtlPreset> {
        let Some(value) = args.timeout.as_deref() else {
            return Ok(self.settings().timeout_preset());
        };
        let preset = parse_timeout(value)?;
        self.remember_timeout(preset)?;
        Ok(preset)
    }

    fn remember_timeout(&mut self, preset: &TtlPreset) -> anyhow::Result<()> {
        let Some(config) = self.config.as_mut() else {
            tracing::debug!("no config file; timeout not remembered");
            return Ok(());
        };
        if config.timeout_preset() == preset {
            return Ok(());
        }
        config.remember_timeout(preset);
        write_config(&self.config_path, config)
    }
}
