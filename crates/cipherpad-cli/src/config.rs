use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use cipherpad_core::persist::DEFAULT_QUIET_PERIOD;
use cipherpad_core::{KdfParams, TtlPreset};

use crate::constants::CONFIG_ENV;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CipherpadConfig {
    pub note: NoteSection,
    #[serde(default)]
    pub security: SecuritySection,
    #[serde(default)]
    pub persist: PersistSection,
    #[serde(default)]
    pub kdf: KdfSection,
    #[serde(default)]
    pub ui: UiSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteSection {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecuritySection {
    pub unlock: UnlockMethod,
    /// Last chosen unlock timeout.
    pub timeout_ms: u64,
}

impl Default for SecuritySection {
    fn default() -> Self {
        Self {
            unlock: UnlockMethod::Passphrase,
            timeout_ms: default_timeout().ttl.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockMethod {
    Passphrase,
    Keychain,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistSection {
    pub quiet_period_ms: u64,
}

impl Default for PersistSection {
    fn default() -> Self {
        Self {
            quiet_period_ms: DEFAULT_QUIET_PERIOD.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KdfSection {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfSection {
    fn default() -> Self {
        let params = KdfParams::default();
        Self {
            memory_kib: params.memory_kib,
            iterations: params.iterations,
            parallelism: params.parallelism,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UiSection {
    pub editor: Option<String>,
}

impl CipherpadConfig {
    pub fn new(note_path: PathBuf, unlock: UnlockMethod, timeout: Duration) -> Self {
        Self {
            note: NoteSection {
                path: note_path.to_string_lossy().to_string(),
            },
            security: SecuritySection {
                unlock,
                timeout_ms: timeout.as_millis() as u64,
            },
            persist: PersistSection::default(),
            kdf: KdfSection::default(),
            ui: UiSection::default(),
        }
    }

    pub fn kdf_params(&self) -> KdfParams {
        KdfParams::new(
            self.kdf.memory_kib,
            self.kdf.iterations,
            self.kdf.parallelism,
        )
    }

    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.persist.quiet_period_ms)
    }

    /// The remembered timeout, snapped to the nearest preset at or below it.
    pub fn timeout_preset(&self) -> &'static TtlPreset {
        TtlPreset::snap(Duration::from_millis(self.security.timeout_ms))
    }

    pub fn remember_timeout(&mut self, preset: &TtlPreset) {
        self.security.timeout_ms = preset.ttl.as_millis() as u64;
    }
}

/// Timeout used when nothing has been chosen yet.
pub fn default_timeout() -> &'static TtlPreset {
    TtlPreset::from_name("5m").unwrap_or(&TtlPreset::all()[0])
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var(CONFIG_ENV) {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn default_note_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join("note.cpad"))
}

pub fn read_config(path: &Path) -> anyhow::Result<CipherpadConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn write_config(path: &Path, config: &CipherpadConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create config directory {}: {}",
                parent.display(),
                e
            )
        })?;
    }
    let contents =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {}", e))?;
    std::fs::write(path, contents)
        .map_err(|e| anyhow::anyhow!("Failed to write config {}: {}", path.display(), e))?;
    Ok(())
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("cipherpad"));
        }
    }
    Ok(home_dir()?.join(".config").join("cipherpad"))
}

pub fn xdg_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("cipherpad"));
        }
    }
    Ok(home_dir()?.join(".local").join("share").join("cipherpad"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_sections_take_defaults() {
        let config: CipherpadConfig = toml::from_str(
            r#"
[note]
path = "/tmp/note.cpad"
"#,
        )
        .expect("parse");
        assert_eq!(config.security.unlock, UnlockMethod::Passphrase);
        assert_eq!(config.quiet_period(), DEFAULT_QUIET_PERIOD);
        assert_eq!(config.kdf_params(), KdfParams::default());
        assert_eq!(config.timeout_preset().name, "5m");
        assert!(config.ui.editor.is_none());
    }

    #[test]
    fn test_remembered_timeout_snaps_to_preset() {
        let mut config = CipherpadConfig::new(
            PathBuf::from("/tmp/note.cpad"),
            UnlockMethod::Keychain,
            Duration::from_secs(90),
        );
        assert_eq!(config.timeout_preset().name, "1m");

        let hour = TtlPreset::from_name("1h").expect("preset");
        config.remember_timeout(hour);
        assert_eq!(config.timeout_preset(), hour);
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");
        let mut config = CipherpadConfig::new(
            PathBuf::from("/tmp/note.cpad"),
            UnlockMethod::Keychain,
            Duration::from_secs(3600),
        );
        config.ui.editor = Some("vi".to_string());
        config.kdf.memory_kib = 8;
        write_config(&path, &config).expect("write");

        let loaded = read_config(&path).expect("read");
        assert_eq!(loaded.note.path, "/tmp/note.cpad");
        assert_eq!(loaded.security.unlock, UnlockMethod::Keychain);
        assert_eq!(loaded.security.timeout_ms, 3_600_000);
        assert_eq!(loaded.ui.editor.as_deref(), Some("vi"));
        assert_eq!(loaded.kdf.memory_kib, 8);
    }
}
