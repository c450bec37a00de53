//! External editor round trip.

use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use zeroize::Zeroizing;

/// Open `initial` in the user's editor and return the saved text.
///
/// `preferred` (from config) wins over `$VISUAL` and `$EDITOR`. The
/// plaintext lives in an owner-only temp file only while the editor runs.
pub fn edit_text(preferred: Option<&str>, initial: &str) -> anyhow::Result<Zeroizing<String>> {
    let editor = resolve_editor(preferred).ok_or_else(|| {
        anyhow::anyhow!("No editor configured; set $EDITOR or ui.editor in the config")
    })?;
    let mut parts = editor.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| anyhow::anyhow!("Editor command is empty"))?;

    let path = temp_note_path()?;
    cipherpad_core::fs::write_atomic(&path, initial.as_bytes())
        .map_err(|e| anyhow::anyhow!("Failed to create temp file: {}", e))?;
    let _guard = RemoveOnDrop(path.clone());

    let status = Command::new(program)
        .args(parts)
        .arg(&path)
        .status()
        .map_err(|e| anyhow::anyhow!("Failed to launch editor: {}", e))?;
    if !status.success() {
        return Err(anyhow::anyhow!("Editor exited with failure"));
    }

    let contents = std::fs::read_to_string(&path)
        .map_err(|e| anyhow::anyhow!("Failed to read temp file: {}", e))?;
    Ok(Zeroizing::new(contents))
}

fn resolve_editor(preferred: Option<&str>) -> Option<String> {
    preferred
        .map(str::to_string)
        .or_else(|| std::env::var("VISUAL").ok())
        .or_else(|| std::env::var("EDITOR").ok())
        .filter(|value| !value.trim().is_empty())
}

fn temp_note_path() -> anyhow::Result<PathBuf> {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| anyhow::anyhow!("System time error: {}", e))?
        .as_nanos();
    let filename = format!("cipherpad_{}_{}.txt", std::process::id(), nanos);
    Ok(std::env::temp_dir().join(filename))
}

struct RemoveOnDrop(PathBuf);

impl Drop for RemoveOnDrop {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}
