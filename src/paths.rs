use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub fn default_library_dir() -> Result<PathBuf> {
    let music = dirs::audio_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Music")))
        .context("unable to resolve music directory")?;
    Ok(music.join("Podcast"))
}

pub fn default_history_file(work_dir: &Path) -> PathBuf {
    work_dir.join("history.txt")
}

/// Expands a leading `~/` against the home directory; other paths are returned as-is.
pub fn expand_home(raw: &str) -> PathBuf {
    match raw.strip_prefix("~/") {
        Some(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => PathBuf::from(raw),
        },
        None => PathBuf::from(raw),
    }
}
