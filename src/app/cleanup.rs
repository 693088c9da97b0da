use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::feed::SIDECAR_SUFFIX;

/// Extensions treated as downloaded episodes when tidying the working directory.
pub(crate) const AUDIO_EXTENSIONS: &[&str] = &["m4a", "mp3", "opus", "ogg", "aac", "flac", "wav"];

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct CleanupReport {
    pub(crate) removed_sidecars: Vec<PathBuf>,
    pub(crate) moved_audio: Vec<PathBuf>,
}

pub(crate) fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Deletes every sidecar in `work_dir` and moves every audio file into `library_dir`.
pub(crate) fn clean_work_dir(work_dir: &Path, library_dir: &Path) -> Result<CleanupReport> {
    let mut report = CleanupReport::default();
    let mut audio = Vec::new();

    let entries =
        fs::read_dir(work_dir).with_context(|| format!("failed to list {}", work_dir.display()))?;
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to list {}", work_dir.display()))?
            .path();
        if !path.is_file() {
            continue;
        }
        let is_sidecar = path
            .file_name()
            .map(|name| name.to_string_lossy().ends_with(SIDECAR_SUFFIX))
            .unwrap_or(false);
        if is_sidecar {
            fs::remove_file(&path)
                .with_context(|| format!("failed to remove {}", path.display()))?;
            debug!(path = %path.display(), "removed sidecar");
            report.removed_sidecars.push(path);
        } else if is_audio_file(&path) {
            audio.push(path);
        }
    }

    if audio.is_empty() {
        return Ok(report);
    }

    fs::create_dir_all(library_dir)
        .with_context(|| format!("failed to create library directory {}", library_dir.display()))?;
    for source in audio {
        let Some(name) = source.file_name() else {
            continue;
        };
        let target = library_dir.join(name);
        move_file(&source, &target)?;
        info!(from = %source.display(), to = %target.display(), "moved audio");
        report.moved_audio.push(target);
    }

    Ok(report)
}

/// Renames `source` to `target`, copying across filesystems when a rename is not possible.
pub(crate) fn move_file(source: &Path, target: &Path) -> Result<()> {
    match fs::rename(source, target) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Err(err)
            .with_context(|| format!("failed to move {}", source.display())),
        Err(_) => {
            fs::copy(source, target).with_context(|| {
                format!("failed to copy {} to {}", source.display(), target.display())
            })?;
            fs::remove_file(source)
                .with_context(|| format!("failed to remove {}", source.display()))
        }
    }
}
