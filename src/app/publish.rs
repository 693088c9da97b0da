use std::fs;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::cleanup::{AUDIO_EXTENSIONS, CleanupReport, clean_work_dir};
use super::feed::{AppendReport, FeedDocument, FeedOrigin, SIDECAR_SUFFIX};
use super::tools::{MirrorFiles, PullFile, PushFile};
use crate::config::Config;

const SIDECAR_REMOTE_DIR: &str = "json";

#[derive(Debug, Clone)]
pub(crate) struct PublishReport {
    pub(crate) origin: FeedOrigin,
    pub(crate) append: AppendReport,
    pub(crate) mirrored: bool,
    /// `None` when nothing was appended and the remote feed was left alone.
    pub(crate) pushed: Option<bool>,
    /// `None` when cleanup was withheld because a remote step failed.
    pub(crate) cleanup: Option<CleanupReport>,
}

pub(crate) fn audio_include_glob() -> String {
    format!("*.{{{}}}", AUDIO_EXTENSIONS.join(","))
}

/// Copies sidecars and audio files to the bucket so enclosure URLs resolve.
pub(crate) fn mirror_artifacts(remote: &impl MirrorFiles, config: &Config) -> bool {
    let include_sidecars = format!("*{SIDECAR_SUFFIX}");
    let sidecars = remote.mirror(&config.work_dir, Some(SIDECAR_REMOTE_DIR), &include_sidecars);
    if !sidecars.success {
        eprintln!("Warning: failed to upload metadata files: {}", sidecars.output);
    }
    let audio = remote.mirror(&config.work_dir, None, &audio_include_glob());
    if !audio.success {
        eprintln!("Warning: failed to upload audio files: {}", audio.output);
    }
    sidecars.success && audio.success
}

/// Retrieves the published feed, falling back to a freshly synthesized one.
pub(crate) fn load_feed(remote: &impl PullFile, config: &Config) -> (FeedDocument, FeedOrigin) {
    println!("[*] Downloading {} from remote storage...", config.feed_file);
    let local = config.local_feed_path();
    let outcome = remote.pull(&config.feed_file, &local);
    if !outcome.success {
        debug!(detail = %outcome.output, "feed pull failed, starting a fresh document");
        return (FeedDocument::fresh(config), FeedOrigin::Fresh);
    }

    match fs::read_to_string(&local) {
        Ok(raw) => match FeedDocument::parse(&raw) {
            Ok(feed) => (feed, FeedOrigin::Existing),
            Err(err) => {
                warn!("{err:#}; starting a fresh document");
                (FeedDocument::fresh(config), FeedOrigin::Fresh)
            }
        },
        Err(err) => {
            debug!(path = %local.display(), "pulled feed unreadable ({err}), starting a fresh document");
            (FeedDocument::fresh(config), FeedOrigin::Fresh)
        }
    }
}

pub(crate) fn run_publish_job<T>(remote: &T, config: &Config, now: DateTime<Utc>) -> Result<PublishReport>
where
    T: PullFile + PushFile + MirrorFiles,
{
    let mirrored = mirror_artifacts(remote, config);
    let (mut feed, origin) = load_feed(remote, config);
    let append = feed.append_new_episodes(&config.work_dir, config, now)?;

    let pushed = if append.updated() {
        let local = config.local_feed_path();
        let rendered = feed.render()?;
        fs::write(&local, rendered)
            .with_context(|| format!("failed to write feed document to {}", local.display()))?;

        println!("[*] Uploading updated {} to remote storage...", config.feed_file);
        let outcome = remote.push(&local, &config.feed_file);
        if outcome.success {
            println!("[√] Published {} new episode(s).", append.appended.len());
        } else {
            println!("[×] Upload failed: {}", outcome.output);
        }
        Some(outcome.success)
    } else {
        println!("[~] No new content, nothing to update.");
        None
    };

    let cleanup = if mirrored && pushed != Some(false) {
        Some(clean_work_dir(&config.work_dir, &config.library_dir)?)
    } else {
        println!("[!] Remote storage is not up to date; keeping local files for the next run.");
        None
    };

    println!("RSS Link: {}", config.feed_url());

    Ok(PublishReport {
        origin,
        append,
        mirrored,
        pushed,
        cleanup,
    })
}
