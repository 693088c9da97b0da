use std::io::{BufRead, Write};

use anyhow::Result;
use tracing::{info, warn};

use super::history::HistoryStore;
use super::playlist::{PendingVideo, exclude_interactively, fetch_playlist, filter_pending};
use super::tools::{DownloadAudio, ListPlaylist};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct FetchReport {
    pub(crate) downloaded: Vec<String>,
    pub(crate) failed: Vec<String>,
}

pub(crate) fn run_fetch_job<L, D, R, W>(
    lister: &L,
    downloader: &D,
    history: &HistoryStore,
    input: &mut R,
    output: &mut W,
) -> Result<FetchReport>
where
    L: ListPlaylist,
    D: DownloadAudio,
    R: BufRead,
    W: Write,
{
    let videos = fetch_playlist(lister);
    let seen = history.load()?;
    let pending = filter_pending(videos, &seen);
    info!(pending = pending.len(), known = seen.len(), "playlist filtered against history");

    let selected = if pending.is_empty() {
        Vec::new()
    } else {
        exclude_interactively(pending, input, output)?
    };

    if selected.is_empty() {
        println!("No videos to download.");
        return Ok(FetchReport::default());
    }

    download_all(&selected, downloader, history)
}

/// Downloads each video in order; only successful downloads enter history.
pub(crate) fn download_all<D>(
    videos: &[PendingVideo],
    downloader: &D,
    history: &HistoryStore,
) -> Result<FetchReport>
where
    D: DownloadAudio,
{
    println!("\nPreparing to download {} audio file(s)...", videos.len());
    let mut report = FetchReport::default();
    for video in videos {
        println!("Downloading: {}", video.title);
        let outcome = downloader.download_audio(video);
        if outcome.success {
            history.record(&video.id)?;
            report.downloaded.push(video.id.clone());
        } else {
            warn!(id = %video.id, detail = %outcome.output, "download failed");
            eprintln!(
                "Warning: download failed for {} ({}): {}. It will be offered again next run.",
                video.title, video.id, outcome.output
            );
            report.failed.push(video.id.clone());
        }
    }
    Ok(report)
}
