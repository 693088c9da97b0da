use std::collections::HashSet;
use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use super::tools::ListPlaylist;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingVideo {
    pub(crate) title: String,
    pub(crate) id: String,
    pub(crate) url: String,
}

/// Outcome of reading one line at the exclusion prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ExclusionInput {
    Done,
    Exclude(Vec<usize>),
    Invalid,
}

pub(crate) fn parse_playlist_line(line: &str) -> Option<PendingVideo> {
    let line = line.trim_end_matches(['\r', '\n']);
    let mut parts = line.split('|');
    let title = parts.next()?;
    let id = parts.next()?;
    let url = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some(PendingVideo {
        title: title.to_string(),
        id: id.to_string(),
        url: url.to_string(),
    })
}

pub(crate) fn parse_playlist_output(raw: &str) -> Vec<PendingVideo> {
    raw.lines().filter_map(parse_playlist_line).collect()
}

/// Lists the playlist, printing the tool's complaint and yielding nothing on failure.
pub(crate) fn fetch_playlist(lister: &impl ListPlaylist) -> Vec<PendingVideo> {
    println!("Fetching watch-later playlist...");
    let outcome = lister.list_playlist();
    if !outcome.success {
        println!(
            "Failed to read the playlist; check the network and browser cookie access. Error: {}",
            outcome.output
        );
        return Vec::new();
    }
    parse_playlist_output(&outcome.output)
}

pub(crate) fn filter_pending(videos: Vec<PendingVideo>, history: &HashSet<String>) -> Vec<PendingVideo> {
    videos
        .into_iter()
        .filter(|video| !history.contains(&video.id))
        .collect()
}

pub(crate) fn parse_exclusion_input(line: &str) -> ExclusionInput {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ExclusionInput::Done;
    }
    let parsed = trimmed
        .split_whitespace()
        .map(str::parse::<usize>)
        .collect::<Result<Vec<_>, _>>();
    match parsed {
        Ok(indices) => ExclusionInput::Exclude(indices),
        Err(_) => ExclusionInput::Invalid,
    }
}

/// Drops the given positions of the current list; positions past the end are ignored.
pub(crate) fn exclude_indices(pending: Vec<PendingVideo>, indices: &[usize]) -> Vec<PendingVideo> {
    pending
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| !indices.contains(idx))
        .map(|(_, video)| video)
        .collect()
}

pub(crate) fn render_pending(pending: &[PendingVideo]) -> String {
    let mut out = String::from("\n--- Pending downloads ---\n");
    for (idx, video) in pending.iter().enumerate() {
        out.push_str(&format!("[{idx}] {} (ID: {})\n", video.title, video.id));
    }
    out
}

/// Lets the operator drop videos by position until an empty line is entered.
///
/// Positions always refer to the list as displayed in the current round, so
/// removing `1` twice from `[a, b, c]` drops `b` and then `c`. End of input
/// cancels the run and returns an empty list.
pub(crate) fn exclude_interactively<R, W>(
    mut pending: Vec<PendingVideo>,
    input: &mut R,
    output: &mut W,
) -> Result<Vec<PendingVideo>>
where
    R: BufRead,
    W: Write,
{
    loop {
        write!(output, "{}", render_pending(&pending)).context("failed to write pending list")?;
        write!(
            output,
            "\nEnter numbers to skip (space separated, press Enter to start downloading): "
        )
        .context("failed to write prompt")?;
        output.flush().context("failed to flush prompt")?;

        let mut line = String::new();
        let read = input.read_line(&mut line).context("failed to read selection")?;
        if read == 0 {
            writeln!(output, "\nInput closed; nothing will be downloaded.")
                .context("failed to write cancellation notice")?;
            return Ok(Vec::new());
        }

        match parse_exclusion_input(&line) {
            ExclusionInput::Done => return Ok(pending),
            ExclusionInput::Exclude(indices) => pending = exclude_indices(pending, &indices),
            ExclusionInput::Invalid => {
                writeln!(output, "Error: please enter valid numbers.")
                    .context("failed to write input error")?;
            }
        }
    }
}
