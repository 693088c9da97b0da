use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rss::extension::itunes::{ITunesChannelExtension, ITunesItemExtension};
use rss::{Channel, Enclosure, Guid, Item};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;

pub(crate) const SIDECAR_SUFFIX: &str = ".info.json";
const DEFAULT_AUDIO_EXT: &str = "m4a";

/// The fields of a downloader sidecar that end up in the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EpisodeMetadata {
    pub(crate) id: String,
    pub(crate) title: Option<String>,
    pub(crate) description: String,
    pub(crate) upload_date: Option<String>,
    pub(crate) uploader: Option<String>,
    pub(crate) duration: Option<u64>,
    pub(crate) ext: String,
}

impl EpisodeMetadata {
    /// Reads a sidecar object permissively; only `id` is mandatory.
    pub(crate) fn from_value(value: &Value) -> Option<Self> {
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
        let id = text("id").filter(|id| !id.trim().is_empty())?;
        Some(Self {
            id,
            title: text("title"),
            description: text("description").unwrap_or_default(),
            upload_date: text("upload_date"),
            uploader: text("uploader").filter(|uploader| !uploader.is_empty()),
            duration: value.get("duration").and_then(parse_duration),
            ext: text("ext")
                .filter(|ext| !ext.is_empty())
                .unwrap_or_else(|| DEFAULT_AUDIO_EXT.to_string()),
        })
    }
}

fn parse_duration(value: &Value) -> Option<u64> {
    let seconds = match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|secs| *secs >= 1.0).map(|secs| secs as u64)),
        _ => None,
    }?;
    (seconds > 0).then_some(seconds)
}

/// Sidecars that did not produce an item, and why.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct AppendReport {
    pub(crate) appended: Vec<String>,
    pub(crate) missing_audio: Vec<String>,
    pub(crate) unreadable: Vec<String>,
}

impl AppendReport {
    pub(crate) fn updated(&self) -> bool {
        !self.appended.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FeedOrigin {
    Fresh,
    Existing,
}

#[derive(Debug, Clone)]
pub(crate) struct FeedDocument {
    channel: Channel,
    guids: HashSet<String>,
}

impl FeedDocument {
    pub(crate) fn fresh(config: &Config) -> Self {
        let mut itunes = ITunesChannelExtension::default();
        itunes.set_author(config.channel.author.clone());
        itunes.set_image(config.cover_url());

        let mut channel = Channel::default();
        channel.set_title(config.channel.title.clone());
        channel.set_link(config.base_url.clone());
        channel.set_description(config.channel.description.clone());
        channel.set_language(config.channel.language.clone());
        channel.set_itunes_ext(itunes);

        Self {
            channel,
            guids: HashSet::new(),
        }
    }

    pub(crate) fn parse(raw: &str) -> Result<Self> {
        let channel = raw
            .parse::<Channel>()
            .map_err(|err| anyhow!("failed to parse feed document: {err}"))?;
        let guids = channel
            .items()
            .iter()
            .filter_map(Item::guid)
            .map(|guid| guid.value().to_string())
            .collect();
        Ok(Self { channel, guids })
    }

    #[cfg(test)]
    pub(crate) fn channel(&self) -> &Channel {
        &self.channel
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.guids.contains(id)
    }

    #[cfg(test)]
    pub(crate) fn item_guids(&self) -> Vec<String> {
        self.channel
            .items()
            .iter()
            .filter_map(Item::guid)
            .map(|guid| guid.value().to_string())
            .collect()
    }

    /// Appends one episode unless its id is already in the document.
    pub(crate) fn append_episode(
        &mut self,
        meta: &EpisodeMetadata,
        audio_file_name: &str,
        byte_len: u64,
        config: &Config,
        now: DateTime<Utc>,
    ) -> bool {
        if !self.guids.insert(meta.id.clone()) {
            return false;
        }

        let mut guid = Guid::default();
        guid.set_value(meta.id.clone());
        guid.set_permalink(false);

        let mut enclosure = Enclosure::default();
        enclosure.set_url(enclosure_url(&config.base_url, audio_file_name));
        enclosure.set_length(byte_len.to_string());
        enclosure.set_mime_type(mime_type_for(&meta.ext));

        let mut itunes = ITunesItemExtension::default();
        itunes.set_author(
            meta.uploader
                .clone()
                .unwrap_or_else(|| config.channel.author.clone()),
        );
        itunes.set_duration(meta.duration.map(|secs| secs.to_string()));
        itunes.set_image(config.cover_url());

        let mut item = Item::default();
        item.set_title(meta.title.clone());
        item.set_guid(guid);
        item.set_description(meta.description.clone());
        item.set_pub_date(format_pub_date(meta.upload_date.as_deref(), now));
        item.set_enclosure(enclosure);
        item.set_itunes_ext(itunes);

        self.channel.items.push(item);
        true
    }

    /// Adds an item for every sidecar in `work_dir` whose id is not yet published.
    pub(crate) fn append_new_episodes(
        &mut self,
        work_dir: &Path,
        config: &Config,
        now: DateTime<Utc>,
    ) -> Result<AppendReport> {
        let mut report = AppendReport::default();

        for sidecar in collect_sidecars(work_dir)? {
            let sidecar_name = file_name_lossy(&sidecar);
            let meta = match read_sidecar(&sidecar) {
                Ok(meta) => meta,
                Err(err) => {
                    warn!(sidecar = %sidecar.display(), "skipping sidecar: {err:#}");
                    eprintln!("Warning: skipping {sidecar_name}: {err:#}");
                    report.unreadable.push(sidecar_name);
                    continue;
                }
            };
            if self.contains(&meta.id) {
                debug!(id = %meta.id, "already published");
                continue;
            }

            println!(
                "[+] New episode: {}",
                meta.title.as_deref().unwrap_or(meta.id.as_str())
            );
            let Some(audio_file_name) = audio_file_name_for(&sidecar_name, &meta.ext) else {
                continue;
            };
            let audio_path = work_dir.join(&audio_file_name);
            if !audio_path.is_file() {
                println!("[!] Audio file not found: {audio_file_name}");
                report.missing_audio.push(audio_file_name);
                continue;
            }

            let byte_len = fs::metadata(&audio_path)
                .with_context(|| format!("failed to stat {}", audio_path.display()))?
                .len();
            if self.append_episode(&meta, &audio_file_name, byte_len, config, now) {
                report.appended.push(meta.id);
            }
        }

        Ok(report)
    }

    /// Pretty-printed document with blank lines removed.
    pub(crate) fn render(&self) -> Result<String> {
        let bytes = self
            .channel
            .pretty_write_to(Vec::new(), b' ', 2)
            .map_err(|err| anyhow!("failed to serialize feed document: {err}"))?;
        let text = String::from_utf8(bytes).context("feed document is not valid UTF-8")?;
        Ok(strip_blank_lines(&text))
    }
}

pub(crate) fn strip_blank_lines(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn collect_sidecars(work_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(work_dir)
        .with_context(|| format!("failed to list {}", work_dir.display()))?;
    let mut sidecars = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to list {}", work_dir.display()))?;
        let path = entry.path();
        if path.is_file() && file_name_lossy(&path).ends_with(SIDECAR_SUFFIX) {
            sidecars.push(path);
        }
    }
    sidecars.sort();
    Ok(sidecars)
}

fn read_sidecar(path: &Path) -> Result<EpisodeMetadata> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("invalid JSON in {}", path.display()))?;
    EpisodeMetadata::from_value(&value).context("sidecar has no `id` field")
}

fn file_name_lossy(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub(crate) fn audio_file_name_for(sidecar_name: &str, ext: &str) -> Option<String> {
    sidecar_name
        .strip_suffix(SIDECAR_SUFFIX)
        .map(|stem| format!("{stem}.{ext}"))
}

pub(crate) fn enclosure_url(base_url: &str, file_name: &str) -> String {
    format!("{base_url}/{}", urlencoding::encode(file_name))
}

pub(crate) fn mime_type_for(ext: &str) -> String {
    match ext {
        "m4a" => "audio/mp4".to_string(),
        other => format!("audio/{other}"),
    }
}

pub(crate) fn parse_upload_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y%m%d").ok()
}

/// RFC 2822 date for an 8-digit `YYYYMMDD` upload date, or for `now` when it is unusable.
pub(crate) fn format_pub_date(upload_date: Option<&str>, now: DateTime<Utc>) -> String {
    upload_date
        .and_then(parse_upload_date)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or(now)
        .to_rfc2822()
}
