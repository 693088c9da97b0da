use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::paths::{default_history_file, default_library_dir, expand_home};

const DEFAULT_PLAYLIST_URL: &str = "https://www.youtube.com/playlist?list=WL";
const DEFAULT_PROXY: &str = "192.168.31.233:7890";
const DEFAULT_COOKIES_FROM: &str = "safari";
const DEFAULT_REMOTE: &str = "linpod:linpod";
const DEFAULT_BASE_URL: &str = "https://linpod.lllincx.cn";
const DEFAULT_FEED_FILE: &str = "podcast.xml";
const DEFAULT_COVER_NAME: &str = "linpod.jpg";

/// Channel-level fields written when no previous feed can be retrieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub title: String,
    pub description: String,
    pub language: String,
    pub author: String,
}

impl Default for ChannelInfo {
    fn default() -> Self {
        Self {
            title: "LinPod".to_string(),
            description: "Podcast by Chauncey".to_string(),
            language: "zh-cn".to_string(),
            author: "Chauncey".to_string(),
        }
    }
}

/// Everything both jobs need to know about the outside world.
///
/// Built once in `app::run` and handed down by reference, so tests can
/// substitute any field without touching process state.
#[derive(Debug, Clone)]
pub struct Config {
    pub playlist_url: String,
    pub proxy: String,
    pub cookies_from_browser: String,
    pub ytdlp_bin: PathBuf,
    pub rclone_bin: PathBuf,
    /// `<remote-name>:<bucket>` as understood by rclone.
    pub remote: String,
    pub base_url: String,
    pub work_dir: PathBuf,
    pub history_file: PathBuf,
    pub feed_file: String,
    pub cover_name: String,
    pub library_dir: PathBuf,
    pub channel: ChannelInfo,
}

impl Config {
    pub fn from_env(work_dir: Option<PathBuf>) -> Result<Self> {
        let work_dir = match work_dir {
            Some(dir) => dir,
            None => env::current_dir().context("unable to resolve current directory")?,
        };
        Self::resolve(work_dir, |key| env::var_os(key))
    }

    pub fn resolve<F>(work_dir: PathBuf, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let var = |key: &str| -> Option<String> {
            lookup(key)
                .map(|value| value.to_string_lossy().trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let library_dir = match var("LINPOD_LIBRARY_DIR") {
            Some(raw) => expand_home(&raw),
            None => default_library_dir()?,
        };
        let history_file = match var("LINPOD_HISTORY_FILE") {
            Some(raw) => expand_home(&raw),
            None => default_history_file(&work_dir),
        };

        let defaults = ChannelInfo::default();
        let channel = ChannelInfo {
            title: var("LINPOD_TITLE").unwrap_or(defaults.title),
            description: var("LINPOD_DESCRIPTION").unwrap_or(defaults.description),
            language: var("LINPOD_LANGUAGE").unwrap_or(defaults.language),
            author: var("LINPOD_AUTHOR").unwrap_or(defaults.author),
        };

        Ok(Self {
            playlist_url: var("LINPOD_PLAYLIST_URL").unwrap_or_else(|| DEFAULT_PLAYLIST_URL.to_string()),
            proxy: var("LINPOD_PROXY").unwrap_or_else(|| DEFAULT_PROXY.to_string()),
            cookies_from_browser: var("LINPOD_COOKIES_FROM")
                .unwrap_or_else(|| DEFAULT_COOKIES_FROM.to_string()),
            ytdlp_bin: PathBuf::from(var("LINPOD_YTDLP_BIN").unwrap_or_else(|| "yt-dlp".to_string())),
            rclone_bin: PathBuf::from(var("LINPOD_RCLONE_BIN").unwrap_or_else(|| "rclone".to_string())),
            remote: var("LINPOD_REMOTE")
                .map(|remote| remote.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_REMOTE.to_string()),
            base_url: var("LINPOD_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            work_dir,
            history_file,
            feed_file: var("LINPOD_FEED_FILE").unwrap_or_else(|| DEFAULT_FEED_FILE.to_string()),
            cover_name: var("LINPOD_COVER").unwrap_or_else(|| DEFAULT_COVER_NAME.to_string()),
            library_dir,
            channel,
        })
    }

    pub fn cover_url(&self) -> String {
        format!("{}/{}", self.base_url, self.cover_name)
    }

    pub fn feed_url(&self) -> String {
        format!("{}/{}", self.base_url, self.feed_file)
    }

    pub fn local_feed_path(&self) -> PathBuf {
        self.work_dir.join(&self.feed_file)
    }
}
