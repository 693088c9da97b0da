use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command as ProcessCommand, Stdio};

use tracing::debug;

use super::playlist::PendingVideo;
use crate::config::Config;

/// Result of one external tool invocation, reduced to what the jobs act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ToolOutcome {
    pub(crate) success: bool,
    /// Captured stdout on success, a failure description otherwise.
    pub(crate) output: String,
}

impl ToolOutcome {
    pub(crate) fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    pub(crate) fn failed(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }
}

pub(crate) trait ListPlaylist {
    fn list_playlist(&self) -> ToolOutcome;
}

pub(crate) trait DownloadAudio {
    fn download_audio(&self, video: &PendingVideo) -> ToolOutcome;
}

pub(crate) trait PullFile {
    fn pull(&self, remote_key: &str, local: &Path) -> ToolOutcome;
}

pub(crate) trait PushFile {
    fn push(&self, local: &Path, remote_key: &str) -> ToolOutcome;
}

/// Glob-filtered directory copy, used to publish sidecars and audio.
pub(crate) trait MirrorFiles {
    fn mirror(&self, local_dir: &Path, remote_subdir: Option<&str>, include: &str) -> ToolOutcome;
}

pub(crate) struct YtDlp {
    bin: PathBuf,
    playlist_url: String,
    proxy: String,
    cookies_from_browser: String,
    output_dir: PathBuf,
}

impl YtDlp {
    pub(crate) fn new(config: &Config) -> Self {
        Self {
            bin: config.ytdlp_bin.clone(),
            playlist_url: config.playlist_url.clone(),
            proxy: config.proxy.clone(),
            cookies_from_browser: config.cookies_from_browser.clone(),
            output_dir: config.work_dir.clone(),
        }
    }

    pub(crate) fn playlist_args(&self) -> Vec<String> {
        vec![
            "--proxy".to_string(),
            self.proxy.clone(),
            "--flat-playlist".to_string(),
            "--print".to_string(),
            "%(title)s|%(id)s|%(webpage_url)s".to_string(),
            "--cookies-from-browser".to_string(),
            self.cookies_from_browser.clone(),
            "--extractor-args".to_string(),
            "youtubetab:skip=authcheck".to_string(),
            self.playlist_url.clone(),
        ]
    }

    pub(crate) fn download_args(&self, video: &PendingVideo) -> Vec<String> {
        let template = self.output_dir.join("%(title)s.%(ext)s");
        vec![
            "--proxy".to_string(),
            self.proxy.clone(),
            "-f".to_string(),
            "ba[ext=m4a]/ba".to_string(),
            "--extract-audio".to_string(),
            "--write-info-json".to_string(),
            "--audio-format".to_string(),
            "m4a".to_string(),
            "--cookies-from-browser".to_string(),
            self.cookies_from_browser.clone(),
            "-o".to_string(),
            template.to_string_lossy().into_owned(),
            video.url.clone(),
        ]
    }
}

impl ListPlaylist for YtDlp {
    fn list_playlist(&self) -> ToolOutcome {
        let mut cmd = ProcessCommand::new(&self.bin);
        cmd.args(self.playlist_args());
        run_captured(cmd)
    }
}

impl DownloadAudio for YtDlp {
    fn download_audio(&self, video: &PendingVideo) -> ToolOutcome {
        let mut cmd = ProcessCommand::new(&self.bin);
        cmd.args(self.download_args(video));
        run_inherited(cmd)
    }
}

pub(crate) struct Rclone {
    bin: PathBuf,
    remote: String,
}

impl Rclone {
    pub(crate) fn new(config: &Config) -> Self {
        Self {
            bin: config.rclone_bin.clone(),
            remote: config.remote.clone(),
        }
    }

    fn remote_path(&self, key: &str) -> String {
        format!("{}/{}", self.remote, key)
    }
}

impl PullFile for Rclone {
    fn pull(&self, remote_key: &str, local: &Path) -> ToolOutcome {
        let mut cmd = ProcessCommand::new(&self.bin);
        cmd.arg("copyto").arg(self.remote_path(remote_key)).arg(local);
        run_captured(cmd)
    }
}

impl PushFile for Rclone {
    fn push(&self, local: &Path, remote_key: &str) -> ToolOutcome {
        let mut cmd = ProcessCommand::new(&self.bin);
        cmd.arg("copyto").arg(local).arg(self.remote_path(remote_key));
        run_captured(cmd)
    }
}

impl MirrorFiles for Rclone {
    fn mirror(&self, local_dir: &Path, remote_subdir: Option<&str>, include: &str) -> ToolOutcome {
        let target = match remote_subdir {
            Some(subdir) => self.remote_path(subdir),
            None => self.remote.clone(),
        };
        let mut cmd = ProcessCommand::new(&self.bin);
        cmd.arg("copy")
            .arg(local_dir)
            .arg(target)
            .arg("--include")
            .arg(include)
            .arg("-P")
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        run_status(cmd)
    }
}

fn describe(cmd: &ProcessCommand) -> String {
    let program = cmd.get_program().to_string_lossy().into_owned();
    let args = cmd
        .get_args()
        .map(OsStr::to_string_lossy)
        .collect::<Vec<_>>()
        .join(" ");
    if args.is_empty() {
        program
    } else {
        format!("{program} {args}")
    }
}

/// Runs a command to completion with stdout and stderr captured.
pub(crate) fn run_captured(mut cmd: ProcessCommand) -> ToolOutcome {
    let line = describe(&cmd);
    debug!(command = %line, "running");
    let output = match cmd.stdin(Stdio::null()).output() {
        Ok(output) => output,
        Err(err) => return ToolOutcome::failed(format!("failed to launch `{line}`: {err}")),
    };
    debug!(command = %line, status = %output.status, "finished");

    if output.status.success() {
        return ToolOutcome::ok(String::from_utf8_lossy(&output.stdout));
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        ToolOutcome::failed(format!("`{line}` exited with status: {}", output.status))
    } else {
        ToolOutcome::failed(stderr.to_string())
    }
}

/// Runs a command that reports progress on the operator's terminal.
pub(crate) fn run_inherited(mut cmd: ProcessCommand) -> ToolOutcome {
    cmd.stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    run_status(cmd)
}

fn run_status(mut cmd: ProcessCommand) -> ToolOutcome {
    let line = describe(&cmd);
    debug!(command = %line, "running");
    match cmd.status() {
        Ok(status) if status.success() => ToolOutcome::ok(String::new()),
        Ok(status) => {
            debug!(command = %line, %status, "finished");
            ToolOutcome::failed(format!("`{line}` exited with status: {status}"))
        }
        Err(err) => ToolOutcome::failed(format!("failed to launch `{line}`: {err}")),
    }
}
