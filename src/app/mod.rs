mod cleanup;
mod feed;
mod fetch;
mod history;
mod playlist;
mod publish;
mod tools;


use std::io;

use anyhow::Result;
use chrono::Utc;
use clap::CommandFactory;
use tracing::info;

use crate::cli::{Cli, Command};
use crate::config::Config;

use self::fetch::run_fetch_job;
use self::history::HistoryStore;
use self::publish::run_publish_job;
use self::tools::{Rclone, YtDlp};

pub fn run(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = Config::from_env(cli.work_dir)?;
    info!(work_dir = %config.work_dir.display(), "configuration resolved");

    match command {
        Command::Fetch => run_fetch(&config)?,
        Command::Publish => run_publish(&config)?,
    }

    Ok(())
}

fn run_fetch(config: &Config) -> Result<()> {
    let ytdlp = YtDlp::new(config);
    let history = HistoryStore::new(&config.history_file);
    info!(history = %history.path().display(), "using history file");

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    let report = run_fetch_job(&ytdlp, &ytdlp, &history, &mut input, &mut output)?;

    if !report.failed.is_empty() {
        println!(
            "\nDownloaded {}, failed {}.",
            report.downloaded.len(),
            report.failed.len()
        );
    }
    Ok(())
}

fn run_publish(config: &Config) -> Result<()> {
    let rclone = Rclone::new(config);
    let report = run_publish_job(&rclone, config, Utc::now())?;
    info!(
        origin = ?report.origin,
        appended = report.append.appended.len(),
        missing_audio = report.append.missing_audio.len(),
        unreadable = report.append.unreadable.len(),
        mirrored = report.mirrored,
        pushed = ?report.pushed,
        removed_sidecars = report.cleanup.as_ref().map_or(0, |c| c.removed_sidecars.len()),
        moved_audio = report.cleanup.as_ref().map_or(0, |c| c.moved_audio.len()),
        "publish finished"
    );
    Ok(())
}
