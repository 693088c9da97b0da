use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "linpod",
    version,
    about = "Download a watch-later playlist as audio and publish it as a podcast feed",
    arg_required_else_help = true
)]
pub struct Cli {
    /// Working directory shared by `fetch` and `publish` (defaults to the current directory).
    #[arg(short = 'C', long, global = true, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Pick new playlist videos and download them as audio.
    Fetch,
    /// Append downloaded episodes to the remote feed and tidy the working directory.
    #[command(alias = "build")]
    Publish,
}
