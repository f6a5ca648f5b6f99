use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "saturday-morning",
    version,
    about = "Build a Saturday-morning Plex playlist that keeps multi-part arcs in order"
)]
pub struct Cli {
    /// Path to config.yaml (defaults to ./config.yaml, then the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Select episodes and replace the playlist (default)
    Build(BuildArgs),
    /// Preview the selection in a terminal UI before committing it
    Preview(BuildArgs),
    /// Print current continuity tracking data
    ShowContinuity,
    /// Clear continuity tracking data
    ResetContinuity,
    /// Log in to Plex and store the token
    Auth,
    /// Remove the saved Plex token
    Logout,
}

#[derive(Debug, Clone, Default, Args)]
pub struct BuildArgs {
    /// Print selected episodes without creating the playlist
    #[arg(long)]
    pub dry_run: bool,

    /// Override max total duration in minutes
    #[arg(long)]
    pub max_duration: Option<u32>,

    /// Override minimum episode length in minutes
    #[arg(long)]
    pub min_length: Option<u32>,

    /// Override maximum episode length in minutes
    #[arg(long)]
    pub max_length: Option<u32>,

    /// Exclude the live-action segment
    #[arg(long)]
    pub no_live: bool,

    /// Disable shuffling of playlist order
    #[arg(long)]
    pub no_shuffle: bool,

    /// Seed for the random selection, for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,
}
