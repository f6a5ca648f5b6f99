mod app;
mod cli;
mod config;
mod http;
mod logging;
mod paths;
mod plex;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    app::run(cli)
}
