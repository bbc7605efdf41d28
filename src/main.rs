mod app;
mod cache;
mod cli;
mod ffmpeg;
mod nfo;
mod scan;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    app::run(cli)
}
