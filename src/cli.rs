use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "kodisort",
    version,
    about = "Keep Kodi special episodes in chronological order between regular episodes"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interleave specials between regular episodes via display tags
    Sort {
        path: PathBuf,
        /// Compute and print every decision without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Generate NFO files and thumbnails for manually curated extras (S00E1000+)
    Extras {
        path: PathBuf,
        /// Regenerate NFO files even when they already exist
        #[arg(long, conflicts_with = "force_all")]
        force_nfo: bool,
        /// Regenerate thumbnails even when they already exist
        #[arg(long, conflicts_with_all = ["force_nfo", "force_all"])]
        force_thumb: bool,
        /// Regenerate both NFO files and thumbnails
        #[arg(long)]
        force_all: bool,
        /// Skip label badges on thumbnails
        #[arg(long)]
        no_labels: bool,
        /// Compute and print every decision without writing anything
        #[arg(long)]
        dry_run: bool,
    },
}
