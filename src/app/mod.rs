mod extras;
mod label;
mod sequence;
mod sort;


use anyhow::Result;

use crate::cli::{Cli, Command};

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Sort { path, dry_run } => sort::run_sort(&path, dry_run),
        Command::Extras {
            path,
            force_nfo,
            force_thumb,
            force_all,
            no_labels,
            dry_run,
        } => {
            let options = extras::ExtrasOptions {
                force_nfo: force_nfo || force_all,
                force_thumb: force_thumb || force_all,
                add_labels: !no_labels,
                dry_run,
            };
            extras::run_extras(&path, &options)
        }
    }
}
