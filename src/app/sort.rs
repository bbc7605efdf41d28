use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Utc;

use crate::cache::{self, DisplayCache};
use crate::nfo;
use crate::scan;

use super::sequence::{
    DisplayPosition, EpisodeRecord, Exclusion, WriteDecision, check_eligibility, decide_write,
    sequence_episodes,
};

pub(crate) fn run_sort(base: &Path, dry_run: bool) -> Result<()> {
    if !base.exists() {
        bail!("path does not exist: {}", base.display());
    }
    if dry_run {
        println!("dry-run mode, nothing will be written\n");
    }

    println!("scanning for NFO files in {}", base.display());
    let nfo_files = scan::find_nfo_files(base);
    println!("found {} NFO file(s)\n", nfo_files.len());

    let mut records = Vec::new();
    let mut special_count = 0usize;

    for path in nfo_files {
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        // Files without a SxxEyy identity (tvshow.nfo, season.nfo, ...) are
        // not episode records and are passed over quietly.
        let Some(info) = scan::parse_episode_stem(stem) else {
            continue;
        };

        let aired = match nfo::read_aired_date(&path) {
            Ok(aired) => aired,
            Err(err) => {
                println!("warning: skipping {}: {err:#}", scan::file_name(&path));
                continue;
            }
        };

        let aired = match check_eligibility(info.season, info.episode, aired) {
            Ok(aired) => aired,
            Err(exclusion @ Exclusion::OutOfBandSpecial) => {
                println!("skipping {} ({})", scan::file_name(&path), exclusion.reason());
                continue;
            }
            Err(exclusion) => {
                println!(
                    "warning: skipping {} ({})",
                    scan::file_name(&path),
                    exclusion.reason()
                );
                continue;
            }
        };

        let cached = if info.season == 0 {
            special_count += 1;
            match cache::load_display_cache(&cache::display_cache_path(&path)) {
                Ok(cached) => cached,
                Err(err) => {
                    println!(
                        "warning: ignoring cache for {}: {err:#}",
                        scan::file_name(&path)
                    );
                    None
                }
            }
        } else {
            None
        };

        records.push(EpisodeRecord {
            path,
            season: info.season,
            episode: info.episode,
            aired,
            cached,
        });
    }

    if special_count == 0 {
        println!("no special episodes to process");
        return Ok(());
    }

    let normal_count = records.len() - special_count;
    println!("sequencing {special_count} special(s) between {normal_count} regular episode(s)\n");

    let mut written = 0usize;
    let mut skipped = 0usize;
    let mut failed = 0usize;

    for entry in sequence_episodes(records) {
        let record = &entry.record;
        let Some(display) = entry.display else {
            if record.is_special() {
                println!(
                    "warning: {} aired before any regular episode, no season to place it in",
                    scan::file_name(&record.path)
                );
            }
            continue;
        };

        if !record.is_special() {
            println!(
                "  S{:02}E{:02} -> display S{:02}E{:02} ({})",
                record.season,
                record.episode,
                display.season,
                display.episode,
                record.aired.format(nfo::AIRED_FORMAT)
            );
            continue;
        }

        match decide_write(display, record.cached.as_ref()) {
            WriteDecision::Skip => {
                println!(
                    "  {} already correct: S{:02}E{:02}",
                    scan::file_name(&record.path),
                    display.season,
                    display.episode
                );
                skipped += 1;
            }
            WriteDecision::Write => {
                println!("  {}", scan::file_name(&record.path));
                println!("    original: S{:02}E{:02}", record.season, record.episode);
                println!("    aired:    {}", record.aired.format(nfo::AIRED_FORMAT));
                println!("    display:  S{:02}E{:02}", display.season, display.episode);
                if dry_run {
                    println!("    [dry-run] would update record and cache");
                    written += 1;
                    continue;
                }
                match persist_special(record, display) {
                    Ok(()) => written += 1,
                    Err(err) => {
                        // A failed write leaves this record for the next
                        // invocation; the rest of the run continues.
                        println!(
                            "warning: failed to update {}: {err:#}",
                            scan::file_name(&record.path)
                        );
                        failed += 1;
                    }
                }
            }
        }
    }

    println!();
    if failed > 0 {
        println!("done: {written} special(s) updated, {skipped} already correct, {failed} failed");
    } else {
        println!("done: {written} special(s) updated, {skipped} already correct");
    }
    Ok(())
}

fn persist_special(record: &EpisodeRecord, display: DisplayPosition) -> Result<()> {
    nfo::set_display_tags(&record.path, display.season, display.episode)
        .with_context(|| format!("failed to update display tags in {}", record.path.display()))?;

    let entry = DisplayCache {
        original_season: record.season,
        original_episode: record.episode,
        aired: record.aired.format(nfo::AIRED_FORMAT).to_string(),
        display_season: display.season,
        display_episode: display.episode,
        last_modified: Utc::now().to_rfc3339(),
    };
    cache::save_display_cache(&cache::display_cache_path(&record.path), &entry)
}
