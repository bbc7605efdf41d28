use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{Local, Utc};

use crate::cache::{self, ExtrasRecord};
use crate::ffmpeg;
use crate::nfo::{self, EpisodeMetadata};
use crate::scan::{self, StemInfo};

use super::label;

/// Extras live in the S00E1000+ range; everything below belongs to scraped
/// specials.
pub(crate) const EXTRAS_EPISODE_FLOOR: u32 = 1_000;

pub(crate) struct ExtrasOptions {
    pub(crate) force_nfo: bool,
    pub(crate) force_thumb: bool,
    pub(crate) add_labels: bool,
    pub(crate) dry_run: bool,
}

pub(crate) fn run_extras(base: &Path, options: &ExtrasOptions) -> Result<()> {
    if !base.exists() {
        bail!("path does not exist: {}", base.display());
    }
    if options.dry_run {
        println!("dry-run mode, nothing will be written\n");
    }

    println!(
        "scanning for extras (S00E{EXTRAS_EPISODE_FLOOR}+) in {}",
        base.display()
    );
    describe_mode(options);

    let ffmpeg_ok = ffmpeg::tools_available();
    if !ffmpeg_ok {
        println!("warning: ffmpeg/ffprobe not found, thumbnails will be skipped");
    }

    let videos = scan::find_extra_videos(base, EXTRAS_EPISODE_FLOOR);
    if videos.is_empty() {
        println!("no extras found");
        return Ok(());
    }
    println!("found {} video file(s)\n", videos.len());

    let mut processed = 0usize;
    for video in videos {
        match process_video(&video, options, ffmpeg_ok) {
            Ok(()) => processed += 1,
            Err(err) => println!("warning: skipping {}: {err:#}", scan::file_name(&video)),
        }
    }

    println!("\ndone: {processed} extra(s) processed");
    Ok(())
}

fn describe_mode(options: &ExtrasOptions) {
    match (options.force_nfo, options.force_thumb) {
        (true, true) => println!("mode: regenerate NFO files and thumbnails"),
        (true, false) => println!("mode: regenerate NFO files"),
        (false, true) => println!("mode: regenerate thumbnails"),
        (false, false) => println!("mode: create missing files only"),
    }
    if options.add_labels {
        println!("labels: enabled");
    } else {
        println!("labels: disabled");
    }
    println!();
}

fn process_video(video: &Path, options: &ExtrasOptions, ffmpeg_ok: bool) -> Result<()> {
    println!("{}", scan::file_name(video));

    let stem = video
        .file_stem()
        .and_then(|stem| stem.to_str())
        .context("file name is not valid UTF-8")?;
    let info =
        scan::parse_episode_stem(stem).context("could not parse episode info from file name")?;
    let title = info
        .title
        .clone()
        .unwrap_or_else(|| format!("Episode {}", info.episode));

    let video = organize_into_folder(video, &info, &title, options.dry_run)?;
    println!("  season {}, episode {}: {}", info.season, info.episode, title);

    let record_path = cache::extras_record_path(&video);
    let nfo_path = cache::nfo_path_for(&video);
    let thumb_path = cache::thumb_path_for(&video);

    let existing = match cache::load_extras_record(&record_path) {
        Ok(existing) => existing,
        Err(err) => {
            println!("  warning: ignoring metadata record: {err:#}");
            None
        }
    };

    let needs_nfo = options.force_nfo || !nfo_path.exists();
    let needs_thumb = options.force_thumb || !thumb_path.exists();

    // Stored metadata wins over fabricated defaults; manual edits survive
    // regeneration.
    let metadata = existing
        .as_ref()
        .map(|record| record.metadata.clone())
        .unwrap_or_else(|| EpisodeMetadata {
            aired: Local::now().format(nfo::AIRED_FORMAT).to_string(),
            ..EpisodeMetadata::default()
        });

    if needs_nfo {
        if options.dry_run {
            println!("  [dry-run] would write {}", scan::file_name(&nfo_path));
        } else {
            nfo::write_episode_nfo(&nfo_path, &title, info.season, info.episode, &metadata)?;
            println!("  wrote {}", scan::file_name(&nfo_path));
        }
    } else {
        println!("  NFO already present: {}", scan::file_name(&nfo_path));
    }

    let mut timestamp = existing
        .as_ref()
        .and_then(|record| record.thumbnail_timestamp.clone());

    if needs_thumb {
        if ffmpeg_ok {
            let at = timestamp
                .clone()
                .unwrap_or_else(|| thumbnail_timestamp(&video));
            let filter = options
                .add_labels
                .then(|| label::detect_label(&title).map(|found| label::badge_filter(&found)))
                .flatten();
            if options.dry_run {
                println!("  [dry-run] would extract thumbnail at {at}");
            } else {
                match ffmpeg::extract_thumbnail(&video, &thumb_path, &at, filter.as_deref()) {
                    Ok(()) => {
                        println!("  wrote {} (frame at {at})", scan::file_name(&thumb_path));
                    }
                    Err(err) => println!("  warning: thumbnail failed: {err:#}"),
                }
            }
            timestamp = Some(at);
        } else {
            println!("  warning: thumbnail skipped, ffmpeg unavailable");
        }
    } else {
        println!(
            "  thumbnail already present: {}",
            scan::file_name(&thumb_path)
        );
    }

    let record = ExtrasRecord {
        video_file: scan::file_name(&video),
        season: info.season,
        episode: info.episode,
        title,
        metadata,
        thumbnail_timestamp: timestamp,
        nfo_created: nfo_path.exists(),
        thumb_created: thumb_path.exists(),
        last_processed: Utc::now().to_rfc3339(),
    };
    if options.dry_run {
        println!("  [dry-run] would write {}", scan::file_name(&record_path));
    } else {
        cache::save_extras_record(&record_path, &record)?;
    }
    println!();
    Ok(())
}

fn thumbnail_timestamp(video: &Path) -> String {
    match ffmpeg::probe_duration(video) {
        Some(duration) => ffmpeg::midpoint_timestamp(duration),
        None => ffmpeg::FALLBACK_TIMESTAMP.to_string(),
    }
}

/// Moves a loose extra into its own `S00Ennnn - Title` folder. Files already
/// sitting in a folder of that exact name are left where they are.
fn organize_into_folder(
    video: &Path,
    info: &StemInfo,
    title: &str,
    dry_run: bool,
) -> Result<PathBuf> {
    let folder_name = format!("S{:02}E{:04} - {}", info.season, info.episode, title);
    let parent = video.parent().context("video has no parent directory")?;

    if parent.file_name() == Some(OsStr::new(folder_name.as_str())) {
        return Ok(video.to_path_buf());
    }

    let folder = parent.join(&folder_name);
    let target = folder.join(video.file_name().context("video has no file name")?);
    if target.exists() {
        bail!("a file with the same name already exists in {folder_name}/");
    }

    if dry_run {
        println!(
            "  [dry-run] would move {} -> {folder_name}/",
            scan::file_name(video)
        );
        return Ok(target);
    }

    fs::create_dir_all(&folder).with_context(|| format!("failed to create {}", folder.display()))?;
    fs::rename(video, &target).with_context(|| format!("failed to move {}", video.display()))?;
    println!("  moved into {folder_name}/");
    Ok(target)
}
