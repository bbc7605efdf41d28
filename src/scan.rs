use std::path::{Path, PathBuf};

use regex::Regex;
use walkdir::WalkDir;

const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi", "m4v", "ts", "mov"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StemInfo {
    pub(crate) season: u32,
    pub(crate) episode: u32,
    pub(crate) title: Option<String>,
}

pub(crate) fn parse_episode_stem(stem: &str) -> Option<StemInfo> {
    let re = Regex::new(r"[Ss](\d+)[Ee](\d+)").ok()?;
    let caps = re.captures(stem)?;
    let matched = caps.get(0)?;
    let season = caps.get(1)?.as_str().parse().ok()?;
    let episode = caps.get(2)?.as_str().parse().ok()?;
    let title = episode_title_tail(&stem[matched.end()..]);
    Some(StemInfo {
        season,
        episode,
        title,
    })
}

fn episode_title_tail(rest: &str) -> Option<String> {
    let tail = rest.trim_start().strip_prefix('-')?.trim();
    if tail.is_empty() {
        None
    } else {
        Some(tail.to_string())
    }
}

pub(crate) fn find_nfo_files(base: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(base).into_iter().filter_map(|entry| entry.ok()) {
        if entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("nfo"))
        {
            files.push(entry.into_path());
        }
    }
    // Deterministic processing order regardless of directory iteration order.
    files.sort();
    files
}

pub(crate) fn find_extra_videos(base: &Path, episode_floor: u32) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(base).into_iter().filter_map(|entry| entry.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let is_video = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                VIDEO_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            });
        if !is_video {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        if let Some(info) = parse_episode_stem(stem)
            && info.season == 0
            && info.episode >= episode_floor
        {
            files.push(entry.into_path());
        }
    }
    files.sort();
    files
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
