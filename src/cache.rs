use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::nfo::EpisodeMetadata;

/// Side-car entry persisted next to a special's NFO after a display write.
/// Only ever compared against freshly computed values; deleting it forces a
/// rewrite on the next run but never changes the computed sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct DisplayCache {
    pub(crate) original_season: u32,
    pub(crate) original_episode: u32,
    pub(crate) aired: String,
    pub(crate) display_season: u32,
    pub(crate) display_episode: u32,
    pub(crate) last_modified: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ExtrasRecord {
    pub(crate) video_file: String,
    pub(crate) season: u32,
    pub(crate) episode: u32,
    pub(crate) title: String,
    pub(crate) metadata: EpisodeMetadata,
    pub(crate) thumbnail_timestamp: Option<String>,
    pub(crate) nfo_created: bool,
    pub(crate) thumb_created: bool,
    pub(crate) last_processed: String,
}

pub(crate) fn display_cache_path(nfo_path: &Path) -> PathBuf {
    nfo_path.with_extension("nfo.json")
}

pub(crate) fn extras_record_path(video_path: &Path) -> PathBuf {
    video_path.with_extension("json")
}

pub(crate) fn nfo_path_for(video_path: &Path) -> PathBuf {
    video_path.with_extension("nfo")
}

pub(crate) fn thumb_path_for(video_path: &Path) -> PathBuf {
    let stem = video_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    video_path.with_file_name(format!("{stem}-thumb.jpg"))
}

pub(crate) fn load_display_cache(path: &Path) -> Result<Option<DisplayCache>> {
    load_json(path)
}

pub(crate) fn save_display_cache(path: &Path, entry: &DisplayCache) -> Result<()> {
    save_json(path, entry)
}

pub(crate) fn load_extras_record(path: &Path) -> Result<Option<ExtrasRecord>> {
    load_json(path)
}

pub(crate) fn save_extras_record(path: &Path, record: &ExtrasRecord) -> Result<()> {
    save_json(path, record)
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Some(value))
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let raw = serde_json::to_string_pretty(value)
        .with_context(|| format!("failed to serialize {}", path.display()))?;
    fs::write(path, raw).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
