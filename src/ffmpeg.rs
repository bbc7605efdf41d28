use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};

pub(crate) const FALLBACK_TIMESTAMP: &str = "00:00:05";

pub(crate) fn tools_available() -> bool {
    command_succeeds("ffmpeg") && command_succeeds("ffprobe")
}

fn command_succeeds(tool: &str) -> bool {
    Command::new(tool)
        .arg("-version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

pub(crate) fn probe_duration(path: &Path) -> Option<f64> {
    let output = Command::new("ffprobe")
        .arg("-v")
        .arg("error")
        .arg("-show_entries")
        .arg("format=duration")
        .arg("-of")
        .arg("default=noprint_wrappers=1:nokey=1")
        .arg(path)
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let raw = String::from_utf8(output.stdout).ok()?;
    raw.trim().parse::<f64>().ok()
}

pub(crate) fn midpoint_timestamp(duration_secs: f64) -> String {
    format_timestamp((duration_secs / 2.0).max(0.0) as u64)
}

pub(crate) fn format_timestamp(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

pub(crate) fn extract_thumbnail(
    video: &Path,
    thumb: &Path,
    timestamp: &str,
    filter: Option<&str>,
) -> Result<()> {
    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-ss")
        .arg(timestamp)
        .arg("-i")
        .arg(video)
        .arg("-vframes")
        .arg("1")
        .arg("-q:v")
        .arg("2");
    if let Some(filter) = filter {
        cmd.arg("-vf").arg(filter);
    }
    cmd.arg("-y").arg(thumb);

    let output = cmd
        .output()
        .with_context(|| format!("failed to run ffmpeg for {}", video.display()))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("ffmpeg exited with {}: {}", output.status, stderr.trim());
    }
    if !thumb.exists() {
        bail!("ffmpeg reported success but {} is missing", thumb.display());
    }
    Ok(())
}
