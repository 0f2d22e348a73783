//! Fallback caption source backed by yt-dlp.
//!
//! Downloads subtitle tracks (manual or auto-generated) as WebVTT into a
//! scratch directory and parses them into raw segments. Used when the
//! direct timed-text path yields nothing.

use super::{CaptionSource, RawSegment};
use crate::error::{HearsayError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Caption source shelling out to yt-dlp.
pub struct YtdlpSource;

impl YtdlpSource {
    pub fn new() -> Self {
        Self
    }

    async fn download_subtitles(
        &self,
        video_id: &str,
        language: &str,
        dir: &Path,
    ) -> Result<PathBuf> {
        let url = format!("https://www.youtube.com/watch?v={}", video_id);
        let sub_langs = format!("{0},{0}.*", language);
        let output_template = dir.join("captions").to_string_lossy().to_string();

        let output = tokio::process::Command::new("yt-dlp")
            .args([
                "--skip-download",
                "--write-subs",
                "--write-auto-subs",
                "--sub-langs",
                &sub_langs,
                "--sub-format",
                "vtt",
                "--no-warnings",
                "--no-playlist",
                "-o",
                &output_template,
                &url,
            ])
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    HearsayError::ToolNotFound("yt-dlp".to_string())
                } else {
                    HearsayError::CaptionSource(format!("Failed to run yt-dlp: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HearsayError::ToolFailed(format!(
                "yt-dlp exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        find_subtitle_file(dir, language)
    }
}

impl Default for YtdlpSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Pick the downloaded subtitle file, preferring an exact language match
/// over regional variants.
fn find_subtitle_file(dir: &Path, language: &str) -> Result<PathBuf> {
    let exact_suffix = format!(".{}.vtt", language);
    let mut fallback = None;

    for entry in std::fs::read_dir(dir)?.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.ends_with(".vtt") {
            continue;
        }
        if name.ends_with(&exact_suffix) {
            return Ok(path);
        }
        fallback.get_or_insert(path);
    }

    fallback.ok_or_else(|| {
        HearsayError::CaptionSource("yt-dlp produced no subtitle file".to_string())
    })
}

#[async_trait]
impl CaptionSource for YtdlpSource {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn fetch(&self, video_id: &str, language: &str) -> Result<Vec<RawSegment>> {
        let temp_dir = tempfile::tempdir()?;
        let vtt_path = self
            .download_subtitles(video_id, language, temp_dir.path())
            .await?;
        let content = std::fs::read_to_string(&vtt_path)?;
        Ok(parse_vtt(&content))
    }
}

/// Parse a WebVTT document into raw segments.
///
/// Only cue timings and cue text are used; headers, NOTE/STYLE blocks, and
/// cue identifiers are skipped. Multi-line cue text is joined with spaces.
pub fn parse_vtt(content: &str) -> Vec<RawSegment> {
    let mut segments = Vec::new();
    let mut lines = content.lines().peekable();

    while let Some(line) = lines.next() {
        let line = line.trim_start_matches('\u{feff}').trim();
        if !line.contains("-->") {
            continue;
        }
        let Some((start, end)) = parse_cue_timing(line) else {
            continue;
        };

        let mut text_lines = Vec::new();
        while let Some(next) = lines.peek() {
            let next = next.trim();
            if next.is_empty() || next.contains("-->") {
                break;
            }
            text_lines.push(next.to_string());
            lines.next();
        }

        let text = text_lines.join(" ");
        if text.is_empty() {
            continue;
        }

        segments.push(RawSegment::new(text, start, (end - start).max(0.0)));
    }

    segments
}

fn parse_cue_timing(line: &str) -> Option<(f64, f64)> {
    let (start_part, end_part) = line.split_once("-->")?;
    let start = parse_timestamp(start_part.trim())?;
    // Cue settings like "align:start position:0%" follow the end stamp.
    let end_token = end_part.trim().split_whitespace().next()?;
    let end = parse_timestamp(end_token)?;
    Some((start, end))
}

/// Parse "HH:MM:SS.mmm" or "MM:SS.mmm" (comma decimals tolerated) into
/// seconds.
fn parse_timestamp(s: &str) -> Option<f64> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return None;
    }

    let mut minutes = 0u64;
    for part in &parts[..parts.len() - 1] {
        minutes = minutes * 60 + part.parse::<u64>().ok()?;
    }

    let seconds: f64 = parts.last()?.replace(',', ".").parse().ok()?;
    if seconds < 0.0 {
        return None;
    }

    Some(minutes as f64 * 60.0 + seconds)
}
