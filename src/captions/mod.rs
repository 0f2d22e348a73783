//! Caption acquisition for Hearsay.
//!
//! Provides a trait-based interface over caption sources. The primary
//! source fetches YouTube timed-text tracks directly; a yt-dlp based
//! fallback covers videos the direct path cannot serve.

mod timedtext;
mod ytdlp;

pub use timedtext::TimedTextSource;
pub use ytdlp::YtdlpSource;

use crate::error::{HearsayError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

/// A raw timed caption segment as returned by a caption source.
///
/// Ordered by start time; text may still contain markup and noise, which
/// the chunker cleans up.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawSegment {
    pub text: String,
    /// Start offset in seconds.
    pub start: f64,
    /// Duration in seconds.
    pub duration: f64,
}

impl RawSegment {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }

    /// End offset in seconds.
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Trait for caption providers.
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// Human-readable source name, used in logs.
    fn name(&self) -> &'static str;

    /// Fetch all caption segments for a video in the given language.
    async fn fetch(&self, video_id: &str, language: &str) -> Result<Vec<RawSegment>>;
}

/// Ordered chain of caption sources with fallback.
///
/// Sources are tried in order; a source that errors or returns nothing is
/// logged and skipped. Only when every source comes up empty does the
/// fetch fail.
pub struct CaptionFetcher {
    sources: Vec<Box<dyn CaptionSource>>,
}

impl CaptionFetcher {
    pub fn new(sources: Vec<Box<dyn CaptionSource>>) -> Self {
        Self { sources }
    }

    /// Build the standard chain from settings: direct timed-text first,
    /// then the yt-dlp fallback if enabled.
    pub fn from_settings(settings: &crate::config::Settings) -> Self {
        let mut sources: Vec<Box<dyn CaptionSource>> = vec![Box::new(TimedTextSource::new(
            settings.captions.prefer_manual,
        ))];
        if settings.captions.ytdlp_fallback {
            sources.push(Box::new(YtdlpSource::new()));
        }
        Self::new(sources)
    }

    /// Fetch caption segments, falling through the source chain.
    pub async fn fetch(&self, video_id: &str, language: &str) -> Result<Vec<RawSegment>> {
        for source in &self.sources {
            match source.fetch(video_id, language).await {
                Ok(segments) if !segments.is_empty() => {
                    debug!(
                        source = source.name(),
                        video_id,
                        segments = segments.len(),
                        "captions fetched"
                    );
                    return Ok(segments);
                }
                Ok(_) => {
                    warn!(source = source.name(), video_id, "source returned no captions");
                }
                Err(e) => {
                    warn!(source = source.name(), video_id, error = %e, "caption source failed");
                }
            }
        }

        Err(HearsayError::NoTranscript(format!(
            "no captions available for video {}",
            video_id
        )))
    }
}

/// Resolve a caller-supplied video reference to a canonical video id.
///
/// Accepts bare 11-character ids, watch URLs (any query-parameter order),
/// youtu.be short links, and embed/shorts/live paths. Returns None for
/// anything that cannot be resolved.
pub fn parse_video_reference(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if is_video_id(trimmed) {
        return Some(trimmed.to_string());
    }

    // Tolerate scheme-less URLs like "youtube.com/watch?v=...".
    let owned;
    let candidate = if trimmed.contains("://") {
        trimmed
    } else if trimmed.contains("youtube.com") || trimmed.contains("youtu.be") {
        owned = format!("https://{}", trimmed);
        &owned
    } else {
        return None;
    };

    let parsed = Url::parse(candidate).ok()?;
    let host = parsed.host_str()?;

    if host == "youtu.be" {
        let id = parsed.path_segments()?.next()?.to_string();
        return is_video_id(&id).then_some(id);
    }

    if host == "youtube.com" || host.ends_with(".youtube.com") {
        if let Some(id) = parsed
            .query_pairs()
            .find(|(k, _)| k == "v")
            .map(|(_, v)| v.to_string())
        {
            return is_video_id(&id).then_some(id);
        }

        let mut segments = parsed.path_segments()?;
        if let ("embed" | "shorts" | "live" | "v", Some(id)) =
            (segments.next()?, segments.next().map(str::to_string))
        {
            return is_video_id(&id).then_some(id);
        }
    }

    None
}

fn is_video_id(s: &str) -> bool {
    s.len() == 11
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
