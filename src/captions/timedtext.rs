//! Direct YouTube timed-text caption fetch.
//!
//! Scrapes the caption track list from the watch page, picks a track for
//! the working language, and downloads it in the json3 timed-text format.
//! No API key required; auto-generated tracks are used when no manually
//! authored track exists.

use super::{CaptionSource, RawSegment};
use crate::error::{HearsayError, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Primary caption source: YouTube timed-text tracks over HTTP.
pub struct TimedTextSource {
    client: reqwest::Client,
    tracks_regex: Regex,
    prefer_manual: bool,
}

/// One entry of the watch page's caption track list.
#[derive(Debug, Clone, Deserialize)]
struct CaptionTrack {
    #[serde(rename = "baseUrl")]
    base_url: String,
    #[serde(rename = "languageCode")]
    language_code: String,
    /// "asr" marks auto-generated tracks.
    #[serde(default)]
    kind: Option<String>,
}

impl CaptionTrack {
    fn is_auto_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

/// Timed-text json3 payload.
#[derive(Debug, Deserialize)]
struct TimedTextResponse {
    #[serde(default)]
    events: Vec<TimedTextEvent>,
}

#[derive(Debug, Deserialize)]
struct TimedTextEvent {
    #[serde(rename = "tStartMs")]
    start_ms: Option<f64>,
    #[serde(rename = "dDurationMs")]
    duration_ms: Option<f64>,
    #[serde(default)]
    segs: Vec<TimedTextSeg>,
}

#[derive(Debug, Deserialize)]
struct TimedTextSeg {
    #[serde(default)]
    utf8: String,
}

impl TimedTextSource {
    pub fn new(prefer_manual: bool) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        // The track list is embedded in the watch page's player config.
        // The array holds flat objects, so a non-greedy match up to the
        // first closing bracket captures it whole.
        let tracks_regex =
            Regex::new(r#""captionTracks":(\[.*?\])"#).expect("Invalid caption tracks regex");

        Self {
            client,
            tracks_regex,
            prefer_manual,
        }
    }

    async fn fetch_watch_page(&self, video_id: &str) -> Result<String> {
        let url = format!("https://www.youtube.com/watch?v={}", video_id);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            // Skips the interstitial consent page served in some regions.
            .header(reqwest::header::COOKIE, "CONSENT=YES+cb")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(HearsayError::CaptionSource(format!(
                "watch page returned HTTP {} for video {}",
                response.status(),
                video_id
            )));
        }

        Ok(response.text().await?)
    }

    fn extract_tracks(&self, watch_html: &str) -> Result<Vec<CaptionTrack>> {
        let captures = self.tracks_regex.captures(watch_html).ok_or_else(|| {
            HearsayError::CaptionSource("no caption tracks listed on watch page".to_string())
        })?;

        let tracks: Vec<CaptionTrack> = serde_json::from_str(&captures[1])?;
        Ok(tracks)
    }

    /// Pick a track for the language: a manual track when preferred and
    /// available, otherwise an auto-generated one.
    fn select_track<'a>(
        &self,
        tracks: &'a [CaptionTrack],
        language: &str,
    ) -> Option<&'a CaptionTrack> {
        let regional_prefix = format!("{}-", language);
        let mut matching = tracks.iter().filter(|t| {
            t.language_code == language || t.language_code.starts_with(&regional_prefix)
        });

        if self.prefer_manual {
            let (manual, auto): (Vec<_>, Vec<_>) = matching.partition(|t| !t.is_auto_generated());
            manual.into_iter().next().or_else(|| auto.into_iter().next())
        } else {
            matching.next()
        }
    }

    async fn fetch_track(&self, track: &CaptionTrack) -> Result<Vec<RawSegment>> {
        let url = format!("{}&fmt=json3", track.base_url);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(HearsayError::CaptionSource(format!(
                "timed-text fetch returned HTTP {}",
                response.status()
            )));
        }

        let payload: TimedTextResponse = response.json().await?;
        Ok(parse_events(payload))
    }
}

/// Flatten json3 events into raw segments, skipping styling-only events.
fn parse_events(payload: TimedTextResponse) -> Vec<RawSegment> {
    payload
        .events
        .into_iter()
        .filter_map(|event| {
            let start_ms = event.start_ms?;
            let text: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            Some(RawSegment::new(
                text,
                start_ms / 1000.0,
                event.duration_ms.unwrap_or(0.0) / 1000.0,
            ))
        })
        .collect()
}

#[async_trait]
impl CaptionSource for TimedTextSource {
    fn name(&self) -> &'static str {
        "timedtext"
    }

    async fn fetch(&self, video_id: &str, language: &str) -> Result<Vec<RawSegment>> {
        let watch_html = self.fetch_watch_page(video_id).await?;
        let tracks = self.extract_tracks(&watch_html)?;

        let track = self.select_track(&tracks, language).ok_or_else(|| {
            HearsayError::CaptionSource(format!(
                "no {} caption track for video {} ({} tracks listed)",
                language,
                video_id,
                tracks.len()
            ))
        })?;

        self.fetch_track(track).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(language_code: &str, kind: Option<&str>) -> CaptionTrack {
        CaptionTrack {
            base_url: format!("https://example.invalid/tt?lang={}", language_code),
            language_code: language_code.to_string(),
            kind: kind.map(|k| k.to_string()),
        }
    }

    #[test]
    fn test_extract_tracks_from_watch_html() {
        let source = TimedTextSource::new(true);
        let html = r#"<html>..."captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[{"baseUrl":"https://www.youtube.com/api/timedtext?v=x","languageCode":"en","kind":"asr"}]}},"videoDetails":...</html>"#;

        let tracks = source.extract_tracks(html).unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].language_code, "en");
        assert!(tracks[0].is_auto_generated());
    }

    #[test]
    fn test_extract_tracks_missing() {
        let source = TimedTextSource::new(true);
        let err = source.extract_tracks("<html>no captions here</html>").unwrap_err();
        assert!(matches!(err, HearsayError::CaptionSource(_)));
    }

    #[test]
    fn test_select_track_prefers_manual() {
        let source = TimedTextSource::new(true);
        let tracks = vec![track("en", Some("asr")), track("en", None), track("ru", None)];

        let selected = source.select_track(&tracks, "en").unwrap();
        assert!(!selected.is_auto_generated());
        assert_eq!(selected.language_code, "en");
    }

    #[test]
    fn test_select_track_falls_back_to_auto() {
        let source = TimedTextSource::new(true);
        let tracks = vec![track("en", Some("asr"))];

        let selected = source.select_track(&tracks, "en").unwrap();
        assert!(selected.is_auto_generated());
    }

    #[test]
    fn test_select_track_matches_regional_variant() {
        let source = TimedTextSource::new(true);
        let tracks = vec![track("en-GB", None)];
        assert!(source.select_track(&tracks, "en").is_some());
        assert!(source.select_track(&tracks, "ru").is_none());
    }

    #[test]
    fn test_parse_events() {
        let payload: TimedTextResponse = serde_json::from_str(
            r#"{"events":[
                {"tStartMs":0,"dDurationMs":1500,"segs":[{"utf8":"hello "},{"utf8":"world"}]},
                {"tStartMs":1500,"segs":[{"utf8":"\n"}]},
                {"tStartMs":3000,"dDurationMs":2000,"segs":[{"utf8":"again"}]}
            ]}"#,
        )
        .unwrap();

        let segments = parse_events(payload);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "hello world");
        assert_eq!(segments[0].start, 0.0);
        assert_eq!(segments[0].duration, 1.5);
        assert_eq!(segments[1].start, 3.0);
    }
}
