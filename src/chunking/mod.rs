//! Transcript chunking for retrieval.
//!
//! Turns raw caption segments into cleaned, deduplicated, overlapping text
//! windows. Two windowing policies are supported: fixed-duration time
//! windows and fixed-size token windows.

mod time;
mod token;

pub use time::TimeWindowChunker;
pub use token::TokenWindowChunker;

use crate::captions::RawSegment;
use crate::config::{ChunkingPolicy, ChunkingSettings};
use crate::error::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A retrieval-ready span of transcript text with its time range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Cleaned text content, never empty.
    pub text: String,
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
    /// Canonical id of the video this chunk came from.
    pub source_id: String,
}

impl Chunk {
    pub fn new(text: impl Into<String>, start: f64, end: f64, source_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            source_id: source_id.into(),
        }
    }

    /// Duration of this chunk in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Format the start time for display.
    pub fn format_timestamp(&self) -> String {
        let total_seconds = self.start as u32;
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let secs = total_seconds % 60;

        if hours > 0 {
            format!("{:02}:{:02}:{:02}", hours, minutes, secs)
        } else {
            format!("{:02}:{:02}", minutes, secs)
        }
    }
}

/// Trait for windowing policy implementations.
pub trait Chunker: Send + Sync {
    /// Split caption segments into chunks. Returns an empty list when
    /// nothing survives cleaning; never errors.
    fn chunk(&self, source_id: &str, segments: &[RawSegment]) -> Vec<Chunk>;
}

/// Create a chunker for the configured policy.
pub fn create_chunker(settings: &ChunkingSettings) -> Result<Box<dyn Chunker>> {
    match settings.policy {
        ChunkingPolicy::Time => Ok(Box::new(TimeWindowChunker::new(
            settings.block_duration as f64,
            settings.block_overlap as f64,
        )?)),
        ChunkingPolicy::Token => Ok(Box::new(TokenWindowChunker::new(
            settings.chunk_size_tokens as usize,
            settings.chunk_overlap_tokens as usize,
        )?)),
    }
}

/// Caption text cleanup shared by both windowing policies.
///
/// Strips markup tags, bracketed or parenthetical annotations, and inline
/// timestamp markers; collapses whitespace runs to single spaces.
pub(crate) struct SegmentCleaner {
    tags: Regex,
    annotations: Regex,
    timestamps: Regex,
    whitespace: Regex,
}

impl SegmentCleaner {
    pub(crate) fn new() -> Self {
        Self {
            tags: Regex::new(r"<[^>]*>").expect("Invalid tag regex"),
            annotations: Regex::new(r"\[[^\]]*\]|\([^)]*\)").expect("Invalid annotation regex"),
            timestamps: Regex::new(r"\b\d{1,2}:\d{2}(?::\d{2})?(?:[.,]\d+)?\b")
                .expect("Invalid timestamp regex"),
            whitespace: Regex::new(r"\s+").expect("Invalid whitespace regex"),
        }
    }

    pub(crate) fn clean(&self, text: &str) -> String {
        let text = self.tags.replace_all(text, " ");
        let text = self.annotations.replace_all(&text, " ");
        let text = self.timestamps.replace_all(&text, " ");
        self.whitespace.replace_all(&text, " ").trim().to_string()
    }

    /// Clean every segment, drop the ones that become empty, and collapse
    /// consecutive duplicates (caption sources repeat rolling lines).
    pub(crate) fn prepare(&self, segments: &[RawSegment]) -> Vec<RawSegment> {
        let mut prepared: Vec<RawSegment> = Vec::with_capacity(segments.len());

        for segment in segments {
            let text = self.clean(&segment.text);
            if text.is_empty() {
                continue;
            }
            if prepared.last().is_some_and(|prev| prev.text == text) {
                continue;
            }
            prepared.push(RawSegment::new(text, segment.start, segment.duration));
        }

        prepared
    }
}
