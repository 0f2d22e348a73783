//! Token-based windowing policy.
//!
//! Concatenates the cleaned transcript into one string, keeping a map
//! from character offsets back to segment timestamps, then walks the
//! token stream in overlapping fixed-size windows.

use super::{Chunk, Chunker, SegmentCleaner};
use crate::captions::RawSegment;
use crate::error::{HearsayError, Result};
use regex::Regex;
use std::collections::HashSet;

/// Byte range of one segment's text within the joined transcript, with
/// the segment's time range.
struct SegmentSpan {
    byte_start: usize,
    byte_end: usize,
    start: f64,
    end: f64,
}

/// Chunker producing overlapping fixed-size token windows.
pub struct TokenWindowChunker {
    size: usize,
    overlap: usize,
    cleaner: SegmentCleaner,
    token_regex: Regex,
}

impl TokenWindowChunker {
    pub fn new(size: usize, overlap: usize) -> Result<Self> {
        if size == 0 {
            return Err(HearsayError::Config(
                "chunk_size_tokens must be positive".to_string(),
            ));
        }
        if overlap >= size {
            return Err(HearsayError::Config(format!(
                "chunk_overlap_tokens must be less than chunk_size_tokens, got {} with size {}",
                overlap, size
            )));
        }

        Ok(Self {
            size,
            overlap,
            cleaner: SegmentCleaner::new(),
            token_regex: Regex::new(r"\S+").expect("Invalid token regex"),
        })
    }
}

impl Chunker for TokenWindowChunker {
    fn chunk(&self, source_id: &str, segments: &[RawSegment]) -> Vec<Chunk> {
        let prepared = self.cleaner.prepare(segments);
        if prepared.is_empty() {
            return Vec::new();
        }

        // Join segments with single spaces, recording where each one
        // lands so token offsets can be mapped back to timestamps.
        let mut text = String::new();
        let mut spans = Vec::with_capacity(prepared.len());
        for segment in &prepared {
            if !text.is_empty() {
                text.push(' ');
            }
            let byte_start = text.len();
            text.push_str(&segment.text);
            spans.push(SegmentSpan {
                byte_start,
                byte_end: text.len(),
                start: segment.start,
                end: segment.end(),
            });
        }

        let tokens: Vec<(usize, usize)> = self
            .token_regex
            .find_iter(&text)
            .map(|m| (m.start(), m.end()))
            .collect();
        if tokens.is_empty() {
            return Vec::new();
        }

        let stride = self.size - self.overlap;
        let mut chunks = Vec::new();
        let mut seen = HashSet::new();
        let mut index = 0;

        loop {
            let window = &tokens[index..(index + self.size).min(tokens.len())];
            let (first_start, _) = window[0];
            let (_, last_end) = window[window.len() - 1];

            let chunk_text = text[first_start..last_end].trim();
            if !chunk_text.is_empty() && seen.insert(chunk_text.to_string()) {
                let start = time_at(&spans, first_start).0;
                let end = time_at(&spans, last_end - 1).1;
                chunks.push(Chunk::new(chunk_text, start, end, source_id));
            }

            if index + self.size >= tokens.len() {
                break;
            }
            index += stride;
        }

        chunks
    }
}

/// Timestamps of the segment whose text covers the given byte offset.
///
/// Tokens never straddle segments because the joiner space sits between
/// spans, so every token byte lies inside exactly one span.
fn time_at(spans: &[SegmentSpan], byte_offset: usize) -> (f64, f64) {
    let idx = spans.partition_point(|s| s.byte_end <= byte_offset);
    let span = &spans[idx];
    (span.start, span.end)
}
