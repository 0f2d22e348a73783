//! Time-based windowing policy.
//!
//! Fixed-duration windows advance by (duration − overlap) seconds across
//! the transcript; a segment belongs to every window whose range covers
//! its start time.

use super::{Chunk, Chunker, SegmentCleaner};
use crate::captions::RawSegment;
use crate::error::{HearsayError, Result};

/// Chunker producing overlapping fixed-duration windows.
pub struct TimeWindowChunker {
    duration: f64,
    overlap: f64,
    cleaner: SegmentCleaner,
}

impl TimeWindowChunker {
    pub fn new(duration: f64, overlap: f64) -> Result<Self> {
        if duration <= 0.0 {
            return Err(HearsayError::Config(format!(
                "block_duration must be positive, got {}",
                duration
            )));
        }
        if overlap < 0.0 || overlap >= duration {
            return Err(HearsayError::Config(format!(
                "block_overlap must be in [0, block_duration), got {} with duration {}",
                overlap, duration
            )));
        }

        Ok(Self {
            duration,
            overlap,
            cleaner: SegmentCleaner::new(),
        })
    }
}

impl Chunker for TimeWindowChunker {
    fn chunk(&self, source_id: &str, segments: &[RawSegment]) -> Vec<Chunk> {
        let prepared = self.cleaner.prepare(segments);
        let Some(first) = prepared.first() else {
            return Vec::new();
        };
        let span_end = prepared.last().map(RawSegment::end).unwrap_or(first.end());

        let stride = self.duration - self.overlap;
        let mut chunks = Vec::new();
        let mut window_start = first.start;

        while window_start < span_end {
            let window_end = window_start + self.duration;
            let covered: Vec<&RawSegment> = prepared
                .iter()
                .filter(|s| s.start >= window_start && s.start < window_end)
                .collect();

            if !covered.is_empty() {
                let text = covered
                    .iter()
                    .map(|s| s.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                // The chunk keeps its real extent: a long segment may run
                // past the nominal window end.
                let end = covered
                    .iter()
                    .map(|s| s.end())
                    .fold(window_start, f64::max);
                chunks.push(Chunk::new(text, window_start, end, source_id));
            }

            window_start += stride;
        }

        chunks
    }
}
