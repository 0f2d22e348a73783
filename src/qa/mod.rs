//! Question answering over indexed transcripts.
//!
//! A query either produces an answer or lands on one of a small set of
//! terminal outcomes; no error type crosses this boundary. The two
//! pipeline variants (with and without reranking) share the retrieval and
//! answer-assembly steps.

mod pipeline;

pub use pipeline::{create_pipeline, AnswerPipeline, DirectPipeline, RerankedPipeline};

/// Terminal result of one query.
///
/// Boundary layers (CLI, HTTP) map each variant to user-facing text or a
/// status code exactly once; internals only ever pass the variant around.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// A generated answer.
    Answer(String),
    /// The caller-supplied video reference could not be resolved.
    InvalidReference,
    /// No transcript could be obtained for the video by any path.
    NoTranscript,
    /// The index returned no matching passages for the question.
    NothingFound,
    /// An internal failure with no more specific outcome.
    Failed,
}

impl QueryOutcome {
    /// Stable user-facing message for this outcome.
    pub fn user_message(&self) -> &str {
        match self {
            QueryOutcome::Answer(answer) => answer,
            QueryOutcome::InvalidReference => "Invalid video reference.",
            QueryOutcome::NoTranscript => "No transcript is available for this video.",
            QueryOutcome::NothingFound => {
                "No matching transcript passages were found for this question."
            }
            QueryOutcome::Failed => "The question could not be processed.",
        }
    }

    /// Machine-readable outcome kind, used by the HTTP API and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryOutcome::Answer(_) => "answer",
            QueryOutcome::InvalidReference => "invalid_reference",
            QueryOutcome::NoTranscript => "no_transcript",
            QueryOutcome::NothingFound => "nothing_found",
            QueryOutcome::Failed => "failed",
        }
    }

    pub fn is_answer(&self) -> bool {
        matches!(self, QueryOutcome::Answer(_))
    }
}
