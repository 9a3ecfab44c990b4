//! Alignment data: the per-character timing file produced by an
//! external speech aligner, and its repair/expansion pipeline.
//!
//! Raw tokens flow through [`normalize`](normalize::normalize) (repair
//! against the decoded audio duration) and then
//! [`segment`](segment::segment) (syllable grouping + viseme phase
//! expansion) before the scheduler ever sees them.

pub mod normalize;
pub mod segment;

use crate::error::{LipSyncError, Result};
use serde::{Deserialize, Serialize};

/// One timed token from the aligner. Usually a single character;
/// whitespace, punctuation, and empty placeholder tokens also occur.
///
/// Input invariant: tokens arrive time-ordered and non-overlapping.
/// `start == end` is legal for zero-duration placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentToken {
    pub token: String,
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
}

/// Parse an alignment file: a JSON array of `{token, start, end}`.
///
/// # Errors
///
/// Returns [`LipSyncError::Alignment`] on invalid JSON or missing
/// fields. Callers treat this as non-fatal and fall back to audio-only
/// playback.
pub fn parse_alignment(json: &str) -> Result<Vec<AlignmentToken>> {
    serde_json::from_str(json).map_err(|e| LipSyncError::Alignment(format!("invalid JSON: {e}")))
}
