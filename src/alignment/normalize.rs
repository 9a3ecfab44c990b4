//! Alignment repair: metadata stripping, padding removal, and rescaling
//! raw aligner timestamps against the decoded audio duration.

use super::AlignmentToken;
use tracing::{debug, info};

/// Timebase drift below this (seconds) is left alone.
const RESCALE_TOLERANCE_SECS: f64 = 0.1;

/// Repair a raw token sequence against the authoritative audio duration.
///
/// Three steps, each skipped when its precondition is absent:
/// 1. strip a leading `[` .. `]` metadata header and shift the
///    remaining timestamps back to zero,
/// 2. drop trailing padding tokens (empty after trim),
/// 3. rescale all timestamps when the aligner's end time disagrees with
///    `audio_duration` by more than 0.1 s.
///
/// Soft-fails: with no known duration or no tokens the input comes back
/// unchanged (possibly empty). Ordering is always preserved.
pub fn normalize(
    mut tokens: Vec<AlignmentToken>,
    audio_duration: Option<f64>,
) -> Vec<AlignmentToken> {
    let Some(duration) = audio_duration else {
        return tokens;
    };
    if tokens.is_empty() || duration <= 0.0 {
        return tokens;
    }

    strip_metadata_header(&mut tokens);

    while tokens.last().is_some_and(|t| t.token.trim().is_empty()) {
        tokens.pop();
    }
    if tokens.is_empty() {
        return tokens;
    }

    let json_end = tokens[tokens.len() - 1].end;
    if json_end <= 0.0 {
        return tokens;
    }

    if (json_end - duration).abs() > RESCALE_TOLERANCE_SECS {
        let scale = duration / json_end;
        info!(
            "rescaling alignment: {json_end:.3}s -> {duration:.3}s (x{scale:.2})"
        );
        for t in &mut tokens {
            t.start *= scale;
            t.end *= scale;
        }
    }

    tokens
}

/// Drop a leading `[` .. `]` header (non-speech metadata emitted by the
/// aligner) and shift everything after it back by the header's end time.
fn strip_metadata_header(tokens: &mut Vec<AlignmentToken>) {
    if tokens.first().map(|t| t.token.as_str()) != Some("[") {
        return;
    }
    let Some(close) = tokens.iter().position(|t| t.token == "]") else {
        return;
    };
    let offset = tokens[close].end;
    debug!("stripping alignment metadata header ({} tokens)", close + 1);
    tokens.drain(0..=close);
    for t in tokens.iter_mut() {
        t.start = (t.start - offset).max(0.0);
        t.end -= offset;
    }
}
