//! Syllable segmentation and viseme phase expansion.
//!
//! Normalized tokens are grouped into syllables (runs of letter-class
//! tokens), each syllable is classified into onset / nucleus / coda
//! visemes, and then expanded into 1–3 timed phases with a proportional
//! duration split. The resulting segment list is what the scheduler
//! consumes every animation frame.

use super::AlignmentToken;
use crate::config::SegmenterConfig;
use crate::viseme::{self, Viseme};
use tracing::debug;

/// Proportional split when a syllable has both onset and coda.
const ONSET_FRACTION_FULL: f64 = 0.20;
const CODA_FRACTION_FULL: f64 = 0.25;
/// Onset share when there is no coda.
const ONSET_FRACTION: f64 = 0.25;
/// Vowel share when there is a coda but no onset.
const VOWEL_FRACTION_CODA_ONLY: f64 = 0.70;

/// One viseme phase consumed by the scheduler.
///
/// `display_text` carries the full syllable text on the vowel phase and
/// is empty on onset/coda phases; it is cosmetic only.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub display_text: String,
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds (half-open: the phase is active for
    /// `start <= t < end`).
    pub end: f64,
    pub viseme: Viseme,
}

/// Expand normalized tokens into the final timed phase sequence.
///
/// Soft-fails to an empty list when no syllables are found (e.g.
/// all-punctuation input) — a valid silent track, not an error. Gaps
/// between syllables are implicit neutral intervals, never emitted as
/// segments.
pub fn segment(tokens: &[AlignmentToken], config: &SegmenterConfig) -> Vec<Segment> {
    let syllables = syllabify(tokens);
    let mut segments = Vec::new();
    for syl in &syllables {
        expand_syllable(syl, config, &mut segments);
    }
    debug!(
        "expanded {} tokens -> {} segments ({} syllables)",
        tokens.len(),
        segments.len(),
        syllables.len()
    );
    segments
}

/// Group tokens into syllables: maximal runs of letter-class tokens,
/// split at empty tokens, spaces, and single non-letter characters.
fn syllabify(tokens: &[AlignmentToken]) -> Vec<Vec<AlignmentToken>> {
    let mut syllables = Vec::new();
    let mut current: Vec<AlignmentToken> = Vec::new();

    for token in tokens {
        let t = token.token.trim();
        let is_break = t.is_empty() || is_single_non_letter(t);
        if is_break {
            if !current.is_empty() {
                syllables.push(std::mem::take(&mut current));
            }
        } else {
            current.push(token.clone());
        }
    }
    if !current.is_empty() {
        syllables.push(current);
    }
    syllables
}

fn is_single_non_letter(trimmed: &str) -> bool {
    let mut chars = trimmed.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(ch), None) if !viseme::is_letter(ch)
    )
}

/// Onset / nucleus / coda visemes for one syllable.
struct SyllableShape {
    onset: Viseme,
    nucleus: Viseme,
    coda: Viseme,
}

/// Scan the syllable's characters left to right. The first character
/// before any vowel sets the onset; the first vowel sets the nucleus
/// (later vowels never override it); consonants after the nucleus set
/// the coda, last one winning. A vowel-less syllable animates as a
/// single phase at the onset viseme, with no coda.
fn classify_syllable(syl: &[AlignmentToken]) -> SyllableShape {
    let mut onset = Viseme::Neutral;
    let mut onset_set = false;
    let mut nucleus = Viseme::Neutral;
    let mut coda = Viseme::Neutral;
    let mut vowel_found = false;

    for token in syl {
        for ch in token.token.trim().to_lowercase().chars() {
            if viseme::is_vowel(ch) {
                if !vowel_found {
                    nucleus = viseme::classify(&ch.to_string());
                    vowel_found = true;
                }
            } else if !vowel_found {
                if !onset_set {
                    onset = viseme::classify(&ch.to_string());
                    onset_set = true;
                }
            } else {
                coda = viseme::classify(&ch.to_string());
            }
        }
    }

    if !vowel_found {
        nucleus = onset;
        coda = Viseme::Neutral;
    }

    SyllableShape {
        onset,
        nucleus,
        coda,
    }
}

fn expand_syllable(syl: &[AlignmentToken], config: &SegmenterConfig, out: &mut Vec<Segment>) {
    let start = syl[0].start;
    let end = syl[syl.len() - 1].end;
    let duration = end - start;
    let text: String = syl.iter().map(|t| t.token.as_str()).collect();

    let shape = classify_syllable(syl);

    // Too short to articulate sub-phases.
    if duration < config.short_syllable_secs {
        out.push(Segment {
            display_text: text,
            start,
            end,
            viseme: shape.nucleus,
        });
        return;
    }

    let has_onset = shape.onset != Viseme::Neutral && shape.onset != shape.nucleus;
    let has_coda = shape.coda != Viseme::Neutral && shape.coda != shape.nucleus;

    match (has_onset, has_coda) {
        (true, true) => {
            let onset_end = start + duration * ONSET_FRACTION_FULL;
            // Coda start hangs off the syllable end, not the onset split.
            let coda_start = end - duration * CODA_FRACTION_FULL;
            out.push(Segment {
                display_text: String::new(),
                start,
                end: onset_end,
                viseme: shape.onset,
            });
            out.push(Segment {
                display_text: text,
                start: onset_end,
                end: coda_start,
                viseme: shape.nucleus,
            });
            out.push(Segment {
                display_text: String::new(),
                start: coda_start,
                end,
                viseme: shape.coda,
            });
        }
        (true, false) => {
            let onset_end = start + duration * ONSET_FRACTION;
            out.push(Segment {
                display_text: String::new(),
                start,
                end: onset_end,
                viseme: shape.onset,
            });
            out.push(Segment {
                display_text: text,
                start: onset_end,
                end,
                viseme: shape.nucleus,
            });
        }
        (false, true) => {
            let coda_start = start + duration * VOWEL_FRACTION_CODA_ONLY;
            out.push(Segment {
                display_text: text,
                start,
                end: coda_start,
                viseme: shape.nucleus,
            });
            out.push(Segment {
                display_text: String::new(),
                start: coda_start,
                end,
                viseme: shape.coda,
            });
        }
        (false, false) => {
            out.push(Segment {
                display_text: text,
                start,
                end,
                viseme: shape.nucleus,
            });
        }
    }
}
