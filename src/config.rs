//! Configuration types for the lip-sync pipeline.

use serde::{Deserialize, Serialize};

/// Top-level configuration for the player.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Syllable segmentation and phase expansion settings.
    pub segmenter: SegmenterConfig,
    /// Per-frame scheduling settings.
    pub scheduler: SchedulerConfig,
    /// Tick rate of the animation driver in Hz.
    pub tick_hz: u32,
}

/// Syllable segmentation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Syllables shorter than this (seconds) collapse to a single
    /// vowel phase instead of an onset/vowel/coda split.
    pub short_syllable_secs: f64,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            short_syllable_secs: 0.06,
        }
    }
}

/// Scheduler smoothing and fallback configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Grace period in seconds before the mouth returns to neutral when
    /// the clock falls into a gap between segments. Gaps shorter than
    /// this hold the previous viseme to avoid flicker.
    pub neutral_grace_secs: f64,
    /// Minimum seconds between viseme switches in live-amplitude
    /// fallback mode. Suppresses jitter from the amplitude buffer.
    pub fallback_debounce_secs: f64,
    /// Mean-magnitude thresholds for fallback banding, on the 0–255
    /// scale of a byte frequency buffer. Loudest band first.
    pub fallback_wide_open: f32,
    pub fallback_medium_open: f32,
    pub fallback_slight_open: f32,
    pub fallback_closed_active: f32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            neutral_grace_secs: 0.08,
            fallback_debounce_secs: 0.05,
            fallback_wide_open: 70.0,
            fallback_medium_open: 40.0,
            fallback_slight_open: 15.0,
            fallback_closed_active: 5.0,
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            segmenter: SegmenterConfig::default(),
            scheduler: SchedulerConfig::default(),
            tick_hz: 60,
        }
    }
}
