//! Lipsync: alignment-driven viseme scheduling for 2D mouth animation.
//!
//! Drives a sequence of discrete mouth-shape images from an audio
//! track, using a per-character timing file produced by an external
//! speech aligner:
//! Alignment JSON → Normalizer → Segmenter → per-frame Scheduler
//!
//! # Architecture
//!
//! - **Viseme classifier**: maps single characters to the fixed
//!   20-entry mouth-shape chart
//! - **Alignment normalizer**: repairs raw aligner timestamps against
//!   the decoded audio duration
//! - **Syllable segmenter**: expands syllables into onset/vowel/coda
//!   phases with proportional timing
//! - **Playback scheduler**: per-frame viseme selection with gap grace
//!   periods, plus a live-amplitude fallback when no alignment exists
//! - **Player**: track lifecycle, hot-swap, clock, and the tick driver

pub mod alignment;
pub mod audio;
pub mod config;
pub mod error;
pub mod player;
pub mod scheduler;
pub mod viseme;

pub use alignment::segment::Segment;
pub use alignment::{AlignmentToken, parse_alignment};
pub use config::{PlayerConfig, SchedulerConfig, SegmenterConfig};
pub use error::{LipSyncError, Result};
pub use player::{Player, PlayerCommand, PlayerEvent};
pub use scheduler::{PlaybackState, Scheduler, SchedulerEvent, TickOutput};
pub use viseme::{Viseme, classify};
