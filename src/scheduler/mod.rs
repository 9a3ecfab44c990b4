//! Per-frame playback scheduling: selects the active viseme from the
//! segment timeline under a moving clock, with anti-flicker smoothing
//! and a live-amplitude fallback when no alignment data exists.
//!
//! The scheduler is synchronous and single-owner. The host calls
//! [`Scheduler::tick`] once per animation frame with the current
//! playback clock; ticks are no-ops unless the scheduler is playing.

use crate::alignment::segment::Segment;
use crate::config::SchedulerConfig;
use crate::viseme::Viseme;
use tracing::debug;

/// Playback lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No track loaded.
    Idle,
    /// Track loaded, clock at zero, mouth at rest.
    Stopped,
    /// Tick loop active.
    Playing,
    /// Tick loop suspended, mouth forced to rest.
    Paused,
}

/// Events produced by a tick (or a lifecycle transition), at most one
/// per kind per tick.
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerEvent {
    /// The displayed mouth shape changed.
    VisemeChanged {
        viseme: Viseme,
        label: &'static str,
    },
    /// The active segment index changed (for token-highlight UIs).
    ActiveSegmentChanged { index: Option<usize> },
}

/// Result of one scheduler tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutput {
    pub viseme: Viseme,
    pub active_segment: Option<usize>,
    pub events: Vec<SchedulerEvent>,
}

/// Per-frame viseme scheduler.
pub struct Scheduler {
    config: SchedulerConfig,
    segments: Vec<Segment>,
    state: PlaybackState,
    current_viseme: Viseme,
    active_segment: Option<usize>,
    /// Clock value at which a segment last drove the viseme.
    last_active_viseme_time: f64,
    /// Clock value of the last fallback-mode viseme switch.
    last_fallback_switch: f64,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            segments: Vec::new(),
            state: PlaybackState::Idle,
            current_viseme: Viseme::Neutral,
            active_segment: None,
            last_active_viseme_time: 0.0,
            last_fallback_switch: 0.0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_viseme(&self) -> Viseme {
        self.current_viseme
    }

    pub fn active_segment(&self) -> Option<usize> {
        self.active_segment
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Load a track's segment timeline. Idle -> Stopped. An empty
    /// timeline is legal: playback then runs in live-fallback mode.
    pub fn load(&mut self, segments: Vec<Segment>) {
        debug!("track loaded with {} segments", segments.len());
        self.segments = segments;
        self.state = PlaybackState::Stopped;
        self.reset_tick_state();
    }

    /// Replace the segment timeline wholesale (alignment hot-swap).
    /// The next tick recomputes the active segment from scratch.
    pub fn swap_segments(&mut self, segments: Vec<Segment>) {
        debug!("alignment hot-swap: {} segments", segments.len());
        self.segments = segments;
        self.active_segment = None;
    }

    /// Stopped/Paused -> Playing. Ignored in other states.
    pub fn play(&mut self) {
        if matches!(self.state, PlaybackState::Stopped | PlaybackState::Paused) {
            self.state = PlaybackState::Playing;
        }
    }

    /// Playing -> Paused. Forces the mouth to rest immediately,
    /// independent of the grace period.
    pub fn pause(&mut self) -> Vec<SchedulerEvent> {
        if self.state != PlaybackState::Playing {
            return Vec::new();
        }
        self.state = PlaybackState::Paused;
        let mut events = Vec::new();
        self.set_viseme(Viseme::Neutral, &mut events);
        events
    }

    /// Playing/Paused -> Stopped. Resets all tick state.
    pub fn stop(&mut self) -> Vec<SchedulerEvent> {
        if !matches!(self.state, PlaybackState::Playing | PlaybackState::Paused) {
            return Vec::new();
        }
        self.state = PlaybackState::Stopped;
        let mut events = Vec::new();
        self.set_viseme(Viseme::Neutral, &mut events);
        if self.active_segment.is_some() {
            self.active_segment = None;
            events.push(SchedulerEvent::ActiveSegmentChanged { index: None });
        }
        self.last_active_viseme_time = 0.0;
        self.last_fallback_switch = 0.0;
        events
    }

    /// Any state -> Idle. Discards the segment timeline.
    pub fn unload(&mut self) {
        self.segments.clear();
        self.state = PlaybackState::Idle;
        self.reset_tick_state();
    }

    /// Advance one animation frame.
    ///
    /// `clock` is the playback position in seconds, owned by the host
    /// and monotonic while playing. `amplitude` is the live
    /// frequency/amplitude buffer (0–255 scale) used only when no
    /// alignment data was loaded. No-op unless playing.
    pub fn tick(&mut self, clock: f64, amplitude: Option<&[f32]>) -> TickOutput {
        if self.state != PlaybackState::Playing {
            return TickOutput {
                viseme: self.current_viseme,
                active_segment: self.active_segment,
                events: Vec::new(),
            };
        }

        let mut events = Vec::new();

        // Half-open intervals: a segment is active for start <= t < end,
        // so a shared boundary activates exactly one of two neighbors.
        let active = self
            .segments
            .iter()
            .position(|s| clock >= s.start && clock < s.end);

        if let Some(index) = active {
            let viseme = self.segments[index].viseme;
            self.last_active_viseme_time = clock;
            self.set_viseme(viseme, &mut events);
        } else if !self.segments.is_empty() {
            // In a gap between segments: hold the previous shape briefly
            // so micro-gaps don't flash neutral.
            let since_active = clock - self.last_active_viseme_time;
            if since_active > self.config.neutral_grace_secs {
                self.set_viseme(Viseme::Neutral, &mut events);
            }
        } else if let Some(buffer) = amplitude {
            self.tick_fallback(clock, buffer, &mut events);
        }

        if active != self.active_segment {
            self.active_segment = active;
            events.push(SchedulerEvent::ActiveSegmentChanged { index: active });
        }

        TickOutput {
            viseme: self.current_viseme,
            active_segment: self.active_segment,
            events,
        }
    }

    /// Degraded mode: no alignment data was ever loaded, so drive the
    /// mouth from coarse volume banding with its own switch debounce.
    fn tick_fallback(&mut self, clock: f64, buffer: &[f32], events: &mut Vec<SchedulerEvent>) {
        let mean = mean_magnitude(buffer);
        let viseme = self.band_viseme(mean);
        if viseme != self.current_viseme
            && clock - self.last_fallback_switch >= self.config.fallback_debounce_secs
        {
            self.last_fallback_switch = clock;
            self.set_viseme(viseme, events);
        }
    }

    fn band_viseme(&self, mean: f32) -> Viseme {
        let c = &self.config;
        if mean > c.fallback_wide_open {
            Viseme::A
        } else if mean > c.fallback_medium_open {
            Viseme::O
        } else if mean > c.fallback_slight_open {
            Viseme::E
        } else if mean > c.fallback_closed_active {
            Viseme::M
        } else {
            Viseme::Neutral
        }
    }

    fn set_viseme(&mut self, viseme: Viseme, events: &mut Vec<SchedulerEvent>) {
        if viseme == self.current_viseme {
            return;
        }
        self.current_viseme = viseme;
        events.push(SchedulerEvent::VisemeChanged {
            viseme,
            label: viseme.label(),
        });
    }

    fn reset_tick_state(&mut self) {
        self.current_viseme = Viseme::Neutral;
        self.active_segment = None;
        self.last_active_viseme_time = 0.0;
        self.last_fallback_switch = 0.0;
    }
}

/// Mean magnitude of an amplitude buffer. Empty buffers read as silent.
pub fn mean_magnitude(buffer: &[f32]) -> f32 {
    if buffer.is_empty() {
        return 0.0;
    }
    buffer.iter().sum::<f32>() / buffer.len() as f32
}
