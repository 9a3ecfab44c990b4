//! Track lifecycle and the per-frame tick driver.
//!
//! [`Player`] owns the scheduler and the playback clock, wires the
//! alignment pipeline to track loading (including alignment hot-swap
//! and the deferred-processing case where alignment arrives before the
//! audio duration is known), and fans scheduler events out to
//! subscribers over a broadcast channel.

use crate::alignment::normalize::normalize;
use crate::alignment::segment::segment;
use crate::alignment::{AlignmentToken, parse_alignment};
use crate::audio::probe_duration;
use crate::config::PlayerConfig;
use crate::error::{LipSyncError, Result};
use crate::scheduler::{PlaybackState, Scheduler, SchedulerEvent, TickOutput};
use crate::viseme::Viseme;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};

const EVENT_CHANNEL_SIZE: usize = 64;

/// Transport commands consumed by the tick driver while it owns the
/// player (see [`Player::run`]).
#[derive(Debug)]
pub enum PlayerCommand {
    Play,
    Pause,
    Stop,
    /// Replace the alignment data (hot-swap) mid-track.
    SwapAlignment(String),
    Unload,
}

/// Events published to UI collaborators.
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    /// A track finished loading.
    TrackLoaded {
        duration_secs: Option<f64>,
        segments: usize,
    },
    /// Alignment data was replaced while the track stayed loaded.
    AlignmentSwapped { segments: usize },
    /// Alignment data was discarded as malformed; playback continues
    /// audio-only (live-fallback mode). Non-fatal.
    AlignmentRejected { reason: String },
    /// The displayed mouth shape changed.
    VisemeChanged {
        viseme: Viseme,
        label: &'static str,
    },
    /// The active segment index changed.
    ActiveSegmentChanged { index: Option<usize> },
}

/// Owns the scheduler, the playback clock, and the loaded track state.
///
/// Single-owner by design: the player is the only writer of segments
/// and scheduler state. A multi-threaded embedder must serialize
/// `swap_alignment` against `tick_now` (e.g. behind one lock), since a
/// mid-scan segment replacement is undefined.
pub struct Player {
    config: PlayerConfig,
    scheduler: Scheduler,
    events: broadcast::Sender<PlayerEvent>,
    duration: Option<f64>,
    /// Alignment parked until the audio duration becomes known.
    pending: Option<Vec<AlignmentToken>>,
    /// Clock accumulated across previous play intervals.
    clock_base: f64,
    /// Set while playing; clock = base + elapsed.
    playing_since: Option<Instant>,
}

impl Player {
    pub fn new(config: PlayerConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let scheduler = Scheduler::new(config.scheduler.clone());
        Self {
            config,
            scheduler,
            events,
            duration: None,
            pending: None,
            clock_base: 0.0,
            playing_since: None,
        }
    }

    /// Subscribe to player events.
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> PlaybackState {
        self.scheduler.state()
    }

    pub fn current_viseme(&self) -> Viseme {
        self.scheduler.current_viseme()
    }

    pub fn duration_secs(&self) -> Option<f64> {
        self.duration
    }

    /// Load a track given its audio duration (when already known) and
    /// optional alignment JSON. With no duration yet, alignment is
    /// parked raw and processed once [`set_duration`](Self::set_duration)
    /// is called.
    pub fn load_track(&mut self, duration_secs: Option<f64>, alignment_json: Option<&str>) {
        self.duration = duration_secs;
        self.pending = None;
        self.clock_base = 0.0;
        self.playing_since = None;

        let segments = match alignment_json {
            Some(json) => match self.ingest_alignment(json) {
                // No duration yet: park the raw tokens for set_duration.
                Some(tokens) if self.duration.is_none() => {
                    self.pending = Some(tokens);
                    Vec::new()
                }
                Some(tokens) => self.process_tokens(tokens),
                None => Vec::new(),
            },
            None => Vec::new(),
        };

        let count = segments.len();
        self.scheduler.load(segments);
        info!(
            "track loaded: duration={:?}s, {count} segments",
            self.duration
        );
        let _ = self.events.send(PlayerEvent::TrackLoaded {
            duration_secs: self.duration,
            segments: count,
        });
    }

    /// Load a track from an audio file, measuring its duration by
    /// decoding it.
    ///
    /// # Errors
    ///
    /// Returns an error only when the audio itself is unreadable (fatal
    /// for the track); malformed alignment degrades to audio-only.
    pub fn load_track_from_file(
        &mut self,
        audio: &Path,
        alignment_json: Option<&str>,
    ) -> Result<()> {
        let duration = probe_duration(audio)?;
        self.load_track(Some(duration), alignment_json);
        Ok(())
    }

    /// Supply the audio duration once media metadata resolves. Any
    /// parked alignment is processed and swapped in now.
    pub fn set_duration(&mut self, duration_secs: f64) {
        self.duration = Some(duration_secs);
        if let Some(tokens) = self.pending.take() {
            let segments = self.process_tokens(tokens);
            let count = segments.len();
            self.scheduler.swap_segments(segments);
            let _ = self
                .events
                .send(PlayerEvent::AlignmentSwapped { segments: count });
        }
    }

    /// Replace the alignment data while the track stays loaded.
    ///
    /// # Errors
    ///
    /// Returns [`LipSyncError::Playback`] when no track is loaded.
    /// Malformed JSON is not an error: it is rejected with a warning
    /// event and the current segments are kept.
    pub fn swap_alignment(&mut self, alignment_json: &str) -> Result<()> {
        if self.scheduler.state() == PlaybackState::Idle {
            return Err(LipSyncError::Playback("no track loaded".into()));
        }
        let Some(tokens) = self.ingest_alignment(alignment_json) else {
            return Ok(());
        };
        if self.duration.is_none() {
            self.pending = Some(tokens);
            return Ok(());
        }
        let segments = self.process_tokens(tokens);
        let count = segments.len();
        self.scheduler.swap_segments(segments);
        let _ = self
            .events
            .send(PlayerEvent::AlignmentSwapped { segments: count });
        Ok(())
    }

    /// Begin or resume playback.
    ///
    /// # Errors
    ///
    /// Returns [`LipSyncError::Playback`] when no track is loaded.
    pub fn play(&mut self) -> Result<()> {
        if self.scheduler.state() == PlaybackState::Idle {
            return Err(LipSyncError::Playback("no track loaded".into()));
        }
        self.scheduler.play();
        if self.playing_since.is_none() {
            self.playing_since = Some(Instant::now());
        }
        Ok(())
    }

    /// Suspend playback. The mouth rests immediately, independent of
    /// the gap grace period.
    pub fn pause(&mut self) {
        if let Some(since) = self.playing_since.take() {
            self.clock_base += since.elapsed().as_secs_f64();
        }
        let events = self.scheduler.pause();
        self.forward(events);
    }

    /// Stop playback and reset the clock to zero.
    pub fn stop(&mut self) {
        self.clock_base = 0.0;
        self.playing_since = None;
        let events = self.scheduler.stop();
        self.forward(events);
    }

    /// Unload the track entirely.
    pub fn unload(&mut self) {
        self.scheduler.unload();
        self.duration = None;
        self.pending = None;
        self.clock_base = 0.0;
        self.playing_since = None;
    }

    /// Jump the playback clock.
    pub fn seek(&mut self, secs: f64) {
        let clamped = match self.duration {
            Some(d) => secs.clamp(0.0, d),
            None => secs.max(0.0),
        };
        self.clock_base = clamped;
        if self.playing_since.is_some() {
            self.playing_since = Some(Instant::now());
        }
    }

    /// Current playback position in seconds, bounded by the duration.
    pub fn clock_secs(&self) -> f64 {
        let elapsed = self
            .playing_since
            .map(|since| since.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        let clock = self.clock_base + elapsed;
        match self.duration {
            Some(d) => clock.min(d),
            None => clock,
        }
    }

    /// Run one animation frame against the current clock. `amplitude`
    /// feeds the live fallback when no alignment data exists.
    pub fn tick_now(&mut self, amplitude: Option<&[f32]>) -> TickOutput {
        let clock = self.clock_secs();
        let out = self.scheduler.tick(clock, amplitude);
        self.forward(out.events.clone());
        out
    }

    /// Drive the tick loop at the configured rate, taking transport
    /// control from `commands`. The loop exits on
    /// [`PlayerCommand::Unload`] or when the command channel closes;
    /// pause suspends viseme updates without exiting, so resume needs
    /// no external restart. `amplitude` is polled every frame for the
    /// live-fallback buffer.
    pub async fn run<F>(&mut self, mut commands: mpsc::Receiver<PlayerCommand>, mut amplitude: F)
    where
        F: FnMut() -> Option<Vec<f32>>,
    {
        let period = Duration::from_secs(1) / self.config.tick_hz.max(1);
        let mut ticker = tokio::time::interval(period);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.scheduler.state() == PlaybackState::Idle {
                        break;
                    }
                    let buffer = amplitude();
                    self.tick_now(buffer.as_deref());
                }
                command = commands.recv() => match command {
                    Some(PlayerCommand::Play) => {
                        if let Err(e) = self.play() {
                            warn!("play command ignored: {e}");
                        }
                    }
                    Some(PlayerCommand::Pause) => self.pause(),
                    Some(PlayerCommand::Stop) => self.stop(),
                    Some(PlayerCommand::SwapAlignment(json)) => {
                        if let Err(e) = self.swap_alignment(&json) {
                            warn!("alignment swap ignored: {e}");
                        }
                    }
                    // Channel closed counts as unload: all control
                    // handles are gone, so the driver cannot be stopped
                    // any other way.
                    Some(PlayerCommand::Unload) | None => {
                        self.unload();
                        break;
                    }
                },
            }
        }
    }

    /// Parse alignment JSON; on failure emit a rejection event and
    /// return `None` (audio-only degradation, never a hard error).
    fn ingest_alignment(&mut self, json: &str) -> Option<Vec<AlignmentToken>> {
        match parse_alignment(json) {
            Ok(tokens) => Some(tokens),
            Err(e) => {
                warn!("discarding alignment data: {e}");
                let _ = self.events.send(PlayerEvent::AlignmentRejected {
                    reason: e.to_string(),
                });
                None
            }
        }
    }

    fn process_tokens(&self, tokens: Vec<AlignmentToken>) -> Vec<crate::alignment::segment::Segment> {
        let normalized = normalize(tokens, self.duration);
        segment(&normalized, &self.config.segmenter)
    }

    fn forward(&self, events: Vec<SchedulerEvent>) {
        for event in events {
            let mapped = match event {
                SchedulerEvent::VisemeChanged { viseme, label } => {
                    PlayerEvent::VisemeChanged { viseme, label }
                }
                SchedulerEvent::ActiveSegmentChanged { index } => {
                    PlayerEvent::ActiveSegmentChanged { index }
                }
            };
            let _ = self.events.send(mapped);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALIGNMENT: &str = r#"[
        {"token":"t","start":0.0,"end":0.1},
        {"token":"ô","start":0.1,"end":0.2},
        {"token":"i","start":0.2,"end":0.3}
    ]"#;

    #[test]
    fn load_builds_segments() {
        let mut p = Player::new(PlayerConfig::default());
        p.load_track(Some(0.3), Some(ALIGNMENT));
        assert_eq!(p.state(), PlaybackState::Stopped);
        assert_eq!(p.scheduler.segments().len(), 2);
    }

    #[test]
    fn malformed_alignment_degrades_to_audio_only() {
        let mut p = Player::new(PlayerConfig::default());
        let mut rx = p.subscribe();
        p.load_track(Some(1.0), Some("{broken"));
        assert_eq!(p.state(), PlaybackState::Stopped);
        assert!(p.scheduler.segments().is_empty());
        assert!(matches!(
            rx.try_recv(),
            Ok(PlayerEvent::AlignmentRejected { .. })
        ));
    }

    #[test]
    fn alignment_waits_for_duration() {
        let mut p = Player::new(PlayerConfig::default());
        p.load_track(None, None);
        p.swap_alignment(ALIGNMENT).expect("track is loaded");
        // Parked: no duration yet, nothing to schedule against.
        assert!(p.scheduler.segments().is_empty());
        p.set_duration(0.3);
        assert_eq!(p.scheduler.segments().len(), 2);
    }

    #[test]
    fn alignment_at_load_time_also_waits_for_duration() {
        let mut p = Player::new(PlayerConfig::default());
        p.load_track(None, Some(ALIGNMENT));
        assert!(p.scheduler.segments().is_empty());
        p.set_duration(0.3);
        assert_eq!(p.scheduler.segments().len(), 2);
    }

    #[test]
    fn play_without_track_is_an_error() {
        let mut p = Player::new(PlayerConfig::default());
        assert!(p.play().is_err());
    }

    #[test]
    fn hot_swap_replaces_segments() {
        let mut p = Player::new(PlayerConfig::default());
        p.load_track(Some(0.3), Some(ALIGNMENT));
        p.swap_alignment(r#"[{"token":"a","start":0.0,"end":0.3}]"#)
            .expect("track is loaded");
        assert_eq!(p.scheduler.segments().len(), 1);
        assert_eq!(p.scheduler.segments()[0].viseme, Viseme::A);
    }

    #[test]
    fn malformed_hot_swap_keeps_old_segments() {
        let mut p = Player::new(PlayerConfig::default());
        p.load_track(Some(0.3), Some(ALIGNMENT));
        p.swap_alignment("nope").expect("rejection is not an error");
        assert_eq!(p.scheduler.segments().len(), 2);
    }

    #[tokio::test]
    async fn run_loop_honors_transport_commands() {
        let mut p = Player::new(PlayerConfig::default());
        p.load_track(Some(0.3), Some(ALIGNMENT));
        let (tx, rx) = mpsc::channel(8);
        tx.send(PlayerCommand::Play).await.expect("driver not started yet");
        tx.send(PlayerCommand::Pause).await.expect("queue command");
        tx.send(PlayerCommand::Unload).await.expect("queue command");
        p.run(rx, || None).await;
        assert_eq!(p.state(), PlaybackState::Idle);
        assert!(p.duration_secs().is_none());
    }

    #[tokio::test]
    async fn run_loop_exits_when_control_handles_drop() {
        let mut p = Player::new(PlayerConfig::default());
        p.load_track(Some(0.3), None);
        let (tx, rx) = mpsc::channel::<PlayerCommand>(1);
        drop(tx);
        p.run(rx, || None).await;
        assert_eq!(p.state(), PlaybackState::Idle);
    }

    #[test]
    fn stop_resets_clock() {
        let mut p = Player::new(PlayerConfig::default());
        p.load_track(Some(0.3), Some(ALIGNMENT));
        p.play().expect("track is loaded");
        p.stop();
        assert_eq!(p.state(), PlaybackState::Stopped);
        assert!(p.clock_secs() < 1e-9);
    }
}
