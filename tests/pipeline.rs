//! End-to-end pipeline tests: alignment JSON through normalization,
//! segmentation, and per-frame scheduling.

use lipsync::alignment::normalize::normalize;
use lipsync::alignment::segment::segment;
use lipsync::{
    AlignmentToken, PlaybackState, Player, PlayerConfig, Scheduler, SchedulerConfig,
    SegmenterConfig, Viseme, parse_alignment,
};

fn expand(json: &str, duration: f64) -> Vec<lipsync::Segment> {
    let tokens = parse_alignment(json).expect("valid alignment");
    let normalized = normalize(tokens, Some(duration));
    segment(&normalized, &SegmenterConfig::default())
}

#[test]
fn metadata_header_strips_and_shifts() {
    // Header dropped, remainder shifted to zero; the 0.4s end matches
    // the audio duration within tolerance, so no rescale on top.
    let json = r#"[
        {"token":"[","start":0.0,"end":0.0},
        {"token":"lang:vi","start":0.0,"end":0.2},
        {"token":"]","start":0.2,"end":0.3},
        {"token":"x","start":0.3,"end":0.5},
        {"token":"i","start":0.5,"end":0.7}
    ]"#;
    let tokens = parse_alignment(json).expect("valid alignment");
    let normalized = normalize(tokens, Some(0.4));
    assert_eq!(normalized.len(), 2);
    assert_eq!(normalized[0].token, "x");
    assert!((normalized[0].start - 0.0).abs() < 1e-9);
    assert!((normalized[0].end - 0.2).abs() < 1e-9);
    assert!((normalized[1].start - 0.2).abs() < 1e-9);
    assert!((normalized[1].end - 0.4).abs() < 1e-9);
}

#[test]
fn toi_expands_to_onset_and_vowel() {
    // "tôi": onset t (15) over the first quarter, nucleus ô (3) over
    // the rest; the first vowel wins the nucleus.
    let json = r#"[
        {"token":"t","start":0.0,"end":0.1},
        {"token":"ô","start":0.1,"end":0.2},
        {"token":"i","start":0.2,"end":0.3}
    ]"#;
    let segments = expand(json, 0.3);
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].viseme.id(), 15);
    assert!((segments[0].end - 0.075).abs() < 1e-9);
    assert_eq!(segments[1].viseme.id(), 3);
    assert!((segments[1].end - 0.3).abs() < 1e-9);
}

#[test]
fn empty_alignment_falls_back_to_amplitude() {
    // No alignment ever loaded: a mean magnitude of 55 bands to the
    // medium-open shape (id 12).
    let mut scheduler = Scheduler::new(SchedulerConfig::default());
    scheduler.load(Vec::new());
    scheduler.play();
    let out = scheduler.tick(0.1, Some(&[55.0; 32]));
    assert_eq!(out.viseme.id(), 12);
}

#[test]
fn pause_is_immediate_and_resume_is_stateless() {
    // Pausing rests the mouth at once, ignoring the gap grace period;
    // resuming recomputes purely from the clock.
    let mut scheduler = Scheduler::new(SchedulerConfig::default());
    let tokens = vec![AlignmentToken {
        token: "a".into(),
        start: 0.0,
        end: 1.0,
    }];
    let segments = segment(&tokens, &SegmenterConfig::default());
    scheduler.load(segments);
    scheduler.play();

    assert_eq!(scheduler.tick(0.5, None).viseme, Viseme::A);
    scheduler.pause();
    assert_eq!(scheduler.current_viseme(), Viseme::Neutral);

    scheduler.play();
    let out = scheduler.tick(0.6, None);
    assert_eq!(out.viseme, Viseme::A);
    assert_eq!(out.active_segment, Some(0));
}

#[test]
fn at_most_one_segment_active_at_any_time() {
    let json = r#"[
        {"token":"t","start":0.0,"end":0.1},
        {"token":"a","start":0.1,"end":0.3},
        {"token":"n","start":0.3,"end":0.4},
        {"token":" ","start":0.4,"end":0.45},
        {"token":"x","start":0.45,"end":0.55},
        {"token":"a","start":0.55,"end":0.8}
    ]"#;
    let segments = expand(json, 0.8);
    let mut t = 0.0;
    while t < 0.85 {
        let active: Vec<_> = segments
            .iter()
            .filter(|s| t >= s.start && t < s.end)
            .collect();
        assert!(active.len() <= 1, "overlap at t={t}");
        t += 0.005;
    }
    // Boundaries activate exactly one of the two adjacent phases.
    for pair in segments.windows(2) {
        if (pair[0].end - pair[1].start).abs() < 1e-9 {
            let b = pair[1].start;
            let active = segments
                .iter()
                .filter(|s| b >= s.start && b < s.end)
                .count();
            assert_eq!(active, 1, "boundary t={b}");
        }
    }
}

#[test]
fn grace_period_bridges_micro_gaps_only() {
    let mut scheduler = Scheduler::new(SchedulerConfig::default());
    // Two syllables separated by a 0.05s gap, then one 0.2s away.
    let tokens = vec![
        AlignmentToken {
            token: "a".into(),
            start: 0.0,
            end: 0.3,
        },
        AlignmentToken {
            token: " ".into(),
            start: 0.3,
            end: 0.35,
        },
        AlignmentToken {
            token: "u".into(),
            start: 0.35,
            end: 0.6,
        },
        AlignmentToken {
            token: " ".into(),
            start: 0.6,
            end: 0.8,
        },
        AlignmentToken {
            token: "e".into(),
            start: 0.8,
            end: 1.0,
        },
    ];
    let segments = segment(&tokens, &SegmenterConfig::default());
    scheduler.load(segments);
    scheduler.play();

    assert_eq!(scheduler.tick(0.29, None).viseme, Viseme::A);
    // Inside the 0.05s gap: previous viseme holds.
    assert_eq!(scheduler.tick(0.32, None).viseme, Viseme::A);
    assert_eq!(scheduler.tick(0.4, None).viseme, Viseme::U);
    // Inside the 0.2s gap, past the 0.08s grace: neutral.
    assert_eq!(scheduler.tick(0.59, None).viseme, Viseme::U);
    assert_eq!(scheduler.tick(0.7, None).viseme, Viseme::Neutral);
    assert_eq!(scheduler.tick(0.85, None).viseme, Viseme::E);
}

#[test]
fn rescale_then_schedule_lines_up_with_audio() {
    // Aligner clock ran at half speed; the decoded duration wins.
    let json = r#"[
        {"token":"m","start":0.0,"end":0.25},
        {"token":"a","start":0.25,"end":1.0}
    ]"#;
    let segments = expand(json, 2.0);
    assert!((segments.last().expect("segments").end - 2.0).abs() < 1e-9);

    let mut scheduler = Scheduler::new(SchedulerConfig::default());
    scheduler.load(segments);
    scheduler.play();
    assert_eq!(scheduler.tick(1.9, None).viseme, Viseme::A);
    // Beyond the old, unscaled end time but within the track: active.
    assert_eq!(scheduler.tick(1.2, None).viseme, Viseme::A);
}

#[test]
fn player_events_reach_subscribers() {
    use lipsync::PlayerEvent;

    let mut player = Player::new(PlayerConfig::default());
    let mut rx = player.subscribe();
    let json = r#"[
        {"token":"b","start":0.0,"end":0.2},
        {"token":"a","start":0.2,"end":0.5}
    ]"#;
    player.load_track(Some(0.5), Some(json));
    assert!(matches!(
        rx.try_recv(),
        Ok(PlayerEvent::TrackLoaded { segments: 2, .. })
    ));

    // The clock sits at the track start, inside the onset phase.
    player.play().expect("track is loaded");
    player.tick_now(None);

    let mut saw_viseme = false;
    let mut saw_segment = false;
    while let Ok(event) = rx.try_recv() {
        match event {
            PlayerEvent::VisemeChanged { .. } => saw_viseme = true,
            PlayerEvent::ActiveSegmentChanged { .. } => saw_segment = true,
            _ => {}
        }
    }
    assert!(saw_viseme);
    assert!(saw_segment);
}

#[test]
fn unload_returns_to_idle() {
    let mut player = Player::new(PlayerConfig::default());
    player.load_track(Some(1.0), None);
    player.play().expect("track is loaded");
    player.unload();
    assert_eq!(player.state(), PlaybackState::Idle);
    assert!(player.duration_secs().is_none());
}
