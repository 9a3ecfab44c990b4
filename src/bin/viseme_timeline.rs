//! Print the expanded viseme timeline for an alignment file.
//!
//! Usage: viseme-timeline <alignment.json> [audio-file]
//!
//! With an audio file the decoded duration is authoritative and the
//! timestamps are repaired against it; without one the aligner's own
//! end time is trusted as-is.

use anyhow::{Context, Result, bail};
use lipsync::alignment::normalize::normalize;
use lipsync::alignment::segment::segment;
use lipsync::{SegmenterConfig, parse_alignment};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct TimelineRow {
    start: f64,
    end: f64,
    viseme_id: u8,
    label: &'static str,
    text: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (alignment_path, audio_path) = match args.as_slice() {
        [a] => (a.as_str(), None),
        [a, audio] => (a.as_str(), Some(audio.as_str())),
        _ => bail!("usage: viseme-timeline <alignment.json> [audio-file]"),
    };

    let json = std::fs::read_to_string(alignment_path)
        .with_context(|| format!("reading {alignment_path}"))?;
    let tokens = parse_alignment(&json).context("parsing alignment")?;

    let duration = match audio_path {
        Some(path) => Some(
            lipsync::audio::probe_duration(Path::new(path))
                .with_context(|| format!("probing {path}"))?,
        ),
        None => tokens.last().map(|t| t.end),
    };

    let normalized = normalize(tokens, duration);
    let segments = segment(&normalized, &SegmenterConfig::default());

    let rows: Vec<TimelineRow> = segments
        .iter()
        .map(|s| TimelineRow {
            start: s.start,
            end: s.end,
            viseme_id: s.viseme.id(),
            label: s.viseme.label(),
            text: s.display_text.clone(),
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}
