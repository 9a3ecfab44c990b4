//! Audio duration probing via symphonia.
//!
//! Aligner timestamps are repaired against the real decoded duration,
//! not whatever the alignment file claims, so the duration has to come
//! from the audio container itself.

use crate::error::{LipSyncError, Result};
use std::path::Path;
use tracing::debug;

/// Decode-derived duration of an audio file in seconds.
///
/// Uses the container's declared frame count when present; otherwise
/// decodes the whole stream and counts frames.
///
/// # Errors
///
/// Returns [`LipSyncError::Audio`] if the container cannot be probed or
/// decoded, or [`LipSyncError::Io`] if the file cannot be opened.
pub fn probe_duration(path: &Path) -> Result<f64> {
    use symphonia::core::codecs::DecoderOptions;
    use symphonia::core::errors::Error as SymphError;
    use symphonia::core::formats::FormatOptions;
    use symphonia::core::io::MediaSourceStream;
    use symphonia::core::meta::MetadataOptions;
    use symphonia::core::probe::Hint;

    let file = std::fs::File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| LipSyncError::Audio(format!("failed to probe audio: {e}")))?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| LipSyncError::Audio("no default audio track".into()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| LipSyncError::Audio("unknown sample rate".into()))?;

    // Fast path: the container declares its length.
    if let Some(n_frames) = codec_params.n_frames {
        let seconds = n_frames as f64 / sample_rate as f64;
        debug!("declared duration: {seconds:.3}s");
        return Ok(seconds);
    }

    // Slow path: decode and count frames.
    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| LipSyncError::Audio(format!("failed to create decoder: {e}")))?;

    let mut total_frames: u64 = 0;
    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphError::IoError(e)) => {
                if e.kind() == std::io::ErrorKind::UnexpectedEof {
                    break;
                }
                return Err(LipSyncError::Audio(format!("audio read error: {e}")));
            }
            Err(e) => return Err(LipSyncError::Audio(format!("audio read error: {e}"))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => total_frames += decoded.frames() as u64,
            // Skip over corrupt packets; the remainder still counts.
            Err(SymphError::DecodeError(_)) => continue,
            Err(e) => return Err(LipSyncError::Audio(format!("audio decode error: {e}"))),
        }
    }

    let seconds = total_frames as f64 / sample_rate as f64;
    debug!("decoded duration: {seconds:.3}s ({total_frames} frames)");
    Ok(seconds)
}
