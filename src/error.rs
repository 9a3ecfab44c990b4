//! Error types for the lip-sync pipeline.

/// Top-level error type for the alignment-to-viseme pipeline.
#[derive(Debug, thiserror::Error)]
pub enum LipSyncError {
    /// Alignment data could not be parsed or is structurally invalid.
    #[error("alignment error: {0}")]
    Alignment(String),

    /// Audio container could not be probed or decoded.
    #[error("audio error: {0}")]
    Audio(String),

    /// Playback lifecycle misuse (e.g. play with no track loaded).
    #[error("playback error: {0}")]
    Playback(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, LipSyncError>;
