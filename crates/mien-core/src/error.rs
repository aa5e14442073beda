//! Error types for the MIEN pipeline

use thiserror::Error;

/// Errors crossing crate boundaries in the pipeline.
#[derive(Error, Debug)]
pub enum MienError {
    // Image errors
    #[error("image decode failed: {0}")]
    ImageDecode(String),

    #[error("image must be 8-bit RGBA, got {0}")]
    UnsupportedPixelFormat(String),

    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    // Preset errors
    #[error("emotion preset parse failed: {0}")]
    PresetParse(String),

    #[error("unknown morph channel: {0}")]
    UnknownMorph(String),

    // Render/encode errors
    #[error("render failed: {0}")]
    Render(String),

    #[error("frame encode failed: {0}")]
    Encode(String),

    // Lifecycle errors
    #[error("pipeline is not running")]
    PipelineStopped,

    #[error("thread spawn failed: {0}")]
    Spawn(String),

    // Configuration errors
    #[error("config error: {0}")]
    Config(String),
}

/// Result type for MIEN operations
pub type MienResult<T> = Result<T, MienError>;
