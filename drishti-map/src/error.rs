//! Error types for the mapping engine

/// Configuration validation errors.
///
/// Invalid numeric bounds are rejected when the engine is constructed,
/// never silently clamped.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Field of view outside the usable range
    #[error("invalid {axis} field of view: {value}° (must be in (0, 360))")]
    InvalidFov {
        /// "horizontal" or "vertical"
        axis: &'static str,
        /// Offending value in degrees
        value: f64,
    },

    /// Frame dimensions must be non-zero
    #[error("invalid frame dimensions: {width}x{height}")]
    InvalidFrameSize {
        /// Frame width in pixels
        width: usize,
        /// Frame height in pixels
        height: usize,
    },

    /// Maximum depth must be non-zero
    #[error("maximum depth must be non-zero")]
    InvalidMaxDepth,

    /// Map scale must be non-zero
    #[error("map scale must be non-zero")]
    InvalidScale,
}

/// A depth buffer whose length does not match the declared dimensions.
#[derive(Debug, thiserror::Error)]
#[error("depth buffer length {actual} does not match {width}x{height}")]
pub struct FrameSizeMismatch {
    /// Declared frame width
    pub width: usize,
    /// Declared frame height
    pub height: usize,
    /// Actual buffer length
    pub actual: usize,
}
