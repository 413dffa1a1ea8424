//! Error taxonomy for spectrum construction, interpolation and peak estimation.
//!
//! Every numerical operation validates its inputs at the boundary and reports
//! the first violation it finds. None of these conditions are transient, so
//! callers are expected to treat them as fatal for the spectrum in question.

/// Errors produced by this crate.
#[derive(Debug, thiserror::Error)]
pub enum SpectrumError {
    /// Frequency axis not strictly increasing, non-finite, or length mismatch
    /// between paired sequences.
    #[error("invalid frequency domain: {reason}")]
    InvalidDomain { reason: String },

    /// Non-finite or negative density value.
    #[error("invalid density value {value} at index {index}")]
    InvalidData { index: usize, value: f64 },

    /// Too few samples for the requested operation.
    #[error("insufficient samples: need at least {required}, got {actual}")]
    InsufficientSamples { required: usize, actual: usize },

    /// Requested frequency lies outside the sampled range.
    #[error("frequency {frequency} outside domain [{lower}, {upper}]")]
    OutOfDomain {
        frequency: f64,
        lower: f64,
        upper: f64,
    },

    /// Discrete maximum sits on the first or last sample, so there is no
    /// neighbouring interval on one side to refine into.
    #[error("spectral peak at boundary sample {index} ({frequency} Hz)")]
    BoundaryPeak { index: usize, frequency: f64 },

    /// Out-of-range parameter for a parametric shape or noise model.
    #[error("invalid parameter {name} = {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SpectrumError>;

impl SpectrumError {
    pub(crate) fn domain(reason: impl Into<String>) -> Self {
        SpectrumError::InvalidDomain {
            reason: reason.into(),
        }
    }
}
