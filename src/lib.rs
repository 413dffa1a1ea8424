//! # wavepeak
//!
//! Continuous peak-period estimates from discretely sampled surface-wave
//! spectra.
//!
//! A measured variance-density spectrum only reports energy at a fixed set of
//! frequencies, so the classic peak period (the inverse of the frequency of
//! the largest sample) jumps between bins as the true peak drifts. This crate
//! provides:
//! - Validated spectra and batches of spectra sharing a frequency axis
//! - Resolution loss through piecewise-linear downsampling
//! - Cubic reconstruction: shape-preserving (PCHIP) and natural splines
//! - Variance-conserving reconstruction through the cumulative variance
//! - Peak-period estimation, raw or refined between samples
//! - Parametric reference spectra (Gaussian, Pierson-Moskowitz, JONSWAP) and
//!   chi-square estimation noise
//! - A JSON load-or-compute cache for the analysis layer
//!
//! ## Data Layout
//!
//! Batches are column-major matrices stored in flat vectors: for `n` spectra
//! on `m` frequencies, `data[i + j * n]` is spectrum `i` at frequency `j`.
//!
//! ```
//! use wavepeak::{peak_period, DiscreteSpectrum, PeakMethod, SplineKind};
//!
//! let spectrum = DiscreteSpectrum::new(
//!     vec![0.03, 0.04, 0.05, 0.06, 0.07],
//!     vec![0.1, 1.0, 3.0, 2.5, 0.2],
//! )
//! .unwrap();
//! let raw = peak_period(&spectrum, PeakMethod::Raw, SplineKind::Monotone).unwrap();
//! assert_eq!(raw.frequency, 0.05);
//!
//! let refined = peak_period(&spectrum, PeakMethod::Spline, SplineKind::Monotone).unwrap();
//! assert!(refined.frequency > 0.04 && refined.frequency < 0.06);
//! ```

#![allow(clippy::needless_range_loop)]

pub mod parallel;

pub mod cache;
pub mod conserving;
pub mod error;
pub mod helpers;
pub mod interpolation;
pub mod matrix;
pub mod parametric;
pub mod peak;
pub mod resample;
pub mod spectrum;

// Re-export commonly used items
pub use error::{Result, SpectrumError};
pub use helpers::{cumulative_trapezoid, integrate_trapezoid, trapezoid_weights, NUMERICAL_EPS};
pub use matrix::SpectrumMatrix;
pub use spectrum::{DiscreteSpectrum, SpectralBatch, MIN_SAMPLES};

// Re-export reconstruction and estimation
pub use conserving::{interpolate_conserving, VarianceInterpolant};
pub use interpolation::{build, interpolate, CubicInterpolant, SplineKind};
pub use peak::{
    peak_period, peak_period_batch, peak_period_with, BoundaryPolicy, PeakEstimate, PeakMethod,
    PeakPeriodOptions,
};
pub use resample::downsample;

// Re-export reference spectra and caching
pub use cache::JsonCache;
pub use parametric::{add_estimation_noise, parametric_spectrum, ParametricShape};
