//! Resolution loss: evaluate a spectrum's piecewise-linear reconstruction on a
//! coarser grid, the way an instrument reporting at its own fixed resolution
//! would see it.
//!
//! This is deliberately *not* a reconstruction method; cubic reconstruction
//! lives in [`crate::interpolation`].

use crate::error::Result;
use crate::interpolation::validate_targets;
use crate::iter_maybe_parallel;
use crate::matrix::SpectrumMatrix;
use crate::spectrum::{DiscreteSpectrum, SpectralBatch};
#[cfg(feature = "parallel")]
use rayon::iter::ParallelIterator;

/// Linear interpolation of `(x_data, y_data)` at an in-range `xq`.
fn interp_single(x_data: &[f64], y_data: &[f64], xq: f64) -> f64 {
    let last = x_data.len() - 1;
    if xq <= x_data[0] {
        return y_data[0];
    }
    if xq >= x_data[last] {
        return y_data[last];
    }

    // Binary search for the bracketing interval
    let hi = x_data.partition_point(|&x| x < xq);
    let lo = hi - 1;
    if x_data[hi] == xq {
        return y_data[hi];
    }
    let t = (xq - x_data[lo]) / (x_data[hi] - x_data[lo]);
    y_data[lo] + t * (y_data[hi] - y_data[lo])
}

/// Evaluate the piecewise-linear density of `source` at each target.
///
/// # Arguments
/// * `source` - Fine-resolution spectrum
/// * `targets` - Strictly increasing frequencies inside the source range
///
/// # Errors
/// * `InsufficientSamples` - fewer than three targets
/// * `InvalidDomain` - targets not strictly increasing
/// * `OutOfDomain` - a target outside `[f_0, f_{n-1}]`
pub fn downsample(source: &DiscreteSpectrum, targets: &[f64]) -> Result<DiscreteSpectrum> {
    let (lower, upper) = source.domain();
    validate_targets(targets, lower, upper)?;
    Ok(DiscreteSpectrum::from_parts_unchecked(
        targets.to_vec(),
        linear_at(source.frequencies(), source.density(), targets),
    ))
}

fn linear_at(frequencies: &[f64], density: &[f64], targets: &[f64]) -> Vec<f64> {
    targets
        .iter()
        .map(|&f| interp_single(frequencies, density, f))
        .collect()
}

/// Row-wise [`downsample`] over a batch.
pub fn downsample_batch(batch: &SpectralBatch, targets: &[f64]) -> Result<SpectralBatch> {
    let freqs = batch.frequencies();
    validate_targets(targets, freqs[0], freqs[freqs.len() - 1])?;
    tracing::debug!(spectra = batch.len(), targets = targets.len(), "downsampling batch");

    let densities = batch.densities();
    let rows: Vec<Vec<f64>> = iter_maybe_parallel!(0..batch.len())
        .map(|i| linear_at(freqs, &densities.row(i), targets))
        .collect();

    let out = if rows.is_empty() {
        SpectrumMatrix::zeros(0, targets.len())
    } else {
        SpectrumMatrix::from_rows(&rows)?
    };
    Ok(SpectralBatch::from_parts_unchecked(targets.to_vec(), out))
}
