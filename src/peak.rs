//! Peak-period estimation.
//!
//! Two strategies:
//! - [`PeakMethod::Raw`]: the frequency of the largest sample (first one on
//!   ties). Resolution is limited to the sampling interval.
//! - [`PeakMethod::Spline`]: refine the discrete peak inside its two adjacent
//!   intervals using the cubic variance-conserving reconstruction
//!   ([`crate::conserving::VarianceInterpolant`]). The reconstruction only
//!   refines the bin found by the raw scan; it never relocates the peak to a
//!   distant maximum.
//!
//! ## Bounded refinement
//!
//! The maximum of the reconstructed density is kept only when it lies on the
//! side of the discrete peak and within the offset supported by the three
//! samples around it. That offset is the vertex of the parabola through the
//! log-densities at `k - 1`, `k` and `k + 1`, which is exact for a Gaussian
//! peak. A cubic maximum outside it is replaced by the vertex.
//!
//! For Gaussian peaks with standard deviations between 0.1 and 1 sampling
//! interval, the monotone estimate is strictly closer to the true peak than
//! the raw argmax wherever the true peak lies off the sample grid, with at
//! most 0.3 times the raw error. A peak centred on a sample stays on that
//! sample. Skewed shapes (Pierson-Moskowitz, JONSWAP) stay within one
//! sampling interval of the true peak.
//!
//! A discrete maximum on the first or last sample has only one neighbouring
//! interval. [`BoundaryPolicy`] decides whether that is an error or whether
//! the available side is searched without the three-sample bound.

use crate::conserving::VarianceInterpolant;
use crate::error::{Result, SpectrumError};
use crate::helpers::first_argmax;
use crate::interpolation::SplineKind;
use crate::iter_maybe_parallel;
use crate::spectrum::{DiscreteSpectrum, SpectralBatch};
#[cfg(feature = "parallel")]
use rayon::iter::ParallelIterator;
use serde::{Deserialize, Serialize};

/// Peak-extraction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeakMethod {
    /// Discrete argmax.
    Raw,
    /// Cubic refinement around the discrete argmax.
    #[default]
    Spline,
}

/// What the spline method does when the discrete peak sits on a domain edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Fail with [`SpectrumError::BoundaryPeak`].
    #[default]
    Reject,
    /// Search the single available interval and flag the estimate.
    OneSided,
}

/// Run-time configuration of the estimator.
///
/// Deserializes from JSON with every field optional:
/// `{"method": "spline", "kind": "natural", "boundary": "one_sided"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakPeriodOptions {
    pub method: PeakMethod,
    pub kind: SplineKind,
    pub boundary: BoundaryPolicy,
}

impl PeakPeriodOptions {
    /// Discrete argmax.
    pub fn raw() -> Self {
        Self {
            method: PeakMethod::Raw,
            ..Self::default()
        }
    }

    /// Cubic refinement of the given variant.
    pub fn spline(kind: SplineKind) -> Self {
        Self {
            method: PeakMethod::Spline,
            kind,
            ..Self::default()
        }
    }

    pub fn with_boundary(mut self, boundary: BoundaryPolicy) -> Self {
        self.boundary = boundary;
        self
    }
}

/// Estimated spectral peak.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakEstimate {
    /// Frequency of maximum density (Hz).
    pub frequency: f64,
    /// `1 / frequency` (s); infinite for a peak at 0 Hz.
    pub period: f64,
    /// Density at the peak: the sample for `raw`, the reconstruction for `spline`.
    pub density: f64,
    /// Whether the spline refinement ran (the result may still sit on a sample).
    pub refined: bool,
    /// Whether the discrete peak sat on the first or last sample.
    pub boundary: bool,
}

impl PeakEstimate {
    fn new(frequency: f64, density: f64, refined: bool, boundary: bool) -> Self {
        let period = if frequency > 0.0 {
            1.0 / frequency
        } else {
            f64::INFINITY
        };
        Self {
            frequency,
            period,
            density,
            refined,
            boundary,
        }
    }
}

/// Index of the discrete peak and whether it lies on a domain edge.
fn discrete_peak(spectrum: &DiscreteSpectrum) -> (usize, bool) {
    // Densities are validated finite, so an argmax always exists
    let k = first_argmax(spectrum.density()).unwrap_or(0);
    (k, k == 0 || k == spectrum.len() - 1)
}

/// Densities at or below this are treated as this value in the log domain.
const LOG_DENSITY_FLOOR: f64 = 1e-30;

fn log_density(value: f64) -> f64 {
    if value > LOG_DENSITY_FLOOR {
        value.ln()
    } else {
        LOG_DENSITY_FLOOR.ln()
    }
}

/// Offset from `freqs[k]` of the vertex of the parabola through the
/// log-densities at `k - 1`, `k` and `k + 1`. Requires an interior `k`.
fn gaussian_vertex_offset(freqs: &[f64], density: &[f64], k: usize) -> f64 {
    let left = freqs[k] - freqs[k - 1];
    let right = freqs[k] - freqs[k + 1];
    let y0 = log_density(density[k]);
    let drop_left = y0 - log_density(density[k - 1]);
    let drop_right = y0 - log_density(density[k + 1]);

    // Both drops are nonnegative at a discrete maximum; zero means flat
    let denom = left * drop_right - right * drop_left;
    if denom <= 0.0 {
        return 0.0;
    }
    -0.5 * (left * left * drop_right - right * right * drop_left) / denom
}

/// Keep `candidate` when it moves off `peak` in the direction of `supported`
/// and no further; otherwise use `peak + supported`.
fn bound_refinement(candidate: f64, peak: f64, supported: f64) -> f64 {
    let shift = candidate - peak;
    if shift * supported > 0.0 && shift.abs() <= supported.abs() {
        candidate
    } else {
        peak + supported
    }
}

/// Peak period with the default boundary policy.
///
/// # Arguments
/// * `spectrum` - Sampled spectrum
/// * `method` - Raw argmax or cubic refinement
/// * `kind` - Cubic variant (ignored for `raw`)
pub fn peak_period(
    spectrum: &DiscreteSpectrum,
    method: PeakMethod,
    kind: SplineKind,
) -> Result<PeakEstimate> {
    peak_period_with(
        spectrum,
        &PeakPeriodOptions {
            method,
            kind,
            boundary: BoundaryPolicy::default(),
        },
    )
}

/// Peak period under full options.
///
/// # Errors
/// * `BoundaryPeak` - spline method, discrete peak on a domain edge and
///   [`BoundaryPolicy::Reject`]
pub fn peak_period_with(
    spectrum: &DiscreteSpectrum,
    options: &PeakPeriodOptions,
) -> Result<PeakEstimate> {
    let (k, at_edge) = discrete_peak(spectrum);
    let freqs = spectrum.frequencies();

    if options.method == PeakMethod::Raw {
        return Ok(PeakEstimate::new(
            freqs[k],
            spectrum.density()[k],
            false,
            at_edge,
        ));
    }

    if at_edge {
        match options.boundary {
            BoundaryPolicy::Reject => {
                return Err(SpectrumError::BoundaryPeak {
                    index: k,
                    frequency: freqs[k],
                });
            }
            BoundaryPolicy::OneSided => {
                tracing::warn!(
                    index = k,
                    frequency = freqs[k],
                    "spectral peak on domain edge, refining one side only"
                );
            }
        }
    }

    let lower = freqs[k.saturating_sub(1)];
    let upper = freqs[(k + 1).min(freqs.len() - 1)];
    let curve = VarianceInterpolant::new(spectrum, options.kind);
    let (candidate, density) = curve.peak_on(lower, upper)?;
    if at_edge {
        return Ok(PeakEstimate::new(candidate, density, true, true));
    }

    let supported = gaussian_vertex_offset(freqs, spectrum.density(), k)
        .clamp(lower - freqs[k], upper - freqs[k]);
    let frequency = bound_refinement(candidate, freqs[k], supported).clamp(lower, upper);
    if frequency == candidate {
        return Ok(PeakEstimate::new(candidate, density, true, false));
    }
    tracing::trace!(candidate, frequency, "cubic peak outside three-sample bound");
    let density = curve.density(frequency)?;
    Ok(PeakEstimate::new(frequency, density, true, false))
}

/// One outcome per batch row, in row order.
///
/// Rows are independent: a row that fails (for example a boundary peak under
/// [`BoundaryPolicy::Reject`]) yields its own error without affecting the
/// estimates of the other rows.
pub fn peak_period_batch(
    batch: &SpectralBatch,
    options: &PeakPeriodOptions,
) -> Vec<Result<PeakEstimate>> {
    tracing::debug!(spectra = batch.len(), ?options, "estimating batch peak periods");
    let estimates: Vec<Result<PeakEstimate>> = iter_maybe_parallel!(0..batch.len())
        .map(|i| peak_period_with(&batch.spectrum(i), options))
        .collect();
    let failed = estimates.iter().filter(|e| e.is_err()).count();
    if failed > 0 {
        tracing::debug!(failed, "batch rows without a peak estimate");
    }
    estimates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coarse_grid() -> Vec<f64> {
        (0..=50).map(|i| i as f64 * 0.5 / 50.0).collect()
    }

    fn gaussian_samples(freqs: &[f64], f0: f64, sd: f64) -> DiscreteSpectrum {
        let density = freqs
            .iter()
            .map(|&f| (-0.5 * ((f - f0) / sd).powi(2)).exp())
            .collect();
        DiscreteSpectrum::new(freqs.to_vec(), density).unwrap()
    }

    // ============== Raw ==============

    #[test]
    fn test_raw_unique_maximum() {
        let s = DiscreteSpectrum::new(vec![0.05, 0.1, 0.15, 0.2], vec![0.1, 0.3, 2.0, 0.4]).unwrap();
        let est = peak_period(&s, PeakMethod::Raw, SplineKind::Monotone).unwrap();
        assert_eq!(est.frequency, 0.15);
        assert!((est.period - 1.0 / 0.15).abs() < 1e-12);
        assert_eq!(est.density, 2.0);
        assert!(!est.refined);
        assert!(!est.boundary);
    }

    #[test]
    fn test_raw_ties_take_lowest_frequency() {
        let s = DiscreteSpectrum::new(vec![0.05, 0.1, 0.15, 0.2], vec![0.1, 2.0, 2.0, 0.4]).unwrap();
        let est = peak_period_with(&s, &PeakPeriodOptions::raw()).unwrap();
        assert_eq!(est.frequency, 0.1);
    }

    #[test]
    fn test_raw_boundary_is_not_an_error() {
        let s = DiscreteSpectrum::new(vec![0.05, 0.1, 0.15], vec![3.0, 2.0, 1.0]).unwrap();
        let est = peak_period_with(&s, &PeakPeriodOptions::raw()).unwrap();
        assert_eq!(est.frequency, 0.05);
        assert!(est.boundary);
    }

    #[test]
    fn test_zero_frequency_peak_has_infinite_period() {
        let s = DiscreteSpectrum::new(vec![0.0, 0.1, 0.2], vec![3.0, 2.0, 1.0]).unwrap();
        let est = peak_period_with(&s, &PeakPeriodOptions::raw()).unwrap();
        assert!(est.period.is_infinite());
    }

    // ============== Spline ==============

    #[test]
    fn test_spline_refines_toward_true_peak() {
        let f0 = 0.0525;
        let s = gaussian_samples(&coarse_grid(), f0, 0.0025);
        let raw = peak_period_with(&s, &PeakPeriodOptions::raw()).unwrap();
        assert!((raw.frequency - 0.05).abs() < 1e-12);

        let est = peak_period(&s, PeakMethod::Spline, SplineKind::Monotone).unwrap();
        assert!(est.refined);
        let raw_err = (raw.frequency - f0).abs();
        let err = (est.frequency - f0).abs();
        assert!(err < raw_err, "refined {} not closer than raw", est.frequency);
        assert!(err <= 0.5 * raw_err);
        assert!((est.period - 1.0 / f0).abs() / (1.0 / f0) < 0.02);
    }

    #[test]
    fn test_spline_symmetric_midpoint() {
        // Peak exactly halfway between two samples
        let s = gaussian_samples(&coarse_grid(), 0.055, 0.005);
        for kind in [SplineKind::Monotone, SplineKind::Natural] {
            let est = peak_period(&s, PeakMethod::Spline, kind).unwrap();
            assert!((est.frequency - 0.055).abs() < 1e-6, "{kind}: {}", est.frequency);
        }
    }

    #[test]
    fn test_spline_centred_peak_stays_on_sample() {
        let s = gaussian_samples(&coarse_grid(), 0.1, 0.005);
        for kind in [SplineKind::Monotone, SplineKind::Natural] {
            let est = peak_period(&s, PeakMethod::Spline, kind).unwrap();
            assert!((est.frequency - 0.1).abs() < 1e-9, "{kind}: {}", est.frequency);
        }
    }

    #[test]
    fn test_spline_closer_than_raw_near_samples() {
        // True peaks a tenth or a fifth of an interval off a sample
        let freqs = coarse_grid();
        for &sd in &[0.001, 0.0025, 0.005, 0.01] {
            for &f0 in &[0.101, 0.102, 0.108, 0.109] {
                let s = gaussian_samples(&freqs, f0, sd);
                let raw = peak_period_with(&s, &PeakPeriodOptions::raw()).unwrap();
                let raw_err = (raw.frequency - f0).abs();
                for kind in [SplineKind::Monotone, SplineKind::Natural] {
                    let est = peak_period(&s, PeakMethod::Spline, kind).unwrap();
                    let err = (est.frequency - f0).abs();
                    assert!(
                        err < raw_err,
                        "sd={sd} f0={f0} {kind}: {} vs raw {}",
                        est.frequency,
                        raw.frequency
                    );
                }
                let mono = peak_period(&s, PeakMethod::Spline, SplineKind::Monotone).unwrap();
                assert!((mono.frequency - f0).abs() <= 0.3 * raw_err, "sd={sd} f0={f0}");
            }
        }
    }

    #[test]
    fn test_gaussian_vertex_offset_exact() {
        let freqs = vec![0.09, 0.1, 0.11];
        let density: Vec<f64> = freqs
            .iter()
            .map(|&f: &f64| (-0.5 * ((f - 0.1023) / 0.004).powi(2)).exp())
            .collect();
        let offset = gaussian_vertex_offset(&freqs, &density, 1);
        assert!((offset - 0.0023).abs() < 1e-12, "offset {offset}");

        // Zero neighbours fall back to the floor symmetrically
        let even = [0.5, 1.0, 1.5];
        assert_eq!(gaussian_vertex_offset(&even, &[0.0, 1.0, 0.0], 1), 0.0);
        // Flat top
        assert_eq!(gaussian_vertex_offset(&even, &[1.0, 1.0, 1.0], 1), 0.0);
        // Tied neighbour puts the vertex halfway
        assert!((gaussian_vertex_offset(&even, &[0.2, 1.0, 1.0], 1) - 0.25).abs() < 1e-15);
    }

    #[test]
    fn test_bound_refinement() {
        // Within the supported shift
        assert_eq!(bound_refinement(0.102, 0.1, 0.003), 0.102);
        // Overshoot
        assert!((bound_refinement(0.104, 0.1, 0.003) - 0.103).abs() < 1e-15);
        // Wrong side
        assert!((bound_refinement(0.098, 0.1, 0.003) - 0.103).abs() < 1e-15);
        // No supported shift keeps the sample
        assert_eq!(bound_refinement(0.0967, 0.1, 0.0), 0.1);
    }

    #[test]
    fn test_spline_stays_within_neighbour_intervals() {
        // Secondary narrow bump far from the discrete peak
        let freqs = coarse_grid();
        let density: Vec<f64> = freqs
            .iter()
            .map(|&f| {
                let a = (-0.5 * ((f - 0.1) / 0.01).powi(2)).exp() * 2.0;
                let b = (-0.5 * ((f - 0.3) / 0.004).powi(2)).exp() * 1.5;
                a + b
            })
            .collect();
        let s = DiscreteSpectrum::new(freqs, density).unwrap();
        for kind in [SplineKind::Monotone, SplineKind::Natural] {
            let est = peak_period(&s, PeakMethod::Spline, kind).unwrap();
            assert!(est.frequency >= 0.09 && est.frequency <= 0.11);
        }
    }

    #[test]
    fn test_spline_boundary_rejected_by_default() {
        let s = DiscreteSpectrum::new(vec![0.1, 0.2, 0.3, 0.4], vec![0.5, 1.0, 2.0, 3.0]).unwrap();
        let err = peak_period(&s, PeakMethod::Spline, SplineKind::Monotone).unwrap_err();
        assert!(matches!(err, SpectrumError::BoundaryPeak { index: 3, .. }));
    }

    #[test]
    fn test_spline_boundary_one_sided() {
        let s = DiscreteSpectrum::new(vec![0.1, 0.2, 0.3, 0.4], vec![3.0, 2.0, 1.0, 0.5]).unwrap();
        let opts =
            PeakPeriodOptions::spline(SplineKind::Monotone).with_boundary(BoundaryPolicy::OneSided);
        let est = peak_period_with(&s, &opts).unwrap();
        assert!(est.boundary);
        assert!(est.frequency >= 0.1 && est.frequency <= 0.2);
    }

    // ============== Batch ==============

    #[test]
    fn test_batch_order_and_equality() {
        let freqs = coarse_grid();
        let spectra: Vec<DiscreteSpectrum> = [0.06, 0.0525, 0.11, 0.2075]
            .iter()
            .map(|&f0| gaussian_samples(&freqs, f0, 0.004))
            .collect();
        let batch = SpectralBatch::from_spectra(&spectra).unwrap();
        let opts = PeakPeriodOptions::spline(SplineKind::Natural);
        let estimates = batch.peak_periods(&opts);
        assert_eq!(estimates.len(), spectra.len());
        for (est, s) in estimates.iter().zip(&spectra) {
            assert_eq!(*est.as_ref().unwrap(), s.peak_period(&opts).unwrap());
        }
    }

    #[test]
    fn test_batch_boundary_row_keeps_other_rows() {
        let freqs = vec![0.1, 0.2, 0.3, 0.4];
        let first = DiscreteSpectrum::new(freqs.clone(), vec![0.0, 1.0, 0.2, 0.0]).unwrap();
        let second = DiscreteSpectrum::new(freqs.clone(), vec![0.0, 0.3, 1.0, 0.1]).unwrap();
        let edge = DiscreteSpectrum::new(freqs, vec![1.0, 0.5, 0.1, 0.0]).unwrap();
        let batch = SpectralBatch::from_spectra(&[first.clone(), second.clone(), edge]).unwrap();

        let opts = PeakPeriodOptions::default();
        let estimates = batch.peak_periods(&opts);
        assert_eq!(estimates.len(), 3);
        assert_eq!(*estimates[0].as_ref().unwrap(), first.peak_period(&opts).unwrap());
        assert_eq!(*estimates[1].as_ref().unwrap(), second.peak_period(&opts).unwrap());
        assert!(matches!(
            estimates[2],
            Err(SpectrumError::BoundaryPeak { index: 0, .. })
        ));
    }

    // ============== Options ==============

    #[test]
    fn test_options_defaults_and_serde() {
        let opts = PeakPeriodOptions::default();
        assert_eq!(opts.method, PeakMethod::Spline);
        assert_eq!(opts.kind, SplineKind::Monotone);
        assert_eq!(opts.boundary, BoundaryPolicy::Reject);

        let parsed: PeakPeriodOptions =
            serde_json::from_str(r#"{"method":"raw","boundary":"one_sided"}"#).unwrap();
        assert_eq!(parsed.method, PeakMethod::Raw);
        assert_eq!(parsed.kind, SplineKind::Monotone);
        assert_eq!(parsed.boundary, BoundaryPolicy::OneSided);
    }
}
