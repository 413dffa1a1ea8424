//! Discretely sampled variance-density spectra.
//!
//! A [`DiscreteSpectrum`] pairs a strictly increasing frequency axis (Hz) with
//! nonnegative variance densities (units²/Hz). It is validated once on
//! construction and immutable afterwards, so every consumer can rely on the
//! invariants without re-checking. A [`SpectralBatch`] is a stack of spectra
//! (e.g. a time series) sharing one frequency axis.
//!
//! Bulk parameters are spectral moments `m_n = ∫ f^n E(f) df` evaluated with
//! the trapezoidal rule.

use crate::error::{Result, SpectrumError};
use crate::helpers::{integrate_trapezoid, is_strictly_increasing};
use crate::interpolation::SplineKind;
use crate::matrix::SpectrumMatrix;
use crate::peak::{PeakEstimate, PeakPeriodOptions};
use crate::iter_maybe_parallel;
use nalgebra::DMatrix;
#[cfg(feature = "parallel")]
use rayon::iter::ParallelIterator;
use serde::{Deserialize, Serialize};

/// Minimum number of samples in a spectrum (cubic fitting needs three).
pub const MIN_SAMPLES: usize = 3;

/// Validate a frequency axis: finite and strictly increasing.
pub(crate) fn validate_axis(frequencies: &[f64], what: &str) -> Result<()> {
    if is_strictly_increasing(frequencies) {
        return Ok(());
    }
    let reason = match frequencies.iter().position(|f| !f.is_finite()) {
        Some(i) => format!("{what} value {} at index {i} is not finite", frequencies[i]),
        None => {
            let i = frequencies
                .windows(2)
                .position(|w| w[1] <= w[0])
                .map_or(0, |i| i + 1);
            format!("{what} not strictly increasing at index {i}")
        }
    };
    Err(SpectrumError::domain(reason))
}

/// First density that is non-finite or negative, if any.
fn find_invalid_density(density: &[f64]) -> Option<(usize, f64)> {
    density
        .iter()
        .enumerate()
        .find(|(_, v)| !v.is_finite() || **v < 0.0)
        .map(|(i, &v)| (i, v))
}

/// A variance-density spectrum sampled on a discrete frequency grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SpectrumRecord")]
pub struct DiscreteSpectrum {
    frequencies: Vec<f64>,
    density: Vec<f64>,
}

/// Unvalidated wire form of a spectrum.
#[derive(Deserialize)]
struct SpectrumRecord {
    frequencies: Vec<f64>,
    density: Vec<f64>,
}

impl TryFrom<SpectrumRecord> for DiscreteSpectrum {
    type Error = SpectrumError;

    fn try_from(record: SpectrumRecord) -> Result<Self> {
        DiscreteSpectrum::new(record.frequencies, record.density)
    }
}

impl DiscreteSpectrum {
    /// Build a validated spectrum.
    ///
    /// # Errors
    /// * `InvalidDomain` - length mismatch, or frequencies not finite and
    ///   strictly increasing
    /// * `InsufficientSamples` - fewer than [`MIN_SAMPLES`] samples
    /// * `InvalidData` - a density is non-finite or negative
    pub fn new(frequencies: Vec<f64>, density: Vec<f64>) -> Result<Self> {
        if frequencies.len() != density.len() {
            return Err(SpectrumError::domain(format!(
                "{} frequencies but {} density values",
                frequencies.len(),
                density.len()
            )));
        }
        if frequencies.len() < MIN_SAMPLES {
            return Err(SpectrumError::InsufficientSamples {
                required: MIN_SAMPLES,
                actual: frequencies.len(),
            });
        }
        validate_axis(&frequencies, "frequency")?;
        if let Some((index, value)) = find_invalid_density(&density) {
            return Err(SpectrumError::InvalidData { index, value });
        }
        Ok(Self {
            frequencies,
            density,
        })
    }

    /// Build from parts already known to satisfy the invariants.
    pub(crate) fn from_parts_unchecked(frequencies: Vec<f64>, density: Vec<f64>) -> Self {
        debug_assert_eq!(frequencies.len(), density.len());
        Self {
            frequencies,
            density,
        }
    }

    /// Frequency axis in Hz.
    #[inline]
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Variance density at each frequency.
    #[inline]
    pub fn density(&self) -> &[f64] {
        &self.density
    }

    /// Number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// Always `false`: a valid spectrum has at least [`MIN_SAMPLES`] samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Closed frequency range `(first, last)` covered by the samples.
    pub fn domain(&self) -> (f64, f64) {
        (self.frequencies[0], self.frequencies[self.len() - 1])
    }

    /// Spectral moment `m_n = ∫ f^n E(f) df`.
    pub fn moment(&self, order: i32) -> f64 {
        let weighted: Vec<f64> = self
            .frequencies
            .iter()
            .zip(&self.density)
            .map(|(&f, &e)| f.powi(order) * e)
            .collect();
        integrate_trapezoid(&self.frequencies, &weighted)
    }

    /// Total variance `m0`.
    pub fn variance(&self) -> f64 {
        integrate_trapezoid(&self.frequencies, &self.density)
    }

    /// Significant wave height `Hm0 = 4 √m0`.
    pub fn significant_wave_height(&self) -> f64 {
        4.0 * self.variance().sqrt()
    }

    /// Mean period `Tm01 = m0 / m1`; NaN for a spectrum without energy.
    pub fn mean_period(&self) -> f64 {
        let m1 = self.moment(1);
        if m1 > 0.0 {
            self.variance() / m1
        } else {
            f64::NAN
        }
    }

    /// Mean zero-crossing period `Tm02 = √(m0 / m2)`; NaN without energy.
    pub fn zero_crossing_period(&self) -> f64 {
        let m2 = self.moment(2);
        if m2 > 0.0 {
            (self.variance() / m2).sqrt()
        } else {
            f64::NAN
        }
    }

    /// Peak period of this spectrum, see [`crate::peak::peak_period_with`].
    pub fn peak_period(&self, options: &PeakPeriodOptions) -> Result<PeakEstimate> {
        crate::peak::peak_period_with(self, options)
    }
}

/// Spectra sharing one frequency axis, one spectrum per matrix row.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralBatch {
    frequencies: Vec<f64>,
    densities: SpectrumMatrix,
}

impl SpectralBatch {
    /// Build a validated batch.
    ///
    /// The matrix must have one column per frequency; every entry must be a
    /// finite nonnegative density.
    pub fn new(frequencies: Vec<f64>, densities: SpectrumMatrix) -> Result<Self> {
        if densities.ncols() != frequencies.len() {
            return Err(SpectrumError::domain(format!(
                "{} frequencies but {} density columns",
                frequencies.len(),
                densities.ncols()
            )));
        }
        if frequencies.len() < MIN_SAMPLES {
            return Err(SpectrumError::InsufficientSamples {
                required: MIN_SAMPLES,
                actual: frequencies.len(),
            });
        }
        validate_axis(&frequencies, "frequency")?;
        for col in 0..densities.ncols() {
            if let Some((row, value)) = find_invalid_density(densities.column(col)) {
                tracing::debug!(row, col, value, "invalid density in batch");
                return Err(SpectrumError::InvalidData { index: col, value });
            }
        }
        Ok(Self {
            frequencies,
            densities,
        })
    }

    /// Stack individual spectra. All must share exactly the same axis.
    pub fn from_spectra(spectra: &[DiscreteSpectrum]) -> Result<Self> {
        let Some(first) = spectra.first() else {
            return Err(SpectrumError::InsufficientSamples {
                required: 1,
                actual: 0,
            });
        };
        if let Some(i) = spectra
            .iter()
            .position(|s| s.frequencies() != first.frequencies())
        {
            return Err(SpectrumError::domain(format!(
                "spectrum {i} does not share the batch frequency axis"
            )));
        }
        let rows: Vec<Vec<f64>> = spectra.iter().map(|s| s.density().to_vec()).collect();
        let densities = SpectrumMatrix::from_rows(&rows)?;
        Ok(Self {
            frequencies: first.frequencies().to_vec(),
            densities,
        })
    }

    /// Build a validated batch from a nalgebra matrix (rows = spectra).
    pub fn from_dmatrix(frequencies: Vec<f64>, densities: &DMatrix<f64>) -> Result<Self> {
        Self::new(frequencies, SpectrumMatrix::from_dmatrix(densities))
    }

    /// Densities as a nalgebra matrix (rows = spectra).
    pub fn to_dmatrix(&self) -> DMatrix<f64> {
        self.densities.to_dmatrix()
    }

    /// Bin-wise mean over all spectra, e.g. the average of a time series.
    pub fn mean_spectrum(&self) -> DiscreteSpectrum {
        let mean = self.to_dmatrix().row_mean();
        DiscreteSpectrum::from_parts_unchecked(
            self.frequencies.clone(),
            mean.iter().copied().collect(),
        )
    }

    pub(crate) fn from_parts_unchecked(frequencies: Vec<f64>, densities: SpectrumMatrix) -> Self {
        Self {
            frequencies,
            densities,
        }
    }

    /// Shared frequency axis.
    #[inline]
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Density matrix (rows = spectra).
    #[inline]
    pub fn densities(&self) -> &SpectrumMatrix {
        &self.densities
    }

    /// Number of spectra.
    #[inline]
    pub fn len(&self) -> usize {
        self.densities.nrows()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy out spectrum `i`.
    ///
    /// # Panics
    /// Panics if `i >= len()`.
    pub fn spectrum(&self, i: usize) -> DiscreteSpectrum {
        assert!(i < self.len(), "spectrum index {i} out of range");
        DiscreteSpectrum::from_parts_unchecked(self.frequencies.clone(), self.densities.row(i))
    }

    /// One peak estimate per spectrum, in row order. Rows fail independently.
    pub fn peak_periods(&self, options: &PeakPeriodOptions) -> Vec<Result<PeakEstimate>> {
        crate::peak::peak_period_batch(self, options)
    }

    /// Downsample every spectrum onto `targets`.
    pub fn downsample(&self, targets: &[f64]) -> Result<SpectralBatch> {
        crate::resample::downsample_batch(self, targets)
    }

    /// Cubic interpolation of every spectrum onto `targets`.
    pub fn interpolate(&self, targets: &[f64], kind: SplineKind) -> Result<SpectralBatch> {
        crate::interpolation::interpolate_batch(self, targets, kind)
    }

    /// `Hm0` of every spectrum, in row order.
    pub fn significant_wave_heights(&self) -> Vec<f64> {
        iter_maybe_parallel!(0..self.len())
            .map(|i| self.spectrum(i).significant_wave_height())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> DiscreteSpectrum {
        DiscreteSpectrum::new(vec![0.1, 0.2, 0.3, 0.4], vec![0.0, 1.0, 2.0, 0.0]).unwrap()
    }

    #[test]
    fn test_new_valid() {
        let s = triangle();
        assert_eq!(s.len(), 4);
        assert!(!s.is_empty());
        assert_eq!(s.domain(), (0.1, 0.4));
    }

    #[test]
    fn test_length_mismatch() {
        let err = DiscreteSpectrum::new(vec![0.1, 0.2, 0.3], vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, SpectrumError::InvalidDomain { .. }));
    }

    #[test]
    fn test_too_few_samples() {
        let err = DiscreteSpectrum::new(vec![0.1, 0.2], vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            SpectrumError::InsufficientSamples {
                required: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_non_increasing_frequencies() {
        let err = DiscreteSpectrum::new(vec![0.1, 0.3, 0.2], vec![1.0, 2.0, 3.0]).unwrap_err();
        match err {
            SpectrumError::InvalidDomain { reason } => assert!(reason.contains("index 2")),
            other => panic!("unexpected error {other:?}"),
        }
        let err = DiscreteSpectrum::new(vec![0.1, 0.1, 0.2], vec![1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, SpectrumError::InvalidDomain { .. }));
    }

    #[test]
    fn test_invalid_density() {
        let err = DiscreteSpectrum::new(vec![0.1, 0.2, 0.3], vec![1.0, -0.5, 3.0]).unwrap_err();
        assert!(matches!(err, SpectrumError::InvalidData { index: 1, .. }));
        let err = DiscreteSpectrum::new(vec![0.1, 0.2, 0.3], vec![1.0, 2.0, f64::NAN]).unwrap_err();
        assert!(matches!(err, SpectrumError::InvalidData { index: 2, .. }));
    }

    #[test]
    fn test_moments() {
        let s = triangle();
        // trapezoid: 0.1 * (0.5 + 1.5 + 1.0) = 0.3
        assert!((s.variance() - 0.3).abs() < 1e-12);
        assert!((s.moment(0) - 0.3).abs() < 1e-12);
        assert!((s.significant_wave_height() - 4.0 * 0.3_f64.sqrt()).abs() < 1e-12);
        // m1 = 0.1 * (0.5*(0 + 0.2) + 0.5*(0.2 + 0.6) + 0.5*(0.6 + 0)) = 0.08
        assert!((s.moment(1) - 0.08).abs() < 1e-12);
        assert!((s.mean_period() - 0.3 / 0.08).abs() < 1e-9);
    }

    #[test]
    fn test_zero_spectrum_periods_nan() {
        let s = DiscreteSpectrum::new(vec![0.1, 0.2, 0.3], vec![0.0; 3]).unwrap();
        assert_eq!(s.significant_wave_height(), 0.0);
        assert!(s.mean_period().is_nan());
        assert!(s.zero_crossing_period().is_nan());
    }

    #[test]
    fn test_serde_roundtrip_and_validation() {
        let s = triangle();
        let json = serde_json::to_string(&s).unwrap();
        let back: DiscreteSpectrum = serde_json::from_str(&json).unwrap();
        assert_eq!(s, back);

        let bad = r#"{"frequencies":[0.1,0.2,0.3],"density":[1.0,-1.0,0.0]}"#;
        assert!(serde_json::from_str::<DiscreteSpectrum>(bad).is_err());
    }

    #[test]
    fn test_batch_from_spectra() {
        let a = triangle();
        let b = DiscreteSpectrum::new(vec![0.1, 0.2, 0.3, 0.4], vec![1.0, 1.0, 1.0, 1.0]).unwrap();
        let batch = SpectralBatch::from_spectra(&[a.clone(), b.clone()]).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.spectrum(0), a);
        assert_eq!(batch.spectrum(1), b);

        let hs = batch.significant_wave_heights();
        assert!((hs[0] - a.significant_wave_height()).abs() < 1e-12);
        assert!((hs[1] - b.significant_wave_height()).abs() < 1e-12);
    }

    #[test]
    fn test_batch_axis_mismatch() {
        let a = triangle();
        let b = DiscreteSpectrum::new(vec![0.1, 0.2, 0.3, 0.5], vec![1.0; 4]).unwrap();
        let err = SpectralBatch::from_spectra(&[a, b]).unwrap_err();
        assert!(matches!(err, SpectrumError::InvalidDomain { .. }));
    }

    #[test]
    fn test_batch_rejects_negative_density() {
        let densities =
            SpectrumMatrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![1.0, -2.0, 3.0]]).unwrap();
        let err = SpectralBatch::new(vec![0.1, 0.2, 0.3], densities).unwrap_err();
        assert!(matches!(err, SpectrumError::InvalidData { index: 1, .. }));
    }

    #[test]
    fn test_batch_dmatrix_and_mean() {
        let mat = DMatrix::from_row_slice(2, 3, &[1.0, 4.0, 0.0, 3.0, 2.0, 1.0]);
        let batch = SpectralBatch::from_dmatrix(vec![0.1, 0.2, 0.3], &mat).unwrap();
        assert_eq!(batch.spectrum(1).density(), &[3.0, 2.0, 1.0]);
        assert_eq!(batch.to_dmatrix(), mat);

        let mean = batch.mean_spectrum();
        assert_eq!(mean.frequencies(), &[0.1, 0.2, 0.3]);
        assert_eq!(mean.density(), &[2.0, 3.0, 0.5]);

        let bad = DMatrix::from_row_slice(1, 3, &[1.0, f64::NAN, 0.0]);
        let err = SpectralBatch::from_dmatrix(vec![0.1, 0.2, 0.3], &bad).unwrap_err();
        assert!(matches!(err, SpectrumError::InvalidData { index: 1, .. }));
    }

    #[test]
    fn test_batch_column_count_mismatch() {
        let densities = SpectrumMatrix::from_rows(&[vec![1.0, 2.0, 3.0]]).unwrap();
        let err = SpectralBatch::new(vec![0.1, 0.2, 0.3, 0.4], densities).unwrap_err();
        assert!(matches!(err, SpectrumError::InvalidDomain { .. }));
    }
}
