//! Variance-conserving cubic reconstruction.
//!
//! Instead of interpolating the density samples directly, the cumulative
//! variance `C(f) = ∫_{f_0}^{f} E df` is tabulated at the knots with the
//! trapezoid rule and interpolated with a cubic of the requested variant.
//! The reconstructed density is `C'(f)`.
//!
//! Consequences:
//! - The variance between any two knots equals the trapezoid variance of the
//!   samples.
//! - With [`SplineKind::Monotone`], `C` is nondecreasing, so the density is
//!   never negative.
//! - On each segment `C'` is a quadratic, so its maximum has a closed form.
//!   This is the curve used for sub-bin peak refinement: a density-domain
//!   monotone cubic is stationary at every sample maximum and would never move
//!   a peak off its bin. [`crate::peak`] bounds the refined location by the
//!   three samples around the discrete peak.

use crate::error::Result;
use crate::helpers::cumulative_trapezoid;
use crate::interpolation::{clamp_nonnegative, validate_targets, CubicInterpolant, SplineKind};
use crate::spectrum::DiscreteSpectrum;

/// Density reconstruction through a cubic interpolant of cumulative variance.
#[derive(Debug, Clone, PartialEq)]
pub struct VarianceInterpolant {
    cumulative: CubicInterpolant,
}

impl VarianceInterpolant {
    pub fn new(source: &DiscreteSpectrum, kind: SplineKind) -> Self {
        let knots = source.frequencies().to_vec();
        let values = cumulative_trapezoid(source.frequencies(), source.density());
        Self {
            cumulative: CubicInterpolant::fit(knots, values, kind),
        }
    }

    #[inline]
    pub fn kind(&self) -> SplineKind {
        self.cumulative.kind()
    }

    pub fn domain(&self) -> (f64, f64) {
        self.cumulative.domain()
    }

    /// Cumulative variance from the first knot up to `f`.
    pub fn cumulative(&self, f: f64) -> Result<f64> {
        self.cumulative.evaluate(f)
    }

    /// Reconstructed density `C'(f)`.
    pub fn density(&self, f: f64) -> Result<f64> {
        self.cumulative.derivative(f)
    }

    /// Variance contained in `[lower, upper]`.
    pub fn variance_between(&self, lower: f64, upper: f64) -> Result<f64> {
        Ok(self.cumulative(upper)? - self.cumulative(lower)?)
    }

    /// Location and value of the largest reconstructed density on
    /// `[lower, upper]`; ties go to the lowest frequency.
    pub fn peak_on(&self, lower: f64, upper: f64) -> Result<(f64, f64)> {
        self.cumulative.maximize_slope(lower, upper)
    }
}

/// Evaluate the variance-conserving reconstruction of `source` on `targets`.
///
/// Same target rules as [`crate::interpolation::interpolate`]; natural-variant
/// undershoot is clamped to zero.
pub fn interpolate_conserving(
    source: &DiscreteSpectrum,
    targets: &[f64],
    kind: SplineKind,
) -> Result<DiscreteSpectrum> {
    let (lower, upper) = source.domain();
    validate_targets(targets, lower, upper)?;

    let curve = VarianceInterpolant::new(source, kind);
    let mut density = targets
        .iter()
        .map(|&f| curve.density(f))
        .collect::<Result<Vec<_>>>()?;
    clamp_nonnegative(&mut density, kind);
    Ok(DiscreteSpectrum::from_parts_unchecked(targets.to_vec(), density))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::integrate_trapezoid;

    fn peaked() -> DiscreteSpectrum {
        DiscreteSpectrum::new(
            vec![0.03, 0.04, 0.05, 0.06, 0.07, 0.08, 0.09],
            vec![0.0, 0.1, 2.0, 6.0, 1.0, 0.05, 0.0],
        )
        .unwrap()
    }

    #[test]
    fn test_monotone_density_nonnegative() {
        let curve = VarianceInterpolant::new(&peaked(), SplineKind::Monotone);
        for i in 0..=600 {
            let f = 0.03 + 0.06 * i as f64 / 600.0;
            let v = curve.density(f.min(0.09)).unwrap();
            assert!(v >= -1e-12, "negative density {v} at {f}");
        }
    }

    #[test]
    fn test_variance_conserved_at_knots() {
        let source = peaked();
        for kind in [SplineKind::Monotone, SplineKind::Natural] {
            let curve = VarianceInterpolant::new(&source, kind);
            let total = curve.variance_between(0.03, 0.09).unwrap();
            assert!((total - source.variance()).abs() < 1e-14);

            let f = source.frequencies();
            let e = source.density();
            let band = curve.variance_between(f[2], f[4]).unwrap();
            let expected = integrate_trapezoid(&f[2..=4], &e[2..=4]);
            assert!((band - expected).abs() < 1e-14);
        }
    }

    #[test]
    fn test_peak_on_near_sample_maximum() {
        let curve = VarianceInterpolant::new(&peaked(), SplineKind::Monotone);
        let (f, v) = curve.peak_on(0.05, 0.07).unwrap();
        assert!(f > 0.05 && f < 0.07, "peak at {f}");
        assert!(v > 0.0);
        assert!(curve.peak_on(0.05, 0.1).is_err());
    }

    #[test]
    fn test_interpolate_conserving_grid() {
        let source = peaked();
        let targets: Vec<f64> = (0..=12).map(|i| 0.03 + 0.005 * i as f64).collect();
        let targets: Vec<f64> = targets.into_iter().map(|f| f.min(0.09)).collect();
        let out = interpolate_conserving(&source, &targets, SplineKind::Natural).unwrap();
        assert_eq!(out.len(), 13);
        assert!(out.density().iter().all(|&v| v >= 0.0));
        assert_eq!(
            VarianceInterpolant::new(&source, SplineKind::Natural).kind(),
            SplineKind::Natural
        );
    }
}
