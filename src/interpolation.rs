//! Piecewise-cubic reconstruction of discretely sampled spectra.
//!
//! Two variants are provided:
//! - **Monotone** (PCHIP): Hermite cubics whose knot slopes are the weighted
//!   harmonic mean of the adjacent secants, or zero where the secants disagree
//!   in sign or either vanishes. On every interval where the samples are
//!   monotone the curve is monotone too, and a local extremum of the data is a
//!   stationary point of the curve, so no overshoot is manufactured.
//! - **Natural**: the classic C² cubic spline with zero curvature at both
//!   ends. Unconstrained in shape; it may ring around sharp features.
//!
//! Both interpolate: the curve passes exactly through every sample. Neither
//! extrapolates: evaluation outside the knot range is an error.
//!
//! Each segment is stored in power form in the local offset `s = f - f_i`,
//! `p_i(s) = c0 + c1 s + c2 s² + c3 s³`, which makes value, slope and exact
//! extremum search cheap.

use crate::error::{Result, SpectrumError};
use crate::matrix::SpectrumMatrix;
use crate::spectrum::{validate_axis, DiscreteSpectrum, SpectralBatch, MIN_SAMPLES};
use crate::iter_maybe_parallel;
#[cfg(feature = "parallel")]
use rayon::iter::ParallelIterator;
use serde::{Deserialize, Serialize};

/// Interpolation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplineKind {
    /// Shape-preserving piecewise cubic Hermite (PCHIP).
    #[default]
    Monotone,
    /// Natural cubic spline (zero second derivative at both ends).
    Natural,
}

impl std::fmt::Display for SplineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SplineKind::Monotone => f.write_str("monotone"),
            SplineKind::Natural => f.write_str("natural"),
        }
    }
}

/// One cubic piece in power form around its left knot.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CubicSegment {
    c0: f64,
    c1: f64,
    c2: f64,
    c3: f64,
}

impl CubicSegment {
    /// Hermite cubic from end values `y0, y1` and end slopes `d0, d1`.
    fn hermite(y0: f64, y1: f64, d0: f64, d1: f64, h: f64) -> Self {
        let secant = (y1 - y0) / h;
        Self {
            c0: y0,
            c1: d0,
            c2: (3.0 * secant - 2.0 * d0 - d1) / h,
            c3: (d0 + d1 - 2.0 * secant) / (h * h),
        }
    }

    #[inline]
    fn value(&self, s: f64) -> f64 {
        self.c0 + s * (self.c1 + s * (self.c2 + s * self.c3))
    }

    #[inline]
    fn slope(&self, s: f64) -> f64 {
        self.c1 + s * (2.0 * self.c2 + s * 3.0 * self.c3)
    }

    /// Offsets where the slope vanishes (roots of `c1 + 2 c2 s + 3 c3 s²`).
    fn stationary_points(&self) -> [Option<f64>; 2] {
        quadratic_roots(3.0 * self.c3, 2.0 * self.c2, self.c1)
    }

    /// Offset where the slope itself is extremal (vertex of the slope parabola).
    fn slope_vertex(&self) -> [Option<f64>; 2] {
        if self.c3 == 0.0 {
            [None, None]
        } else {
            [Some(-self.c2 / (3.0 * self.c3)), None]
        }
    }
}

/// Real roots of `a s² + b s + c`, computed without cancellation.
fn quadratic_roots(a: f64, b: f64, c: f64) -> [Option<f64>; 2] {
    let scale = b.abs() + c.abs();
    if a.abs() <= f64::EPSILON * scale {
        // Degenerates to linear (or constant)
        return if b != 0.0 {
            [Some(-c / b), None]
        } else {
            [None, None]
        };
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return [None, None];
    }
    let q = -0.5 * (b + b.signum() * disc.sqrt());
    let r1 = q / a;
    let r2 = if q != 0.0 { Some(c / q) } else { None };
    [Some(r1), r2]
}

/// Sign as -1, 0 or 1 (zero maps to zero, unlike `f64::signum`).
#[inline]
fn sign(v: f64) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

// ============================================================================
// Slope / curvature construction
// ============================================================================

/// Knot slopes for the monotone (PCHIP) variant.
fn monotone_slopes(h: &[f64], secants: &[f64]) -> Vec<f64> {
    let n = h.len() + 1;
    let mut d = vec![0.0; n];

    for k in 1..n - 1 {
        let s1 = secants[k - 1];
        let s2 = secants[k];
        if s1 == 0.0 || s2 == 0.0 || sign(s1) != sign(s2) {
            // Local extremum (or flat run) in the data
            d[k] = 0.0;
        } else {
            let w1 = 2.0 * h[k] + h[k - 1];
            let w2 = h[k] + 2.0 * h[k - 1];
            d[k] = (w1 + w2) / (w1 / s1 + w2 / s2);
        }
    }

    d[0] = monotone_end_slope(h[0], h[1], secants[0], secants[1]);
    d[n - 1] = monotone_end_slope(h[n - 2], h[n - 3], secants[n - 2], secants[n - 3]);
    d
}

/// Three-point end slope, limited so the end interval stays shape-preserving.
fn monotone_end_slope(h0: f64, h1: f64, s0: f64, s1: f64) -> f64 {
    let d = ((2.0 * h0 + h1) * s0 - h0 * s1) / (h0 + h1);
    if sign(d) != sign(s0) {
        0.0
    } else if sign(s0) != sign(s1) && d.abs() > 3.0 * s0.abs() {
        3.0 * s0
    } else {
        d
    }
}

/// Knot second derivatives of the natural spline (Thomas algorithm).
fn natural_curvatures(h: &[f64], secants: &[f64]) -> Vec<f64> {
    let n = h.len() + 1;
    let mut m = vec![0.0; n];
    if n < 3 {
        return m;
    }

    // Forward sweep over interior rows 1..n-1; row i reads
    // h[i-1] m[i-1] + 2(h[i-1] + h[i]) m[i] + h[i] m[i+1] = 6 (s[i] - s[i-1])
    let mut c_prime = vec![0.0; n];
    let mut d_prime = vec![0.0; n];
    for i in 1..n - 1 {
        let sub = h[i - 1];
        let diag = 2.0 * (h[i - 1] + h[i]);
        let sup = h[i];
        let rhs = 6.0 * (secants[i] - secants[i - 1]);
        let denom = diag - sub * c_prime[i - 1];
        c_prime[i] = sup / denom;
        d_prime[i] = (rhs - sub * d_prime[i - 1]) / denom;
    }
    for i in (1..n - 1).rev() {
        m[i] = d_prime[i] - c_prime[i] * m[i + 1];
    }
    m
}

fn build_segments(knots: &[f64], values: &[f64], kind: SplineKind) -> Vec<CubicSegment> {
    let h: Vec<f64> = knots.windows(2).map(|w| w[1] - w[0]).collect();
    let secants: Vec<f64> = values
        .windows(2)
        .zip(&h)
        .map(|(w, &hi)| (w[1] - w[0]) / hi)
        .collect();

    match kind {
        SplineKind::Monotone => {
            let d = monotone_slopes(&h, &secants);
            (0..h.len())
                .map(|i| CubicSegment::hermite(values[i], values[i + 1], d[i], d[i + 1], h[i]))
                .collect()
        }
        SplineKind::Natural => {
            let m = natural_curvatures(&h, &secants);
            (0..h.len())
                .map(|i| CubicSegment {
                    c0: values[i],
                    c1: secants[i] - h[i] * (2.0 * m[i] + m[i + 1]) / 6.0,
                    c2: m[i] / 2.0,
                    c3: (m[i + 1] - m[i]) / (6.0 * h[i]),
                })
                .collect()
        }
    }
}

// ============================================================================
// Continuous interpolant
// ============================================================================

/// Piecewise-cubic curve through a set of samples, immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct CubicInterpolant {
    kind: SplineKind,
    knots: Vec<f64>,
    values: Vec<f64>,
    segments: Vec<CubicSegment>,
}

impl CubicInterpolant {
    /// Fit a cubic interpolant through `(knots[i], values[i])`.
    ///
    /// # Errors
    /// * `InvalidDomain` - length mismatch or knots not strictly increasing
    /// * `InsufficientSamples` - fewer than three samples
    /// * `InvalidData` - a value is not finite
    pub fn new(knots: &[f64], values: &[f64], kind: SplineKind) -> Result<Self> {
        if knots.len() != values.len() {
            return Err(SpectrumError::domain(format!(
                "{} knots but {} values",
                knots.len(),
                values.len()
            )));
        }
        if knots.len() < MIN_SAMPLES {
            return Err(SpectrumError::InsufficientSamples {
                required: MIN_SAMPLES,
                actual: knots.len(),
            });
        }
        validate_axis(knots, "knot")?;
        if let Some((index, &value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(SpectrumError::InvalidData { index, value });
        }
        Ok(Self::fit(knots.to_vec(), values.to_vec(), kind))
    }

    /// Fit through the samples of a spectrum (already validated).
    pub fn from_spectrum(spectrum: &DiscreteSpectrum, kind: SplineKind) -> Self {
        Self::fit(spectrum.frequencies().to_vec(), spectrum.density().to_vec(), kind)
    }

    pub(crate) fn fit(knots: Vec<f64>, values: Vec<f64>, kind: SplineKind) -> Self {
        let segments = build_segments(&knots, &values, kind);
        Self {
            kind,
            knots,
            values,
            segments,
        }
    }

    /// Interpolation variant.
    #[inline]
    pub fn kind(&self) -> SplineKind {
        self.kind
    }

    /// Breakpoints of the piecewise cubic.
    #[inline]
    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// Sample values at the breakpoints.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Closed interval on which the curve is defined.
    pub fn domain(&self) -> (f64, f64) {
        (self.knots[0], self.knots[self.knots.len() - 1])
    }

    fn check_domain(&self, f: f64) -> Result<()> {
        let (lower, upper) = self.domain();
        if (lower..=upper).contains(&f) {
            Ok(())
        } else {
            Err(SpectrumError::OutOfDomain {
                frequency: f,
                lower,
                upper,
            })
        }
    }

    /// Segment index and local offset for an in-domain `f`.
    fn locate(&self, f: f64) -> (usize, f64) {
        let last = self.segments.len() - 1;
        let i = self
            .knots
            .partition_point(|&k| k <= f)
            .saturating_sub(1)
            .min(last);
        (i, f - self.knots[i])
    }

    /// Curve value at `f`. Exact sample value at every knot.
    pub fn evaluate(&self, f: f64) -> Result<f64> {
        self.check_domain(f)?;
        let (i, s) = self.locate(f);
        if f == self.knots[i + 1] {
            return Ok(self.values[i + 1]);
        }
        Ok(self.segments[i].value(s))
    }

    /// First derivative at `f`.
    pub fn derivative(&self, f: f64) -> Result<f64> {
        self.check_domain(f)?;
        let (i, s) = self.locate(f);
        Ok(self.segments[i].slope(s))
    }

    /// Evaluate at many frequencies; fails on the first out-of-domain one.
    pub fn evaluate_many(&self, frequencies: &[f64]) -> Result<Vec<f64>> {
        frequencies.iter().map(|&f| self.evaluate(f)).collect()
    }

    /// Exact maximum of the curve on `[lower, upper]`.
    ///
    /// Every segment overlapping the interval contributes its clipped end
    /// points and interior stationary points; the best candidate wins, ties
    /// going to the lowest frequency.
    ///
    /// # Returns
    /// `(frequency, value)` of the maximum
    pub fn maximize(&self, lower: f64, upper: f64) -> Result<(f64, f64)> {
        self.search(lower, upper, CubicSegment::value, CubicSegment::stationary_points)
    }

    /// Exact maximum of the first derivative on `[lower, upper]`.
    pub(crate) fn maximize_slope(&self, lower: f64, upper: f64) -> Result<(f64, f64)> {
        self.search(lower, upper, CubicSegment::slope, CubicSegment::slope_vertex)
    }

    fn search(
        &self,
        lower: f64,
        upper: f64,
        objective: fn(&CubicSegment, f64) -> f64,
        critical: fn(&CubicSegment) -> [Option<f64>; 2],
    ) -> Result<(f64, f64)> {
        self.check_domain(lower)?;
        self.check_domain(upper)?;
        if lower > upper {
            return Err(SpectrumError::domain(format!(
                "search interval [{lower}, {upper}] is reversed"
            )));
        }

        let mut best: Option<(f64, f64)> = None;
        for (i, seg) in self.segments.iter().enumerate() {
            let left = self.knots[i];
            let right = self.knots[i + 1];
            if right < lower || left > upper {
                continue;
            }
            let s_lo = lower.max(left) - left;
            let s_hi = upper.min(right) - left;

            let interior = critical(seg)
                .into_iter()
                .flatten()
                .filter(|&s| s > s_lo && s < s_hi);
            let mut candidates: Vec<f64> = vec![s_lo];
            candidates.extend(interior);
            candidates.push(s_hi);
            candidates.sort_by(|a, b| a.total_cmp(b));

            for s in candidates {
                let v = objective(seg, s);
                if best.map_or(true, |(_, bv)| v > bv) {
                    best = Some((left + s, v));
                }
            }
        }

        best.ok_or_else(|| {
            SpectrumError::domain(format!("no segment overlaps [{lower}, {upper}]"))
        })
    }
}

/// Build the continuous interpolant of a spectrum.
pub fn build(source: &DiscreteSpectrum, kind: SplineKind) -> CubicInterpolant {
    CubicInterpolant::from_spectrum(source, kind)
}

/// Check a target grid: at least three points, strictly increasing, and
/// inside `[lower, upper]` (boundaries included).
pub(crate) fn validate_targets(targets: &[f64], lower: f64, upper: f64) -> Result<()> {
    if targets.len() < MIN_SAMPLES {
        return Err(SpectrumError::InsufficientSamples {
            required: MIN_SAMPLES,
            actual: targets.len(),
        });
    }
    validate_axis(targets, "target frequency")?;
    for &f in [targets[0], targets[targets.len() - 1]].iter() {
        if f < lower || f > upper {
            return Err(SpectrumError::OutOfDomain {
                frequency: f,
                lower,
                upper,
            });
        }
    }
    Ok(())
}

/// Clamp undershoot below zero; a variance density cannot be negative.
pub(crate) fn clamp_nonnegative(values: &mut [f64], kind: SplineKind) {
    let mut clamped = 0usize;
    for v in values.iter_mut() {
        if *v < 0.0 {
            *v = 0.0;
            clamped += 1;
        }
    }
    if clamped > 0 {
        tracing::debug!(%kind, clamped, "clamped negative interpolated densities to zero");
    }
}

/// Evaluate the cubic reconstruction of `source` on `targets`.
///
/// Targets may touch but not exceed the source's frequency range. Values are
/// clamped at zero, so the result is again a valid spectrum; use
/// [`CubicInterpolant::evaluate`] to see the raw (possibly undershooting)
/// natural spline.
///
/// # Errors
/// * `InsufficientSamples` - fewer than three targets
/// * `InvalidDomain` - targets not strictly increasing
/// * `OutOfDomain` - a target outside the source range
pub fn interpolate(
    source: &DiscreteSpectrum,
    targets: &[f64],
    kind: SplineKind,
) -> Result<DiscreteSpectrum> {
    let (lower, upper) = source.domain();
    validate_targets(targets, lower, upper)?;

    let interpolant = CubicInterpolant::from_spectrum(source, kind);
    let mut density = interpolant.evaluate_many(targets)?;
    clamp_nonnegative(&mut density, kind);
    Ok(DiscreteSpectrum::from_parts_unchecked(targets.to_vec(), density))
}

/// Row-wise [`interpolate`] over a batch.
pub fn interpolate_batch(
    batch: &SpectralBatch,
    targets: &[f64],
    kind: SplineKind,
) -> Result<SpectralBatch> {
    let freqs = batch.frequencies();
    validate_targets(targets, freqs[0], freqs[freqs.len() - 1])?;
    tracing::debug!(spectra = batch.len(), targets = targets.len(), %kind, "interpolating batch");

    let rows: Vec<Vec<f64>> = iter_maybe_parallel!(0..batch.len())
        .map(|i| interpolate(&batch.spectrum(i), targets, kind).map(|s| s.density().to_vec()))
        .collect::<Result<Vec<_>>>()?;

    let densities = if rows.is_empty() {
        SpectrumMatrix::zeros(0, targets.len())
    } else {
        SpectrumMatrix::from_rows(&rows)?
    };
    Ok(SpectralBatch::from_parts_unchecked(targets.to_vec(), densities))
}
