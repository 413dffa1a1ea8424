//! Parametric reference spectra and sampling noise.
//!
//! Shapes are evaluated on the requested grid and then scaled so that the
//! trapezoid significant wave height `4 √m0` equals the requested value.
//!
//! ## Shapes
//!
//! - **Gaussian**: `exp(-½ ((f - f_p) / σ)²)`
//! - **Pierson-Moskowitz**: `f⁻⁵ exp(-5/4 (f_p / f)⁴)` (zero at `f ≤ 0`)
//! - **JONSWAP**: Pierson-Moskowitz times the peak enhancement
//!   `γ^exp(-(f - f_p)² / (2 σ² f_p²))`, with `σ = σ_a` below the peak and
//!   `σ_b` above it.

use crate::error::{Result, SpectrumError};
use crate::spectrum::DiscreteSpectrum;
use rand::prelude::*;
use rand_distr::ChiSquared;
use serde::{Deserialize, Serialize};

/// Default JONSWAP peak enhancement factor.
pub const JONSWAP_GAMMA: f64 = 3.3;
/// Default JONSWAP width below the peak.
pub const JONSWAP_SIGMA_A: f64 = 0.07;
/// Default JONSWAP width above the peak.
pub const JONSWAP_SIGMA_B: f64 = 0.09;

/// Spectral shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParametricShape {
    /// Gaussian bump with standard deviation in Hz.
    Gaussian { standard_deviation: f64 },
    /// Fully developed sea.
    PiersonMoskowitz,
    /// Fetch-limited sea.
    Jonswap {
        gamma: f64,
        sigma_a: f64,
        sigma_b: f64,
    },
}

impl ParametricShape {
    /// JONSWAP with the standard parameters.
    pub fn jonswap() -> Self {
        ParametricShape::Jonswap {
            gamma: JONSWAP_GAMMA,
            sigma_a: JONSWAP_SIGMA_A,
            sigma_b: JONSWAP_SIGMA_B,
        }
    }

    fn validate(&self) -> Result<()> {
        let positive = |name: &'static str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SpectrumError::InvalidParameter { name, value })
            }
        };
        match *self {
            ParametricShape::Gaussian { standard_deviation } => {
                positive("standard_deviation", standard_deviation)
            }
            ParametricShape::PiersonMoskowitz => Ok(()),
            ParametricShape::Jonswap {
                gamma,
                sigma_a,
                sigma_b,
            } => {
                if !(gamma.is_finite() && gamma >= 1.0) {
                    return Err(SpectrumError::InvalidParameter {
                        name: "gamma",
                        value: gamma,
                    });
                }
                positive("sigma_a", sigma_a)?;
                positive("sigma_b", sigma_b)
            }
        }
    }

    /// Unscaled shape value at `f`.
    fn shape_at(&self, f: f64, peak_frequency: f64) -> f64 {
        match *self {
            ParametricShape::Gaussian { standard_deviation } => {
                (-0.5 * ((f - peak_frequency) / standard_deviation).powi(2)).exp()
            }
            ParametricShape::PiersonMoskowitz => pierson_moskowitz(f, peak_frequency),
            ParametricShape::Jonswap {
                gamma,
                sigma_a,
                sigma_b,
            } => {
                let sigma = if f <= peak_frequency { sigma_a } else { sigma_b };
                let r = (f - peak_frequency) / (sigma * peak_frequency);
                pierson_moskowitz(f, peak_frequency) * gamma.powf((-0.5 * r * r).exp())
            }
        }
    }
}

fn pierson_moskowitz(f: f64, peak_frequency: f64) -> f64 {
    if f <= 0.0 {
        return 0.0;
    }
    let tail = (-1.25 * (peak_frequency / f).powi(4)).exp();
    if tail == 0.0 {
        // Far below the peak f⁻⁵ alone would overflow
        0.0
    } else {
        f.powi(-5) * tail
    }
}

/// Sample a parametric spectrum on `frequencies`.
///
/// # Arguments
/// * `frequencies` - Strictly increasing grid (Hz), at least three points
/// * `peak_frequency` - Peak frequency `f_p` (Hz), positive
/// * `significant_wave_height` - Target `Hm0 = 4 √m0`, nonnegative
/// * `shape` - Spectral shape
///
/// # Errors
/// * `InvalidParameter` - bad `f_p`, `Hm0`, or shape parameter; or a positive
///   `Hm0` requested for a shape with no energy on the grid
/// * grid errors as for [`DiscreteSpectrum::new`]
pub fn parametric_spectrum(
    frequencies: &[f64],
    peak_frequency: f64,
    significant_wave_height: f64,
    shape: ParametricShape,
) -> Result<DiscreteSpectrum> {
    if !(peak_frequency.is_finite() && peak_frequency > 0.0) {
        return Err(SpectrumError::InvalidParameter {
            name: "peak_frequency",
            value: peak_frequency,
        });
    }
    if !(significant_wave_height.is_finite() && significant_wave_height >= 0.0) {
        return Err(SpectrumError::InvalidParameter {
            name: "significant_wave_height",
            value: significant_wave_height,
        });
    }
    shape.validate()?;

    let raw: Vec<f64> = frequencies
        .iter()
        .map(|&f| shape.shape_at(f, peak_frequency))
        .collect();
    let unscaled = DiscreteSpectrum::new(frequencies.to_vec(), raw)?;

    let m0 = unscaled.variance();
    let target_m0 = (significant_wave_height / 4.0).powi(2);
    let scale = if target_m0 == 0.0 {
        0.0
    } else if m0 > 0.0 {
        target_m0 / m0
    } else {
        return Err(SpectrumError::InvalidParameter {
            name: "peak_frequency",
            value: peak_frequency,
        });
    };

    let density = unscaled.density().iter().map(|&e| e * scale).collect();
    Ok(DiscreteSpectrum::from_parts_unchecked(
        frequencies.to_vec(),
        density,
    ))
}

/// Multiply each sample by an independent `χ²(ν)/ν` variate, the sampling
/// distribution of a spectral estimate with `ν` degrees of freedom.
///
/// # Arguments
/// * `spectrum` - Noise-free spectrum
/// * `degrees_of_freedom` - `ν`, positive
/// * `seed` - Optional random seed for reproducibility
pub fn add_estimation_noise(
    spectrum: &DiscreteSpectrum,
    degrees_of_freedom: f64,
    seed: Option<u64>,
) -> Result<DiscreteSpectrum> {
    let invalid = SpectrumError::InvalidParameter {
        name: "degrees_of_freedom",
        value: degrees_of_freedom,
    };
    if !(degrees_of_freedom.is_finite() && degrees_of_freedom > 0.0) {
        return Err(invalid);
    }
    let dist = ChiSquared::new(degrees_of_freedom).map_err(|_| invalid)?;

    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    let density = spectrum
        .density()
        .iter()
        .map(|&e| e * dist.sample(&mut rng) / degrees_of_freedom)
        .collect();
    Ok(DiscreteSpectrum::from_parts_unchecked(
        spectrum.frequencies().to_vec(),
        density,
    ))
}
