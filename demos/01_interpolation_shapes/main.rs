//! Example 01: Interpolation Shapes
//!
//! Downsamples high-resolution Gaussian and JONSWAP spectra to a 0.01 Hz
//! instrument grid and reconstructs them with the natural and monotone
//! cubic interpolants, reporting how each reconstruction treats the peak.

use tracing::info;
use wavepeak::{
    downsample, interpolate, parametric_spectrum, CubicInterpolant, DiscreteSpectrum,
    ParametricShape, SplineKind,
};

const FREQUENCY_STEP: f64 = 0.01;

fn max_of(values: &[f64]) -> f64 {
    values.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
}

fn peak_location(spectrum: &DiscreteSpectrum) -> f64 {
    let density = spectrum.density();
    let k = wavepeak::helpers::first_argmax(density).unwrap_or(0);
    spectrum.frequencies()[k]
}

fn report(
    label: &str,
    target: &DiscreteSpectrum,
    sampled: &DiscreteSpectrum,
) -> wavepeak::Result<()> {
    let dense = target.frequencies();
    let scale = max_of(target.density());

    println!("  {label}");
    println!(
        "    target:      peak {:.4} Hz, max {:.3}, Hm0 {:.4}",
        peak_location(target),
        max_of(target.density()) / scale,
        target.significant_wave_height()
    );
    println!(
        "    downsampled: peak {:.4} Hz, max {:.3}, Hm0 {:.4}",
        peak_location(sampled),
        max_of(sampled.density()) / scale,
        sampled.significant_wave_height()
    );

    for kind in [SplineKind::Natural, SplineKind::Monotone] {
        let raw_curve = CubicInterpolant::from_spectrum(sampled, kind);
        let unclamped = raw_curve.evaluate_many(dense)?;
        let undershoot = unclamped.iter().cloned().fold(0.0, f64::min);
        let curve = interpolate(sampled, dense, kind)?;
        println!(
            "    {:<11}  peak {:.4} Hz, max {:.3}, min {:+.4}, Hm0 {:.4}",
            format!("{kind}:"),
            peak_location(&curve),
            max_of(curve.density()) / scale,
            undershoot / scale,
            curve.significant_wave_height()
        );
    }
    Ok(())
}

fn main() -> wavepeak::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("=== Example 01: Interpolation Shapes ===\n");

    let dense: Vec<f64> = (0..=5000).map(|i| i as f64 * 0.5 / 5000.0).collect();
    let sampled: Vec<f64> = (0..=50).map(|i| i as f64 * 0.5 / 50.0).collect();
    info!(dense = dense.len(), sampled = sampled.len(), "frequency grids");

    // --- Section 1: Gaussian peaks of decreasing width ---
    println!("--- Gaussian, f_peak = 0.0525 Hz ---");
    for width in [1.0, 0.5, 0.25, 0.1] {
        let shape = ParametricShape::Gaussian {
            standard_deviation: width * FREQUENCY_STEP,
        };
        let target = parametric_spectrum(&dense, 0.0525, 1.0, shape)?;
        let observed = downsample(&target, &sampled)?;
        report(&format!("sd = {width:.2} df"), &target, &observed)?;
    }

    // --- Section 2: JONSWAP ---
    println!("\n--- JONSWAP ---");
    for peak_frequency in [0.0525, 0.1025] {
        let target = parametric_spectrum(&dense, peak_frequency, 1.0, ParametricShape::jonswap())?;
        let observed = downsample(&target, &sampled)?;
        report(&format!("f_peak = {peak_frequency} Hz"), &target, &observed)?;
    }

    println!("\n=== Done ===");
    Ok(())
}
