//! Example 02: Peak Period Sweep
//!
//! Sweeps the true peak frequency over [0.05, 0.15] Hz for Gaussian,
//! JONSWAP and Pierson-Moskowitz spectra, downsamples each to a 0.01 Hz grid
//! and compares raw, natural and monotone peak-period estimates against the
//! true peak period. Results are cached as JSON; pass a directory as the first
//! argument to choose where (default `target/wavepeak-cache`).

use serde::{Deserialize, Serialize};
use tracing::info;
use wavepeak::{
    downsample, parametric_spectrum, JsonCache, ParametricShape, PeakPeriodOptions, SpectralBatch,
    SplineKind,
};

const FREQUENCY_STEP: f64 = 0.01;

#[derive(Debug, Serialize, Deserialize)]
struct SweepResult {
    label: String,
    peak_frequencies: Vec<f64>,
    target: Vec<f64>,
    raw: Vec<f64>,
    natural: Vec<f64>,
    monotone: Vec<f64>,
}

fn sweep(label: &str, shape: ParametricShape, peaks: &[f64]) -> wavepeak::Result<SweepResult> {
    let dense: Vec<f64> = (0..=5000).map(|i| i as f64 * 0.5 / 5000.0).collect();
    let sampled: Vec<f64> = (0..=50).map(|i| i as f64 * 0.5 / 50.0).collect();

    let mut targets = Vec::with_capacity(peaks.len());
    for &fp in peaks {
        targets.push(parametric_spectrum(&dense, fp, 1.0, shape)?);
    }
    // One batch row per peak frequency
    let observed = SpectralBatch::from_spectra(&targets)?.downsample(&sampled)?;

    let periods = |options: PeakPeriodOptions| -> wavepeak::Result<Vec<f64>> {
        observed
            .peak_periods(&options)
            .into_iter()
            .map(|estimate| estimate.map(|e| e.period))
            .collect()
    };

    Ok(SweepResult {
        label: label.to_string(),
        peak_frequencies: peaks.to_vec(),
        target: peaks.iter().map(|f| 1.0 / f).collect(),
        raw: periods(PeakPeriodOptions::raw())?,
        natural: periods(PeakPeriodOptions::spline(SplineKind::Natural))?,
        monotone: periods(PeakPeriodOptions::spline(SplineKind::Monotone))?,
    })
}

fn relative_errors(estimates: &[f64], truth: &[f64]) -> (f64, f64) {
    let errors: Vec<f64> = estimates
        .iter()
        .zip(truth)
        .map(|(e, t)| (e - t).abs() / t)
        .collect();
    let mean = errors.iter().sum::<f64>() / errors.len() as f64;
    let max = errors.iter().cloned().fold(0.0, f64::max);
    (mean, max)
}

fn print_result(result: &SweepResult) {
    println!("  {}", result.label);
    for (name, values) in [
        ("raw", &result.raw),
        ("natural", &result.natural),
        ("monotone", &result.monotone),
    ] {
        let (mean, max) = relative_errors(values, &result.target);
        println!(
            "    {name:<9} mean error {:6.3}%, max error {:6.3}%",
            mean * 100.0,
            max * 100.0
        );
    }
}

fn main() -> wavepeak::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("=== Example 02: Peak Period Sweep ===\n");

    let cache_dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "target/wavepeak-cache".to_string());
    let cache = JsonCache::new(cache_dir);
    info!(dir = %cache.dir().display(), "using result cache");

    let peaks: Vec<f64> = (0..=100).map(|i| 0.05 + 0.001 * i as f64).collect();

    let mut cases: Vec<(String, ParametricShape)> = [1.0, 0.5, 0.25]
        .iter()
        .map(|&w| {
            (
                format!("gaussian_{w:.2}df"),
                ParametricShape::Gaussian {
                    standard_deviation: w * FREQUENCY_STEP,
                },
            )
        })
        .collect();
    cases.push(("jonswap".to_string(), ParametricShape::jonswap()));
    cases.push(("pierson_moskowitz".to_string(), ParametricShape::PiersonMoskowitz));

    // --- Relative peak-period errors ---
    println!("--- Relative Peak-Period Errors ---");
    for (label, shape) in &cases {
        let result = cache.get_or_compute(label, || sweep(label, *shape, &peaks))?;
        print_result(&result);
    }

    // --- Options from JSON ---
    println!("\n--- Options From JSON ---");
    let options: PeakPeriodOptions =
        serde_json::from_str(r#"{"kind": "natural", "boundary": "one_sided"}"#)?;
    println!("  {options:?}");

    println!("\n=== Done ===");
    Ok(())
}
