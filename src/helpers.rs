//! Helper functions for numerical integration and sample scanning.

/// Small epsilon for numerical comparisons (e.g., avoiding division by zero).
pub const NUMERICAL_EPS: f64 = 1e-10;

/// Compute trapezoidal integration weights for a non-uniform grid.
///
/// `Σ w_i y_i` approximates `∫ y df` over `[f_0, f_{n-1}]`.
///
/// # Arguments
/// * `frequencies` - Grid points (evaluation points)
///
/// # Returns
/// Vector of integration weights
pub fn trapezoid_weights(frequencies: &[f64]) -> Vec<f64> {
    let n = frequencies.len();
    if n < 2 {
        return vec![0.0; n];
    }

    let mut weights = vec![0.0; n];
    for i in 0..n {
        if i == 0 {
            weights[i] = (frequencies[1] - frequencies[0]) / 2.0;
        } else if i == n - 1 {
            weights[i] = (frequencies[n - 1] - frequencies[n - 2]) / 2.0;
        } else {
            weights[i] = (frequencies[i + 1] - frequencies[i - 1]) / 2.0;
        }
    }

    weights
}

/// Integrate `values` over `frequencies` with the trapezoidal rule.
pub fn integrate_trapezoid(frequencies: &[f64], values: &[f64]) -> f64 {
    trapezoid_weights(frequencies)
        .iter()
        .zip(values)
        .map(|(w, v)| w * v)
        .sum()
}

/// Running trapezoidal integral, starting at zero on the first sample.
///
/// The last element equals [`integrate_trapezoid`] over the full grid.
pub fn cumulative_trapezoid(frequencies: &[f64], values: &[f64]) -> Vec<f64> {
    let n = frequencies.len().min(values.len());
    let mut cumulative = Vec::with_capacity(n);
    if n == 0 {
        return cumulative;
    }

    let mut acc = 0.0;
    cumulative.push(acc);
    for i in 1..n {
        acc += 0.5 * (values[i - 1] + values[i]) * (frequencies[i] - frequencies[i - 1]);
        cumulative.push(acc);
    }
    cumulative
}

/// Index of the largest value; ties go to the first occurrence.
///
/// Returns `None` for an empty slice. NaN entries never win.
pub fn first_argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some(b) if v <= values[b] => {}
            _ if v.is_nan() => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Whether `values` is finite and strictly increasing.
pub fn is_strictly_increasing(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite()) && values.windows(2).all(|w| w[1] > w[0])
}
