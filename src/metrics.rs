//! Goodness-of-fit measures for comparing predictions against labels.

/// root mean square of the differences
pub fn rms_error(predicted: &[f64], actual: &[f64]) -> f64 {
    if predicted.is_empty() {
        return 0.0;
    }
    let sum: f64 = predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (p - a).powi(2))
        .sum();
    (sum / predicted.len() as f64).sqrt()
}

pub fn max_abs_error(predicted: &[f64], actual: &[f64]) -> f64 {
    predicted
        .iter()
        .zip(actual)
        .fold(0.0, |acc, (p, a)| f64::max(acc, (p - a).abs()))
}

/// Coefficient of determination
///
/// Returns 1.0 for a perfect fit of constant labels and 0.0 when the
/// labels are constant but not matched.
pub fn r_squared(predicted: &[f64], actual: &[f64]) -> f64 {
    if actual.is_empty() {
        return 1.0;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    let ss_res: f64 = predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (a - p).powi(2))
        .sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}
