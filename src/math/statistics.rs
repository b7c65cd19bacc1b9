use nalgebra::DVector;

/// z-score of a two-sided 95% interval under a normal distribution.
pub const Z_95: f64 = 1.96;

/// `values` shifted so that its minimum is zero.
pub fn relative(values: &DVector<f64>) -> DVector<f64> {
    if values.is_empty() {
        return values.clone();
    }
    let min = values.min();
    values.map(|v| v - min)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator); undefined below two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Half-width of the large-sample interval `1.96 * sd / sqrt(n)`.
pub fn confidence_95(values: &[f64]) -> Option<f64> {
    sample_std(values).map(|sd| Z_95 * sd / (values.len() as f64).sqrt())
}
