//! Latency penalty and shared numeric helpers

/// Steepness of the latency penalty sigmoid
pub const PENALTY_STEEPNESS: f64 = 0.0078;

/// Map a detection delay (in rounds, 1-based) to a penalty in (-1, 1).
///
/// `penalty(1) == 0` and the value approaches 1 as the delay grows.
pub fn penalty(delay: u64) -> f64 {
    -1.0 + 2.0 / (1.0 + (-PENALTY_STEEPNESS * (delay as f64 - 1.0)).exp())
}

/// ERDE cost of a true positive emitted at `latency` for target delay `o`
pub fn erde_true_positive(latency: u64, o: f64) -> f64 {
    1.0 - 1.0 / (1.0 + (latency as f64 - o).exp())
}

/// Median of a sample, averaging the two middle values for even lengths.
/// Returns `None` for an empty sample.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Arithmetic mean, `None` for an empty sample
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_penalty_zero_at_first_round() {
        assert_eq!(penalty(1), 0.0);
    }

    #[test]
    fn test_penalty_strictly_increasing() {
        let values: Vec<f64> = (1..=3000).map(penalty).collect();
        assert!(values.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_penalty_approaches_one() {
        assert!(penalty(5000) > 0.99999);
        assert!(penalty(u64::MAX) < 1.0 + 1e-12);
    }

    #[test]
    fn test_erde_true_positive() {
        let expected = 1.0 - 1.0 / (1.0 + (1.0f64 - 5.0).exp());
        assert!((erde_true_positive(1, 5.0) - expected).abs() < 1e-12);
        // At the target delay the cost is exactly one half
        assert!((erde_true_positive(50, 50.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 0.0, 0.5, 0.5]), Some(0.5));
    }
}
