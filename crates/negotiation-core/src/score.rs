//! Score arithmetic shared by every engine in the pipeline.
//!
//! All engine outputs live on a 0-100 scale. Sub-analyses produce their own
//! 0-100 values, get blended with fixed weights, and the blend is clamped
//! back into range before it leaves the engine.

/// Lower bound of every score.
pub const MIN_SCORE: f64 = 0.0;
/// Upper bound of every score.
pub const MAX_SCORE: f64 = 100.0;

/// Clamp a score into [0, 100]. NaN collapses to 0.
pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        return MIN_SCORE;
    }
    value.clamp(MIN_SCORE, MAX_SCORE)
}

/// Weighted sum of (value, weight) pairs. Weights are not normalized;
/// callers pass tables that already sum to 1.0.
pub fn weighted_sum(parts: &[(f64, f64)]) -> f64 {
    parts.iter().map(|(value, weight)| value * weight).sum()
}

/// Median of a slice, `None` when empty.
pub fn median(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    let mut sorted: Vec<f64> = data.iter().copied().filter(|x| !x.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// True when a score sits in either tail (<= low or >= high).
pub fn is_extreme(value: f64, low: f64, high: f64) -> bool {
    value <= low || value >= high
}

/// Index of the highest score. Ties keep the earliest entry, so callers
/// control precedence through ordering.
pub fn argmax(scores: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, &score) in scores.iter().enumerate() {
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((idx, score)),
        }
    }
    best.map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_clamp_score() {
        assert_eq!(clamp_score(-12.0), 0.0);
        assert_eq!(clamp_score(140.0), 100.0);
        assert_eq!(clamp_score(42.5), 42.5);
        assert_eq!(clamp_score(f64::NAN), 0.0);
    }

    #[test]
    fn test_weighted_sum() {
        let total = weighted_sum(&[(100.0, 0.25), (50.0, 0.5), (0.0, 0.25)]);
        assert_relative_eq!(total, 50.0);
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
    }

    #[test]
    fn test_argmax_prefers_first_on_tie() {
        assert_eq!(argmax(&[10.0, 30.0, 30.0]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_is_extreme() {
        assert!(is_extreme(80.0, 25.0, 75.0));
        assert!(is_extreme(10.0, 25.0, 75.0));
        assert!(!is_extreme(50.0, 25.0, 75.0));
    }
}
