//! Percentile with linear interpolation between closest ranks.
//!
//! For sorted values `v` of length n, rank = p/100 * (n - 1) and the result
//! interpolates between `v[floor(rank)]` and `v[ceil(rank)]`. This is the
//! "linear" convention; other conventions can move the threshold across a
//! boundary value and change which components are selected.

/// Percentile `p` (0..=100) of `values`. Returns `None` for empty input.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let p = p.clamp(0.0, 100.0);
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;

    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn empty_is_none() {
        assert_eq!(percentile(&[], 90.0), None);
    }

    #[test]
    fn single_value_is_itself() {
        assert_eq!(percentile(&[3.5], 90.0), Some(3.5));
    }

    #[test]
    fn interpolates_between_ranks() {
        // rank = 0.9 * 4 = 3.6 -> 1 + 0.6 * 9
        assert_approx(
            percentile(&[1.0, 1.0, 1.0, 1.0, 10.0], 90.0).unwrap(),
            6.4,
            DEFAULT_EPSILON,
        );
        // order of input does not matter
        assert_approx(
            percentile(&[10.0, 1.0, 1.0, 1.0, 1.0], 90.0).unwrap(),
            6.4,
            DEFAULT_EPSILON,
        );
    }

    #[test]
    fn extremes_are_min_and_max() {
        let v = [4.0, -2.0, 7.0, 0.5];
        assert_eq!(percentile(&v, 0.0), Some(-2.0));
        assert_eq!(percentile(&v, 100.0), Some(7.0));
        assert_approx(percentile(&v, 50.0).unwrap(), 2.25, DEFAULT_EPSILON);
    }
}
