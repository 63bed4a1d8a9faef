//! Decimation of oversized series to a bounded point budget.
//!
//! The budget is shared by the [`SERIES_PER_DATASET`] series drawn from one dataset,
//! so the stride is `ceil(n / budget * SERIES_PER_DATASET)`. Plain decimation; any
//! aliasing it introduces is accepted.

use crate::config::SERIES_PER_DATASET;

/// Stride for `n` samples under `budget` points; always at least 1.
pub fn stride(n: usize, budget: usize) -> usize {
    if n == 0 {
        return 1;
    }
    let budget = budget.max(1);
    let step = (n as f64 / budget as f64 * SERIES_PER_DATASET as f64).ceil();
    (step as usize).max(1)
}

/// Indices kept for `n` samples under `budget`, starting at 0.
pub fn indices(n: usize, budget: usize) -> impl Iterator<Item = usize> {
    (0..n).step_by(stride(n, budget))
}

/// Every `stride`-th element of `data`.
pub fn decimate<T: Copy>(data: &[T], budget: usize) -> Vec<T> {
    indices(data.len(), budget).map(|i| data[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousand_samples_into_five_hundred() {
        assert_eq!(stride(1000, 500), 8);
        assert_eq!(indices(1000, 500).count(), 125);
    }

    #[test]
    fn small_inputs_keep_everything() {
        assert_eq!(stride(10, 2048), 1);
        let data: Vec<u32> = (0..10).collect();
        assert_eq!(decimate(&data, 2048), data);
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert_eq!(stride(0, 500), 1);
        assert!(decimate::<f64>(&[], 500).is_empty());
    }

    #[test]
    fn output_is_bounded_by_budget_share() {
        for n in [1usize, 7, 513, 2048, 10_000, 123_457] {
            let kept = indices(n, 2048).count();
            assert!(kept <= 2048 / SERIES_PER_DATASET + 1, "n={} kept={}", n, kept);
            assert!(kept >= 1);
        }
    }

    #[test]
    fn zero_budget_does_not_panic() {
        assert_eq!(indices(5, 0).count(), 1);
    }
}
