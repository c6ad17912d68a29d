//! Progress derivation for key results and objectives.
//!
//! # Invariants
//! - Every value returned here is finite and lies in `[0, 100]`.
//! - An objective without key results has progress `0`, never NaN.

use crate::model::key_result::KeyResultType;

pub const MIN_PROGRESS: f64 = 0.0;
pub const MAX_PROGRESS: f64 = 100.0;

/// Whether `current_value` has reached `target_value` coming from
/// `start_value`.
///
/// Descending targets (`target < start`) are reached from above. Agrees with
/// [`key_result_progress`]: completed exactly when progress is `100`.
pub fn is_completed(start_value: f64, target_value: f64, current_value: f64) -> bool {
    if target_value < start_value {
        current_value <= target_value
    } else {
        current_value >= target_value
    }
}

/// Derives key result progress in percent.
///
/// Metric results interpolate linearly between `start_value` and
/// `target_value` and clamp to `[0, 100]`; this also covers descending
/// targets (`target < start`). Binary results are `0` or `100` by
/// [`is_completed`]. A zero span, which validation keeps out of storage,
/// degrades to the binary rule.
pub fn key_result_progress(
    kind: KeyResultType,
    start_value: f64,
    target_value: f64,
    current_value: f64,
) -> f64 {
    let binary = || {
        if is_completed(start_value, target_value, current_value) {
            MAX_PROGRESS
        } else {
            MIN_PROGRESS
        }
    };

    match kind {
        KeyResultType::Binary => binary(),
        KeyResultType::Metric => {
            let span = target_value - start_value;
            if span == 0.0 {
                return binary();
            }
            clamp_progress((current_value - start_value) / span * 100.0)
        }
    }
}

/// Mean of key result progress values; `0` for an empty set.
pub fn objective_progress(key_result_progress: &[f64]) -> f64 {
    clamp_progress(mean(key_result_progress))
}

/// Arithmetic mean with the empty set mapped to `0`.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Clamps to `[0, 100]`; NaN collapses to `0`.
pub fn clamp_progress(value: f64) -> f64 {
    if value.is_nan() {
        return MIN_PROGRESS;
    }
    value.clamp(MIN_PROGRESS, MAX_PROGRESS)
}

#[cfg(test)]
mod tests {
    use super::{
        clamp_progress, is_completed, key_result_progress, objective_progress, MAX_PROGRESS,
    };
    use crate::model::key_result::KeyResultType;

    #[test]
    fn metric_halfway_is_fifty_percent() {
        assert_eq!(key_result_progress(KeyResultType::Metric, 0.0, 50.0, 25.0), 50.0);
    }

    #[test]
    fn metric_clamps_outside_range() {
        assert_eq!(key_result_progress(KeyResultType::Metric, 10.0, 20.0, 5.0), 0.0);
        assert_eq!(key_result_progress(KeyResultType::Metric, 10.0, 20.0, 95.0), 100.0);
    }

    #[test]
    fn metric_supports_descending_targets() {
        // Reduce churn from 10% to 5%.
        assert_eq!(key_result_progress(KeyResultType::Metric, 10.0, 5.0, 7.5), 50.0);
        assert_eq!(key_result_progress(KeyResultType::Metric, 10.0, 5.0, 12.0), 0.0);
        assert!(!is_completed(10.0, 5.0, 9.0));
        assert!(!is_completed(10.0, 5.0, 7.5));
        assert!(is_completed(10.0, 5.0, 5.0));
        assert!(is_completed(10.0, 5.0, 3.0));
    }

    #[test]
    fn binary_follows_direction_of_target() {
        assert_eq!(key_result_progress(KeyResultType::Binary, 1.0, 0.0, 1.0), 0.0);
        assert_eq!(key_result_progress(KeyResultType::Binary, 1.0, 0.0, 0.0), 100.0);
        assert!(!is_completed(1.0, 0.0, 1.0));
    }

    #[test]
    fn completion_agrees_with_full_progress() {
        let spans = [(0.0, 100.0), (10.0, 5.0), (-3.0, 7.0), (200.0, -50.0)];
        for kind in [KeyResultType::Metric, KeyResultType::Binary] {
            for (start, target) in spans {
                for fraction in [-0.25, 0.0, 0.25, 0.5, 0.75, 1.0, 1.5] {
                    let current = start + (target - start) * fraction;
                    let progress = key_result_progress(kind, start, target, current);
                    let completed = is_completed(start, target, current);
                    assert_eq!(
                        completed,
                        progress == MAX_PROGRESS,
                        "{kind:?} start={start} target={target} current={current}"
                    );
                }
            }
        }
    }

    #[test]
    fn binary_is_all_or_nothing() {
        assert_eq!(key_result_progress(KeyResultType::Binary, 0.0, 1.0, 0.0), 0.0);
        assert_eq!(key_result_progress(KeyResultType::Binary, 0.0, 1.0, 1.0), 100.0);
    }

    #[test]
    fn zero_span_never_yields_nan() {
        assert_eq!(key_result_progress(KeyResultType::Metric, 5.0, 5.0, 4.0), 0.0);
        assert_eq!(key_result_progress(KeyResultType::Metric, 5.0, 5.0, 5.0), 100.0);
    }

    #[test]
    fn objective_progress_is_mean_or_zero() {
        assert_eq!(objective_progress(&[]), 0.0);
        assert_eq!(objective_progress(&[100.0, 0.0, 50.0]), 50.0);
    }

    #[test]
    fn clamp_handles_non_finite() {
        assert_eq!(clamp_progress(f64::NAN), 0.0);
        assert_eq!(clamp_progress(f64::INFINITY), 100.0);
        assert_eq!(clamp_progress(f64::NEG_INFINITY), 0.0);
    }
}
