use crate::stats::percentile;
use serde::Serialize;

/// Hard floor on both-in-tail co-occurrences for a conditional probability.
pub const MIN_TAIL_OBSERVATIONS: usize = 5;

/// Fraction of the expected tail-event count (`tail_threshold * shared_days`)
/// that must co-occur. A tunable heuristic, not a derived statistic.
pub const TAIL_OBSERVATION_SCALE: f64 = 0.1;

/// Co-occurrences required before `P(j in tail | i in tail)` is reported:
/// `max(5, ceil(0.1 * tail_threshold * shared_days))`.
pub fn minimum_tail_observations(tail_threshold: f64, shared_days: usize) -> usize {
    let expected = TAIL_OBSERVATION_SCALE * tail_threshold * shared_days as f64;
    // The product picks up representation error (0.1 * 0.1 * 100 > 1.0).
    let scaled = (expected - 1e-9).ceil().max(0.0) as usize;
    MIN_TAIL_OBSERVATIONS.max(scaled)
}

/// Where a single strategy's tail begins, measured on its own trading days.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyTailProfile {
    pub strategy: String,
    pub trading_days: usize,
    pub tail_days: usize,
    /// Transformed-return cutoff; NaN when the strategy never traded.
    pub tail_cutoff: f64,
}

/// Directional tail co-occurrence probabilities for every strategy pair.
#[derive(Debug, Clone, PartialEq)]
pub struct JointTailRisk {
    /// `matrix[i][j] = P(j in tail | i in tail)` on shared trading days, NaN if
    /// there were too few co-occurrences. Diagonal is 1.0.
    pub matrix: Vec<Vec<f64>>,
    pub shared_trading_days: Vec<Vec<usize>>,
    /// Unordered pairs with at least one NaN direction.
    pub insufficient_data_pairs: usize,
    pub profiles: Vec<StrategyTailProfile>,
}

/// Days on which both strategies traded; the diagonal is each strategy's own count.
pub fn shared_trading_days(traded_mask: &[Vec<bool>]) -> Vec<Vec<usize>> {
    traded_mask
        .iter()
        .map(|a| {
            traded_mask
                .iter()
                .map(|b| a.iter().zip(b).filter(|&(&x, &y)| x && y).count())
                .collect()
        })
        .collect()
}

/// Estimates the joint tail-risk matrix from transformed returns.
///
/// A day is "in tail" for a strategy only if the strategy traded that day and
/// its transformed return is at or below the strategy's `tail_threshold`
/// quantile, where the quantile ignores zero-padded non-trading days.
pub fn estimate_joint_tail_risk(
    strategies: &[String],
    transformed: &[Vec<f64>],
    traded_mask: &[Vec<bool>],
    tail_threshold: f64,
) -> JointTailRisk {
    let n = transformed.len();

    let cutoffs: Vec<f64> = transformed
        .iter()
        .zip(traded_mask)
        .map(|(row, mask)| {
            let traded: Vec<f64> = row
                .iter()
                .zip(mask)
                .filter_map(|(&value, &traded)| traded.then_some(value))
                .collect();
            percentile(&traded, tail_threshold)
        })
        .collect();

    let in_tail: Vec<Vec<bool>> = transformed
        .iter()
        .zip(traded_mask)
        .zip(&cutoffs)
        .map(|((row, mask), &cutoff)| {
            row.iter()
                .zip(mask)
                .map(|(&value, &traded)| traded && value <= cutoff)
                .collect()
        })
        .collect();

    let shared = shared_trading_days(traded_mask);

    let mut matrix = vec![vec![1.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let (mut tail_i, mut both) = (0usize, 0usize);
            for t in 0..in_tail[i].len() {
                if !(traded_mask[i][t] && traded_mask[j][t]) || !in_tail[i][t] {
                    continue;
                }
                tail_i += 1;
                if in_tail[j][t] {
                    both += 1;
                }
            }
            let required = minimum_tail_observations(tail_threshold, shared[i][j]);
            matrix[i][j] = if both < required {
                f64::NAN
            } else {
                both as f64 / tail_i as f64
            };
        }
    }

    let insufficient_data_pairs = (0..n)
        .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
        .filter(|&(i, j)| matrix[i][j].is_nan() || matrix[j][i].is_nan())
        .count();

    let profiles = strategies
        .iter()
        .enumerate()
        .map(|(i, strategy)| StrategyTailProfile {
            strategy: strategy.clone(),
            trading_days: shared[i][i],
            tail_days: in_tail[i].iter().filter(|&&flag| flag).count(),
            tail_cutoff: cutoffs[i],
        })
        .collect();

    tracing::debug!(
        strategies = n,
        tail_threshold,
        insufficient_data_pairs,
        "Estimated joint tail-risk matrix."
    );

    JointTailRisk {
        matrix,
        shared_trading_days: shared,
        insufficient_data_pairs,
        profiles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("S{i}")).collect()
    }

    /// 100 days. A trades every day with its ten worst days at 0..10; B trades
    /// only days 0..50 with its five worst days at 0..5.
    fn nested_tails() -> (Vec<Vec<f64>>, Vec<Vec<bool>>) {
        let a: Vec<f64> = (0..100)
            .map(|t| if t < 10 { -100.0 - t as f64 } else { t as f64 })
            .collect();
        let b: Vec<f64> = (0..100)
            .map(|t| match t {
                0..5 => -50.0 - t as f64,
                5..50 => t as f64,
                _ => 0.0,
            })
            .collect();
        let mask_a = vec![true; 100];
        let mask_b: Vec<bool> = (0..100).map(|t| t < 50).collect();
        (vec![a, b], vec![mask_a, mask_b])
    }

    #[test]
    fn dynamic_minimum_scales_with_shared_days() {
        assert_eq!(minimum_tail_observations(0.1, 50), 5);
        assert_eq!(minimum_tail_observations(0.1, 100), 5);
        assert_eq!(minimum_tail_observations(0.1, 6_000), 60);
        assert_eq!(minimum_tail_observations(0.5, 2_001), 101);
        assert_eq!(minimum_tail_observations(0.99, 10_000), 990);
        assert_eq!(minimum_tail_observations(0.1, 0), 5);
    }

    #[test]
    fn conditional_probabilities_are_directional() {
        let (transformed, mask) = nested_tails();
        let joint = estimate_joint_tail_risk(&names(2), &transformed, &mask, 0.1);

        // Ten A-tail days on the shared window, five of which are B-tail days.
        assert_relative_eq!(joint.matrix[0][1], 0.5);
        // Every B-tail day is an A-tail day.
        assert_relative_eq!(joint.matrix[1][0], 1.0);
        assert_ne!(joint.matrix[0][1], joint.matrix[1][0]);
        assert_eq!(joint.matrix[0][0], 1.0);
        assert_eq!(joint.matrix[1][1], 1.0);
        assert_eq!(joint.insufficient_data_pairs, 0);
        assert_eq!(joint.shared_trading_days[0][1], 50);
        assert_eq!(joint.shared_trading_days[1][1], 50);
    }

    #[test]
    fn padding_days_never_enter_the_tail() {
        let (transformed, mask) = nested_tails();
        let joint = estimate_joint_tail_risk(&names(2), &transformed, &mask, 0.1);

        let b = &joint.profiles[1];
        assert_eq!(b.trading_days, 50);
        assert_eq!(b.tail_days, 5);
        // Cutoff sits between the 5th and 6th worst traded values (-50 and 5).
        assert_relative_eq!(b.tail_cutoff, -50.0 + 0.9 * 55.0, epsilon = 1e-9);
        assert_eq!(joint.profiles[0].tail_days, 10);
    }

    #[test]
    fn too_few_co_occurrences_yield_nan() {
        // 40 identical days: four tail days each, below the floor of five.
        let row: Vec<f64> = (0..40).map(f64::from).collect();
        let transformed = vec![row.clone(), row];
        let mask = vec![vec![true; 40]; 2];
        let joint = estimate_joint_tail_risk(&names(2), &transformed, &mask, 0.1);

        assert!(joint.matrix[0][1].is_nan());
        assert!(joint.matrix[1][0].is_nan());
        assert_eq!(joint.insufficient_data_pairs, 1);
        assert_eq!(joint.matrix[0][0], 1.0);
    }

    #[test]
    fn strategies_without_overlap_are_insufficient() {
        let transformed = vec![vec![-1.0, 0.0], vec![0.0, -1.0]];
        let mask = vec![vec![true, false], vec![false, true]];
        let joint = estimate_joint_tail_risk(&names(2), &transformed, &mask, 0.5);
        assert_eq!(joint.shared_trading_days[0][1], 0);
        assert!(joint.matrix[0][1].is_nan());
        assert_eq!(joint.insufficient_data_pairs, 1);
    }

    #[test]
    fn idle_strategy_has_no_cutoff() {
        let transformed = vec![vec![0.0; 3]];
        let mask = vec![vec![false; 3]];
        let joint = estimate_joint_tail_risk(&names(1), &transformed, &mask, 0.1);
        assert!(joint.profiles[0].tail_cutoff.is_nan());
        assert_eq!(joint.profiles[0].tail_days, 0);
        assert_eq!(joint.matrix, vec![vec![1.0]]);
    }
}
