use serde::Serialize;
use std::cmp::Ordering;

/// Pair score above which a strategy pair counts as highly tail-dependent.
pub const HIGH_DEPENDENCE_THRESHOLD: f64 = 0.5;

/// A strategy pair and its symmetric tail-dependence score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairScore {
    pub pair: (String, String),
    pub value: f64,
}

/// Summary statistics over every valid strategy pair of the joint tail matrix.
///
/// The default value is the zeroed summary used when nothing could be measured.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TailRiskAnalytics {
    pub highest_joint_tail_risk: Option<PairScore>,
    pub lowest_joint_tail_risk: Option<PairScore>,
    pub average_joint_tail_risk: f64,
    /// Fraction of valid pairs scoring above [`HIGH_DEPENDENCE_THRESHOLD`].
    pub high_risk_pair_share: f64,
    pub valid_pairs: usize,
    pub total_pairs: usize,
}

/// A strategy's share of responsibility for portfolio tail risk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarginalContribution {
    pub strategy: String,
    /// 0-100 diagnostic score; contributions do not sum to 100.
    pub tail_risk_contribution: f64,
    pub concentration_score: f64,
    pub average_tail_dependence: f64,
}

/// Mean of the two directional entries, or `None` if either is missing.
pub fn pair_score(matrix: &[Vec<f64>], i: usize, j: usize) -> Option<f64> {
    let (forward, backward) = (matrix[i][j], matrix[j][i]);
    (forward.is_finite() && backward.is_finite()).then(|| (forward + backward) / 2.0)
}

/// Extremes, mean and high-dependence share of the pair scores.
///
/// Pairs with an insufficient-data direction are skipped entirely. On ties the
/// first pair in row-major order wins.
pub fn summarize_tail_matrix(strategies: &[String], matrix: &[Vec<f64>]) -> TailRiskAnalytics {
    let n = strategies.len();
    let mut summary = TailRiskAnalytics {
        total_pairs: n * n.saturating_sub(1) / 2,
        ..Default::default()
    };

    let mut sum = 0.0;
    let mut high = 0usize;
    for i in 0..n {
        for j in i + 1..n {
            let Some(value) = pair_score(matrix, i, j) else {
                continue;
            };
            summary.valid_pairs += 1;
            sum += value;
            if value > HIGH_DEPENDENCE_THRESHOLD {
                high += 1;
            }

            let score = || PairScore {
                pair: (strategies[i].clone(), strategies[j].clone()),
                value,
            };
            if summary.highest_joint_tail_risk.as_ref().is_none_or(|best| value > best.value) {
                summary.highest_joint_tail_risk = Some(score());
            }
            if summary.lowest_joint_tail_risk.as_ref().is_none_or(|worst| value < worst.value) {
                summary.lowest_joint_tail_risk = Some(score());
            }
        }
    }

    if summary.valid_pairs > 0 {
        summary.average_joint_tail_risk = sum / summary.valid_pairs as f64;
        summary.high_risk_pair_share = high as f64 / summary.valid_pairs as f64;
    }
    summary
}

/// Ranks strategies by their blended contribution to portfolio tail risk.
///
/// Each score is `100 * (w * concentration + (1 - w) * average tail dependence)`,
/// where concentration is the strategy's share of absolute loading on the
/// dominant factor.
pub fn marginal_contributions(
    strategies: &[String],
    dominant_loadings: Option<&[f64]>,
    matrix: &[Vec<f64>],
    concentration_weight: f64,
) -> Vec<MarginalContribution> {
    let n = strategies.len();
    let concentration = concentration_scores(n, dominant_loadings);

    let mut contributions: Vec<MarginalContribution> = strategies
        .iter()
        .enumerate()
        .map(|(i, strategy)| {
            let scores: Vec<f64> = (0..n)
                .filter(|&j| j != i)
                .filter_map(|j| pair_score(matrix, i, j))
                .collect();
            let average_tail_dependence = if scores.is_empty() {
                0.0
            } else {
                scores.iter().sum::<f64>() / scores.len() as f64
            };
            let blended = concentration_weight * concentration[i]
                + (1.0 - concentration_weight) * average_tail_dependence;

            MarginalContribution {
                strategy: strategy.clone(),
                tail_risk_contribution: 100.0 * blended,
                concentration_score: concentration[i],
                average_tail_dependence,
            }
        })
        .collect();

    sort_contributions(&mut contributions);
    contributions
}

/// `100 / N` for every strategy; the attribution of a degenerate analysis.
pub fn equal_contributions(strategies: &[String]) -> Vec<MarginalContribution> {
    let share = 1.0 / strategies.len().max(1) as f64;
    strategies
        .iter()
        .map(|strategy| MarginalContribution {
            strategy: strategy.clone(),
            tail_risk_contribution: 100.0 * share,
            concentration_score: share,
            average_tail_dependence: 0.0,
        })
        .collect()
}

fn concentration_scores(n: usize, loadings: Option<&[f64]>) -> Vec<f64> {
    let equal = vec![1.0 / n.max(1) as f64; n];
    let Some(loadings) = loadings.filter(|l| l.len() == n) else {
        return equal;
    };
    let total: f64 = loadings.iter().map(|l| l.abs()).sum();
    if total > 0.0 && total.is_finite() {
        loadings.iter().map(|l| l.abs() / total).collect()
    } else {
        equal
    }
}

fn sort_contributions(contributions: &mut [MarginalContribution]) {
    contributions.sort_by(|a, b| {
        b.tail_risk_contribution
            .partial_cmp(&a.tail_risk_contribution)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.strategy.cmp(&b.strategy))
    });
}
