use crate::attribution::{MarginalContribution, TailRiskAnalytics};
use crate::tail::StrategyTailProfile;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::time::Duration;

/// First and last calendar day of an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnalysisPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// The complete, immutable outcome of one tail-risk analysis run.
///
/// All matrices are indexed in the order of `strategies`. Joint tail-risk cells
/// holding NaN (insufficient data) serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TailRiskAnalysisResult {
    // I. Inputs echoed back
    pub strategies: Vec<String>,
    pub trading_days_used: usize,
    pub analysis_period: Option<AnalysisPeriod>,
    pub tail_threshold: f64,
    pub variance_threshold: f64,

    // II. Dependence
    pub copula_correlation_matrix: Vec<Vec<f64>>,
    pub joint_tail_risk_matrix: Vec<Vec<f64>>,
    pub insufficient_data_pairs: usize,
    pub shared_trading_days: Vec<Vec<usize>>,
    pub tail_profiles: Vec<StrategyTailProfile>,

    // III. Factor structure
    pub eigenvalues: Vec<f64>,
    pub eigenvectors: Vec<Vec<f64>>,
    pub explained_variance: Vec<f64>,
    pub effective_factors: usize,

    // IV. Attribution
    pub analytics: TailRiskAnalytics,
    pub marginal_contributions: Vec<MarginalContribution>,

    // V. Bookkeeping
    pub computed_at: DateTime<Utc>,
    #[serde(with = "humantime_serde")]
    pub computation_duration: Duration,
}

impl TailRiskAnalysisResult {
    pub fn strategy_count(&self) -> usize {
        self.strategies.len()
    }

    /// Position of `strategy` in every matrix of this result.
    pub fn index_of(&self, strategy: &str) -> Option<usize> {
        self.strategies.iter().position(|s| s == strategy)
    }

    /// `P(to in tail | from in tail)`, `None` for unknown names or insufficient data.
    pub fn joint_tail_risk(&self, from: &str, to: &str) -> Option<f64> {
        let (i, j) = (self.index_of(from)?, self.index_of(to)?);
        Some(self.joint_tail_risk_matrix[i][j]).filter(|p| !p.is_nan())
    }
}

/// N x N identity matrix as nested rows.
pub fn identity_matrix(n: usize) -> Vec<Vec<f64>> {
    (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect()
}
