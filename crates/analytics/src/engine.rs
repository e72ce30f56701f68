use crate::aggregator::{aggregate_returns, AlignedStrategyReturns};
use crate::attribution::{equal_contributions, marginal_contributions, summarize_tail_matrix, TailRiskAnalytics};
use crate::dependence::copula_correlation_matrix;
use crate::factors::{analyze_factors, EigenSolver, FactorAnalysis, NalgebraEigenSolver};
use crate::report::{identity_matrix, AnalysisPeriod, TailRiskAnalysisResult};
use crate::stats::probability_integral_transform;
use crate::tail::{estimate_joint_tail_risk, shared_trading_days};
use chrono::Utc;
use configuration::TailRiskOptions;
use core_types::Trade;
use std::time::Instant;

/// A stateless calculator for the tail-risk dependence between trading strategies.
///
/// The engine owns nothing but its eigen-solver, so a single instance can
/// serve any number of concurrent analyses.
#[derive(Debug, Default)]
pub struct TailRiskEngine<S = NalgebraEigenSolver> {
    solver: S,
}

impl TailRiskEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: EigenSolver> TailRiskEngine<S> {
    /// Uses `solver` for the factor analysis instead of the nalgebra backend.
    pub fn with_solver(solver: S) -> Self {
        Self { solver }
    }

    /// The main entry point for a tail-risk analysis.
    ///
    /// # Arguments
    ///
    /// * `trades` - Every trade in scope; filtering happens here according to `options`.
    /// * `options` - Thresholds, filters and normalization. Out-of-range values are clamped.
    ///
    /// # Returns
    ///
    /// A `TailRiskAnalysisResult`. Insufficient data never fails the call; it
    /// produces an identity result with equal attribution instead.
    #[tracing::instrument(name = "tail_risk_analyze", skip_all, fields(trades = trades.len()))]
    pub fn analyze(&self, trades: &[Trade], options: &TailRiskOptions) -> TailRiskAnalysisResult {
        let started = Instant::now();
        let tail_threshold = options.effective_tail_threshold();
        let variance_threshold = options.effective_variance_threshold();

        let aligned = aggregate_returns(trades, options);
        let shared = shared_trading_days(&aligned.traded_mask);
        let overlap = widest_overlap(&shared);
        if aligned.strategy_count() < 2 || overlap < options.min_trading_days {
            tracing::info!(
                strategies = aligned.strategy_count(),
                days = aligned.day_count(),
                widest_overlap = overlap,
                min_trading_days = options.min_trading_days,
                "Not enough data for a tail-risk analysis; returning identity result."
            );
            return degenerate_result(aligned, shared, tail_threshold, variance_threshold, started);
        }

        // --- 1. Marginals ---
        let transformed: Vec<Vec<f64>> = aligned
            .returns
            .iter()
            .map(|row| probability_integral_transform(row))
            .collect();

        // --- 2. Dependence and factor structure ---
        let correlation = copula_correlation_matrix(&transformed);
        let factors = analyze_factors(&correlation, variance_threshold, &self.solver);

        // --- 3. Tails ---
        let joint = estimate_joint_tail_risk(
            &aligned.strategies,
            &transformed,
            &aligned.traded_mask,
            tail_threshold,
        );

        // --- 4. Summary and attribution ---
        let analytics = summarize_tail_matrix(&aligned.strategies, &joint.matrix);
        let contributions = marginal_contributions(
            &aligned.strategies,
            factors.dominant_loadings(),
            &joint.matrix,
            options.effective_concentration_weight(),
        );

        let duration = started.elapsed();
        tracing::info!(
            strategies = aligned.strategy_count(),
            days = aligned.day_count(),
            effective_factors = factors.effective_factors,
            insufficient_data_pairs = joint.insufficient_data_pairs,
            average_joint_tail_risk = analytics.average_joint_tail_risk,
            elapsed_ms = duration.as_millis() as u64,
            "Tail-risk analysis complete."
        );

        TailRiskAnalysisResult {
            analysis_period: period(&aligned),
            trading_days_used: aligned.day_count(),
            strategies: aligned.strategies,
            tail_threshold,
            variance_threshold,
            copula_correlation_matrix: correlation,
            joint_tail_risk_matrix: joint.matrix,
            insufficient_data_pairs: joint.insufficient_data_pairs,
            shared_trading_days: joint.shared_trading_days,
            tail_profiles: joint.profiles,
            eigenvalues: factors.eigenvalues,
            eigenvectors: factors.eigenvectors,
            explained_variance: factors.explained_variance,
            effective_factors: factors.effective_factors,
            analytics,
            marginal_contributions: contributions,
            computed_at: Utc::now(),
            computation_duration: duration,
        }
    }
}

/// Most days any two distinct strategies traded together.
fn widest_overlap(shared: &[Vec<usize>]) -> usize {
    shared
        .iter()
        .enumerate()
        .flat_map(|(i, row)| row.iter().skip(i + 1).copied())
        .max()
        .unwrap_or(0)
}

fn period(aligned: &AlignedStrategyReturns) -> Option<AnalysisPeriod> {
    Some(AnalysisPeriod {
        start: *aligned.dates.first()?,
        end: *aligned.dates.last()?,
    })
}

/// Identity matrices, one factor per strategy, zeroed analytics and equal attribution.
fn degenerate_result(
    aligned: AlignedStrategyReturns,
    shared_trading_days: Vec<Vec<usize>>,
    tail_threshold: f64,
    variance_threshold: f64,
    started: Instant,
) -> TailRiskAnalysisResult {
    let n = aligned.strategy_count();
    let factors = FactorAnalysis::identity(n);

    TailRiskAnalysisResult {
        analysis_period: period(&aligned),
        trading_days_used: aligned.day_count(),
        tail_threshold,
        variance_threshold,
        copula_correlation_matrix: identity_matrix(n),
        joint_tail_risk_matrix: identity_matrix(n),
        insufficient_data_pairs: 0,
        shared_trading_days,
        tail_profiles: Vec::new(),
        eigenvalues: factors.eigenvalues,
        eigenvectors: factors.eigenvectors,
        explained_variance: factors.explained_variance,
        effective_factors: factors.effective_factors,
        analytics: TailRiskAnalytics::default(),
        marginal_contributions: equal_contributions(&aligned.strategies),
        strategies: aligned.strategies,
        computed_at: Utc::now(),
        computation_duration: started.elapsed(),
    }
}
