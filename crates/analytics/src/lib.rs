//! # Tail-Risk Dependence Engine
//!
//! This crate measures how likely independently-run trading strategies are to
//! suffer extreme losses *together*, even when their everyday correlation
//! looks low.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of storage,
//!   files or presentation. It depends only on `core-types` and `configuration`.
//! - **Stateless Calculation:** The `TailRiskEngine` takes an immutable slice of
//!   trades plus options and produces a `TailRiskAnalysisResult`. Data-quality
//!   problems are encoded in the result (identity matrices, NaN cells), never
//!   raised as errors.
//!
//! ## Pipeline
//!
//! 1. `aggregator` - per-strategy daily returns on a shared, zero-padded calendar.
//! 2. `stats` - probability integral transform onto normal scores.
//! 3. `dependence` - Kendall tau-b mapped to a copula correlation matrix.
//! 4. `factors` - eigen-decomposition and effective factor count.
//! 5. `tail` - directional conditional tail co-occurrence probabilities.
//! 6. `attribution` - tail-matrix summary and per-strategy contributions.

// Declare the modules that constitute this crate.
pub mod aggregator;
pub mod attribution;
pub mod dependence;
pub mod engine;
pub mod error;
pub mod factors;
pub mod report;
pub mod stats;
pub mod tail;

// Re-export the key components to create a clean, public-facing API.
pub use aggregator::{aggregate_returns, AlignedStrategyReturns};
pub use attribution::{MarginalContribution, PairScore, TailRiskAnalytics};
pub use engine::TailRiskEngine;
pub use error::AnalyticsError;
pub use factors::{EigenPairs, EigenSolver, FactorAnalysis, NalgebraEigenSolver};
pub use report::{AnalysisPeriod, TailRiskAnalysisResult};
pub use tail::{JointTailRisk, StrategyTailProfile};
