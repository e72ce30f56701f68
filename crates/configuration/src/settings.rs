use chrono::NaiveDate;
use core_types::{DateBasis, NormalizationMode};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TAIL_THRESHOLD: f64 = 0.10;
pub const DEFAULT_VARIANCE_THRESHOLD: f64 = 0.80;
pub const DEFAULT_MIN_TRADING_DAYS: usize = 30;
pub const DEFAULT_CONCENTRATION_WEIGHT: f64 = 0.5;

/// Inclusive bounds on the trade anchor date. Either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }
}

/// Every knob of a tail-risk analysis run. All fields are optional in a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TailRiskOptions {
    /// Quantile that defines a "tail" day, e.g. 0.10 for the worst decile.
    pub tail_threshold: f64,
    /// Below this many calendar days the analysis short-circuits to an identity result.
    pub min_trading_days: usize,
    pub normalization: NormalizationMode,
    pub date_basis: DateBasis,
    /// Case-insensitive substring match against the trade symbol.
    pub ticker_filter: Option<String>,
    pub strategy_filter: Option<Vec<String>>,
    pub date_range: Option<DateRange>,
    /// Share of variance the effective factors must explain.
    pub variance_threshold: f64,
    /// Weight of factor concentration versus average tail dependence in attribution.
    pub concentration_weight: f64,
}

impl Default for TailRiskOptions {
    fn default() -> Self {
        Self {
            tail_threshold: DEFAULT_TAIL_THRESHOLD,
            min_trading_days: DEFAULT_MIN_TRADING_DAYS,
            normalization: NormalizationMode::default(),
            date_basis: DateBasis::default(),
            ticker_filter: None,
            strategy_filter: None,
            date_range: None,
            variance_threshold: DEFAULT_VARIANCE_THRESHOLD,
            concentration_weight: DEFAULT_CONCENTRATION_WEIGHT,
        }
    }
}

impl TailRiskOptions {
    /// The tail quantile clamped to [0.01, 0.99].
    pub fn effective_tail_threshold(&self) -> f64 {
        clamp_or_default(self.tail_threshold, 0.01, 0.99, DEFAULT_TAIL_THRESHOLD)
    }

    /// The explained-variance cutoff clamped to [0.5, 0.99].
    pub fn effective_variance_threshold(&self) -> f64 {
        clamp_or_default(self.variance_threshold, 0.5, 0.99, DEFAULT_VARIANCE_THRESHOLD)
    }

    /// The attribution blend weight clamped to [0, 1].
    pub fn effective_concentration_weight(&self) -> f64 {
        clamp_or_default(self.concentration_weight, 0.0, 1.0, DEFAULT_CONCENTRATION_WEIGHT)
    }

    /// The ticker filter, or `None` when it is absent or blank.
    pub fn ticker_filter(&self) -> Option<&str> {
        self.ticker_filter
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// The strategy filter, or `None` when it is absent or empty.
    pub fn strategy_filter(&self) -> Option<&[String]> {
        self.strategy_filter.as_deref().filter(|names| !names.is_empty())
    }
}

fn clamp_or_default(value: f64, min: f64, max: f64, default: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        default
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn tail_threshold_is_clamped() {
        let mut options = TailRiskOptions { tail_threshold: 5.0, ..Default::default() };
        assert_relative_eq!(options.effective_tail_threshold(), 0.99);

        options.tail_threshold = -1.0;
        assert_relative_eq!(options.effective_tail_threshold(), 0.01);

        options.tail_threshold = f64::NAN;
        assert_relative_eq!(options.effective_tail_threshold(), DEFAULT_TAIL_THRESHOLD);
    }

    #[test]
    fn variance_threshold_and_weight_are_clamped() {
        let options = TailRiskOptions {
            variance_threshold: 0.2,
            concentration_weight: 1.7,
            ..Default::default()
        };
        assert_relative_eq!(options.effective_variance_threshold(), 0.5);
        assert_relative_eq!(options.effective_concentration_weight(), 1.0);

        let options = TailRiskOptions { variance_threshold: 1.5, ..Default::default() };
        assert_relative_eq!(options.effective_variance_threshold(), 0.99);
    }

    #[test]
    fn blank_filters_are_ignored() {
        let options = TailRiskOptions {
            ticker_filter: Some("  ".to_string()),
            strategy_filter: Some(Vec::new()),
            ..Default::default()
        };
        assert_eq!(options.ticker_filter(), None);
        assert_eq!(options.strategy_filter(), None);
    }

    #[test]
    fn date_range_is_inclusive() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 5, day).unwrap();
        let range = DateRange { from: Some(d(3)), to: Some(d(7)) };
        assert!(range.contains(d(3)));
        assert!(range.contains(d(7)));
        assert!(!range.contains(d(2)));
        assert!(!range.contains(d(8)));

        let open_ended = DateRange { from: None, to: Some(d(7)) };
        assert!(open_ended.contains(d(1)));
    }
}
