use crate::settings::TailRiskOptions;
use chrono::NaiveDate;
use core_types::{DateBasis, NormalizationMode};

/// Command-line overrides for a loaded `TailRiskOptions`.
///
/// Any flag left unset keeps the value from the config file or environment.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct OptionOverrides {
    /// Tail quantile in (0, 1); clamped to [0.01, 0.99].
    #[arg(long)]
    pub tail_threshold: Option<f64>,

    /// Minimum number of calendar days required for a full analysis.
    #[arg(long)]
    pub min_trading_days: Option<usize>,

    /// Return scaling: raw, margin or notional.
    #[arg(long)]
    pub normalization: Option<NormalizationMode>,

    /// Calendar anchor: opened or closed.
    #[arg(long)]
    pub date_basis: Option<DateBasis>,

    /// Keep only trades whose symbol contains this text.
    #[arg(long)]
    pub ticker: Option<String>,

    /// Keep only these strategies (repeat the flag or separate with commas).
    #[arg(long = "strategy", value_delimiter = ',')]
    pub strategies: Vec<String>,

    /// First anchor date to include (YYYY-MM-DD).
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last anchor date to include (YYYY-MM-DD).
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Explained-variance cutoff for the effective factor count.
    #[arg(long)]
    pub variance_threshold: Option<f64>,

    /// Weight of factor concentration in the attribution blend.
    #[arg(long)]
    pub concentration_weight: Option<f64>,
}

impl OptionOverrides {
    pub fn apply(self, mut options: TailRiskOptions) -> TailRiskOptions {
        if let Some(v) = self.tail_threshold {
            options.tail_threshold = v;
        }
        if let Some(v) = self.min_trading_days {
            options.min_trading_days = v;
        }
        if let Some(v) = self.normalization {
            options.normalization = v;
        }
        if let Some(v) = self.date_basis {
            options.date_basis = v;
        }
        if self.ticker.is_some() {
            options.ticker_filter = self.ticker;
        }
        if !self.strategies.is_empty() {
            options.strategy_filter = Some(self.strategies);
        }
        if self.from.is_some() || self.to.is_some() {
            let mut range = options.date_range.unwrap_or_default();
            range.from = self.from.or(range.from);
            range.to = self.to.or(range.to);
            options.date_range = Some(range);
        }
        if let Some(v) = self.variance_threshold {
            options.variance_threshold = v;
        }
        if let Some(v) = self.concentration_weight {
            options.concentration_weight = v;
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::DateRange;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        overrides: OptionOverrides,
    }

    #[test]
    fn flags_override_loaded_options() {
        let cli = TestCli::parse_from([
            "test",
            "--tail-threshold",
            "0.05",
            "--normalization",
            "notional",
            "--strategy",
            "Iron Condor,Strangle",
            "--to",
            "2024-06-30",
        ]);
        let base = TailRiskOptions {
            date_range: Some(DateRange {
                from: NaiveDate::from_ymd_opt(2024, 1, 1),
                to: None,
            }),
            ..Default::default()
        };

        let options = cli.overrides.apply(base);
        assert_eq!(options.tail_threshold, 0.05);
        assert_eq!(options.normalization, NormalizationMode::Notional);
        assert_eq!(options.date_basis, DateBasis::Opened);
        assert_eq!(options.strategy_filter().map(|s| s.len()), Some(2));
        assert_eq!(
            options.date_range,
            Some(DateRange {
                from: NaiveDate::from_ymd_opt(2024, 1, 1),
                to: NaiveDate::from_ymd_opt(2024, 6, 30),
            })
        );
    }

    #[test]
    fn no_flags_leave_options_untouched() {
        let cli = TestCli::parse_from(["test"]);
        let base = TailRiskOptions { min_trading_days: 12, ..Default::default() };
        assert_eq!(cli.overrides.apply(base.clone()), base);
    }
}
