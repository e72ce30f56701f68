use chrono::NaiveDate;
use configuration::TailRiskOptions;
use core_types::{DateBasis, NormalizationMode, Trade};
use rust_decimal::prelude::*;
use std::collections::{BTreeSet, HashMap};

/// Per-strategy daily returns laid out on the union calendar of all strategies.
///
/// `returns[i][t]` is the summed normalized return of `strategies[i]` on `dates[t]`.
/// Cells where the strategy did not trade hold `0.0` and are `false` in
/// `traded_mask`; they are padding, never observations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignedStrategyReturns {
    pub strategies: Vec<String>,
    pub dates: Vec<NaiveDate>,
    pub returns: Vec<Vec<f64>>,
    pub traded_mask: Vec<Vec<bool>>,
}

impl AlignedStrategyReturns {
    pub fn strategy_count(&self) -> usize {
        self.strategies.len()
    }

    pub fn day_count(&self) -> usize {
        self.dates.len()
    }

    /// Number of days on which strategy `index` actually traded.
    pub fn trading_days(&self, index: usize) -> usize {
        self.traded_mask
            .get(index)
            .map_or(0, |row| row.iter().filter(|&&traded| traded).count())
    }
}

/// A single trade reduced to the cell it contributes to.
struct Observation<'a> {
    strategy: &'a str,
    date: NaiveDate,
    value: f64,
}

/// Scales a trade's P/L according to `mode`.
///
/// Returns `None` when the denominator is zero or the result cannot be
/// represented as a finite `f64`; such trades carry no observation at all.
pub fn normalized_return(trade: &Trade, mode: NormalizationMode) -> Option<f64> {
    let scaled = match mode {
        NormalizationMode::Raw => Some(trade.pl),
        NormalizationMode::Margin => scale(trade.pl, Some(trade.margin_req)),
        NormalizationMode::Notional => scale(trade.pl, trade.notional()),
    }?;
    scaled.to_f64().filter(|value| value.is_finite())
}

fn scale(pl: Decimal, denominator: Option<Decimal>) -> Option<Decimal> {
    // Credit trades report negative opening prices; only the magnitude scales.
    let denominator = denominator?.abs();
    if denominator.is_zero() {
        return None;
    }
    pl.checked_div(denominator)
}

/// The date a trade is filed under on the shared calendar.
pub fn anchor_date(trade: &Trade, basis: DateBasis) -> Option<NaiveDate> {
    match basis {
        DateBasis::Opened => Some(trade.date_opened),
        DateBasis::Closed => trade.date_closed,
    }
}

fn observe<'a>(trade: &'a Trade, options: &TailRiskOptions) -> Option<Observation<'a>> {
    let strategy = trade.strategy_label()?;
    let date = anchor_date(trade, options.date_basis)?;

    if let Some(names) = options.strategy_filter() {
        if !names.iter().any(|name| name.trim() == strategy) {
            return None;
        }
    }
    if let Some(ticker) = options.ticker_filter() {
        if !trade.symbol.to_lowercase().contains(&ticker.to_lowercase()) {
            return None;
        }
    }
    if let Some(range) = options.date_range {
        if !range.contains(date) {
            return None;
        }
    }

    let value = normalized_return(trade, options.normalization)?;
    Some(Observation { strategy, date, value })
}

/// Groups trades into per-strategy daily return series aligned on one calendar.
///
/// Strategies and dates are both sorted ascending, so identical inputs always
/// produce identical matrices.
pub fn aggregate_returns(trades: &[Trade], options: &TailRiskOptions) -> AlignedStrategyReturns {
    let observations: Vec<Observation<'_>> =
        trades.iter().filter_map(|trade| observe(trade, options)).collect();

    let strategies: Vec<String> = observations
        .iter()
        .map(|o| o.strategy)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();
    let dates: Vec<NaiveDate> = observations
        .iter()
        .map(|o| o.date)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let strategy_index: HashMap<&str, usize> = strategies
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();
    let date_index: HashMap<NaiveDate, usize> =
        dates.iter().enumerate().map(|(t, date)| (*date, t)).collect();

    let mut returns = vec![vec![0.0; dates.len()]; strategies.len()];
    let mut traded_mask = vec![vec![false; dates.len()]; strategies.len()];
    for observation in &observations {
        let i = strategy_index[observation.strategy];
        let t = date_index[&observation.date];
        returns[i][t] += observation.value;
        traded_mask[i][t] = true;
    }

    tracing::debug!(
        trades = trades.len(),
        kept = observations.len(),
        strategies = strategies.len(),
        days = dates.len(),
        normalization = %options.normalization,
        date_basis = %options.date_basis,
        "Aggregated daily strategy returns."
    );

    AlignedStrategyReturns { strategies, dates, returns, traded_mask }
}
