use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single closed (or still open) trade as exported by the trade journal.
///
/// The tail-risk engine only ever reads these; the journal owns them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    #[serde(default = "Uuid::new_v4")]
    pub trade_id: Uuid,
    /// Ticker or leg description, e.g. "SPX 4500P/4450P".
    #[serde(default)]
    pub symbol: String,
    /// The strategy label the trade was filed under. Unlabelled trades are ignored.
    #[serde(default)]
    pub strategy: Option<String>,
    pub date_opened: NaiveDate,
    #[serde(default)]
    pub date_closed: Option<NaiveDate>,
    /// Realized profit or loss.
    pub pl: Decimal,
    #[serde(default)]
    pub margin_req: Decimal,
    #[serde(default)]
    pub opening_price: Decimal,
    #[serde(default)]
    pub num_contracts: u32,
}

impl Trade {
    /// Creates a trade with only the fields needed for raw P/L aggregation.
    pub fn new(strategy: impl Into<String>, date_opened: NaiveDate, pl: Decimal) -> Self {
        Self {
            trade_id: Uuid::new_v4(),
            symbol: String::new(),
            strategy: Some(strategy.into()),
            date_opened,
            date_closed: None,
            pl,
            margin_req: Decimal::ZERO,
            opening_price: Decimal::ZERO,
            num_contracts: 0,
        }
    }

    /// Returns the trimmed strategy label, or `None` when it is missing or blank.
    pub fn strategy_label(&self) -> Option<&str> {
        self.strategy
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
    }

    /// Opening price times contract count, the denominator for notional returns.
    ///
    /// `None` if the product overflows `Decimal`.
    pub fn notional(&self) -> Option<Decimal> {
        self.opening_price.checked_mul(Decimal::from(self.num_contracts))
    }
}
