use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a trade's realized P/L is scaled before it enters a daily return series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizationMode {
    /// P/L in account currency, unscaled.
    #[default]
    Raw,
    /// P/L divided by the margin requirement.
    Margin,
    /// P/L divided by opening price times contract count.
    Notional,
}

/// Which trade date anchors the shared calendar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateBasis {
    #[default]
    Opened,
    Closed,
}

impl NormalizationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            NormalizationMode::Raw => "raw",
            NormalizationMode::Margin => "margin",
            NormalizationMode::Notional => "notional",
        }
    }
}

impl DateBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateBasis::Opened => "opened",
            DateBasis::Closed => "closed",
        }
    }
}

impl fmt::Display for NormalizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for DateBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NormalizationMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(NormalizationMode::Raw),
            "margin" => Ok(NormalizationMode::Margin),
            "notional" => Ok(NormalizationMode::Notional),
            other => Err(CoreError::InvalidInput {
                field: "normalization",
                value: other.to_string(),
                expected: "raw, margin, notional",
            }),
        }
    }
}

impl FromStr for DateBasis {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "opened" => Ok(DateBasis::Opened),
            "closed" => Ok(DateBasis::Closed),
            other => Err(CoreError::InvalidInput {
                field: "date_basis",
                value: other.to_string(),
                expected: "opened, closed",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_modes_case_insensitively() {
        assert_eq!("Margin".parse::<NormalizationMode>().unwrap(), NormalizationMode::Margin);
        assert_eq!(" notional ".parse::<NormalizationMode>().unwrap(), NormalizationMode::Notional);
        assert_eq!("CLOSED".parse::<DateBasis>().unwrap(), DateBasis::Closed);
    }

    #[test]
    fn rejects_unknown_mode() {
        let err = "percent".parse::<NormalizationMode>().unwrap_err();
        assert!(err.to_string().contains("normalization"));
        assert!("settled".parse::<DateBasis>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&NormalizationMode::Notional).unwrap();
        assert_eq!(json, "\"notional\"");
        let basis: DateBasis = serde_json::from_str("\"closed\"").unwrap();
        assert_eq!(basis, DateBasis::Closed);
    }
}
