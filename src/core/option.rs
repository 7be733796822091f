//! Option side and moneyness classification
//!
//! Call/put identity, the user-facing side selector and the simple
//! strike-vs-spot comparisons used to label chain rows.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{ScannerError, ScannerResult};

/// Strikes within this fraction of spot are labelled at-the-money
pub const ATM_BAND: f64 = 0.02;

/// Option side (Call or Put)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionSide {
    Call,
    Put,
}

impl OptionSide {
    /// Intrinsic value at given spot
    pub fn intrinsic(&self, spot: f64, strike: f64) -> f64 {
        match self {
            OptionSide::Call => (spot - strike).max(0.0),
            OptionSide::Put => (strike - spot).max(0.0),
        }
    }

    /// Call: strike below spot. Put: strike above spot.
    pub fn is_in_the_money(&self, strike: f64, spot: f64) -> bool {
        match self {
            OptionSide::Call => strike < spot,
            OptionSide::Put => strike > spot,
        }
    }

    /// Broker right code ("C" / "P")
    pub fn right(&self) -> &'static str {
        match self {
            OptionSide::Call => "C",
            OptionSide::Put => "P",
        }
    }
}

/// Which side(s) of the chain a request or filter covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SideSelector {
    #[default]
    All,
    Call,
    Put,
}

impl SideSelector {
    /// Does this selector keep quotes of the given side?
    pub fn includes(&self, side: OptionSide) -> bool {
        match self {
            SideSelector::All => true,
            SideSelector::Call => side == OptionSide::Call,
            SideSelector::Put => side == OptionSide::Put,
        }
    }

    /// The single side selected, or `None` for mixed evaluation
    pub fn single_side(&self) -> Option<OptionSide> {
        match self {
            SideSelector::All => None,
            SideSelector::Call => Some(OptionSide::Call),
            SideSelector::Put => Some(OptionSide::Put),
        }
    }

    /// Sides covered, calls first
    pub fn sides(&self) -> &'static [OptionSide] {
        match self {
            SideSelector::All => &[OptionSide::Call, OptionSide::Put],
            SideSelector::Call => &[OptionSide::Call],
            SideSelector::Put => &[OptionSide::Put],
        }
    }
}

impl fmt::Display for SideSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SideSelector::All => "all",
            SideSelector::Call => "call",
            SideSelector::Put => "put",
        };
        f.write_str(s)
    }
}

impl FromStr for SideSelector {
    type Err = ScannerError;

    fn from_str(s: &str) -> ScannerResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(SideSelector::All),
            "call" | "c" => Ok(SideSelector::Call),
            "put" | "p" => Ok(SideSelector::Put),
            other => Err(ScannerError::invalid_input(format!(
                "unknown option type '{}', expected all/call/put",
                other
            ))),
        }
    }
}

/// Is the strike within 2% of spot?
pub fn is_at_the_money(strike: f64, spot: f64) -> bool {
    spot > 0.0 && (strike - spot).abs() / spot <= ATM_BAND
}

/// Map NaN/infinite upstream values to "not available"
pub fn sanitize(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_side() {
        assert_eq!(OptionSide::Call.intrinsic(110.0, 100.0), 10.0);
        assert_eq!(OptionSide::Put.intrinsic(90.0, 100.0), 10.0);
        assert_eq!(OptionSide::Call.intrinsic(90.0, 100.0), 0.0);
    }

    #[test]
    fn test_moneyness() {
        let spot = 185.50;
        assert!(OptionSide::Call.is_in_the_money(180.0, spot));
        assert!(!OptionSide::Call.is_in_the_money(190.0, spot));
        assert!(OptionSide::Put.is_in_the_money(190.0, spot));
        assert!(!OptionSide::Put.is_in_the_money(180.0, spot));

        assert!(is_at_the_money(185.0, spot));
        assert!(is_at_the_money(189.0, spot));
        assert!(!is_at_the_money(190.0, spot));
    }

    #[test]
    fn test_selector() {
        assert!(SideSelector::All.includes(OptionSide::Put));
        assert!(!SideSelector::Call.includes(OptionSide::Put));
        assert_eq!(SideSelector::Put.single_side(), Some(OptionSide::Put));
        assert_eq!(SideSelector::All.single_side(), None);

        assert_eq!("CALL".parse::<SideSelector>().unwrap(), SideSelector::Call);
        assert!("straddle".parse::<SideSelector>().is_err());

        let json = serde_json::to_string(&SideSelector::Put).unwrap();
        assert_eq!(json, "\"put\"");
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize(Some(0.0)), Some(0.0));
        assert_eq!(sanitize(Some(f64::NAN)), None);
        assert_eq!(sanitize(Some(f64::NEG_INFINITY)), None);
        assert_eq!(sanitize(None), None);
    }
}
