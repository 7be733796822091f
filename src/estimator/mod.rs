//! Delta-Targeted Strike Narrowing
//!
//! Delta is strictly monotonic in strike, so the strikes whose delta falls in
//! a requested band form one contiguous interval. The estimator bisects the
//! two boundary strikes under a single volatility estimate, then widens the
//! result by a safety margin to absorb the volatility smile.
//!
//! Narrowing is an optimization only: whenever it cannot be done safely the
//! estimator answers [`StrikeRangeEstimate::NoNarrowing`] and the caller
//! fetches the full chain.

mod bisect;
mod range;

pub use bisect::*;
pub use range::*;

use serde::{Deserialize, Serialize};

use crate::core::{ensure_finite, OptionSide, ScannerError, ScannerResult, SideSelector};

/// Requested |delta| band and the side(s) it applies to
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeltaFilterSpec {
    min_abs_delta: f64,
    max_abs_delta: f64,
    side: SideSelector,
}

impl DeltaFilterSpec {
    /// Both bounds in [0, 1] with `min <= max`
    pub fn new(min_abs_delta: f64, max_abs_delta: f64, side: SideSelector) -> ScannerResult<Self> {
        ensure_finite("min_delta", min_abs_delta)?;
        ensure_finite("max_delta", max_abs_delta)?;
        if !(0.0..=1.0).contains(&min_abs_delta) || !(0.0..=1.0).contains(&max_abs_delta) {
            return Err(ScannerError::invalid_input(format!(
                "delta bounds must lie in [0, 1], got [{}, {}]",
                min_abs_delta, max_abs_delta
            )));
        }
        if min_abs_delta > max_abs_delta {
            return Err(ScannerError::invalid_input(format!(
                "min_delta {} exceeds max_delta {}",
                min_abs_delta, max_abs_delta
            )));
        }
        Ok(Self {
            min_abs_delta,
            max_abs_delta,
            side,
        })
    }

    pub fn min_abs_delta(&self) -> f64 {
        self.min_abs_delta
    }

    pub fn max_abs_delta(&self) -> f64 {
        self.max_abs_delta
    }

    pub fn side(&self) -> SideSelector {
        self.side
    }

    /// Signed delta interval for one side: calls `[min, max]`,
    /// puts `[-max, -min]`
    pub fn signed_targets(&self, side: OptionSide) -> (f64, f64) {
        match side {
            OptionSide::Call => (self.min_abs_delta, self.max_abs_delta),
            OptionSide::Put => (-self.max_abs_delta, -self.min_abs_delta),
        }
    }

    /// Does a side's signed delta satisfy the band?
    pub fn admits(&self, side: OptionSide, delta: f64) -> bool {
        let (lo, hi) = self.signed_targets(side);
        delta >= lo && delta <= hi
    }
}

/// Strike interval to fetch, or the instruction to fetch everything
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrikeRangeEstimate {
    Range { low: f64, high: f64 },
    NoNarrowing,
}

impl StrikeRangeEstimate {
    pub fn is_narrowed(&self) -> bool {
        matches!(self, StrikeRangeEstimate::Range { .. })
    }

    pub fn bounds(&self) -> Option<(f64, f64)> {
        match *self {
            StrikeRangeEstimate::Range { low, high } => Some((low, high)),
            StrikeRangeEstimate::NoNarrowing => None,
        }
    }

    /// `NoNarrowing` contains every strike
    pub fn contains(&self, strike: f64) -> bool {
        match *self {
            StrikeRangeEstimate::Range { low, high } => strike >= low && strike <= high,
            StrikeRangeEstimate::NoNarrowing => true,
        }
    }

    /// Listed strikes that fall inside the estimate, in input order
    pub fn select(&self, listed: &[f64]) -> Vec<f64> {
        listed.iter().copied().filter(|k| self.contains(*k)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_validation() {
        assert!(DeltaFilterSpec::new(0.3, 0.5, SideSelector::Call).is_ok());
        assert!(DeltaFilterSpec::new(0.5, 0.3, SideSelector::Call).is_err());
        assert!(DeltaFilterSpec::new(-0.1, 0.3, SideSelector::All).is_err());
        assert!(DeltaFilterSpec::new(0.1, 1.2, SideSelector::Put).is_err());
        assert!(DeltaFilterSpec::new(f64::NAN, 0.3, SideSelector::Put).is_err());
    }

    #[test]
    fn test_signed_targets() {
        let spec = DeltaFilterSpec::new(0.3, 0.5, SideSelector::All).unwrap();
        assert_eq!(spec.signed_targets(OptionSide::Call), (0.3, 0.5));
        assert_eq!(spec.signed_targets(OptionSide::Put), (-0.5, -0.3));
        assert!(spec.admits(OptionSide::Put, -0.4));
        assert!(!spec.admits(OptionSide::Put, 0.4));
    }

    #[test]
    fn test_estimate_selection() {
        let listed = [170.0, 175.0, 180.0, 185.0, 190.0, 195.0];
        let range = StrikeRangeEstimate::Range { low: 177.5, high: 190.0 };
        assert_eq!(range.select(&listed), vec![180.0, 185.0, 190.0]);
        assert_eq!(StrikeRangeEstimate::NoNarrowing.select(&listed).len(), listed.len());
        assert!(!StrikeRangeEstimate::NoNarrowing.is_narrowed());
    }
}
