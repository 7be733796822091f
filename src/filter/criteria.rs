//! Filter criteria and per-field predicates

use serde::{Deserialize, Serialize};

use crate::core::{OptionSide, ScannerError, ScannerResult, SideSelector};

/// One `{enabled, min, max}` bound on a quote field
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RangeCriterion {
    pub enabled: bool,
    pub min: f64,
    pub max: f64,
}

impl RangeCriterion {
    /// A criterion that always passes
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Enabled inclusive bound
    pub fn between(min: f64, max: f64) -> Self {
        Self {
            enabled: true,
            min,
            max,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Disabled passes everything; enabled rejects missing data
    pub fn admits(&self, value: Option<f64>) -> bool {
        if !self.enabled {
            return true;
        }
        value.map_or(false, |v| self.contains(v))
    }

    fn validate(&self, name: &str) -> ScannerResult<()> {
        if !self.enabled {
            return Ok(());
        }
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(ScannerError::invalid_input(format!(
                "{} filter needs finite min <= max, got [{}, {}]",
                name, self.min, self.max
            )));
        }
        Ok(())
    }
}

/// How a delta bound entered as a magnitude is compared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaMode {
    /// Side known: calls against `[min, max]`, puts against `[-max, -min]`
    Signed(OptionSide),
    /// Mixed-side evaluation: `|delta|` against `[min, max]`
    Magnitude,
}

impl DeltaMode {
    /// Signed comparison when the selector names one side
    pub fn for_selector(selector: SideSelector) -> Self {
        match selector.single_side() {
            Some(side) => DeltaMode::Signed(side),
            None => DeltaMode::Magnitude,
        }
    }
}

/// Compare a raw delta to a magnitude bound
pub fn delta_matches(mode: DeltaMode, raw_delta: f64, min: f64, max: f64) -> bool {
    match mode {
        DeltaMode::Signed(OptionSide::Call) => raw_delta >= min && raw_delta <= max,
        DeltaMode::Signed(OptionSide::Put) => raw_delta >= -max && raw_delta <= -min,
        DeltaMode::Magnitude => {
            let abs = raw_delta.abs();
            abs >= min && abs <= max
        }
    }
}

/// User filter over a fetched chain. All enabled criteria must pass.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    /// Sides to keep
    pub side: SideSelector,
    /// |delta| magnitude bound
    pub delta: RangeCriterion,
    /// Implied volatility in percentage points
    pub iv: RangeCriterion,
    /// |theta| per day
    pub theta: RangeCriterion,
}

impl FilterCriteria {
    /// Keep only one side (or both) with no Greek bounds
    pub fn for_side(side: SideSelector) -> Self {
        Self {
            side,
            ..Default::default()
        }
    }

    pub fn with_delta(mut self, min: f64, max: f64) -> Self {
        self.delta = RangeCriterion::between(min, max);
        self
    }

    pub fn with_iv_percent(mut self, min: f64, max: f64) -> Self {
        self.iv = RangeCriterion::between(min, max);
        self
    }

    pub fn with_theta(mut self, min: f64, max: f64) -> Self {
        self.theta = RangeCriterion::between(min, max);
        self
    }

    /// Any Greek-based criterion enabled? (Greeks must then be fetched.)
    pub fn needs_greeks(&self) -> bool {
        self.delta.enabled || self.iv.enabled || self.theta.enabled
    }

    pub fn validate(&self) -> ScannerResult<()> {
        self.delta.validate("delta")?;
        self.iv.validate("iv")?;
        self.theta.validate("theta")
    }
}
