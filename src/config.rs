//! Configuration for pricing, IV solving, strike narrowing and selection

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{ScannerError, ScannerResult};

/// Full scanner configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Market assumptions
    pub pricing: PricingConfig,
    /// Implied volatility solver
    pub iv_solver: IvSolverConfig,
    /// Delta-targeted strike narrowing
    pub estimator: EstimatorConfig,
    /// Strike selection when no narrowing applies
    pub selection: SelectionConfig,
}

impl ScannerConfig {
    /// Load from a JSON file; missing sections take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> ScannerResult<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        let config: ScannerConfig = serde_json::from_str(&json)?;
        config.validate()?;
        tracing::info!("Loaded scanner config from {:?}", path.as_ref());
        Ok(config)
    }

    /// Reject settings that would break the solvers
    pub fn validate(&self) -> ScannerResult<()> {
        let p = &self.pricing;
        if !p.risk_free_rate.is_finite() {
            return Err(ScannerError::invalid_input("risk_free_rate must be finite"));
        }
        if !(p.default_volatility > 0.0) || !(p.days_per_year > 0.0) {
            return Err(ScannerError::invalid_input(
                "default_volatility and days_per_year must be positive",
            ));
        }

        let iv = &self.iv_solver;
        if !(iv.tolerance > 0.0) || !(iv.vol_lower > 0.0) || !(iv.vol_upper > iv.vol_lower) {
            return Err(ScannerError::invalid_input(
                "IV solver needs tolerance > 0 and 0 < vol_lower < vol_upper",
            ));
        }

        let e = &self.estimator;
        if !(e.margin_fraction >= 0.0) || !(e.min_strike_increment >= 0.0) {
            return Err(ScannerError::invalid_input(
                "estimator margin and strike increment must be non-negative",
            ));
        }
        if !(e.search_lower_factor > 0.0) || !(e.search_upper_factor > e.search_lower_factor) {
            return Err(ScannerError::invalid_input(
                "estimator search factors need 0 < lower < upper",
            ));
        }
        if !(e.delta_tolerance > 0.0) || e.max_iterations == 0 {
            return Err(ScannerError::invalid_input(
                "estimator needs delta_tolerance > 0 and max_iterations > 0",
            ));
        }
        Ok(())
    }
}

/// Market assumptions used when the caller has nothing better
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Annualized continuously-compounded rate
    /// Default: 0.05
    pub risk_free_rate: f64,

    /// Single-σ proxy for strike narrowing when no ATM IV is known
    /// Default: 0.30
    pub default_volatility: f64,

    /// Calendar days per year when converting days to expiry into years
    /// Default: 365
    pub days_per_year: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.05,
            default_volatility: 0.30,
            days_per_year: 365.0,
        }
    }
}

/// Newton-Raphson / bisection IV solver settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IvSolverConfig {
    /// Absolute price error accepted as converged
    pub tolerance: f64,
    pub max_newton_iterations: usize,
    pub max_bisection_iterations: usize,
    /// Bisection bracket for σ
    pub vol_lower: f64,
    pub vol_upper: f64,
}

impl Default for IvSolverConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            max_newton_iterations: 100,
            max_bisection_iterations: 200,
            vol_lower: 1e-4,
            vol_upper: 5.0,
        }
    }
}

/// Strike-range estimator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Widening applied on each side, as a fraction of the raw range width
    /// Default: 0.10
    pub margin_fraction: f64,

    /// Minimum widening on each side, in price units (one listed strike step)
    /// Default: 1.0
    pub min_strike_increment: f64,

    /// Search interval is [spot * lower, spot * upper] unless the caller
    /// supplies one
    /// Default: 0.01 / 10.0
    pub search_lower_factor: f64,
    pub search_upper_factor: f64,

    /// Bisection stops once the bracket's deltas differ by less than this
    /// Default: 1e-4
    pub delta_tolerance: f64,

    /// Default: 200
    pub max_iterations: usize,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            margin_fraction: 0.10,
            min_strike_increment: 1.0,
            search_lower_factor: 0.01,
            search_upper_factor: 10.0,
            delta_tolerance: 1e-4,
            max_iterations: 200,
        }
    }
}

impl EstimatorConfig {
    /// Smaller margin: fewer wasted fetches, weaker smile coverage
    pub fn tight() -> Self {
        Self {
            margin_fraction: 0.05,
            ..Default::default()
        }
    }

    /// Generous margin for steep smiles or stale σ estimates
    pub fn wide() -> Self {
        Self {
            margin_fraction: 0.25,
            ..Default::default()
        }
    }
}

/// Strike selection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Strikes fetched around ATM when a request does not say
    /// Default: 20
    pub default_num_strikes: usize,

    /// Strikes on each side of ATM when a narrowed range selects nothing
    /// Default: 15
    pub fallback_half_window: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            default_num_strikes: 20,
            fallback_half_window: 15,
        }
    }
}
