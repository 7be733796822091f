//! StrikeRangeEstimator - bounds the strikes a delta filter can select

use crate::config::EstimatorConfig;
use crate::core::{ensure_finite, ScannerError, ScannerResult};
use crate::models::black_scholes::{delta, PricingInput};

use super::{bisect_decreasing, DeltaFilterSpec, StrikeRangeEstimate};

/// Estimate with the default configuration over `[S*0.01, S*10]`
pub fn estimate_strike_range(
    spec: &DeltaFilterSpec,
    spot: f64,
    time_to_expiry: f64,
    volatility: f64,
    risk_free_rate: f64,
) -> ScannerResult<StrikeRangeEstimate> {
    StrikeRangeEstimator::new().estimate(spec, spot, time_to_expiry, volatility, risk_free_rate)
}

/// Delta-targeted strike range estimator
#[derive(Debug, Clone, Default)]
pub struct StrikeRangeEstimator {
    config: EstimatorConfig,
}

impl StrikeRangeEstimator {
    /// Create an estimator with default configuration
    pub fn new() -> Self {
        Self {
            config: EstimatorConfig::default(),
        }
    }

    /// Create with custom configuration
    pub fn with_config(config: EstimatorConfig) -> Self {
        Self { config }
    }

    /// Get current configuration
    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Estimate over the default search interval around spot
    pub fn estimate(
        &self,
        spec: &DeltaFilterSpec,
        spot: f64,
        time_to_expiry: f64,
        volatility: f64,
        risk_free_rate: f64,
    ) -> ScannerResult<StrikeRangeEstimate> {
        self.estimate_within(spec, spot, time_to_expiry, volatility, risk_free_rate, None)
    }

    /// Estimate the strike interval to fetch.
    ///
    /// # Arguments
    /// * `spec` - Requested |delta| band and side
    /// * `volatility` - Single-σ proxy, typically ATM implied volatility
    /// * `search` - Strike interval to search (e.g. lowest/highest listed
    ///   strike); defaults to `[spot * 0.01, spot * 10]`
    ///
    /// # Returns
    /// `Range` guaranteed to contain every strike in the search interval
    /// whose delta under `volatility` lies in the band, or `NoNarrowing`
    /// when the band is unreachable or the inputs are degenerate.
    pub fn estimate_within(
        &self,
        spec: &DeltaFilterSpec,
        spot: f64,
        time_to_expiry: f64,
        volatility: f64,
        risk_free_rate: f64,
        search: Option<(f64, f64)>,
    ) -> ScannerResult<StrikeRangeEstimate> {
        ensure_finite("spot", spot)?;
        ensure_finite("time_to_expiry", time_to_expiry)?;
        ensure_finite("volatility", volatility)?;
        ensure_finite("risk_free_rate", risk_free_rate)?;
        if spot <= 0.0 {
            return Err(ScannerError::invalid_input(format!("spot must be positive, got {}", spot)));
        }
        if time_to_expiry < 0.0 {
            return Err(ScannerError::invalid_input(format!(
                "time to expiry must be non-negative, got {}",
                time_to_expiry
            )));
        }

        let (search_low, search_high) = match search {
            Some((lo, hi)) if lo.is_finite() && hi.is_finite() && lo > 0.0 && lo < hi => (lo, hi),
            Some((lo, hi)) => {
                return Err(ScannerError::invalid_input(format!(
                    "invalid strike search interval [{}, {}]",
                    lo, hi
                )))
            }
            None => (
                spot * self.config.search_lower_factor,
                spot * self.config.search_upper_factor,
            ),
        };

        if time_to_expiry == 0.0 || volatility <= 0.0 {
            tracing::debug!(
                "No strike narrowing: degenerate inputs (T={}, vol={})",
                time_to_expiry,
                volatility
            );
            return Ok(StrikeRangeEstimate::NoNarrowing);
        }

        let mut combined: Option<(f64, f64)> = None;
        for &side in spec.side().sides() {
            let base = PricingInput::new(spot, spot, time_to_expiry, risk_free_rate, volatility, side)?;
            let side_range = match self.side_range(spec, &base, search_low, search_high) {
                Ok(r) => r,
                Err(e) if e.is_non_convergent() => {
                    tracing::debug!("No strike narrowing for {:?}: {}", side, e);
                    return Ok(StrikeRangeEstimate::NoNarrowing);
                }
                Err(e) => return Err(e),
            };

            if let Some((lo, hi)) = side_range {
                combined = Some(match combined {
                    Some((clo, chi)) => (clo.min(lo), chi.max(hi)),
                    None => (lo, hi),
                });
            }
        }

        let Some((raw_low, raw_high)) = combined else {
            tracing::debug!(
                "No strike narrowing: |delta| in [{}, {}] unreachable on [{:.2}, {:.2}]",
                spec.min_abs_delta(),
                spec.max_abs_delta(),
                search_low,
                search_high
            );
            return Ok(StrikeRangeEstimate::NoNarrowing);
        };

        let (low, high) = self.widen(raw_low, raw_high);
        tracing::debug!(
            "Strike range for |delta| in [{}, {}] ({}): raw [{:.2}, {:.2}] -> [{:.2}, {:.2}]",
            spec.min_abs_delta(),
            spec.max_abs_delta(),
            spec.side(),
            raw_low,
            raw_high,
            low,
            high
        );
        Ok(StrikeRangeEstimate::Range { low, high })
    }

    /// Raw strike interval for one side, `None` if no strike in the search
    /// interval can reach the band.
    fn side_range(
        &self,
        spec: &DeltaFilterSpec,
        base: &PricingInput,
        search_low: f64,
        search_high: f64,
    ) -> ScannerResult<Option<(f64, f64)>> {
        let (target_low, target_high) = spec.signed_targets(base.side());
        let curve = |strike: f64| delta_at(base, strike);

        // Delta decreases with strike: highest at the low edge
        let delta_top = curve(search_low);
        let delta_bottom = curve(search_high);
        if target_high < delta_bottom || target_low > delta_top {
            return Ok(None);
        }

        let cfg = &self.config;
        let low = if target_high >= delta_top {
            search_low
        } else {
            bisect_decreasing(
                curve,
                target_high,
                search_low,
                search_high,
                cfg.delta_tolerance,
                cfg.max_iterations,
            )?
            .low
        };
        let high = if target_low <= delta_bottom {
            search_high
        } else {
            bisect_decreasing(
                curve,
                target_low,
                search_low,
                search_high,
                cfg.delta_tolerance,
                cfg.max_iterations,
            )?
            .high
        };

        Ok(Some((low, high)))
    }

    /// Pad each side by `max(margin * width, min_strike_increment)`
    fn widen(&self, low: f64, high: f64) -> (f64, f64) {
        let pad = ((high - low) * self.config.margin_fraction).max(self.config.min_strike_increment);
        ((low - pad).max(0.0), high + pad)
    }
}

/// Delta of the base contract moved to `strike`. The base has T > 0, so
/// delta is defined; a NaN would surface as a non-convergent bisection.
fn delta_at(base: &PricingInput, strike: f64) -> f64 {
    delta(&base.at_strike(strike)).unwrap_or(f64::NAN)
}
