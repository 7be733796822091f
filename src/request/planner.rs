//! FetchPlanner - decides which strikes to request from the data source

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::{EstimatorConfig, ScannerConfig};
use crate::core::{ScannerError, ScannerResult};
use crate::estimator::{StrikeRangeEstimate, StrikeRangeEstimator};

use super::ChainRequest;

/// Rule that produced a fetch plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// Strikes named in the request
    Explicit,
    /// Listed strikes inside the delta-derived range
    DeltaNarrowed,
    /// Every listed strike
    FullChain,
    /// Strikes nearest to spot
    AtmWindow,
}

/// Strikes to fetch and how they were chosen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchPlan {
    /// Ascending, de-duplicated
    pub strikes: Vec<f64>,
    pub selection: Selection,
    /// Underlying price the plan was built around
    pub spot: f64,
    /// Range estimate when the delta filter was active
    pub estimate: Option<StrikeRangeEstimate>,
}

impl FetchPlan {
    fn new(strikes: Vec<f64>, selection: Selection, spot: f64) -> Self {
        Self {
            strikes,
            selection,
            spot,
            estimate: None,
        }
    }
}

/// Strike selection policy for chain requests.
///
/// Order of precedence: explicit strikes, delta filter, `num_strikes == 0`
/// (whole chain), ATM window of `num_strikes` (configured default when the
/// request leaves it out).
#[derive(Debug, Clone, Default)]
pub struct FetchPlanner {
    config: ScannerConfig,
}

impl FetchPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ScannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Plan the fetch for one request.
    ///
    /// # Arguments
    /// * `listed` - Strikes the data source lists for the expiration
    /// * `spot` - Underlying price if the feed has one; otherwise the median
    ///   listed strike stands in
    /// * `vol_estimate` - ATM implied vol if known; falls back to the
    ///   configured default volatility
    /// * `today` - Valuation date
    pub fn plan(
        &self,
        request: &ChainRequest,
        listed: &[f64],
        spot: Option<f64>,
        vol_estimate: Option<f64>,
        today: NaiveDate,
    ) -> ScannerResult<FetchPlan> {
        request.validate()?;

        let listed = normalize_strikes(listed);
        let listed_len = listed.len();
        let spot = resolve_spot(spot, &listed).ok_or_else(|| {
            ScannerError::invalid_input(format!(
                "no price and no listed strikes for {} {}",
                request.symbol, request.expiration
            ))
        })?;

        if let Some(explicit) = request.strikes.as_deref().filter(|s| !s.is_empty()) {
            let plan = FetchPlan::new(normalize_strikes(explicit), Selection::Explicit, spot);
            self.log_plan(request, &plan, listed_len);
            return Ok(plan);
        }

        if listed.is_empty() {
            tracing::warn!("No listed strikes for {} {}", request.symbol, request.expiration);
            return Ok(FetchPlan::new(listed, Selection::FullChain, spot));
        }

        let plan = if let Some(spec) = request.delta_filter()? {
            let pricing = &self.config.pricing;
            let time_to_expiry = request.time_to_expiry(today, pricing.days_per_year)?;
            let volatility = vol_estimate
                .filter(|v| v.is_finite() && *v > 0.0)
                .unwrap_or(pricing.default_volatility);
            let search = match (listed.first(), listed.last()) {
                (Some(&lo), Some(&hi)) if lo < hi => Some((lo, hi)),
                _ => None,
            };

            let estimator = StrikeRangeEstimator::with_config(self.estimator_config(&listed));
            let estimate = estimator.estimate_within(
                &spec,
                spot,
                time_to_expiry,
                volatility,
                pricing.risk_free_rate,
                search,
            )?;

            let mut plan = match estimate {
                StrikeRangeEstimate::NoNarrowing => FetchPlan::new(listed, Selection::FullChain, spot),
                StrikeRangeEstimate::Range { .. } => {
                    let selected = estimate.select(&listed);
                    if selected.is_empty() {
                        let half = self.config.selection.fallback_half_window;
                        FetchPlan::new(atm_window(&listed, spot, half), Selection::AtmWindow, spot)
                    } else {
                        FetchPlan::new(selected, Selection::DeltaNarrowed, spot)
                    }
                }
            };
            plan.estimate = Some(estimate);
            plan
        } else {
            let num_strikes = request
                .num_strikes
                .unwrap_or(self.config.selection.default_num_strikes);
            if num_strikes == 0 {
                FetchPlan::new(listed, Selection::FullChain, spot)
            } else {
                let window = atm_window(&listed, spot, num_strikes / 2);
                FetchPlan::new(window, Selection::AtmWindow, spot)
            }
        };

        self.log_plan(request, &plan, listed_len);
        Ok(plan)
    }

    /// Pad by at least one listed strike step
    fn estimator_config(&self, listed: &[f64]) -> EstimatorConfig {
        let mut config = self.config.estimator.clone();
        if let Some(step) = strike_step(listed) {
            config.min_strike_increment = step;
        }
        config
    }

    fn log_plan(&self, request: &ChainRequest, plan: &FetchPlan, listed: usize) {
        tracing::info!(
            "Fetch plan for {} {}: {:?}, {} of {} listed strikes",
            request.symbol,
            request.expiration,
            plan.selection,
            plan.strikes.len(),
            listed
        );
    }
}

/// Usable underlying price, else the median of the sorted listed strikes
pub fn resolve_spot(spot: Option<f64>, sorted_listed: &[f64]) -> Option<f64> {
    if let Some(spot) = spot.filter(|p| p.is_finite() && *p > 0.0) {
        return Some(spot);
    }
    let median = sorted_listed.get(sorted_listed.len() / 2).copied()?;
    tracing::info!("No underlying price, using median listed strike {}", median);
    Some(median)
}

/// `half` strikes either side of the strike nearest to spot, plus that strike
pub fn atm_window(listed: &[f64], spot: f64, half: usize) -> Vec<f64> {
    let Some(atm_idx) = listed
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (*a - spot).abs().total_cmp(&(*b - spot).abs()))
        .map(|(i, _)| i)
    else {
        return Vec::new();
    };

    let start = atm_idx.saturating_sub(half);
    let end = (atm_idx + half + 1).min(listed.len());
    listed[start..end].to_vec()
}

/// Smallest gap between consecutive sorted strikes
pub fn strike_step(sorted: &[f64]) -> Option<f64> {
    sorted
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|d| *d > 0.0)
        .min_by(|a, b| a.total_cmp(b))
}

fn normalize_strikes(strikes: &[f64]) -> Vec<f64> {
    let mut out: Vec<f64> = strikes
        .iter()
        .copied()
        .filter(|k| k.is_finite() && *k > 0.0)
        .collect();
    out.sort_by(|a, b| a.total_cmp(b));
    out.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
    out
}
