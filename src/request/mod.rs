//! Chain request/response contract and fetch planning
//!
//! The request layer in front of the scanner speaks JSON. A request names
//! the symbol and expiration, how many strikes to fetch (or all of them),
//! whether Greeks are needed, and an optional delta filter. The planner
//! turns that into the concrete list of strikes to ask the market-data
//! source for.

mod planner;

pub use planner::*;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::{sort_by_strike, OptionQuote, ScannerError, ScannerResult, SideSelector};
use crate::estimator::DeltaFilterSpec;
use crate::filter::FilteredChain;

fn default_true() -> bool {
    true
}

fn default_max_delta() -> f64 {
    1.0
}

/// Option chain request as received over the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainRequest {
    /// Underlying symbol
    pub symbol: String,
    /// Expiration date, `YYYYMMDD`
    pub expiration: String,
    /// Explicit strikes; overrides every other selection rule
    #[serde(default)]
    pub strikes: Option<Vec<f64>>,
    /// Strikes around ATM; 0 fetches the whole chain, absent uses the
    /// configured default
    #[serde(default)]
    pub num_strikes: Option<usize>,
    /// Whether Greeks/IV are wanted on the returned rows
    #[serde(default = "default_true")]
    pub need_greeks: bool,
    #[serde(default)]
    pub delta_filter_enabled: bool,
    #[serde(default)]
    pub min_delta: f64,
    #[serde(default = "default_max_delta")]
    pub max_delta: f64,
    #[serde(default)]
    pub option_type: SideSelector,
}

impl ChainRequest {
    /// Request with wire defaults
    pub fn new(symbol: impl Into<String>, expiration: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            expiration: expiration.into(),
            strikes: None,
            num_strikes: None,
            need_greeks: true,
            delta_filter_enabled: false,
            min_delta: 0.0,
            max_delta: default_max_delta(),
            option_type: SideSelector::All,
        }
    }

    /// Enable the delta filter
    pub fn with_delta_filter(mut self, min_delta: f64, max_delta: f64, side: SideSelector) -> Self {
        self.delta_filter_enabled = true;
        self.min_delta = min_delta;
        self.max_delta = max_delta;
        self.option_type = side;
        self
    }

    pub fn with_strikes(mut self, strikes: Vec<f64>) -> Self {
        self.strikes = Some(strikes);
        self
    }

    pub fn with_num_strikes(mut self, num_strikes: usize) -> Self {
        self.num_strikes = Some(num_strikes);
        self
    }

    /// Parse the expiration (`YYYYMMDD`, `YYYY-MM-DD` also accepted)
    pub fn expiration_date(&self) -> ScannerResult<NaiveDate> {
        let raw = self.expiration.trim();
        NaiveDate::parse_from_str(raw, "%Y%m%d")
            .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
            .map_err(|e| {
                ScannerError::invalid_input(format!("bad expiration '{}': {}", self.expiration, e))
            })
    }

    /// Calendar days to expiry, at least 1 so same-day contracts keep time value
    pub fn days_to_expiry(&self, today: NaiveDate) -> ScannerResult<i64> {
        let days = (self.expiration_date()? - today).num_days();
        Ok(days.max(1))
    }

    /// Time to expiry in years
    pub fn time_to_expiry(&self, today: NaiveDate, days_per_year: f64) -> ScannerResult<f64> {
        Ok(self.days_to_expiry(today)? as f64 / days_per_year)
    }

    /// The delta filter, when enabled with a usable band
    /// (`min_delta > 0`, `max_delta <= 1`)
    pub fn delta_filter(&self) -> ScannerResult<Option<DeltaFilterSpec>> {
        if !self.delta_filter_enabled || !(self.min_delta > 0.0 && self.max_delta <= 1.0) {
            return Ok(None);
        }
        DeltaFilterSpec::new(self.min_delta, self.max_delta, self.option_type).map(Some)
    }

    /// Greeks must be requested upstream when asked for or when a delta
    /// filter needs them
    pub fn greeks_required(&self) -> bool {
        self.need_greeks || (self.delta_filter_enabled && self.min_delta > 0.0)
    }

    pub fn validate(&self) -> ScannerResult<()> {
        if self.symbol.trim().is_empty() {
            return Err(ScannerError::invalid_input("symbol is empty"));
        }
        self.expiration_date()?;
        if let Some(strikes) = &self.strikes {
            if let Some(bad) = strikes.iter().find(|k| !(k.is_finite() && **k > 0.0)) {
                return Err(ScannerError::invalid_input(format!("invalid strike {}", bad)));
            }
        }
        self.delta_filter()?;
        Ok(())
    }
}

/// Chain response as sent over the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainResponse {
    pub symbol: String,
    pub stock_price: f64,
    pub expiration: String,
    pub calls: Vec<OptionQuote>,
    pub puts: Vec<OptionQuote>,
}

impl ChainResponse {
    /// Build the response; each side is sorted by strike
    pub fn from_filtered(request: &ChainRequest, stock_price: f64, chain: FilteredChain) -> Self {
        let FilteredChain { mut calls, mut puts } = chain;
        sort_by_strike(&mut calls);
        sort_by_strike(&mut puts);

        Self {
            symbol: request.symbol.clone(),
            stock_price,
            expiration: request.expiration.clone(),
            calls,
            puts,
        }
    }
}
