//! # Options Scanner - Greeks, Delta Narrowing and Chain Filtering
//!
//! Analytics core for an option-chain scanner. A front end asks for a
//! symbol and expiration with an optional delta band; this crate decides
//! which strikes are worth fetching, fills in Black-Scholes Greeks and
//! implied volatility where the feed left them blank, and filters the
//! returned rows.
//!
//! ## Key Components
//!
//! - **Black-Scholes**: Price, delta, gamma, theta (per day), vega (per vol
//!   point) and a Newton/bisection IV solver
//! - **Strike Range Estimator**: Inverts delta over strike to bound the
//!   strikes a delta filter can select, so the fetch stays small
//! - **Chain Filter**: Side, delta, IV and theta criteria with per-side sign
//!   handling
//! - **Fetch Planner**: Request-level strike selection (explicit, delta
//!   narrowed, ATM window, whole chain)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use options_scanner::prelude::*;
//!
//! let spec = DeltaFilterSpec::new(0.3, 0.5, SideSelector::Call).unwrap();
//! let range = estimate_strike_range(&spec, 185.5, 30.0 / 365.0, 0.30, 0.05).unwrap();
//!
//! let listed: Vec<f64> = (160..=210).step_by(5).map(|k| k as f64).collect();
//! let to_fetch = range.select(&listed);
//!
//! let criteria = FilterCriteria::for_side(SideSelector::Call).with_delta(0.3, 0.5);
//! # let (calls, puts): (Vec<OptionQuote>, Vec<OptionQuote>) = (Vec::new(), Vec::new());
//! let matched = filter_chain(&calls, &puts, &criteria);
//! ```
//!
//! ## What This Crate Does NOT Do
//!
//! - Talk to a broker or market-data feed
//! - Price American exercise (European Black-Scholes only)
//! - Model the volatility smile (one σ per estimate)

pub mod config;
pub mod core;
pub mod data;
pub mod estimator;
pub mod filter;
pub mod models;
pub mod request;

/// Prelude with commonly used types
pub mod prelude {
    // Core types
    pub use crate::core::{
        Greeks, OptionQuote, OptionSide, ScannerError, ScannerResult, SideSelector,
        UnderlyingQuote, Valuation,
    };

    pub use crate::config::{
        EstimatorConfig, IvSolverConfig, PricingConfig, ScannerConfig, SelectionConfig,
    };

    // Models
    pub use crate::models::{
        compute_greeks, enrich_quote, enrich_quotes, implied_volatility, norm_cdf, norm_pdf,
        price as bs_price, MarketContext, PricingInput, PricingParams,
    };

    // Strike narrowing
    pub use crate::estimator::{
        estimate_strike_range, DeltaFilterSpec, StrikeRangeEstimate, StrikeRangeEstimator,
    };

    // Filtering
    pub use crate::filter::{filter_chain, FilterCriteria, FilteredChain, QuoteFilter, RangeCriterion};

    // Requests
    pub use crate::request::{ChainRequest, ChainResponse, FetchPlan, FetchPlanner, Selection};

    pub use crate::data::RecentSymbols;
}

// Re-export main types at crate root
pub use crate::core::{ScannerError, ScannerResult};
pub use crate::estimator::{StrikeRangeEstimate, StrikeRangeEstimator};
pub use crate::filter::FilterCriteria;
