//! Pricing Models
//!
//! Implements:
//! - Black-Scholes (pricing, Greeks, IV inversion)
//! - Quote enrichment (fill missing IV/Greeks from market prices)

pub mod black_scholes;
pub mod enrich;

pub use black_scholes::*;
pub use enrich::*;
