//! Option Greeks
//!
//! First-order sensitivities plus gamma, as reported per contract.

use serde::{Deserialize, Serialize};

/// Option Greeks (sensitivities)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    /// Delta: dV/dS (sensitivity to spot)
    pub delta: f64,
    /// Gamma: d²V/dS² (sensitivity of delta to spot)
    pub gamma: f64,
    /// Theta: dV/dt per calendar day, raw sign (usually negative)
    pub theta: f64,
    /// Vega: dV/dσ per 1 volatility point
    pub vega: f64,
}

impl Greeks {
    pub fn new(delta: f64, gamma: f64, theta: f64, vega: f64) -> Self {
        Self {
            delta,
            gamma,
            theta,
            vega,
        }
    }
}

/// Theoretical price with Greeks.
///
/// `greeks` is `None` at expiry, where the derivatives are discontinuous.
/// It is never filled with zeros: zero is a legitimate delta or theta.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    pub price: f64,
    pub greeks: Option<Greeks>,
}
