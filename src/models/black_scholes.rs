//! Black-Scholes Model
//!
//! Provides:
//! - European option pricing
//! - Greeks computation (per-day theta, per-point vega)
//! - Implied volatility solver (Newton-Raphson with bisection fallback)
//!
//! At expiry (`T == 0`) the price collapses to intrinsic value and every
//! Greek is reported as `None`: the payoff kink makes the derivatives
//! undefined there, and a zero would be indistinguishable from a real value.

use std::f64::consts::{PI, SQRT_2};

use statrs::function::erf::erfc;

use crate::config::IvSolverConfig;
use crate::core::{ensure_finite, Greeks, OptionSide, ScannerError, ScannerResult, Valuation};

/// Calendar days used to express theta per day
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Smallest σ difference an implied volatility is expected to resolve
const IV_RESOLUTION: f64 = 1e-4;

/// Contract and market inputs without a volatility.
///
/// Validated on construction: spot and strike positive, time non-negative,
/// everything finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingParams {
    spot: f64,
    strike: f64,
    time_to_expiry: f64,
    risk_free_rate: f64,
    side: OptionSide,
}

impl PricingParams {
    pub fn new(
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        risk_free_rate: f64,
        side: OptionSide,
    ) -> ScannerResult<Self> {
        ensure_finite("spot", spot)?;
        ensure_finite("strike", strike)?;
        ensure_finite("time_to_expiry", time_to_expiry)?;
        ensure_finite("risk_free_rate", risk_free_rate)?;
        if spot <= 0.0 {
            return Err(ScannerError::invalid_input(format!("spot must be positive, got {}", spot)));
        }
        if strike <= 0.0 {
            return Err(ScannerError::invalid_input(format!(
                "strike must be positive, got {}",
                strike
            )));
        }
        if time_to_expiry < 0.0 {
            return Err(ScannerError::invalid_input(format!(
                "time to expiry must be non-negative, got {}",
                time_to_expiry
            )));
        }

        Ok(Self {
            spot,
            strike,
            time_to_expiry,
            risk_free_rate,
            side,
        })
    }

    pub fn spot(&self) -> f64 {
        self.spot
    }

    pub fn strike(&self) -> f64 {
        self.strike
    }

    pub fn time_to_expiry(&self) -> f64 {
        self.time_to_expiry
    }

    pub fn risk_free_rate(&self) -> f64 {
        self.risk_free_rate
    }

    pub fn side(&self) -> OptionSide {
        self.side
    }

    /// Attach a volatility, producing a full pricing input
    pub fn with_volatility(&self, volatility: f64) -> ScannerResult<PricingInput> {
        ensure_finite("volatility", volatility)?;
        if volatility <= 0.0 {
            return Err(ScannerError::invalid_input(format!(
                "volatility must be positive, got {}",
                volatility
            )));
        }
        Ok(PricingInput {
            params: *self,
            volatility,
        })
    }

    /// Same contract at another strike. Callers guarantee `strike > 0`.
    pub(crate) fn at_strike(&self, strike: f64) -> Self {
        debug_assert!(strike > 0.0);
        Self { strike, ..*self }
    }

    /// e^{-rT}
    pub fn discount_factor(&self) -> f64 {
        (-self.risk_free_rate * self.time_to_expiry).exp()
    }

    /// No-arbitrage price interval (lower, upper)
    pub fn price_bounds(&self) -> (f64, f64) {
        let pv_strike = self.strike * self.discount_factor();
        match self.side {
            OptionSide::Call => ((self.spot - pv_strike).max(0.0), self.spot),
            OptionSide::Put => ((pv_strike - self.spot).max(0.0), pv_strike),
        }
    }
}

/// Full Black-Scholes input: contract, market and volatility
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingInput {
    params: PricingParams,
    volatility: f64,
}

impl PricingInput {
    pub fn new(
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        risk_free_rate: f64,
        volatility: f64,
        side: OptionSide,
    ) -> ScannerResult<Self> {
        PricingParams::new(spot, strike, time_to_expiry, risk_free_rate, side)?
            .with_volatility(volatility)
    }

    pub fn params(&self) -> &PricingParams {
        &self.params
    }

    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    pub fn spot(&self) -> f64 {
        self.params.spot
    }

    pub fn strike(&self) -> f64 {
        self.params.strike
    }

    pub fn time_to_expiry(&self) -> f64 {
        self.params.time_to_expiry
    }

    pub fn side(&self) -> OptionSide {
        self.params.side
    }

    /// Same input at another strike. Callers guarantee `strike > 0`.
    pub(crate) fn at_strike(&self, strike: f64) -> Self {
        Self {
            params: self.params.at_strike(strike),
            volatility: self.volatility,
        }
    }

    /// Same input with another σ. Callers guarantee `volatility > 0`.
    fn at_volatility(&self, volatility: f64) -> Self {
        Self {
            params: self.params,
            volatility,
        }
    }

    fn is_expired(&self) -> bool {
        self.params.time_to_expiry <= 0.0
    }
}

/// Standard normal CDF
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Standard normal PDF
pub fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// Black-Scholes d1 parameter
pub fn d1(spot: f64, strike: f64, rate: f64, vol: f64, time: f64) -> f64 {
    ((spot / strike).ln() + (rate + 0.5 * vol * vol) * time) / (vol * time.sqrt())
}

/// Black-Scholes d2 parameter
pub fn d2(spot: f64, strike: f64, rate: f64, vol: f64, time: f64) -> f64 {
    d1(spot, strike, rate, vol, time) - vol * time.sqrt()
}

fn d1_of(input: &PricingInput) -> f64 {
    let p = &input.params;
    d1(p.spot, p.strike, p.risk_free_rate, input.volatility, p.time_to_expiry)
}

/// Black-Scholes European option price; intrinsic value at expiry
pub fn price(input: &PricingInput) -> f64 {
    let p = &input.params;
    if input.is_expired() {
        return p.side.intrinsic(p.spot, p.strike);
    }

    let d1 = d1_of(input);
    let d2 = d1 - input.volatility * p.time_to_expiry.sqrt();
    let pv_strike = p.strike * p.discount_factor();

    match p.side {
        OptionSide::Call => p.spot * norm_cdf(d1) - pv_strike * norm_cdf(d2),
        OptionSide::Put => pv_strike * norm_cdf(-d2) - p.spot * norm_cdf(-d1),
    }
}

/// Φ(d1) for calls, Φ(d1) - 1 for puts.
///
/// Strictly decreasing in strike for both sides.
pub fn delta(input: &PricingInput) -> Option<f64> {
    if input.is_expired() {
        return None;
    }
    let nd1 = norm_cdf(d1_of(input));
    Some(match input.side() {
        OptionSide::Call => nd1,
        OptionSide::Put => nd1 - 1.0,
    })
}

/// Same for call and put
pub fn gamma(input: &PricingInput) -> Option<f64> {
    if input.is_expired() {
        return None;
    }
    let sqrt_t = input.time_to_expiry().sqrt();
    Some(norm_pdf(d1_of(input)) / (input.spot() * input.volatility * sqrt_t))
}

/// Per 1 volatility point (σ + 0.01); same for call and put
pub fn vega(input: &PricingInput) -> Option<f64> {
    if input.is_expired() {
        return None;
    }
    Some(raw_vega(input) / 100.0)
}

/// Per calendar day, raw sign
pub fn theta(input: &PricingInput) -> Option<f64> {
    if input.is_expired() {
        return None;
    }
    let p = &input.params;
    let sqrt_t = p.time_to_expiry.sqrt();
    let d1 = d1_of(input);
    let d2 = d1 - input.volatility * sqrt_t;
    let pv_strike = p.strike * p.discount_factor();

    let decay = -p.spot * norm_pdf(d1) * input.volatility / (2.0 * sqrt_t);
    let per_year = match p.side {
        OptionSide::Call => decay - p.risk_free_rate * pv_strike * norm_cdf(d2),
        OptionSide::Put => decay + p.risk_free_rate * pv_strike * norm_cdf(-d2),
    };
    Some(per_year / DAYS_PER_YEAR)
}

/// dV/dσ per unit σ (used by the Newton step)
fn raw_vega(input: &PricingInput) -> f64 {
    input.spot() * norm_pdf(d1_of(input)) * input.time_to_expiry().sqrt()
}

/// Price and all Greeks in one pass
pub fn compute_greeks(input: &PricingInput) -> Valuation {
    let price = price(input);
    if input.is_expired() {
        return Valuation {
            price,
            greeks: None,
        };
    }

    let p = &input.params;
    let vol = input.volatility;
    let sqrt_t = p.time_to_expiry.sqrt();
    let d1 = d1_of(input);
    let d2 = d1 - vol * sqrt_t;
    let pdf_d1 = norm_pdf(d1);
    let pv_strike = p.strike * p.discount_factor();

    let delta = match p.side {
        OptionSide::Call => norm_cdf(d1),
        OptionSide::Put => norm_cdf(d1) - 1.0,
    };
    let gamma = pdf_d1 / (p.spot * vol * sqrt_t);
    let vega = p.spot * pdf_d1 * sqrt_t / 100.0;

    let decay = -p.spot * pdf_d1 * vol / (2.0 * sqrt_t);
    let theta = match p.side {
        OptionSide::Call => decay - p.risk_free_rate * pv_strike * norm_cdf(d2),
        OptionSide::Put => decay + p.risk_free_rate * pv_strike * norm_cdf(-d2),
    };

    Valuation {
        price,
        greeks: Some(Greeks::new(delta, gamma, theta / DAYS_PER_YEAR, vega)),
    }
}

/// Implied volatility with the default solver settings
pub fn implied_volatility(observed_price: f64, params: &PricingParams) -> ScannerResult<f64> {
    implied_volatility_with(observed_price, params, &IvSolverConfig::default())
}

/// Implied volatility solver using Newton-Raphson with bisection fallback.
///
/// Fails with `NonConvergent` when there is no time value to invert, the
/// price violates the no-arbitrage bounds, or the iteration budget runs out.
pub fn implied_volatility_with(
    observed_price: f64,
    params: &PricingParams,
    config: &IvSolverConfig,
) -> ScannerResult<f64> {
    if !observed_price.is_finite() || observed_price <= 0.0 {
        return Err(ScannerError::non_convergent(format!(
            "no IV for non-positive price {}",
            observed_price
        )));
    }
    if params.time_to_expiry <= 0.0 {
        return Err(ScannerError::non_convergent("no IV at expiry"));
    }

    let (lower, upper) = params.price_bounds();
    if observed_price < lower - config.tolerance || observed_price >= upper {
        return Err(ScannerError::non_convergent(format!(
            "price {:.6} outside arbitrage bounds [{:.6}, {:.6})",
            observed_price, lower, upper
        )));
    }

    // Deep in or far out of the money the price carries no volatility information
    let time_value = observed_price - lower;
    if time_value <= config.tolerance {
        return Err(ScannerError::non_convergent(format!(
            "price {:.6} has no time value over the bound {:.6}",
            observed_price, lower
        )));
    }

    // Initial guess using Brenner-Subrahmanyam on the time value
    let seed = time_value / (0.4 * params.spot * params.time_to_expiry.sqrt());
    let mut input = PricingInput {
        params: *params,
        volatility: seed.clamp(0.01, 3.0),
    };

    for _ in 0..config.max_newton_iterations {
        let diff = price(&input) - observed_price;
        if diff.abs() < config.tolerance {
            return resolved(&input, config);
        }

        let vega = raw_vega(&input);
        if vega < 1e-12 {
            break; // Vega too small, switch to bisection
        }

        let next = input.volatility - diff / vega;
        if !next.is_finite() || next < config.vol_lower || next > config.vol_upper {
            break; // Out of bounds, switch to bisection
        }
        input = input.at_volatility(next);
    }

    bisection_iv(observed_price, &input, config)
}

/// Accept a solved σ only if a move of `IV_RESOLUTION` would still change
/// the price by more than the tolerance
fn resolved(input: &PricingInput, config: &IvSolverConfig) -> ScannerResult<f64> {
    if raw_vega(input) * IV_RESOLUTION < config.tolerance {
        return Err(ScannerError::non_convergent(format!(
            "price insensitive to volatility near σ = {:.4}",
            input.volatility
        )));
    }
    Ok(input.volatility)
}

/// Bisection method for IV (slower but more robust)
fn bisection_iv(
    observed_price: f64,
    input: &PricingInput,
    config: &IvSolverConfig,
) -> ScannerResult<f64> {
    let mut low = config.vol_lower;
    let mut high = config.vol_upper;

    let price_low = price(&input.at_volatility(low));
    let price_high = price(&input.at_volatility(high));
    if observed_price < price_low - config.tolerance || observed_price > price_high + config.tolerance {
        return Err(ScannerError::non_convergent(format!(
            "price {:.6} not bracketed by σ in [{}, {}]",
            observed_price, low, high
        )));
    }

    for _ in 0..config.max_bisection_iterations {
        let mid = 0.5 * (low + high);
        let diff = price(&input.at_volatility(mid)) - observed_price;

        if diff.abs() < config.tolerance || (high - low) < 1e-12 {
            return resolved(&input.at_volatility(mid), config);
        }

        if diff > 0.0 {
            high = mid;
        } else {
            low = mid;
        }
    }

    Err(ScannerError::non_convergent("IV solver did not converge"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(strike: f64, vol: f64, side: OptionSide) -> PricingInput {
        PricingInput::new(100.0, strike, 1.0, 0.05, vol, side).unwrap()
    }

    #[test]
    fn test_norm_cdf() {
        assert!((norm_cdf(0.0) - 0.5).abs() < 1e-12);
        assert!((norm_cdf(1.96) - 0.975).abs() < 0.001);
        assert!((norm_cdf(-1.96) - 0.025).abs() < 0.001);
    }

    #[test]
    fn test_bs_price() {
        // ATM call, 20% vol, 1 year, 5% rate: textbook 10.4506
        let call_price = price(&input(100.0, 0.20, OptionSide::Call));
        assert!((call_price - 10.4506).abs() < 1e-3);

        // Put-call parity: C - P = S - K e^{-rT}
        let put_price = price(&input(100.0, 0.20, OptionSide::Put));
        let parity = call_price - put_price - (100.0 - 100.0 * (-0.05_f64).exp());
        assert!(parity.abs() < 1e-10);
    }

    #[test]
    fn test_greeks() {
        let v = compute_greeks(&input(100.0, 0.20, OptionSide::Call));
        let g = v.greeks.unwrap();

        // ATM call delta should be around 0.5-0.7
        assert!(g.delta > 0.5 && g.delta < 0.7);
        assert!(g.gamma > 0.0);
        assert!(g.theta < 0.0);
        assert!(g.vega > 0.0);

        // Standalone functions agree with the batch
        let i = input(100.0, 0.20, OptionSide::Call);
        assert_eq!(delta(&i), Some(g.delta));
        assert!((gamma(&i).unwrap() - g.gamma).abs() < 1e-15);
        assert!((theta(&i).unwrap() - g.theta).abs() < 1e-15);
        assert!((vega(&i).unwrap() - g.vega).abs() < 1e-15);
    }

    #[test]
    fn test_call_put_symmetry() {
        let call = compute_greeks(&input(105.0, 0.3, OptionSide::Call)).greeks.unwrap();
        let put = compute_greeks(&input(105.0, 0.3, OptionSide::Put)).greeks.unwrap();

        assert!((call.delta - put.delta - 1.0).abs() < 1e-12);
        assert!((call.gamma - put.gamma).abs() < 1e-15);
        assert!((call.vega - put.vega).abs() < 1e-15);
        assert!(put.delta < 0.0 && put.delta > -1.0);
    }

    #[test]
    fn test_theta_per_day_and_vega_per_point() {
        let i = input(100.0, 0.20, OptionSide::Call);
        let theta_day = theta(&i).unwrap();
        // Textbook annual theta for this option is about -6.41
        assert!((theta_day * 365.0 + 6.414).abs() < 0.01);

        // Finite-difference check of per-point vega
        let bumped = price(&input(100.0, 0.21, OptionSide::Call)) - price(&i);
        assert!((vega(&i).unwrap() - bumped).abs() < 0.01);
    }

    #[test]
    fn test_expiry_boundary() {
        let expired = PricingInput::new(110.0, 100.0, 0.0, 0.05, 0.2, OptionSide::Call).unwrap();
        assert_eq!(price(&expired), 10.0);

        let put = PricingInput::new(90.0, 100.0, 0.0, 0.05, 0.2, OptionSide::Put).unwrap();
        let v = compute_greeks(&put);
        assert_eq!(v.price, 10.0);
        assert!(v.greeks.is_none());
        assert_eq!(delta(&put), None);
        assert_eq!(gamma(&put), None);
        assert_eq!(theta(&put), None);
        assert_eq!(vega(&put), None);
    }

    #[test]
    fn test_validation() {
        assert!(PricingInput::new(-1.0, 100.0, 1.0, 0.05, 0.2, OptionSide::Call).is_err());
        assert!(PricingInput::new(100.0, 0.0, 1.0, 0.05, 0.2, OptionSide::Call).is_err());
        assert!(PricingInput::new(100.0, 100.0, -0.1, 0.05, 0.2, OptionSide::Call).is_err());
        assert!(PricingInput::new(100.0, 100.0, 1.0, 0.05, 0.0, OptionSide::Call).is_err());
        assert!(PricingInput::new(100.0, 100.0, 1.0, f64::NAN, 0.2, OptionSide::Call).is_err());

        let err = PricingInput::new(100.0, 100.0, 1.0, 0.05, -0.2, OptionSide::Put).unwrap_err();
        assert!(matches!(err, ScannerError::InvalidInput(_)));
    }

    #[test]
    fn test_implied_vol() {
        let params = PricingParams::new(100.0, 100.0, 0.5, 0.05, OptionSide::Call).unwrap();
        let market_price = price(&params.with_volatility(0.25).unwrap());
        let iv = implied_volatility(market_price, &params).unwrap();

        assert!((iv - 0.25).abs() < 1e-4);
    }

    #[test]
    fn test_iv_otm_put() {
        let params = PricingParams::new(100.0, 90.0, 0.25, 0.05, OptionSide::Put).unwrap();
        let market_price = price(&params.with_volatility(0.30).unwrap());
        let iv = implied_volatility(market_price, &params).unwrap();

        assert!((iv - 0.30).abs() < 1e-3);
    }

    #[test]
    fn test_iv_deep_itm_call() {
        let params = PricingParams::new(185.5, 150.0, 30.0 / 365.0, 0.05, OptionSide::Call).unwrap();
        let market_price = price(&params.with_volatility(0.45).unwrap());
        let iv = implied_volatility(market_price, &params).unwrap();

        assert!((iv - 0.45).abs() / 0.45 < 1e-3);
    }

    #[test]
    fn test_iv_without_time_value_is_undefined() {
        // Deep ITM: the quoted price equals discounted intrinsic to many digits
        let params = PricingParams::new(100.0, 60.0, 30.0 / 365.0, 0.05, OptionSide::Call).unwrap();
        let market_price = price(&params.with_volatility(0.30).unwrap());
        assert!(implied_volatility(market_price, &params).unwrap_err().is_non_convergent());

        let params = PricingParams::new(185.5, 150.0, 7.0 / 365.0, 0.05, OptionSide::Call).unwrap();
        let market_price = price(&params.with_volatility(0.25).unwrap());
        assert!(implied_volatility(market_price, &params).unwrap_err().is_non_convergent());
    }

    #[test]
    fn test_iv_rejects_arbitrage_violations() {
        let params = PricingParams::new(100.0, 80.0, 0.5, 0.05, OptionSide::Call).unwrap();

        // Below discounted intrinsic
        let err = implied_volatility(15.0, &params).unwrap_err();
        assert!(err.is_non_convergent());

        // Above the spot
        assert!(implied_volatility(101.0, &params).unwrap_err().is_non_convergent());

        // Nothing to invert
        assert!(implied_volatility(0.0, &params).is_err());
        assert!(implied_volatility(f64::NAN, &params).is_err());

        let expired = PricingParams::new(100.0, 80.0, 0.0, 0.05, OptionSide::Call).unwrap();
        assert!(implied_volatility(20.0, &expired).unwrap_err().is_non_convergent());
    }

    #[test]
    fn test_delta_decreases_with_strike() {
        let strikes = [60.0, 80.0, 95.0, 100.0, 105.0, 120.0, 160.0];
        for side in [OptionSide::Call, OptionSide::Put] {
            let deltas: Vec<f64> = strikes
                .iter()
                .map(|&k| delta(&input(k, 0.25, side)).unwrap())
                .collect();
            assert!(deltas.windows(2).all(|w| w[0] > w[1]), "{:?}: {:?}", side, deltas);
        }
    }
}
