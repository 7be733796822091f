//! Quote enrichment
//!
//! Fills IV and Greeks that the upstream feed did not supply, using the
//! Black-Scholes engine on the quote's own market price. Upstream values are
//! never overwritten, and anything that cannot be computed stays `None`.

use serde::{Deserialize, Serialize};

use crate::config::IvSolverConfig;
use crate::core::OptionQuote;

use super::black_scholes::{compute_greeks, implied_volatility_with, PricingParams};

/// Market state shared by every quote of one chain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketContext {
    /// Underlying spot price
    pub spot: f64,
    /// Time to expiry in years
    pub time_to_expiry: f64,
    pub risk_free_rate: f64,
}

impl MarketContext {
    pub fn new(spot: f64, time_to_expiry: f64, risk_free_rate: f64) -> Self {
        Self {
            spot,
            time_to_expiry,
            risk_free_rate,
        }
    }
}

/// Enrich with the default solver settings
pub fn enrich_quote(quote: &OptionQuote, ctx: &MarketContext) -> OptionQuote {
    enrich_quote_with(quote, ctx, &IvSolverConfig::default())
}

/// Return a copy of `quote` with missing IV/Greeks filled where possible
pub fn enrich_quote_with(
    quote: &OptionQuote,
    ctx: &MarketContext,
    solver: &IvSolverConfig,
) -> OptionQuote {
    let mut out = quote.clone().with_spot(ctx.spot);
    if out.implied_vol.is_some() && out.greeks().is_some() {
        return out;
    }

    let params = match PricingParams::new(
        ctx.spot,
        quote.strike,
        ctx.time_to_expiry,
        ctx.risk_free_rate,
        quote.side,
    ) {
        Ok(p) => p,
        Err(e) => {
            tracing::debug!("Skipping enrichment for strike {}: {}", quote.strike, e);
            return out;
        }
    };

    let iv = match out.implied_vol.filter(|v| *v > 0.0) {
        Some(iv) => iv,
        None => {
            let Some(observed) = quote.best_price() else {
                return out;
            };
            match implied_volatility_with(observed, &params, solver) {
                Ok(iv) => iv,
                Err(e) => {
                    tracing::debug!(
                        "No IV for {:?} {} at price {:.4}: {}",
                        quote.side,
                        quote.strike,
                        observed,
                        e
                    );
                    return out;
                }
            }
        }
    };
    out.implied_vol = Some(iv);

    let Ok(input) = params.with_volatility(iv) else {
        return out;
    };
    if let Some(g) = compute_greeks(&input).greeks {
        out.delta = out.delta.or(Some(g.delta));
        out.gamma = out.gamma.or(Some(g.gamma));
        out.theta = out.theta.or(Some(g.theta));
        out.vega = out.vega.or(Some(g.vega));
    }
    out
}

/// Enrich a whole side of a chain
pub fn enrich_quotes(quotes: &[OptionQuote], ctx: &MarketContext) -> Vec<OptionQuote> {
    quotes.iter().map(|q| enrich_quote(q, ctx)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::OptionSide;
    use crate::models::black_scholes::{price, PricingInput};

    const SPOT: f64 = 185.5;
    const T: f64 = 30.0 / 365.0;

    fn ctx() -> MarketContext {
        MarketContext::new(SPOT, T, 0.05)
    }

    fn market_price(strike: f64, vol: f64, side: OptionSide) -> f64 {
        price(&PricingInput::new(SPOT, strike, T, 0.05, vol, side).unwrap())
    }

    #[test]
    fn test_fills_missing_greeks_from_mid() {
        let p = market_price(190.0, 0.28, OptionSide::Call);
        let quote = OptionQuote::new(190.0, OptionSide::Call).with_bid_ask(Some(p), Some(p));

        let enriched = enrich_quote(&quote, &ctx());
        assert!((enriched.implied_vol.unwrap() - 0.28).abs() < 1e-4);
        let delta = enriched.delta.unwrap();
        assert!(delta > 0.3 && delta < 0.5);
        assert!(enriched.theta.unwrap() < 0.0);
        assert!(!enriched.in_the_money);
    }

    #[test]
    fn test_keeps_upstream_values() {
        let p = market_price(180.0, 0.30, OptionSide::Put);
        let quote = OptionQuote::new(180.0, OptionSide::Put)
            .with_last(Some(p))
            .with_greeks(Some(-0.31), None, None, None);

        let enriched = enrich_quote(&quote, &ctx());
        assert_eq!(enriched.delta, Some(-0.31));
        assert!(enriched.gamma.is_some());
        assert!(enriched.implied_vol.is_some());
    }

    #[test]
    fn test_unsolvable_price_stays_undefined() {
        // Below intrinsic value of a deep ITM call
        let quote = OptionQuote::new(150.0, OptionSide::Call).with_bid_ask(Some(20.0), Some(20.0));

        let enriched = enrich_quote(&quote, &ctx());
        assert_eq!(enriched.implied_vol, None);
        assert_eq!(enriched.delta, None);
        assert!(enriched.in_the_money);
    }

    #[test]
    fn test_deep_itm_without_time_value_stays_undefined() {
        let p = price(&PricingInput::new(SPOT, 150.0, 7.0 / 365.0, 0.05, 0.25, OptionSide::Call).unwrap());
        let quote = OptionQuote::new(150.0, OptionSide::Call).with_bid_ask(Some(p), Some(p));

        let enriched = enrich_quote(&quote, &MarketContext::new(SPOT, 7.0 / 365.0, 0.05));
        assert_eq!(enriched.implied_vol, None);
        assert!(enriched.greeks().is_none());
    }

    #[test]
    fn test_no_price_no_greeks() {
        let quote = OptionQuote::new(190.0, OptionSide::Call);
        let enriched = enrich_quote(&quote, &ctx());
        assert!(enriched.greeks().is_none());
        assert_eq!(enriched.implied_vol, None);
    }
}
