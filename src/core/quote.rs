//! Option quote data
//!
//! One row of an option chain: market prices, activity and (possibly missing)
//! Greeks for a single strike/side.

use serde::{Deserialize, Serialize};

use super::greeks::Greeks;
use super::option::{is_at_the_money, sanitize, OptionSide};

/// Option market quote.
///
/// Every Greek is optional: `None` means "not available" (not requested,
/// or the upstream/solver could not produce it) and is distinct from zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionQuote {
    /// Strike price
    pub strike: f64,
    /// Call or put
    pub side: OptionSide,
    /// Bid price
    pub bid: Option<f64>,
    /// Ask price
    pub ask: Option<f64>,
    /// Last traded price
    pub last: Option<f64>,
    /// Traded volume
    #[serde(default)]
    pub volume: u64,
    /// Open interest
    pub open_interest: Option<u64>,
    pub delta: Option<f64>,
    pub gamma: Option<f64>,
    /// Per-day theta, raw sign
    pub theta: Option<f64>,
    pub vega: Option<f64>,
    /// Implied volatility as a fraction (0.25 = 25%)
    #[serde(rename = "iv")]
    pub implied_vol: Option<f64>,
    #[serde(rename = "itm", default)]
    pub in_the_money: bool,
}

impl OptionQuote {
    /// Create an empty quote for a strike/side
    pub fn new(strike: f64, side: OptionSide) -> Self {
        Self {
            strike,
            side,
            bid: None,
            ask: None,
            last: None,
            volume: 0,
            open_interest: None,
            delta: None,
            gamma: None,
            theta: None,
            vega: None,
            implied_vol: None,
            in_the_money: false,
        }
    }

    /// Set bid/ask, dropping non-finite or negative prices
    pub fn with_bid_ask(mut self, bid: Option<f64>, ask: Option<f64>) -> Self {
        self.bid = non_negative(bid);
        self.ask = non_negative(ask);
        self
    }

    pub fn with_last(mut self, last: Option<f64>) -> Self {
        self.last = non_negative(last);
        self
    }

    pub fn with_activity(mut self, volume: u64, open_interest: Option<u64>) -> Self {
        self.volume = volume;
        self.open_interest = open_interest;
        self
    }

    /// Set Greeks as reported upstream; NaN/inf become `None`
    pub fn with_greeks(
        mut self,
        delta: Option<f64>,
        gamma: Option<f64>,
        theta: Option<f64>,
        vega: Option<f64>,
    ) -> Self {
        self.delta = sanitize(delta);
        self.gamma = sanitize(gamma);
        self.theta = sanitize(theta);
        self.vega = sanitize(vega);
        self
    }

    pub fn with_implied_vol(mut self, iv: Option<f64>) -> Self {
        self.implied_vol = non_negative(iv);
        self
    }

    /// Label moneyness against the given spot
    pub fn with_spot(mut self, spot: f64) -> Self {
        self.in_the_money = self.side.is_in_the_money(self.strike, spot);
        self
    }

    /// Mid price from bid/ask (both required, ask >= bid)
    pub fn mid(&self) -> Option<f64> {
        match (self.bid, self.ask) {
            (Some(b), Some(a)) if a >= b && a > 0.0 => Some((a + b) / 2.0),
            _ => None,
        }
    }

    /// Get the best available price (mid > last)
    pub fn best_price(&self) -> Option<f64> {
        self.mid().or(self.last.filter(|p| *p > 0.0))
    }

    /// All four Greeks, only when every one of them is known
    pub fn greeks(&self) -> Option<Greeks> {
        match (self.delta, self.gamma, self.theta, self.vega) {
            (Some(d), Some(g), Some(t), Some(v)) => Some(Greeks::new(d, g, t, v)),
            _ => None,
        }
    }

    /// Implied volatility in percentage points
    pub fn iv_percent(&self) -> Option<f64> {
        self.implied_vol.map(|iv| iv * 100.0)
    }

    pub fn is_at_the_money(&self, spot: f64) -> bool {
        is_at_the_money(self.strike, spot)
    }
}

/// Underlying quote as reported by the feed
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UnderlyingQuote {
    pub last: Option<f64>,
    pub close: Option<f64>,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
}

impl UnderlyingQuote {
    /// First usable price in the order last, close, bid, ask
    pub fn price(&self) -> Option<f64> {
        [self.last, self.close, self.bid, self.ask]
            .into_iter()
            .flatten()
            .find(|p| p.is_finite() && *p > 0.0)
    }
}

fn non_negative(value: Option<f64>) -> Option<f64> {
    sanitize(value).filter(|v| *v >= 0.0)
}

/// Sort quotes by strike (NaN-free by construction)
pub fn sort_by_strike(quotes: &mut [OptionQuote]) {
    quotes.sort_by(|a, b| a.strike.total_cmp(&b.strike));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_prices() {
        let quote = OptionQuote::new(190.0, OptionSide::Call)
            .with_bid_ask(Some(2.10), Some(2.30))
            .with_last(Some(2.25));

        assert!((quote.mid().unwrap() - 2.20).abs() < 1e-12);
        assert_eq!(quote.best_price(), quote.mid());
    }

    #[test]
    fn test_best_price_falls_back_to_last() {
        let quote = OptionQuote::new(190.0, OptionSide::Put)
            .with_bid_ask(None, Some(1.0))
            .with_last(Some(0.95));
        assert_eq!(quote.best_price(), Some(0.95));

        // Crossed market is not a usable mid
        let crossed = OptionQuote::new(190.0, OptionSide::Put).with_bid_ask(Some(1.2), Some(1.0));
        assert_eq!(crossed.mid(), None);
    }

    #[test]
    fn test_upstream_placeholders_are_undefined() {
        let quote = OptionQuote::new(190.0, OptionSide::Call)
            .with_bid_ask(Some(-1.0), Some(f64::NAN))
            .with_greeks(Some(f64::NAN), Some(0.02), None, Some(0.1))
            .with_implied_vol(Some(f64::INFINITY));

        assert_eq!(quote.bid, None);
        assert_eq!(quote.ask, None);
        assert_eq!(quote.delta, None);
        assert_eq!(quote.gamma, Some(0.02));
        assert_eq!(quote.implied_vol, None);
        assert!(quote.greeks().is_none());
    }

    #[test]
    fn test_underlying_price_priority() {
        let quote = UnderlyingQuote {
            last: Some(f64::NAN),
            close: Some(0.0),
            bid: Some(185.4),
            ask: Some(185.6),
        };
        assert_eq!(quote.price(), Some(185.4));

        let quote = UnderlyingQuote {
            last: Some(185.5),
            ..quote
        };
        assert_eq!(quote.price(), Some(185.5));
        assert_eq!(UnderlyingQuote::default().price(), None);
    }

    #[test]
    fn test_wire_field_names() {
        let quote = OptionQuote::new(190.0, OptionSide::Call)
            .with_activity(12, Some(340))
            .with_implied_vol(Some(0.25))
            .with_spot(185.5);
        let json = serde_json::to_value(&quote).unwrap();

        assert_eq!(json["openInterest"], 340);
        assert_eq!(json["iv"], 0.25);
        assert_eq!(json["itm"], false);
        assert_eq!(json["side"], "call");
    }
}
