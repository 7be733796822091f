//! ChainFilterEngine - applies FilterCriteria to fetched quotes

use serde::{Deserialize, Serialize};

use crate::core::{OptionQuote, OptionSide};

use super::{delta_matches, DeltaMode, FilterCriteria};

/// Quotes that survived filtering, per side
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilteredChain {
    pub calls: Vec<OptionQuote>,
    pub puts: Vec<OptionQuote>,
}

impl FilteredChain {
    pub fn len(&self) -> usize {
        self.calls.len() + self.puts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty() && self.puts.is_empty()
    }
}

/// Row predicate built from one set of criteria
#[derive(Debug, Clone, Copy)]
pub struct QuoteFilter {
    criteria: FilterCriteria,
    delta_mode: Option<DeltaMode>,
}

impl QuoteFilter {
    pub fn new(criteria: FilterCriteria) -> Self {
        Self {
            criteria,
            delta_mode: None,
        }
    }

    /// Force a delta comparison mode instead of deriving it from the selector
    pub fn with_delta_mode(mut self, mode: DeltaMode) -> Self {
        self.delta_mode = Some(mode);
        self
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Does the quote pass every enabled criterion?
    pub fn matches(&self, quote: &OptionQuote) -> bool {
        let c = &self.criteria;
        if !c.side.includes(quote.side) {
            return false;
        }

        if c.delta.enabled {
            let mode = self.delta_mode.unwrap_or_else(|| DeltaMode::for_selector(c.side));
            match quote.delta {
                Some(d) if delta_matches(mode, d, c.delta.min, c.delta.max) => {}
                _ => return false,
            }
        }

        c.theta.admits(quote.theta.map(f64::abs)) && c.iv.admits(quote.iv_percent())
    }

    /// Keep matching quotes of one side, preserving order
    pub fn apply(&self, side: OptionSide, quotes: &[OptionQuote]) -> Vec<OptionQuote> {
        if !self.criteria.side.includes(side) {
            return Vec::new();
        }
        quotes.iter().filter(|q| self.matches(q)).cloned().collect()
    }
}

/// Filter both sides of a chain.
///
/// A side excluded by the selector comes back empty without being evaluated.
pub fn filter_chain(
    calls: &[OptionQuote],
    puts: &[OptionQuote],
    criteria: &FilterCriteria,
) -> FilteredChain {
    let filter = QuoteFilter::new(*criteria);
    let result = FilteredChain {
        calls: filter.apply(OptionSide::Call, calls),
        puts: filter.apply(OptionSide::Put, puts),
    };

    tracing::debug!(
        "Filtered chain ({}): calls {}/{}, puts {}/{}",
        criteria.side,
        result.calls.len(),
        calls.len(),
        result.puts.len(),
        puts.len()
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SideSelector;

    fn call(strike: f64, delta: f64) -> OptionQuote {
        OptionQuote::new(strike, OptionSide::Call).with_greeks(Some(delta), Some(0.03), Some(-0.05), Some(0.2))
    }

    fn put(strike: f64, delta: f64) -> OptionQuote {
        OptionQuote::new(strike, OptionSide::Put).with_greeks(Some(delta), Some(0.03), Some(-0.05), Some(0.2))
    }

    #[test]
    fn test_call_delta_scenario() {
        // Spot 185.50, 190 call with delta 0.38
        let criteria = FilterCriteria::for_side(SideSelector::Call).with_delta(0.3, 0.5);
        let out = filter_chain(&[call(190.0, 0.38)], &[put(190.0, -0.62)], &criteria);

        assert_eq!(out.calls.len(), 1);
        assert!(out.puts.is_empty());
    }

    #[test]
    fn test_put_delta_scenario() {
        // Put side compares against [-0.5, -0.3]: -0.62 is out
        let criteria = FilterCriteria::for_side(SideSelector::Put).with_delta(0.3, 0.5);
        let out = filter_chain(
            &[call(190.0, 0.38)],
            &[put(190.0, -0.62), put(185.0, -0.45)],
            &criteria,
        );

        assert!(out.calls.is_empty());
        assert_eq!(out.puts.len(), 1);
        assert_eq!(out.puts[0].strike, 185.0);
    }

    #[test]
    fn test_theta_uses_absolute_value() {
        let criteria = FilterCriteria::default().with_theta(0.1, 0.5);
        let filter = QuoteFilter::new(criteria);

        let slow = OptionQuote::new(190.0, OptionSide::Call).with_greeks(None, None, Some(-0.04), None);
        let fast = OptionQuote::new(190.0, OptionSide::Call).with_greeks(None, None, Some(-0.20), None);
        assert!(!filter.matches(&slow));
        assert!(filter.matches(&fast));
    }

    #[test]
    fn test_iv_in_percentage_points() {
        let criteria = FilterCriteria::default().with_iv_percent(20.0, 40.0);
        let filter = QuoteFilter::new(criteria);

        let q = OptionQuote::new(190.0, OptionSide::Put).with_implied_vol(Some(0.28));
        assert!(filter.matches(&q));
        let q = OptionQuote::new(190.0, OptionSide::Put).with_implied_vol(Some(0.45));
        assert!(!filter.matches(&q));
    }

    #[test]
    fn test_missing_greeks_never_match_enabled_criteria() {
        let bare = OptionQuote::new(190.0, OptionSide::Call).with_bid_ask(Some(2.0), Some(2.2));

        assert!(QuoteFilter::new(FilterCriteria::default()).matches(&bare));
        assert!(!QuoteFilter::new(FilterCriteria::default().with_delta(0.0, 1.0)).matches(&bare));
        assert!(!QuoteFilter::new(FilterCriteria::default().with_iv_percent(0.0, 500.0)).matches(&bare));
        assert!(!QuoteFilter::new(FilterCriteria::default().with_theta(0.0, 10.0)).matches(&bare));
    }

    #[test]
    fn test_zero_delta_is_a_value() {
        let q = call(400.0, 0.0);
        let criteria = FilterCriteria::for_side(SideSelector::Call).with_delta(0.0, 0.05);
        assert!(QuoteFilter::new(criteria).matches(&q));
    }

    #[test]
    fn test_mixed_mode_uses_magnitude() {
        // Feed reporting put deltas as positive magnitudes
        let q = put(180.0, 0.4);
        let all = FilterCriteria::default().with_delta(0.3, 0.5);
        assert!(QuoteFilter::new(all).matches(&q));

        let put_only = FilterCriteria::for_side(SideSelector::Put).with_delta(0.3, 0.5);
        assert!(!QuoteFilter::new(put_only).matches(&q));

        let forced = QuoteFilter::new(put_only).with_delta_mode(DeltaMode::Magnitude);
        assert!(forced.matches(&q));
    }

    #[test]
    fn test_criteria_are_conjunctive() {
        let criteria = FilterCriteria::default()
            .with_delta(0.3, 0.5)
            .with_theta(0.01, 0.1)
            .with_iv_percent(10.0, 30.0);

        let good = call(190.0, 0.4).with_implied_vol(Some(0.25));
        let high_iv = call(190.0, 0.4).with_implied_vol(Some(0.35));
        let out = filter_chain(&[good.clone(), high_iv], &[], &criteria);

        assert_eq!(out.calls, vec![good]);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_inputs_untouched_and_order_kept() {
        let calls = vec![call(195.0, 0.25), call(185.0, 0.55), call(190.0, 0.38)];
        let criteria = FilterCriteria::default().with_delta(0.2, 0.6);
        let out = filter_chain(&calls, &[], &criteria);

        let strikes: Vec<f64> = out.calls.iter().map(|q| q.strike).collect();
        assert_eq!(strikes, vec![195.0, 185.0, 190.0]);
        assert_eq!(calls.len(), 3);
    }
}
