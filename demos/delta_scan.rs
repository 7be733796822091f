//! Example: Narrow a chain by delta before fetching it
//!
//! Run with: cargo run --example delta_scan

use options_scanner::models::black_scholes::{delta, PricingInput};
use options_scanner::prelude::*;

fn main() {
    let spot = 185.5;
    let time = 30.0 / 365.0;
    let rate = 0.05;
    let strikes: Vec<f64> = (0..=60).map(|i| 140.0 + i as f64 * 1.5).collect();

    let spec = DeltaFilterSpec::new(0.25, 0.40, SideSelector::All).unwrap();

    println!("=== Strike range for |delta| 0.25 - 0.40 ===\n");
    println!("Spot: {:.2}, {} listed strikes\n", spot, strikes.len());

    for (name, config) in [
        ("tight", EstimatorConfig::tight()),
        ("default", EstimatorConfig::default()),
        ("wide", EstimatorConfig::wide()),
    ] {
        let estimator = StrikeRangeEstimator::with_config(config);
        for vol in [0.15, 0.30, 0.60] {
            let est = estimator.estimate(&spec, spot, time, vol, rate).unwrap();
            let selected = est.select(&strikes);
            match est.bounds() {
                Some((low, high)) => println!(
                    "{:>8} vol {:>4.0}%: [{:>7.2}, {:>7.2}] -> {:>2} strikes",
                    name,
                    vol * 100.0,
                    low,
                    high,
                    selected.len()
                ),
                None => println!("{:>8} vol {:>4.0}%: no narrowing", name, vol * 100.0),
            }
        }
    }

    // Every strike that actually qualifies must have been selected
    let vol = 0.30;
    let est = StrikeRangeEstimator::new().estimate(&spec, spot, time, vol, rate).unwrap();
    let mut missed = 0;
    for &k in &strikes {
        for side in [OptionSide::Call, OptionSide::Put] {
            let input = PricingInput::new(spot, k, time, rate, vol, side).unwrap();
            let d = delta(&input).unwrap();
            if spec.admits(side, d) && !est.contains(k) {
                missed += 1;
            }
        }
    }
    println!("\nQualifying strikes outside the estimate: {}", missed);

    // Filter the enriched chain down to the band
    let ctx = MarketContext::new(spot, time, rate);
    let chain = |side: OptionSide| -> Vec<OptionQuote> {
        est.select(&strikes)
            .into_iter()
            .map(|k| {
                let input = PricingInput::new(spot, k, time, rate, vol, side).unwrap();
                let p = bs_price(&input);
                enrich_quote(&OptionQuote::new(k, side).with_bid_ask(Some(p * 0.99), Some(p * 1.01)), &ctx)
            })
            .collect()
    };

    let criteria = FilterCriteria::default().with_delta(0.25, 0.40);
    let result = filter_chain(&chain(OptionSide::Call), &chain(OptionSide::Put), &criteria);

    println!("\n=== Filtered chain: {} calls, {} puts ===", result.calls.len(), result.puts.len());
    for q in result.calls.iter().chain(result.puts.iter()) {
        println!(
            "{:>7.2}{} delta {:>6.3}  IV {:>5.1}%",
            q.strike,
            q.side.right(),
            q.delta.unwrap_or(f64::NAN),
            q.iv_percent().unwrap_or(f64::NAN)
        );
    }
}
