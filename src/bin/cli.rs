//! Options Scanner CLI
//!
//! Runs one scan end to end against a synthetic chain: plan the fetch from a
//! delta band, enrich the fetched rows with Greeks/IV, filter, and print the
//! response JSON.
//!
//! Usage: `cli [config.json] [data_dir]`
//!
//! The recent-symbols history is written under `data_dir`, or under
//! `$OPTIONS_SCANNER_DATA_DIR` when no directory is given. With neither set
//! the history is not persisted.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{Duration, Local};
use tracing_subscriber::EnvFilter;

use options_scanner::data::default_history_path;
use options_scanner::models::black_scholes::{price, PricingInput};
use options_scanner::prelude::*;

const SYMBOL: &str = "AAPL";
const SPOT: f64 = 185.5;
const DATA_DIR_ENV: &str = "OPTIONS_SCANNER_DATA_DIR";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Scan failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> ScannerResult<()> {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => ScannerConfig::from_json_file(path)?,
        None => ScannerConfig::default(),
    };
    let data_dir = args
        .next()
        .or_else(|| std::env::var(DATA_DIR_ENV).ok())
        .filter(|d| !d.trim().is_empty())
        .map(PathBuf::from);
    config.validate()?;

    println!("Options Scanner");
    println!("===============\n");

    let today = Local::now().date_naive();
    let expiry = today + Duration::days(30);
    let request = ChainRequest::new(SYMBOL, expiry.format("%Y%m%d").to_string())
        .with_delta_filter(0.3, 0.5, SideSelector::All);

    let listed: Vec<f64> = (0..=28).map(|i| 150.0 + 2.5 * i as f64).collect();
    let planner = FetchPlanner::with_config(config.clone());
    let underlying = UnderlyingQuote {
        close: Some(SPOT),
        ..Default::default()
    };
    let spot = underlying.price();
    let plan = planner.plan(&request, &listed, spot, spot.map(smile_vol), today)?;

    println!("Fetch plan ({:?}):", plan.selection);
    if let Some(StrikeRangeEstimate::Range { low, high }) = plan.estimate {
        println!("  Estimated strike range: {:.2} - {:.2}", low, high);
    }
    println!("  Strikes: {} of {} listed\n", plan.strikes.len(), listed.len());

    let time_to_expiry = request.time_to_expiry(today, config.pricing.days_per_year)?;
    let ctx = MarketContext::new(plan.spot, time_to_expiry, config.pricing.risk_free_rate);

    let (calls, puts) = synthetic_chain(&plan.strikes, &ctx)?;
    let calls = enrich_quotes(&calls, &ctx);
    let puts = enrich_quotes(&puts, &ctx);

    let criteria = FilterCriteria::for_side(request.option_type)
        .with_delta(request.min_delta, request.max_delta);
    criteria.validate()?;
    let filtered = filter_chain(&calls, &puts, &criteria);

    println!("{:>9} {:>5} {:>8} {:>8} {:>8} {:>7}", "Strike", "Side", "Mid", "Delta", "Theta", "IV%");
    for q in filtered.calls.iter().chain(filtered.puts.iter()) {
        println!(
            "{:>8.2}{} {:>5} {:>8.2} {:>8.3} {:>8.3} {:>7.1}",
            q.strike,
            if q.is_at_the_money(plan.spot) { "*" } else { " " },
            q.side.right(),
            q.mid().unwrap_or(f64::NAN),
            q.delta.unwrap_or(f64::NAN),
            q.theta.unwrap_or(f64::NAN),
            q.iv_percent().unwrap_or(f64::NAN)
        );
    }

    let response = ChainResponse::from_filtered(&request, plan.spot, filtered);
    println!("\n{}", serde_json::to_string_pretty(&response)?);

    match data_dir {
        Some(dir) => {
            let history_path = default_history_path(dir);
            let mut recent = RecentSymbols::load(&history_path).unwrap_or_default();
            recent.touch(SYMBOL);
            if let Err(e) = recent.save(&history_path) {
                tracing::warn!("Could not save symbol history: {}", e);
            }
        }
        None => tracing::info!("No data directory given, symbol history not saved"),
    }

    Ok(())
}

/// Mild equity-style skew
fn smile_vol(strike: f64) -> f64 {
    let m = (strike / SPOT).ln();
    0.28 - 0.15 * m + 0.6 * m * m
}

/// Quotes as a feed without Greeks would deliver them
fn synthetic_chain(
    strikes: &[f64],
    ctx: &MarketContext,
) -> ScannerResult<(Vec<OptionQuote>, Vec<OptionQuote>)> {
    let mut calls = Vec::with_capacity(strikes.len());
    let mut puts = Vec::with_capacity(strikes.len());

    for &strike in strikes {
        for side in [OptionSide::Call, OptionSide::Put] {
            let input = PricingInput::new(
                ctx.spot,
                strike,
                ctx.time_to_expiry,
                ctx.risk_free_rate,
                smile_vol(strike),
                side,
            )?;
            let fair = price(&input);
            let half_spread = (fair * 0.01).max(0.01);
            let quote = OptionQuote::new(strike, side)
                .with_bid_ask(Some((fair - half_spread).max(0.0)), Some(fair + half_spread))
                .with_activity(100, Some(1_000));

            match side {
                OptionSide::Call => calls.push(quote),
                OptionSide::Put => puts.push(quote),
            }
        }
    }
    Ok((calls, puts))
}
