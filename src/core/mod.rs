//! Core data types for the options scanner
//!
//! Defines fundamental types:
//! - OptionSide / SideSelector: call/put identity and request scope
//! - OptionQuote: one chain row with optional Greeks
//! - Greeks / Valuation: engine output
//! - ScannerError: crate error type

pub mod option;
pub mod quote;
pub mod greeks;
pub mod error;

pub use option::*;
pub use quote::*;
pub use greeks::*;
pub use error::*;
