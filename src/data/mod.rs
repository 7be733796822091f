//! Local persistence
//!
//! Handles:
//! - Recently scanned symbols (JSON on disk)

pub mod history;

pub use history::*;
