//! Greeks-Based Chain Filtering
//!
//! Post-filters fetched quotes by option side, delta, implied volatility and
//! theta. Users enter non-negative magnitudes; the engine applies the sign
//! per side:
//! - **Delta**: calls vs `[min, max]`, puts vs `[-max, -min]`, mixed vs `|delta|`
//! - **Theta**: `|theta|` per day
//! - **IV**: percentage points (`iv * 100`)
//!
//! A quote with no value for an enabled criterion never matches it.

mod criteria;
mod engine;

pub use criteria::*;
pub use engine::*;
