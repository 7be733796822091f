//! Strike bisection on a monotonic delta curve

use crate::core::{ScannerError, ScannerResult};

/// Strike interval known to contain the boundary strike
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub low: f64,
    pub high: f64,
}

/// Find the strike where a decreasing `delta_at` crosses `target`.
///
/// Requires `delta_at(low) >= target >= delta_at(high)`. The returned bracket
/// always contains the crossing; iteration stops once the deltas at its ends
/// differ by less than `tolerance`.
pub fn bisect_decreasing<F>(
    delta_at: F,
    target: f64,
    mut low: f64,
    mut high: f64,
    tolerance: f64,
    max_iterations: usize,
) -> ScannerResult<Bracket>
where
    F: Fn(f64) -> f64,
{
    let mut delta_low = delta_at(low);
    let mut delta_high = delta_at(high);

    if !(delta_low >= target && target >= delta_high) {
        return Err(ScannerError::non_convergent(format!(
            "delta {:.6} not bracketed by [{:.6}, {:.6}] on strikes [{}, {}]",
            target, delta_high, delta_low, low, high
        )));
    }

    for _ in 0..max_iterations {
        if delta_low - delta_high < tolerance || high - low <= f64::EPSILON * high {
            return Ok(Bracket { low, high });
        }

        let mid = 0.5 * (low + high);
        let delta_mid = delta_at(mid);
        if delta_mid.is_nan() {
            break;
        }

        if delta_mid >= target {
            low = mid;
            delta_low = delta_mid;
        } else {
            high = mid;
            delta_high = delta_mid;
        }
    }

    Err(ScannerError::non_convergent(format!(
        "strike bisection for delta {:.6} did not converge",
        target
    )))
}
