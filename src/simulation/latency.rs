//! Artificial latency.

use std::ops::Range;
use std::time::Duration;

use rand::Rng;

/// Delay range for the slow endpoint, in seconds (half-open).
pub const SLOW_DELAY_SECS: Range<f64> = 2.0..5.0;

/// Pick a delay uniformly from `SLOW_DELAY_SECS`.
pub fn slow_delay<R: Rng + ?Sized>(rng: &mut R) -> Duration {
    Duration::from_secs_f64(rng.gen_range(SLOW_DELAY_SECS))
}
