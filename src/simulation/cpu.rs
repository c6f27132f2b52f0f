//! Synchronous CPU burn.

use std::hint::black_box;
use std::time::Instant;

/// Iterations of the square-root accumulation.
pub const CPU_ITERATIONS: u64 = 10_000_000;

/// Outcome of one burn.
#[derive(Debug, Clone, Copy)]
pub struct CpuRun {
    /// Wall time in seconds.
    pub duration: f64,
    /// Sum of square roots.
    pub result: f64,
}

/// Sum `sqrt(i)` for `i` in `0..iterations`, blocking the calling thread.
pub fn burn(iterations: u64) -> CpuRun {
    let start = Instant::now();
    let mut acc = 0.0_f64;
    for i in 0..iterations {
        acc += black_box(i as f64).sqrt();
    }
    CpuRun {
        duration: start.elapsed().as_secs_f64(),
        result: black_box(acc),
    }
}
