//! Randomly injected failures.

use std::fmt;

use rand::Rng;
use serde::Serialize;

/// Probability that a call to the faulty endpoint fails.
pub const FAULT_PROBABILITY: f64 = 0.4;

/// Kind of simulated failure, picked uniformly when a call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    Timeout,
    InvalidData,
    ServiceUnavailable,
}

impl FaultKind {
    pub const ALL: [FaultKind; 3] = [
        FaultKind::Timeout,
        FaultKind::InvalidData,
        FaultKind::ServiceUnavailable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FaultKind::Timeout => "timeout",
            FaultKind::InvalidData => "invalid_data",
            FaultKind::ServiceUnavailable => "service_unavailable",
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decide whether this call fails, and how.
pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Option<FaultKind> {
    if rng.gen_bool(FAULT_PROBABILITY) {
        Some(FaultKind::ALL[rng.gen_range(0..FaultKind::ALL.len())])
    } else {
        None
    }
}
