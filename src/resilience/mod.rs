//! Resilience helpers for outbound calls.
//!
//! The only outbound traffic is log shipping; pushes that fail are retried
//! with jittered exponential backoff before the batch is given up.

pub mod backoff;
