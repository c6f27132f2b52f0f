//! Simulated misbehavior served by the `/api/*` endpoints.
//!
//! Each submodule is the pure core of one endpoint; the HTTP layer only adds
//! logging and JSON framing.
//!
//! - `latency.rs`: random delay for `/api/slow`
//! - `faults.rs`: random failures for `/api/faulty`
//! - `leak.rs`: never-freed allocations for `/api/memory-leak`
//! - `cpu.rs`: busy loop for `/api/cpu-intensive`

pub mod cpu;
pub mod faults;
pub mod latency;
pub mod leak;

pub use cpu::CpuRun;
pub use faults::FaultKind;
pub use leak::LeakStore;
