//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → logging + log shipper → metrics upkeep → listener (main.rs)
//!
//! Signals (signals.rs):
//!     SIGINT/SIGTERM → server stops accepting, finishes in-flight requests
//!
//! Shutdown (shutdown.rs):
//!     Broadcast to background tasks → log shipper flushes → exit
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
pub use startup::{StartupError, Telemetry};
