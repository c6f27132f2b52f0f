//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layers)
//!     → request.rs (request ID assigned and propagated)
//!     → middleware/instrument.rs (timing, metrics, access log)
//!     → handlers.rs (one endpoint)
//!     → response.rs (JSON bodies, fault and panic responses)
//!     → Send to client
//! ```

pub mod handlers;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::{request_id, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
