//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → CLI / environment overrides (main.rs)
//!     → ServiceConfig (immutable, shared by value)
//! ```
//!
//! # Design Decisions
//! - Every field has a default, so the service runs with no file at all
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{ListenerConfig, LogFormat, LokiConfig, ObservabilityConfig, ServiceConfig};
pub use validation::{validate_config, ValidationError};
