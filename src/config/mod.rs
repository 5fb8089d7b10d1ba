//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AdaptorConfig (validated, immutable)
//!     → HandlerConfig handed to Handler::new, ServerConfig to AdaptorServer
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::AdaptorConfig;
pub use schema::DocumentConfig;
pub use schema::HandlerConfig;
pub use schema::ObservabilityConfig;
pub use schema::ServerConfig;
