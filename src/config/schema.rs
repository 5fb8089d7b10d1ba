//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::handler::TextEncoding;

/// Root configuration for the adaptor.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AdaptorConfig {
    /// Transport settings.
    pub server: ServerConfig,

    /// Request handler settings.
    pub handler: HandlerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Documents served by the bundled static adaptor.
    pub documents: Vec<DocumentConfig>,
}

/// Transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:5678").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5678".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Handler configuration. Immutable once a `Handler` is built from it.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HandlerConfig {
    /// Authority used when a request has no `Host` header.
    pub fallback_hostname: String,

    /// Encoding for generated text bodies.
    pub text_encoding: TextEncoding,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            fallback_hostname: "localhost".to_string(),
            text_encoding: TextEncoding::Utf8,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// A document served verbatim by the static adaptor.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DocumentConfig {
    /// Request path, starting with `/`.
    pub path: String,

    #[serde(default = "default_content_type")]
    pub content_type: String,

    pub body: String,

    /// HTTP-date of the last change; enables conditional GET.
    #[serde(default)]
    pub last_modified: Option<String>,
}

fn default_content_type() -> String {
    "text/plain".to_string()
}
