//! Request handling core.
//!
//! # Data Flow
//! ```text
//! transport builds Exchange
//!     → dispatch.rs (Handler::handle: log, run adaptor step, map failures)
//!         → adaptor step, which may call:
//!             canonical.rs   (loggable request headers)
//!             uri.rs         (absolute request URI)
//!             conditional.rs (If-Modified-Since)
//!             compression.rs (gzip negotiation)
//!             canned.rs      (fixed-content response)
//!     → transport streams what the sink received
//! ```
//!
//! # Design Decisions
//! - The adaptor step is an injected trait object, not a subtype
//! - Handler configuration is immutable after construction
//! - No per-request state lives on the Handler; it is shared via `Arc`

pub mod canned;
pub mod canonical;
pub mod compression;
pub mod conditional;
pub mod dispatch;
pub mod encoding;
pub mod uri;

use std::sync::Arc;

use crate::config::loader::ConfigError;
use crate::config::schema::HandlerConfig;
use crate::config::validation::validate_handler_config;
use crate::exchange::Exchange;

pub use dispatch::DispatchError;
pub use encoding::TextEncoding;

/// Failure reported by an adaptor step. Any error type converts into it.
pub type AdaptorError = Box<dyn std::error::Error + Send + Sync>;

/// Adaptor-specific handling of one exchange.
///
/// On success the step must leave the exchange committed. It may call any
/// of the `Handler` operations on the same exchange.
pub trait AdaptorStep: Send + Sync {
    fn handle(&self, handler: &Handler, ex: &mut Exchange) -> Result<(), AdaptorError>;
}

impl<F> AdaptorStep for F
where
    F: Fn(&Handler, &mut Exchange) -> Result<(), AdaptorError> + Send + Sync,
{
    fn handle(&self, handler: &Handler, ex: &mut Exchange) -> Result<(), AdaptorError> {
        self(handler, ex)
    }
}

/// Pin a closure to the [`AdaptorStep`] signature so its argument and
/// error types infer without annotations.
pub fn adaptor_fn<F>(f: F) -> F
where
    F: Fn(&Handler, &mut Exchange) -> Result<(), AdaptorError> + Send + Sync,
{
    f
}

/// Shared request handler: two immutable settings plus the adaptor step.
#[derive(Clone)]
pub struct Handler {
    fallback_hostname: String,
    text_encoding: TextEncoding,
    step: Arc<dyn AdaptorStep>,
}

impl Handler {
    /// Build a handler, failing if the configuration is unusable.
    pub fn new(config: HandlerConfig, step: impl AdaptorStep + 'static) -> Result<Self, ConfigError> {
        validate_handler_config(&config).map_err(ConfigError::Validation)?;
        Ok(Self {
            fallback_hostname: config.fallback_hostname,
            text_encoding: config.text_encoding,
            step: Arc::new(step),
        })
    }

    /// Host used when a request carries no `Host` header.
    pub fn fallback_hostname(&self) -> &str {
        &self.fallback_hostname
    }

    pub fn text_encoding(&self) -> TextEncoding {
        self.text_encoding
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handler")
            .field("fallback_hostname", &self.fallback_hostname)
            .field("text_encoding", &self.text_encoding)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Handler with a no-op step, `localhost` fallback and UTF-8 bodies.
    pub(crate) fn handler() -> Handler {
        Handler::new(HandlerConfig::default(), adaptor_fn(|_, _| Ok(())))
            .expect("default config is valid")
    }

    #[test]
    fn empty_fallback_host_is_fatal() {
        let config = HandlerConfig {
            fallback_hostname: String::new(),
            ..HandlerConfig::default()
        };
        let err = Handler::new(config, adaptor_fn(|_, _| Ok(()))).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn exposes_configuration() {
        let h = handler();
        assert_eq!(h.fallback_hostname(), "localhost");
        assert_eq!(h.text_encoding(), TextEncoding::Utf8);
    }
}
