//! Request-handling layer for a content-serving adaptor.
//!
//! The core lives in [`handler`]: header rendering, request URI
//! reconstruction, conditional GET, gzip negotiation, canned responses and
//! the commit-aware dispatch entry point. [`exchange`] models a single
//! request/response pair; [`http`] binds both to an Axum server.

pub mod adaptor;
pub mod config;
pub mod exchange;
pub mod handler;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::schema::AdaptorConfig;
pub use exchange::{BodyLength, Exchange, ExchangeError};
pub use handler::{adaptor_fn, AdaptorError, AdaptorStep, DispatchError, Handler};
pub use http::AdaptorServer;
pub use lifecycle::Shutdown;
