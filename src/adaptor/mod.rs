//! Bundled adaptor implementations.
//!
//! Real deployments supply their own [`crate::handler::AdaptorStep`]; the
//! static adaptor makes the binary runnable on its own.

pub mod static_docs;

pub use static_docs::StaticDocuments;
