//! HTTP transport binding.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → bridge.rs (Exchange + channel sink)
//!     → handler::Handler::handle on the blocking pool
//!     → bridge.rs (head + streamed body back to Axum)
//!     → Send to client
//! ```

pub mod bridge;
pub mod request;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::AdaptorServer;
