//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! handler/dispatch.rs, http/server.rs produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows in through the transport span
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
