//! Metrics collection and exposition.
//!
//! # Metrics
//! - `adaptor_requests_total` (counter): requests by method, status, outcome
//! - `adaptor_request_duration_seconds` (histogram): dispatch latency by method
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Status `0` means the exchange was never committed

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// How dispatch ended for one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The adaptor step completed.
    Success,
    /// The adaptor step failed before committing and a 500 was sent.
    Recovered,
    /// The adaptor step failed after committing; the connection is aborted.
    Aborted,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Recovered => "recovered",
            Outcome::Aborted => "aborted",
        }
    }
}

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one dispatched request.
pub fn record_request(method: &str, status: u16, outcome: Outcome, start: Instant) {
    counter!(
        "adaptor_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);

    histogram!("adaptor_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_labels() {
        assert_eq!(Outcome::Success.as_str(), "success");
        assert_eq!(Outcome::Recovered.as_str(), "recovered");
        assert_eq!(Outcome::Aborted.as_str(), "aborted");
    }

    #[test]
    fn recording_without_recorder_is_harmless() {
        record_request("GET", 200, Outcome::Success, Instant::now());
    }
}
