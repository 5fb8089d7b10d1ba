//! Metered dispatch: the per-request entry point.
//!
//! # Responsibilities
//! - Log the request before the adaptor step runs
//! - Run the adaptor step exactly once, treating a panic as a failure
//! - Convert failures to a generic 500 while the exchange is uncommitted
//! - Hand failures back to the transport once bytes are on the wire
//! - Record request metrics

use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use axum::http::StatusCode;
use thiserror::Error;

use crate::exchange::{Exchange, ExchangeError};
use crate::handler::{AdaptorError, Handler};
use crate::observability::metrics::{self, Outcome};

const INTERNAL_ERROR_BODY: &str = "Internal Server Error";

/// Failures `handle` cannot absorb into a well-formed response.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The adaptor failed after the response was committed; the transport
    /// must abort the connection.
    #[error("adaptor failed after response was committed: {0}")]
    Committed(#[source] AdaptorError),

    /// Closing the response, or writing the error response, failed.
    #[error("failed to send error response: {0}")]
    ErrorResponse(#[from] ExchangeError),
}

impl Handler {
    /// Handle one exchange.
    ///
    /// Returns `Ok` whenever the client got a well-formed response: the one
    /// the adaptor produced, or a 500 if it failed before committing.
    pub fn handle(&self, ex: &mut Exchange) -> Result<(), DispatchError> {
        let start = Instant::now();
        let method = ex.method().clone();

        if tracing::enabled!(tracing::Level::DEBUG) {
            let uri = self
                .request_uri(ex)
                .map(|uri| uri.to_string())
                .unwrap_or_else(|_| ex.path().to_string());
            tracing::debug!(
                method = %method,
                uri = %uri,
                version = ?ex.version(),
                headers = %self.loggable_request_headers(ex),
                "Handling request"
            );
        }

        let result = match panic::catch_unwind(AssertUnwindSafe(|| self.step.handle(self, ex))) {
            Ok(result) => result,
            Err(payload) => Err(panic_message(payload).into()),
        };

        let outcome = match result {
            Ok(()) => {
                if ex.is_committed() {
                    ex.close().map(|()| Outcome::Success).map_err(DispatchError::from)
                } else {
                    tracing::warn!(method = %method, path = %ex.path(), "Adaptor returned without responding");
                    Ok(Outcome::Success)
                }
            }
            Err(error) if !ex.is_committed() => {
                tracing::warn!(
                    method = %method,
                    path = %ex.path(),
                    error = %error,
                    "Adaptor failed before responding, sending 500"
                );
                self.send_internal_error(ex).map(|()| Outcome::Recovered)
            }
            Err(error) => {
                tracing::error!(
                    method = %method,
                    path = %ex.path(),
                    status = ?ex.response_code(),
                    error = %error,
                    "Adaptor failed after response was committed"
                );
                Err(DispatchError::Committed(error))
            }
        };

        let status = ex.response_code().map(|s| s.as_u16()).unwrap_or(0);
        let recorded = match &outcome {
            Ok(outcome) => *outcome,
            Err(_) => Outcome::Aborted,
        };
        metrics::record_request(method.as_str(), status, recorded, start);

        outcome.map(|_| ())
    }

    /// Replace whatever the adaptor staged with a bare 500.
    fn send_internal_error(&self, ex: &mut Exchange) -> Result<(), DispatchError> {
        ex.reset_response()?;
        let content_type = self.text_encoding.content_type("text/plain");
        self.canned_respond(
            ex,
            StatusCode::INTERNAL_SERVER_ERROR,
            Some(content_type.as_str()),
            INTERNAL_ERROR_BODY,
        )?;
        Ok(())
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("adaptor panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("adaptor panicked: {}", s)
    } else {
        "adaptor panicked".to_string()
    }
}
