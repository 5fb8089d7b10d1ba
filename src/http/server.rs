//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router; every path goes to the exchange dispatcher
//! - Wire up middleware (request ID, tracing, timeout)
//! - Run `Handler::handle` on the blocking pool per request
//! - Turn the committed head and body channel into an Axum response
//! - Graceful shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{uri::Scheme, Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::Instrument;

use crate::config::ServerConfig;
use crate::handler::Handler;
use crate::http::bridge::{self, ResponseHead};
use crate::http::request::{request_id, MakeRequestUuid};
use crate::lifecycle::ShutdownSignal;

/// Application state injected into the dispatcher.
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<Handler>,
    pub scheme: Scheme,
}

/// HTTP server exposing a [`Handler`].
pub struct AdaptorServer {
    router: Router,
}

impl AdaptorServer {
    /// Create a new server dispatching every request to `handler`.
    pub fn new(config: ServerConfig, handler: Arc<Handler>) -> Self {
        let state = AppState {
            handler,
            scheme: Scheme::HTTP,
        };
        let router = Self::build_router(&config, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs))),
            )
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: ShutdownSignal) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.recv().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Runs one exchange through the handler and streams what it produced.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (parts, _body) = request.into_parts();
    let request_id = request_id(&parts.headers);
    let span = tracing::info_span!("exchange", request_id = %request_id);

    let (sink, receiver, abort) = bridge::channel();
    let mut exchange = bridge::exchange_from_parts(&parts, state.scheme.clone(), sink);
    let handler = state.handler.clone();
    let blocking_span = span.clone();

    let task = tokio::task::spawn_blocking(move || {
        let _entered = blocking_span.enter();
        if let Err(e) = handler.handle(&mut exchange) {
            tracing::error!(error = %e, "Aborting response");
            abort.abort();
        }
    });

    match receiver.head.instrument(span.clone()).await {
        Ok(ResponseHead { status, headers }) => {
            let mut response = Response::new(bridge::into_body(receiver.body));
            *response.status_mut() = status;
            *response.headers_mut() = headers;
            response
        }
        Err(_) => {
            // The sink was dropped without a head: the exchange was abandoned
            // or the blocking task died.
            if let Err(e) = task.await {
                span.in_scope(|| tracing::error!(error = %e, "Dispatch task failed"));
            }
            span.in_scope(|| tracing::error!("Exchange finished without a response"));
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
