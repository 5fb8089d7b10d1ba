//! Bridge between the synchronous exchange and an axum response.
//!
//! # Data Flow
//! ```text
//! blocking task                         async handler
//!   Exchange ──send_head──▶ oneshot ──▶ status + headers
//!            ──write──────▶ mpsc    ──▶ streaming Body
//!   abort ────Err─────────▶ mpsc    ──▶ body error (connection reset)
//! ```
//!
//! # Design Decisions
//! - The head travels separately so the async side can build the response
//!   as soon as the exchange commits
//! - A post-commit failure is surfaced as a body error, which makes hyper
//!   drop the connection instead of terminating the body cleanly

use std::io;

use axum::body::{Body, Bytes};
use axum::http::request::Parts;
use axum::http::uri::Scheme;
use axum::http::{HeaderMap, StatusCode};
use futures_util::stream;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::exchange::{Exchange, HeaderSet, ResponseSink};

/// Body chunks in flight between the blocking task and hyper.
const BODY_CHANNEL_CAPACITY: usize = 16;

/// Error placed on the body stream when dispatch fails after commit.
#[derive(Debug, Error)]
#[error("response aborted after commit")]
pub struct BodyAborted;

type Chunk = Result<Bytes, BodyAborted>;

/// Committed status line and headers.
#[derive(Debug)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

/// Sink writing into the channels read by the async handler.
#[derive(Debug)]
pub struct ChannelSink {
    head: Option<oneshot::Sender<ResponseHead>>,
    body: Option<mpsc::Sender<Chunk>>,
}

/// Async side of a [`ChannelSink`].
#[derive(Debug)]
pub struct ChannelReceiver {
    pub head: oneshot::Receiver<ResponseHead>,
    pub body: mpsc::Receiver<Chunk>,
}

/// Handle kept by the transport to abort the body after a failed dispatch.
#[derive(Debug, Clone)]
pub struct AbortHandle {
    body: mpsc::Sender<Chunk>,
}

/// Create a connected sink, receiver and abort handle.
pub fn channel() -> (ChannelSink, ChannelReceiver, AbortHandle) {
    let (head_tx, head_rx) = oneshot::channel();
    let (body_tx, body_rx) = mpsc::channel(BODY_CHANNEL_CAPACITY);
    (
        ChannelSink {
            head: Some(head_tx),
            body: Some(body_tx.clone()),
        },
        ChannelReceiver {
            head: head_rx,
            body: body_rx,
        },
        AbortHandle { body: body_tx },
    )
}

fn client_gone() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "client went away")
}

impl ResponseSink for ChannelSink {
    fn send_head(&mut self, status: StatusCode, headers: &HeaderMap) -> io::Result<()> {
        let head = self
            .head
            .take()
            .ok_or_else(|| io::Error::other("response head already sent"))?;
        head.send(ResponseHead {
            status,
            headers: headers.clone(),
        })
        .map_err(|_| client_gone())
    }

    fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        if chunk.is_empty() {
            return Ok(());
        }
        let body = self
            .body
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "response body finished"))?;
        body.blocking_send(Ok(Bytes::copy_from_slice(chunk)))
            .map_err(|_| client_gone())
    }

    fn finish(&mut self) -> io::Result<()> {
        self.body = None;
        Ok(())
    }
}

impl AbortHandle {
    /// Fail the body stream. Must be called off the async runtime.
    pub fn abort(self) {
        let _ = self.body.blocking_send(Err(BodyAborted));
    }
}

/// Turn the body channel into a streaming axum body.
pub fn into_body(body: mpsc::Receiver<Chunk>) -> Body {
    Body::from_stream(stream::unfold(body, |mut rx| async move {
        rx.recv().await.map(|chunk| (chunk, rx))
    }))
}

/// Build an exchange from an incoming request head.
pub fn exchange_from_parts(parts: &Parts, scheme: Scheme, sink: ChannelSink) -> Exchange {
    let path = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    Exchange::new(parts.method.clone(), path, sink)
        .with_version(parts.version)
        .with_scheme(scheme)
        .with_request_headers(HeaderSet::from(&parts.headers))
}
