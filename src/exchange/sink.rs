//! Response output abstraction.
//!
//! # Responsibilities
//! - Receive the committed status line and headers exactly once
//! - Receive body chunks already content-encoded
//! - Mark end of body
//!
//! The transport owns the concrete sink; tests use [`BufferedSink`].

use std::io;
use std::sync::{Arc, Mutex};

use axum::http::{HeaderMap, StatusCode};

/// Destination for a single response.
pub trait ResponseSink: Send {
    /// Transmit status and headers. Called once, before any body bytes.
    fn send_head(&mut self, status: StatusCode, headers: &HeaderMap) -> io::Result<()>;

    /// Transmit a chunk of body bytes.
    fn write(&mut self, chunk: &[u8]) -> io::Result<()>;

    /// Signal that the body is complete.
    fn finish(&mut self) -> io::Result<()>;
}

/// Everything a [`BufferedSink`] has received so far.
#[derive(Debug, Clone, Default)]
pub struct BufferedResponse {
    pub status: Option<StatusCode>,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub finished: bool,
}

/// In-memory sink whose contents stay readable after the exchange is gone.
///
/// Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct BufferedSink {
    inner: Arc<Mutex<BufferedResponse>>,
}

impl BufferedSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the response received so far.
    pub fn snapshot(&self) -> BufferedResponse {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BufferedResponse> {
        self.inner.lock().expect("buffered sink mutex poisoned")
    }
}

impl ResponseSink for BufferedSink {
    fn send_head(&mut self, status: StatusCode, headers: &HeaderMap) -> io::Result<()> {
        let mut inner = self.lock();
        if inner.status.is_some() {
            return Err(io::Error::other("response head already sent"));
        }
        inner.status = Some(status);
        inner.headers = headers.clone();
        Ok(())
    }

    fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        let mut inner = self.lock();
        if inner.finished {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "response body already finished",
            ));
        }
        inner.body.extend_from_slice(chunk);
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        self.lock().finished = true;
        Ok(())
    }
}
