//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;

use adaptor_handler::config::{HandlerConfig, ServerConfig};
use adaptor_handler::{AdaptorServer, AdaptorStep, Handler, Shutdown};
use tokio::net::TcpListener;

/// A running server; shuts down when dropped.
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a server on an ephemeral port dispatching to `step`.
pub async fn start_server(step: impl AdaptorStep + 'static) -> TestServer {
    let handler = Arc::new(Handler::new(HandlerConfig::default(), step).unwrap());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    let server = AdaptorServer::new(ServerConfig::default(), handler);
    tokio::spawn(async move {
        let _ = server.run(listener, signal).await;
    });

    TestServer { addr, shutdown }
}

/// Client that never goes through a proxy and never decompresses.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
