//! TCP listener and per-connection plumbing.
//!
//! The listener only accepts and spawns: every accepted socket gets its own task
//! running a [`ConnectionHandler`], which frames one request with the
//! [`RequestDecoder`], hands it to the [`RequestProcessor`] and writes the response.
//! There is no concurrency cap and no read timeout.

pub mod connection;
pub mod decoder;
pub mod registry;

pub use connection::ConnectionHandler;
pub use decoder::{FrameError, Request, RequestDecoder};
pub use registry::{ConnectionId, ConnectionInfo, ConnectionRegistry};

use crate::api::RequestProcessor;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Pause after a failed `accept()` (e.g. EMFILE) before trying again.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Sleep for [`ACCEPT_ERROR_BACKOFF`], returning early on cancellation.
async fn accept_backoff(cancel_token: &CancellationToken) {
    tokio::select! {
        _ = cancel_token.cancelled() => {}
        _ = tokio::time::sleep(ACCEPT_ERROR_BACKOFF) => {}
    }
}

/// Accept loop owning the connection registry.
#[derive(Debug, Clone)]
pub struct Server {
    processor: RequestProcessor,
    registry: Arc<ConnectionRegistry>,
}

impl Server {
    pub fn new(processor: RequestProcessor) -> Self {
        Self {
            processor,
            registry: Arc::new(ConnectionRegistry::new()),
        }
    }

    /// Live connections, shared with every handler.
    pub fn registry(&self) -> Arc<ConnectionRegistry> {
        Arc::clone(&self.registry)
    }

    /// Accept connections until `cancel_token` fires.
    ///
    /// In-flight connections keep running on their own tasks after this returns.
    pub async fn serve(self, listener: TcpListener, cancel_token: CancellationToken) {
        if let Ok(addr) = listener.local_addr() {
            info!(addr = %addr, "Accepting connections");
        }

        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => {
                    info!(
                        live_connections = self.registry.len(),
                        "Listener shutting down"
                    );
                    break;
                }
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            let id = self.registry.register(Some(peer));
                            debug!(connection = id, peer = %peer, "Accepted connection");
                            let handler = ConnectionHandler::new(
                                id,
                                Arc::clone(&self.registry),
                                self.processor.clone(),
                            );
                            tokio::spawn(handler.run(stream));
                        }
                        Err(e) => {
                            warn!(error = %e, "Failed to accept connection");
                            accept_backoff(&cancel_token).await;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ScriptedGenerator;
    use crate::config::BridgeportConfig;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn start() -> (std::net::SocketAddr, Arc<ConnectionRegistry>, CancellationToken) {
        let processor = RequestProcessor::new(
            Arc::new(BridgeportConfig::default()),
            Arc::new(ScriptedGenerator::replying("pong")),
        );
        let server = Server::new(processor);
        let registry = server.registry();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let cancel_token = CancellationToken::new();
        tokio::spawn(server.serve(listener, cancel_token.clone()));
        (addr, registry, cancel_token)
    }

    #[tokio::test]
    async fn test_accept_backoff_waits() {
        let cancel_token = CancellationToken::new();
        let start = std::time::Instant::now();
        accept_backoff(&cancel_token).await;
        assert!(start.elapsed() >= ACCEPT_ERROR_BACKOFF);
    }

    #[tokio::test]
    async fn test_accept_backoff_ends_on_cancel() {
        let cancel_token = CancellationToken::new();
        cancel_token.cancel();
        let start = std::time::Instant::now();
        accept_backoff(&cancel_token).await;
        assert!(start.elapsed() < ACCEPT_ERROR_BACKOFF);
    }

    #[tokio::test]
    async fn test_serves_and_deregisters() {
        let (addr, registry, cancel_token) = start().await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /healthz HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.unwrap();

        assert!(raw.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(raw.ends_with(r#"{"ok":true}"#));

        // The handler deregisters right after shutting the socket down.
        for _ in 0..50 {
            if registry.is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(registry.is_empty());

        cancel_token.cancel();
    }

    #[tokio::test]
    async fn test_stops_accepting_after_cancel() {
        let (addr, _registry, cancel_token) = start().await;
        cancel_token.cancel();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        // Listener is dropped, so the connection is refused or closed without data.
        if let Ok(mut stream) = TcpStream::connect(addr).await {
            let _ = stream.write_all(b"GET /healthz HTTP/1.1\r\n\r\n").await;
            let mut raw = Vec::new();
            let _ = stream.read_to_end(&mut raw).await;
            assert!(raw.is_empty());
        }
    }
}
