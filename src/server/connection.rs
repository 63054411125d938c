//! Per-connection handler: one request in, one response out, then close.

use super::decoder::{FrameError, RequestDecoder};
use super::registry::{ConnectionId, ConnectionRegistry};
use crate::api::{ApiError, RequestProcessor};
use futures::StreamExt;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::FramedRead;
use tracing::{debug, info};

/// Owns one accepted connection for its whole lifetime.
///
/// Deregisters itself from the [`ConnectionRegistry`] exactly once, whether the
/// connection finishes normally or the task running it is dropped.
#[derive(Debug)]
pub struct ConnectionHandler {
    id: ConnectionId,
    registry: Arc<ConnectionRegistry>,
    processor: RequestProcessor,
    closed: bool,
}

impl ConnectionHandler {
    pub fn new(
        id: ConnectionId,
        registry: Arc<ConnectionRegistry>,
        processor: RequestProcessor,
    ) -> Self {
        Self {
            id,
            registry,
            processor,
            closed: false,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Serve a single request on `stream`, then shut it down and deregister.
    ///
    /// Nothing is written until the response is complete. A stream that ends or
    /// fails before a full request arrives is closed without a response.
    pub async fn run<S>(mut self, mut stream: S)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        match self.serve(&mut stream).await {
            Ok(Some(status)) => debug!(connection = self.id, status, "Response written"),
            Ok(None) => debug!(
                connection = self.id,
                "Connection closed before a complete request"
            ),
            Err(e) => debug!(connection = self.id, error = %e, "Connection I/O error"),
        }

        if let Err(e) = stream.shutdown().await {
            debug!(connection = self.id, error = %e, "Shutdown failed");
        }
        self.close();
    }

    async fn serve<S>(&self, stream: &mut S) -> std::io::Result<Option<u16>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let response = {
            let mut frames = FramedRead::new(&mut *stream, RequestDecoder::new());
            match frames.next().await {
                Some(Ok(request)) => {
                    self.processor
                        .handle(&request.method, &request.path, &request.body)
                        .await
                }
                Some(Err(FrameError::Io(e))) => return Err(e),
                Some(Err(e)) => {
                    info!(
                        connection = self.id,
                        status = 400,
                        error = %e,
                        "Rejected malformed request"
                    );
                    ApiError::bad_request(&e.to_string()).into_response()
                }
                None => return Ok(None),
            }
        };

        let status = response.status;
        stream.write_all(&response.into_bytes()).await?;
        stream.flush().await?;
        Ok(Some(status))
    }

    /// Idempotent; later calls are no-ops.
    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.registry.remove(self.id);
    }
}

impl Drop for ConnectionHandler {
    fn drop(&mut self) {
        self.close();
    }
}
