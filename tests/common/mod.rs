//! Shared test utilities for bridgeport integration tests.
//!
//! Provides processors wired to scripted backends, a real TCP server on an
//! ephemeral port, and a raw HTTP client that can split writes at arbitrary points.

#![allow(dead_code)]

use bridgeport::api::RequestProcessor;
use bridgeport::backend::{ScriptedGenerator, TextGenerator};
use bridgeport::config::BridgeportConfig;
use bridgeport::server::{ConnectionRegistry, Server};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

// =============================================================================
// Processor Builders
// =============================================================================

/// Processor with default config and the given backend.
pub fn make_processor(generator: Arc<dyn TextGenerator>) -> RequestProcessor {
    make_processor_with_config(BridgeportConfig::default(), generator)
}

/// Processor with a custom config (normalized before use).
pub fn make_processor_with_config(
    config: BridgeportConfig,
    generator: Arc<dyn TextGenerator>,
) -> RequestProcessor {
    RequestProcessor::new(Arc::new(config.normalized()), generator)
}

/// Processor whose backend always answers `reply`.
pub fn scripted_processor(reply: &str) -> (Arc<ScriptedGenerator>, RequestProcessor) {
    let generator = Arc::new(ScriptedGenerator::replying(reply));
    let processor = make_processor(generator.clone());
    (generator, processor)
}

// =============================================================================
// Real Server
// =============================================================================

pub struct TestServer {
    pub addr: SocketAddr,
    pub registry: Arc<ConnectionRegistry>,
    pub cancel_token: CancellationToken,
}

impl TestServer {
    /// Start a server on 127.0.0.1 with an ephemeral port.
    pub async fn start(processor: RequestProcessor) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = Server::new(processor);
        let registry = server.registry();
        let cancel_token = CancellationToken::new();
        tokio::spawn(server.serve(listener, cancel_token.clone()));
        Self {
            addr,
            registry,
            cancel_token,
        }
    }

    /// Send raw bytes (optionally in several writes) and read until the server closes.
    pub async fn send_chunks(&self, chunks: &[&[u8]]) -> Vec<u8> {
        let mut stream = TcpStream::connect(self.addr).await.unwrap();
        stream.set_nodelay(true).unwrap();
        for chunk in chunks {
            stream.write_all(chunk).await.unwrap();
            stream.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await.unwrap();
        raw
    }

    pub async fn send(&self, raw: &[u8]) -> Vec<u8> {
        self.send_chunks(&[raw]).await
    }

    /// Wait until every connection has deregistered.
    pub async fn wait_idle(&self) {
        for _ in 0..100 {
            if self.registry.is_empty() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("connections still registered: {}", self.registry.len());
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

// =============================================================================
// Raw HTTP Helpers
// =============================================================================

/// Build a raw request with a correct Content-Length.
pub fn raw_request(method: &str, path: &str, body: &[u8]) -> Vec<u8> {
    let mut raw = format!(
        "{} {} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n",
        method,
        path,
        body.len()
    )
    .into_bytes();
    raw.extend_from_slice(body);
    raw
}

/// A parsed response as seen by a client.
#[derive(Debug)]
pub struct ParsedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ParsedResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// Parse a complete HTTP/1.1 response.
pub fn parse_response(raw: &[u8]) -> ParsedResponse {
    let split = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response has no header terminator");
    let head = std::str::from_utf8(&raw[..split]).unwrap();
    let mut lines = head.split("\r\n");
    let status_line = lines.next().unwrap();
    let status = status_line.split(' ').nth(1).unwrap().parse().unwrap();
    let headers = lines
        .filter_map(|line| line.split_once(": "))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    ParsedResponse {
        status,
        headers,
        body: raw[split + 4..].to_vec(),
    }
}

/// Strip the per-response identifiers so two completions can be compared.
pub fn without_ids(mut body: Value) -> Value {
    if let Some(obj) = body.as_object_mut() {
        obj.remove("id");
        obj.remove("created");
    }
    if let Some(calls) = body
        .pointer_mut("/choices/0/message/tool_calls")
        .and_then(Value::as_array_mut)
    {
        for call in calls {
            if let Some(obj) = call.as_object_mut() {
                obj.remove("id");
            }
        }
    }
    body
}
