//! Incremental HTTP/1.1 request decoder.
//!
//! Bytes are buffered until the `\r\n\r\n` header terminator appears, the request line
//! and headers are parsed once, then the decoder waits for exactly `Content-Length`
//! body bytes. One request per connection: after a request is produced the decoder
//! ignores any further input.

use bytes::{Buf, Bytes, BytesMut};
use thiserror::Error;
use tokio_util::codec::Decoder;

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Upper bound on buffer space reserved ahead of body bytes actually arriving.
const MAX_BODY_RESERVE: usize = 64 * 1024;

/// Framing failures. Each maps to a local 400 response.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Invalid request headers")]
    InvalidHeaders,

    #[error("Invalid request line")]
    InvalidRequestLine,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// Whether the client should be told about this failure.
    ///
    /// Transport errors close the connection silently.
    pub fn is_malformed_request(&self) -> bool {
        !matches!(self, FrameError::Io(_))
    }
}

/// A fully received request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    /// Exactly `Content-Length` bytes.
    pub body: Bytes,
}

impl Request {
    /// Case-insensitive header lookup; the last occurrence wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug)]
struct Head {
    method: String,
    path: String,
    headers: Vec<(String, String)>,
}

#[derive(Debug)]
enum State {
    AwaitingHeaders,
    AwaitingBody { head: Head, content_length: usize },
    Done,
}

/// Decoder state machine for a single request.
#[derive(Debug)]
pub struct RequestDecoder {
    state: State,
    /// Bytes already searched for the header terminator.
    scanned: usize,
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestDecoder {
    pub fn new() -> Self {
        Self {
            state: State::AwaitingHeaders,
            scanned: 0,
        }
    }

    /// Whether a request has already been produced.
    pub fn is_done(&self) -> bool {
        matches!(self.state, State::Done)
    }

    fn find_terminator(&mut self, src: &BytesMut) -> Option<usize> {
        let from = self.scanned.saturating_sub(HEADER_TERMINATOR.len() - 1);
        let found = src[from..]
            .windows(HEADER_TERMINATOR.len())
            .position(|window| window == HEADER_TERMINATOR)
            .map(|pos| from + pos);
        self.scanned = src.len();
        found
    }
}

fn parse_head(raw: &[u8]) -> Result<(Head, usize), FrameError> {
    let text = std::str::from_utf8(raw).map_err(|_| FrameError::InvalidHeaders)?;
    let mut lines = text.split("\r\n");

    let request_line = lines.next().unwrap_or("");
    let mut parts = request_line.split(' ').filter(|part| !part.is_empty());
    let (method, path) = match (parts.next(), parts.next()) {
        (Some(method), Some(path)) => (method.to_string(), path.to_string()),
        _ => return Err(FrameError::InvalidRequestLine),
    };

    let mut headers = Vec::new();
    let mut content_length = 0;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if name.eq_ignore_ascii_case("content-length") {
            content_length = value.parse().unwrap_or(0);
        }
        headers.push((name.to_string(), value.to_string()));
    }

    Ok((
        Head {
            method,
            path,
            headers,
        },
        content_length,
    ))
}

impl Decoder for RequestDecoder {
    type Item = Request;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Request>, FrameError> {
        loop {
            match std::mem::replace(&mut self.state, State::Done) {
                State::AwaitingHeaders => {
                    let Some(end) = self.find_terminator(src) else {
                        self.state = State::AwaitingHeaders;
                        return Ok(None);
                    };

                    let (head, content_length) = parse_head(&src[..end])?;
                    src.advance(end + HEADER_TERMINATOR.len());
                    tracing::trace!(
                        method = %head.method,
                        path = %head.path,
                        content_length,
                        "Request head parsed"
                    );
                    self.state = State::AwaitingBody {
                        head,
                        content_length,
                    };
                }
                State::AwaitingBody {
                    head,
                    content_length,
                } => {
                    if src.len() < content_length {
                        src.reserve((content_length - src.len()).min(MAX_BODY_RESERVE));
                        self.state = State::AwaitingBody {
                            head,
                            content_length,
                        };
                        return Ok(None);
                    }

                    let body = src.split_to(content_length).freeze();
                    // One request per connection; pipelined bytes are dropped.
                    src.clear();
                    return Ok(Some(Request {
                        method: head.method,
                        path: head.path,
                        headers: head.headers,
                        body,
                    }));
                }
                State::Done => {
                    src.clear();
                    return Ok(None);
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Request>, FrameError> {
        // A stream that ends before the request is complete gets no response.
        match self.decode(src)? {
            Some(request) => Ok(Some(request)),
            None => {
                src.clear();
                Ok(None)
            }
        }
    }
}
