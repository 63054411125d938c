//! bridgeport - OpenAI-compatible chat completions over a plain text model
//!
//! This library exposes a local HTTP server that speaks the OpenAI chat-completion
//! API and forwards each request to a prompt-in, text-out backend. Tool calling is
//! emulated by embedding a strict JSON reply contract in the prompt and parsing the
//! model's reply back into tool invocations.
//!
//! Request flow: [`server`] frames one request per connection, [`api`] routes and
//! validates it, [`bridge`] builds the prompt and interprets the reply, [`backend`]
//! generates the text, and [`http`] encodes the response.

pub mod api;
pub mod backend;
pub mod bridge;
pub mod cli;
pub mod config;
pub mod http;
pub mod logging;
pub mod server;
