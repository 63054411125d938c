//! In-memory generator with canned replies.
//!
//! Lets the whole request pipeline run without a model server: tests, demos and
//! embedders that want deterministic output plug this in as the backend.

use super::{BackendError, GenerationOptions, TextGenerator};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail(BackendError),
}

/// Replays scripted replies in order, then repeats the last one.
///
/// Every prompt it receives is recorded and can be inspected with [`prompts`].
///
/// [`prompts`]: ScriptedGenerator::prompts
///
/// ```
/// use bridgeport::backend::{GenerationOptions, ScriptedGenerator, TextGenerator};
///
/// # tokio_test::block_on(async {
/// let generator = ScriptedGenerator::replying(r#"{"type":"final","content":"hi"}"#);
/// let reply = generator.generate("prompt", &GenerationOptions::default()).await.unwrap();
/// assert!(reply.contains("final"));
/// assert_eq!(generator.prompts(), vec!["prompt".to_string()]);
/// # });
/// ```
#[derive(Debug)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Reply>>,
    last: Mutex<Option<Reply>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    fn from_replies(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            last: Mutex::new(None),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always reply with `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self::from_replies([Reply::Text(text.into())])
    }

    /// Reply with each text in turn; the last one repeats once exhausted.
    pub fn with_replies<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_replies(texts.into_iter().map(|t| Reply::Text(t.into())))
    }

    /// Always fail with `error`.
    pub fn failing(error: BackendError) -> Self {
        Self::from_replies([Reply::Fail(error)])
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }

    fn next_reply(&self) -> Result<Reply, BackendError> {
        let mut replies = self.replies.lock().map_err(poisoned)?;
        let mut last = self.last.lock().map_err(poisoned)?;

        if let Some(reply) = replies.pop_front() {
            *last = Some(reply);
        }
        (*last)
            .clone()
            .ok_or_else(|| BackendError::Unavailable("no scripted replies".to_string()))
    }
}

fn poisoned<T>(_: T) -> BackendError {
    BackendError::Unavailable("scripted generator poisoned".to_string())
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<String, BackendError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        match self.next_reply()? {
            Reply::Text(text) => Ok(text),
            Reply::Fail(err) => Err(err),
        }
    }
}
