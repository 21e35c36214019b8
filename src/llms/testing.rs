//! Scripted [`TextGenerator`] for unit tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::base_llm::{GenerationError, TextGenerator};

/// Replays queued results in order and records every call.
///
/// When the queue runs dry, further calls fail with a transport error so a
/// test that makes an unexpected call fails loudly.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<Result<String, GenerationError>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response.
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.responses.lock().push_back(Ok(text.into()));
        self
    }

    /// Queue a failure.
    pub fn fail(self, error: GenerationError) -> Self {
        self.responses.lock().push_back(Err(error));
        self
    }

    /// Number of `generate` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// `(prompt, model)` pairs in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str, model: &str) -> Result<String, GenerationError> {
        self.calls.lock().push((prompt.to_string(), model.to_string()));
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Transport("no scripted response left".into())))
    }

    fn provider(&self) -> &str {
        "scripted"
    }
}
