//! Base text generation trait.
//!
//! Every call to the external generative service goes through a
//! [`TextGenerator`]. Implementations are constructed once at process start
//! and shared behind an `Arc`; they never retry, persist, or post-process
//! the generated text beyond resolving it out of the provider's response
//! envelope.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum number of characters of a provider body kept in error messages.
pub const ERROR_BODY_PREVIEW_CHARS: usize = 500;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Classified failure of a generation call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Credentials missing or rejected by the provider.
    #[error("authentication with the generative service failed: {0}")]
    Auth(String),

    /// Rate limit or quota exhausted.
    #[error("generative service quota exhausted: {0}")]
    Quota(String),

    /// Network failure, timeout, or provider-side error.
    #[error("generative service transport failure: {0}")]
    Transport(String),

    /// The provider answered, but not in any recognized envelope.
    #[error("unrecognized response shape from generative service: {0}")]
    UnknownResponseShape(String),
}

/// Wire-level name of a [`GenerationError`] class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationErrorKind {
    Auth,
    Quota,
    Transport,
    UnknownResponseShape,
}

impl GenerationError {
    pub fn kind(&self) -> GenerationErrorKind {
        match self {
            Self::Auth(_) => GenerationErrorKind::Auth,
            Self::Quota(_) => GenerationErrorKind::Quota,
            Self::Transport(_) => GenerationErrorKind::Transport,
            Self::UnknownResponseShape(_) => GenerationErrorKind::UnknownResponseShape,
        }
    }

    /// Whether the caller may retry later without changing anything.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Quota(_) | Self::Transport(_))
    }
}

impl fmt::Display for GenerationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Auth => "auth",
            Self::Quota => "quota",
            Self::Transport => "transport",
            Self::UnknownResponseShape => "unknown_response_shape",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// TextGenerator trait
// ---------------------------------------------------------------------------

/// Uniform call into the external generative text service.
///
/// "Given a prompt string and a model identifier, return generated text or
/// fail." The trait is model-agnostic; callers choose the model per call.
#[async_trait]
pub trait TextGenerator: Send + Sync + fmt::Debug {
    /// Generate text for `prompt` using `model`.
    async fn generate(&self, prompt: &str, model: &str) -> Result<String, GenerationError>;

    /// Provider name, used in logs and health output.
    fn provider(&self) -> &str;
}

/// Truncate `text` to at most `max_chars` characters on a char boundary.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
