//! Text generation for brandforge.
//!
//! - [`base_llm`] - The [`TextGenerator`] trait and its error classes
//! - [`providers`] - Concrete provider clients (Gemini)

pub mod base_llm;
pub mod providers;

#[cfg(test)]
pub mod testing;

// Re-exports for convenience
pub use base_llm::{preview, GenerationError, GenerationErrorKind, TextGenerator};
pub use providers::gemini::{GeminiClient, GeminiConfig};
