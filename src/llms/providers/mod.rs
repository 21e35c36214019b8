//! Text generation provider implementations.
//!
//! Each provider implements [`TextGenerator`](crate::llms::base_llm::TextGenerator)
//! and handles authentication, request formatting and error classification
//! specific to that provider.
//!
//! | Provider | Module |
//! |----------|--------|
//! | Google Gemini | [`gemini`] |

pub mod gemini;
