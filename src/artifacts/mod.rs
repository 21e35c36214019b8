//! The artifact generation pipeline.
//!
//! - [`registry`] - Static descriptor per artifact kind
//! - [`gate`] - Prerequisite checks against a brand snapshot
//! - [`prompts`] - Deterministic prompt rendering
//! - [`normalizer`] - Raw model output to typed values
//! - [`generator`] - Gate, prompt, generate, normalize, persist
//! - [`consistency`] - Non-persisting content scoring

pub mod consistency;
pub mod gate;
pub mod generator;
pub mod normalizer;
pub mod prompts;
pub mod registry;

pub use consistency::ConsistencyReport;
pub use gate::{check_prerequisites, Prerequisites};
pub use generator::{ArtifactError, ArtifactGenerator, FailureClass, GenerationStage};
pub use normalizer::{normalize, MalformedOutput, NormalizedValue};
pub use prompts::build_prompt;
pub use registry::{descriptor, ArtifactDescriptor, ArtifactKind, ModelTier, OutputShape};
