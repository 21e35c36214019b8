//! # brandforge
//!
//! Brand-identity artifact generation backed by a generative text service.
//!
//! A [`Brand`] starts as a name and description. Each artifact (brand DNA,
//! messaging matrix, logo concepts, brand book, press kit, ...) is produced
//! by one pass through the pipeline in [`artifacts`]:
//!
//! ```text
//! prerequisite gate -> prompt -> TextGenerator -> normalizer -> store upsert
//! ```
//!
//! Artifacts that build on earlier ones are gated until those exist. The
//! [`diagnostics`] module runs the same generator against an introspection
//! prompt and never fails, and [`server`] exposes everything over HTTP.

pub mod artifacts;
pub mod brand;
pub mod config;
pub mod diagnostics;
pub mod llms;
pub mod server;
pub mod store;

pub use artifacts::{ArtifactError, ArtifactGenerator, ArtifactKind, ConsistencyReport};
pub use brand::{Brand, BrandDna, BrandField, BrandId, FieldUpdate, OwnerId};
pub use config::AppConfig;
pub use diagnostics::{DiagnosticLog, DiagnosticReport, SelfRepair, SystemCheck};
pub use llms::{GeminiClient, GenerationError, TextGenerator};
pub use store::{BrandStore, MemoryBrandStore, SqliteBrandStore, StoreError};

/// Crate version, reported by `/health`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
