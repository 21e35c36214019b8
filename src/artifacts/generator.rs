//! Artifact generator.
//!
//! Drives one artifact generation for one brand:
//!
//! ```text
//! Requested -> Gated -> Prompted -> Generated -> Normalized -> Persisted
//!        \-> Rejected        \-> Failed      \-> Failed
//! ```
//!
//! At most one generation call is made per request, and the brand is written
//! only after the output has been fully normalized.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::brand::{Brand, BrandDna, BrandField, BrandId, FieldUpdate, JsonField, OwnerId};
use crate::config::ModelConfig;
use crate::llms::{GenerationError, GenerationErrorKind, TextGenerator};
use crate::store::{BrandStore, StoreError};

use super::gate::{check_prerequisites, Prerequisites};
use super::normalizer::{normalize, MalformedOutput, NormalizedValue};
use super::prompts::build_prompt;
use super::registry::{ArtifactDescriptor, ArtifactKind, ArtifactTarget};

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Position of a request in the generation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStage {
    Requested,
    Gated,
    Prompted,
    Generated,
    Normalized,
    Persisted,
    Rejected,
    Failed,
}

impl fmt::Display for GenerationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Requested => "requested",
            Self::Gated => "gated",
            Self::Prompted => "prompted",
            Self::Generated => "generated",
            Self::Normalized => "normalized",
            Self::Persisted => "persisted",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why an artifact request did not produce an updated brand.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// No brand with this id for this owner.
    #[error("brand not found")]
    NotFound,

    #[error("missing prerequisites: {}", join_fields(.missing))]
    Rejected { missing: Vec<BrandField> },

    #[error(transparent)]
    Service(#[from] GenerationError),

    #[error(transparent)]
    Malformed(#[from] MalformedOutput),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Caller-facing failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    MissingPrerequisites,
    NotFound,
    InvalidInput,
    ServiceUnavailable,
    ProcessingFailed,
    Internal,
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MissingPrerequisites => "missing_prerequisites",
            Self::NotFound => "not_found",
            Self::InvalidInput => "invalid_input",
            Self::ServiceUnavailable => "service_unavailable",
            Self::ProcessingFailed => "processing_failed",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

impl ArtifactError {
    pub fn class(&self) -> FailureClass {
        match self {
            Self::NotFound => FailureClass::NotFound,
            Self::Rejected { .. } => FailureClass::MissingPrerequisites,
            Self::InvalidInput(_) => FailureClass::InvalidInput,
            Self::Service(e) if e.kind() == GenerationErrorKind::UnknownResponseShape => {
                FailureClass::ProcessingFailed
            }
            Self::Service(_) => FailureClass::ServiceUnavailable,
            Self::Malformed(_) => FailureClass::ProcessingFailed,
            Self::Store(_) => FailureClass::Internal,
        }
    }

    /// Whether retrying the same request later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Service(e) => e.is_transient(),
            Self::Store(e) => e.is_transient(),
            _ => false,
        }
    }
}

fn join_fields(fields: &[BrandField]) -> String {
    fields
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// ArtifactGenerator
// ---------------------------------------------------------------------------

/// Process-wide orchestrator shared by every request.
#[derive(Debug, Clone)]
pub struct ArtifactGenerator {
    pub(crate) store: Arc<dyn BrandStore>,
    pub(crate) generator: Arc<dyn TextGenerator>,
    pub(crate) models: ModelConfig,
}

impl ArtifactGenerator {
    pub fn new(
        store: Arc<dyn BrandStore>,
        generator: Arc<dyn TextGenerator>,
        models: ModelConfig,
    ) -> Self {
        Self {
            store,
            generator,
            models,
        }
    }

    pub fn store(&self) -> &Arc<dyn BrandStore> {
        &self.store
    }

    pub fn models(&self) -> &ModelConfig {
        &self.models
    }

    /// Generate `kind` for the brand `brand_id` owned by `owner` and persist it.
    pub async fn generate(
        &self,
        owner: &OwnerId,
        brand_id: &BrandId,
        kind: ArtifactKind,
    ) -> Result<Brand, ArtifactError> {
        let descriptor = kind.descriptor();
        stage(kind, brand_id, GenerationStage::Requested);

        let brand = self
            .store
            .find_brand(brand_id, owner)
            .await?
            .ok_or(ArtifactError::NotFound)?;

        if let Prerequisites::Missing(missing) = check_prerequisites(&brand, kind) {
            stage(kind, brand_id, GenerationStage::Rejected);
            log::info!(
                "Rejected {} for brand {}: missing {}",
                kind,
                brand_id,
                join_fields(&missing)
            );
            return Err(ArtifactError::Rejected { missing });
        }
        stage(kind, brand_id, GenerationStage::Gated);

        let prompt = build_prompt(kind, &brand);
        stage(kind, brand_id, GenerationStage::Prompted);

        let model = self.models.for_tier(descriptor.model);
        let raw = match self.generator.generate(&prompt, model).await {
            Ok(raw) => raw,
            Err(e) => {
                stage(kind, brand_id, GenerationStage::Failed);
                log::warn!(
                    "Generation of {} for brand {} failed ({}): {}",
                    kind,
                    brand_id,
                    e.kind(),
                    e
                );
                return Err(e.into());
            }
        };
        stage(kind, brand_id, GenerationStage::Generated);

        let update = match to_update(descriptor, &raw) {
            Ok(update) => update,
            Err(e) => {
                stage(kind, brand_id, GenerationStage::Failed);
                log::warn!(
                    "Output for {} on brand {} rejected: {}; raw output starts: {:?}",
                    kind,
                    brand_id,
                    e.reason,
                    e.snippet
                );
                return Err(e.into());
            }
        };
        stage(kind, brand_id, GenerationStage::Normalized);

        let updated = self
            .store
            .upsert_brand_field(brand_id, owner, update)
            .await?
            .ok_or(ArtifactError::NotFound)?;
        stage(kind, brand_id, GenerationStage::Persisted);
        log::info!(
            "Generated {} for brand {} with model {}",
            kind,
            brand_id,
            model
        );

        Ok(updated)
    }
}

fn stage(kind: ArtifactKind, brand_id: &BrandId, stage: GenerationStage) {
    log::debug!("artifact={} brand={} stage={}", kind, brand_id, stage);
}

/// Coerce raw output into the update for `descriptor`'s target field.
pub fn to_update(descriptor: &ArtifactDescriptor, raw: &str) -> Result<FieldUpdate, MalformedOutput> {
    let value = normalize(raw, descriptor.output)?;

    if let (Some(container), NormalizedValue::Json(json)) = (descriptor.container, &value) {
        if !container.matches(json) {
            return Err(MalformedOutput::new(
                format!("expected a JSON {container} for {}", descriptor.name),
                raw,
            ));
        }
    }

    match (descriptor.target, value) {
        (ArtifactTarget::Markdown(field), NormalizedValue::Markdown(text)) => {
            if text.is_empty() {
                return Err(MalformedOutput::new("document is empty", raw));
            }
            Ok(FieldUpdate::Markdown(field, text))
        }
        (ArtifactTarget::Json(JsonField::Slogans), NormalizedValue::Json(json)) => {
            let all_text = json.as_array().is_some_and(|items| {
                items
                    .iter()
                    .all(|item| item.as_str().is_some_and(|s| !s.trim().is_empty()))
            });
            if !all_text {
                return Err(MalformedOutput::new("slogans must be non-empty strings", raw));
            }
            Ok(FieldUpdate::Json(JsonField::Slogans, json))
        }
        (ArtifactTarget::Json(field), NormalizedValue::Json(json)) => Ok(FieldUpdate::Json(field, json)),
        (ArtifactTarget::Dna, NormalizedValue::Json(json)) => {
            let dna: BrandDna = serde_json::from_value(json).map_err(|e| {
                MalformedOutput::new(format!("DNA payload does not match the expected fields: {e}"), raw)
            })?;
            if dna.mission.trim().is_empty() {
                return Err(MalformedOutput::new("DNA payload has a blank mission", raw));
            }
            Ok(FieldUpdate::Dna(dna))
        }
        (target, value) => Err(MalformedOutput::new(
            format!(
                "{:?} output cannot be written to {}",
                value.shape(),
                target.primary_field()
            ),
            raw,
        )),
    }
}
