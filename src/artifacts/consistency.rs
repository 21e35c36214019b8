//! Brand consistency analysis.
//!
//! Scores a piece of content against a brand's full identity. Uses the same
//! gate, generator and normalizer as artifact generation but persists
//! nothing.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::brand::{BrandField, BrandId, OwnerId};
use crate::llms::preview;

use super::gate::unmet;
use super::generator::{ArtifactError, ArtifactGenerator};
use super::normalizer::{normalize, MalformedOutput, NormalizedValue};
use super::prompts::JSON_ONLY_INSTRUCTION;
use super::registry::{Dependency, ModelTier, OutputShape, IDENTITY_FIELDS};

/// Maximum characters of content sent for analysis.
pub const MAX_CONTENT_CHARS: usize = 8000;

const REQUIRES: &[Dependency] = &[Dependency::Present(BrandField::Mission)];

const REPORT_SCHEMA: &str = r#"{
  "score": 0,
  "report": "A detailed, multi-paragraph Markdown report explaining the score, with specific strengths and weaknesses across messaging, tone and implied visuals."
}"#;

/// Score (0-100) and Markdown report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    #[serde(deserialize_with = "deserialize_score")]
    pub score: u8,
    pub report: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScore {
    Number(f64),
    Text(String),
}

fn deserialize_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = match RawScore::deserialize(deserializer)? {
        RawScore::Number(n) => n,
        RawScore::Text(s) => s
            .trim()
            .trim_end_matches('%')
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("score {s:?} is not a number")))?,
    };
    if !(0.0..=100.0).contains(&value) {
        return Err(D::Error::custom(format!("score {value} is outside 0-100")));
    }
    Ok(value.round() as u8)
}

/// Render the consistency prompt from an identity projection.
pub fn build_consistency_prompt(identity: &Value, content: &str) -> String {
    format!(
        "As an expert brand strategist, analyze the following content for its consistency with the brand identity below. \
Give a holistic consistency score from 0 to 100 and a detailed report highlighting specific alignment and misalignment, \
referencing elements of the brand identity. Consider tone of voice, messaging, implied visual cues and overall personality.\n\n\
Comprehensive Brand Identity:\n{identity:#}\n\n\
Content to Analyze:\n---\n{content}\n---\n\n\
{JSON_ONLY_INSTRUCTION}\n\
The top-level value must be a JSON object with this structure (score is a number):\n{REPORT_SCHEMA}\n"
    )
}

/// Parse normalized output into a [`ConsistencyReport`].
pub fn parse_report(raw: &str) -> Result<ConsistencyReport, MalformedOutput> {
    let NormalizedValue::Json(value) = normalize(raw, OutputShape::Json)? else {
        return Err(MalformedOutput::new("expected JSON output", raw));
    };
    serde_json::from_value(value)
        .map_err(|e| MalformedOutput::new(format!("report does not match the expected shape: {e}"), raw))
}

impl ArtifactGenerator {
    /// Score `content` against the identity of `brand_id`.
    pub async fn analyze_consistency(
        &self,
        owner: &OwnerId,
        brand_id: &BrandId,
        content: &str,
    ) -> Result<ConsistencyReport, ArtifactError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ArtifactError::InvalidInput(
                "content to analyze is required".to_string(),
            ));
        }

        let brand = self
            .store
            .find_brand(brand_id, owner)
            .await?
            .ok_or(ArtifactError::NotFound)?;

        let missing = unmet(REQUIRES, &brand);
        if !missing.is_empty() {
            return Err(ArtifactError::Rejected { missing });
        }

        let content = preview(content, MAX_CONTENT_CHARS);
        let prompt = build_consistency_prompt(&brand.project(IDENTITY_FIELDS), &content);
        let raw = self
            .generator
            .generate(&prompt, self.models.for_tier(ModelTier::Fast))
            .await?;

        let report = parse_report(&raw).map_err(|e| {
            log::warn!(
                "Consistency report for brand {} rejected: {}; raw output starts: {:?}",
                brand_id,
                e.reason,
                e.snippet
            );
            e
        })?;
        log::info!("Consistency score {} for brand {}", report.score, brand_id);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brand::{BrandDna, FieldUpdate};
    use crate::config::ModelConfig;
    use crate::llms::testing::ScriptedGenerator;
    use crate::store::memory::MemoryBrandStore;
    use crate::store::BrandStore;
    use std::sync::Arc;

    #[test]
    fn test_parse_report_accepts_number_or_string_score() {
        let r = parse_report("```json\n{\"score\": 72, \"report\": \"ok\"}\n```").unwrap();
        assert_eq!(r, ConsistencyReport { score: 72, report: "ok".into() });

        let r = parse_report(r#"{"score": "85", "report": "good"}"#).unwrap();
        assert_eq!(r.score, 85);

        let r = parse_report(r#"{"score": 66.6, "report": "fine"}"#).unwrap();
        assert_eq!(r.score, 67);
    }

    #[test]
    fn test_parse_report_rejects_out_of_range_and_missing_fields() {
        assert!(parse_report(r#"{"score": 140, "report": "x"}"#).is_err());
        assert!(parse_report(r#"{"score": "high", "report": "x"}"#).is_err());
        assert!(parse_report(r#"{"score": 50}"#).is_err());
        assert!(parse_report("Great content!").is_err());
    }

    #[test]
    fn test_prompt_embeds_identity_and_content() {
        let prompt = build_consistency_prompt(&serde_json::json!({"name": "Acme"}), "Beep beep");
        assert!(prompt.contains("\"name\": \"Acme\""));
        assert!(prompt.contains("---\nBeep beep\n---"));
        assert!(prompt.contains(JSON_ONLY_INSTRUCTION));
    }

    async fn setup(
        generator: ScriptedGenerator,
        with_dna: bool,
    ) -> (ArtifactGenerator, Arc<ScriptedGenerator>, BrandId) {
        let store = Arc::new(MemoryBrandStore::new());
        let owner = OwnerId::new("o");
        let brand = store.create_brand(&owner, "Acme", None).await.unwrap();
        if with_dna {
            store
                .upsert_brand_field(
                    &brand.id,
                    &owner,
                    FieldUpdate::Dna(BrandDna {
                        mission: "Deliver joy".into(),
                        vision: None,
                        values: None,
                        target_audience: None,
                        usp: None,
                        personality_traits: None,
                    }),
                )
                .await
                .unwrap();
        }
        let generator = Arc::new(generator);
        let pipeline = ArtifactGenerator::new(store, generator.clone(), ModelConfig::default());
        (pipeline, generator, brand.id)
    }

    #[tokio::test]
    async fn test_analysis_requires_mission() {
        let (pipeline, generator, id) = setup(ScriptedGenerator::new(), false).await;
        let err = pipeline
            .analyze_consistency(&OwnerId::new("o"), &id, "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, ArtifactError::Rejected { .. }));
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_content_is_invalid_input() {
        let (pipeline, _, id) = setup(ScriptedGenerator::new(), true).await;
        let err = pipeline
            .analyze_consistency(&OwnerId::new("o"), &id, "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, ArtifactError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_analysis_truncates_content_and_parses_report() {
        let (pipeline, generator, id) = setup(
            ScriptedGenerator::new().reply(r#"{"score": "90", "report": "On brand."}"#),
            true,
        )
        .await;
        let content = "x".repeat(MAX_CONTENT_CHARS + 500);
        let report = pipeline
            .analyze_consistency(&OwnerId::new("o"), &id, &content)
            .await
            .unwrap();
        assert_eq!(report.score, 90);

        let (prompt, _) = &generator.calls()[0];
        assert!(prompt.contains(&"x".repeat(MAX_CONTENT_CHARS)));
        assert!(!prompt.contains(&"x".repeat(MAX_CONTENT_CHARS + 1)));
        assert!(prompt.contains("Deliver joy"));
    }
}
