//! Prompt builder.
//!
//! A prompt is the descriptor's brief, the projected brand fields as
//! pretty-printed JSON, then fixed output instructions. The same brand
//! snapshot and kind always render the same bytes.

use serde_json::Value;

use crate::brand::Brand;

use super::registry::{ArtifactDescriptor, ArtifactKind, JsonContainer, OutputContract};

/// Closing instruction for JSON artifacts.
pub const JSON_ONLY_INSTRUCTION: &str = "Your output MUST be a single, valid JSON value. Do not include any text, explanation, or formatting markers (such as code fences) before or after it.";

/// Closing instruction for Markdown artifacts.
pub const MARKDOWN_ONLY_INSTRUCTION: &str = "Your output MUST be Markdown only. Do not include meta-commentary, preambles, or explanations before or after the document.";

/// Render the generation prompt for `kind` from `brand`.
pub fn build_prompt(kind: ArtifactKind, brand: &Brand) -> String {
    let descriptor = kind.descriptor();
    let projection = brand.project(descriptor.prompt_fields);
    render(descriptor, &projection)
}

fn render(descriptor: &ArtifactDescriptor, projection: &Value) -> String {
    let mut prompt = String::new();
    prompt.push_str(descriptor.brief);
    prompt.push_str("\n\nBrand Information:\n");
    prompt.push_str(&format!("{projection:#}"));
    prompt.push_str("\n\n");

    match descriptor.contract {
        OutputContract::Schema(schema) => {
            let container = match descriptor.container {
                Some(JsonContainer::Array) => "array",
                _ => "object",
            };
            prompt.push_str(JSON_ONLY_INSTRUCTION);
            prompt.push_str(&format!(
                "\nThe top-level value must be a JSON {container} with this structure:\n"
            ));
            prompt.push_str(schema);
        }
        OutputContract::Sections(sections) => {
            prompt.push_str("Structure the document with these section headings, in this order:\n");
            for section in sections {
                prompt.push_str("## ");
                prompt.push_str(section);
                prompt.push('\n');
            }
            prompt.push('\n');
            prompt.push_str(MARKDOWN_ONLY_INSTRUCTION);
        }
    }
    prompt.push('\n');
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brand::OwnerId;
    use serde_json::json;

    fn brand() -> Brand {
        let mut b = Brand::new(OwnerId::new("u"), "Acme", Some("Rockets".into()));
        b.mission = Some("Deliver joy".into());
        b.usp = Some("Fastest".into());
        b.messaging_matrix = Some(json!({"masterTagline": "Beep beep"}));
        b.brand_book = Some("# SECRET BOOK".into());
        b
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let b = brand();
        for kind in ArtifactKind::ALL {
            assert_eq!(build_prompt(kind, &b), build_prompt(kind, &b.clone()));
        }
    }

    #[test]
    fn test_only_declared_fields_are_projected() {
        let b = brand();
        let prompt = build_prompt(ArtifactKind::LogoIdeas, &b);
        assert!(prompt.contains("\"name\": \"Acme\""));
        assert!(prompt.contains("Rockets"));
        assert!(!prompt.contains("Deliver joy"));
        assert!(!prompt.contains("Beep beep"));

        let prompt = build_prompt(ArtifactKind::PressKit, &b);
        assert!(prompt.contains("Beep beep"));
        assert!(!prompt.contains("SECRET BOOK"));
        assert!(!prompt.contains(b.id.as_str()));
        assert!(!prompt.contains("\"userId\""));
    }

    #[test]
    fn test_json_prompt_carries_schema_and_instruction() {
        let prompt = build_prompt(ArtifactKind::MessagingMatrix, &brand());
        assert!(prompt.contains(JSON_ONLY_INSTRUCTION));
        assert!(prompt.contains("JSON object"));
        assert!(prompt.contains("\"elevatorPitch\""));

        let prompt = build_prompt(ArtifactKind::PostIdeas, &brand());
        assert!(prompt.contains("JSON array"));
    }

    #[test]
    fn test_markdown_prompt_lists_sections() {
        let prompt = build_prompt(ArtifactKind::WebsiteCopy, &brand());
        assert!(prompt.contains(MARKDOWN_ONLY_INSTRUCTION));
        assert!(prompt.contains("## Homepage\n## About Us Page\n"));
        assert!(!prompt.contains(JSON_ONLY_INSTRUCTION));
    }

    #[test]
    fn test_pillars_prompt_includes_earlier_artifacts() {
        let mut b = brand();
        b.slogans = Some(json!(["Meep meep"]));
        let prompt = build_prompt(ArtifactKind::ContentPillars, &b);
        assert!(prompt.contains("Meep meep"));
        assert!(prompt.contains("Beep beep"));
        assert!(prompt.contains("\"logoIdeas\": null"));
        assert!(!prompt.contains("SECRET BOOK"));
    }

    #[test]
    fn test_absent_fields_render_as_null() {
        let prompt = build_prompt(ArtifactKind::MessagingMatrix, &brand());
        assert!(prompt.contains("\"vision\": null"));
    }
}
