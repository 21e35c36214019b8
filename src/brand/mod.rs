//! The Brand aggregate.
//!
//! A [`Brand`] is the only aggregate root in the system. Its DNA fields and
//! every derived artifact field are independently nullable; an artifact field
//! is either absent or holds a value of the artifact's declared shape.
//!
//! Every mutation goes through a [`FieldUpdate`], which fully overwrites the
//! targeted field (or, for DNA, the six DNA fields as one group).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Opaque brand identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BrandId(String);

impl BrandId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BrandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BrandId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Opaque identity of the user owning a brand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// Field vocabulary
// ---------------------------------------------------------------------------

/// Every addressable field of a [`Brand`], named as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BrandField {
    Name,
    Description,
    Mission,
    Vision,
    Values,
    TargetAudience,
    Usp,
    PersonalityTraits,
    MessagingMatrix,
    Slogans,
    LogoIdeas,
    ColorPalettes,
    TypographyPairings,
    ContentPillars,
    PostIdeas,
    ImageryAndArtDirection,
    BrandBook,
    MessagingGuide,
    PersonaSheets,
    PressKit,
    SalesDeck,
    WebsiteCopy,
}

impl BrandField {
    /// Wire (camelCase) name of the field.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::Mission => "mission",
            Self::Vision => "vision",
            Self::Values => "values",
            Self::TargetAudience => "targetAudience",
            Self::Usp => "usp",
            Self::PersonalityTraits => "personalityTraits",
            Self::MessagingMatrix => "messagingMatrix",
            Self::Slogans => "slogans",
            Self::LogoIdeas => "logoIdeas",
            Self::ColorPalettes => "colorPalettes",
            Self::TypographyPairings => "typographyPairings",
            Self::ContentPillars => "contentPillars",
            Self::PostIdeas => "postIdeas",
            Self::ImageryAndArtDirection => "imageryAndArtDirection",
            Self::BrandBook => "brandBook",
            Self::MessagingGuide => "messagingGuide",
            Self::PersonaSheets => "personaSheets",
            Self::PressKit => "pressKit",
            Self::SalesDeck => "salesDeck",
            Self::WebsiteCopy => "websiteCopy",
        }
    }
}

impl fmt::Display for BrandField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured (JSON) artifact fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonField {
    MessagingMatrix,
    Slogans,
    LogoIdeas,
    ColorPalettes,
    TypographyPairings,
    ContentPillars,
    PostIdeas,
    ImageryAndArtDirection,
}

impl JsonField {
    pub const fn field(self) -> BrandField {
        match self {
            Self::MessagingMatrix => BrandField::MessagingMatrix,
            Self::Slogans => BrandField::Slogans,
            Self::LogoIdeas => BrandField::LogoIdeas,
            Self::ColorPalettes => BrandField::ColorPalettes,
            Self::TypographyPairings => BrandField::TypographyPairings,
            Self::ContentPillars => BrandField::ContentPillars,
            Self::PostIdeas => BrandField::PostIdeas,
            Self::ImageryAndArtDirection => BrandField::ImageryAndArtDirection,
        }
    }
}

/// Long-form Markdown artifact fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkdownField {
    BrandBook,
    MessagingGuide,
    PersonaSheets,
    PressKit,
    SalesDeck,
    WebsiteCopy,
}

impl MarkdownField {
    pub const fn field(self) -> BrandField {
        match self {
            Self::BrandBook => BrandField::BrandBook,
            Self::MessagingGuide => BrandField::MessagingGuide,
            Self::PersonaSheets => BrandField::PersonaSheets,
            Self::PressKit => BrandField::PressKit,
            Self::SalesDeck => BrandField::SalesDeck,
            Self::WebsiteCopy => BrandField::WebsiteCopy,
        }
    }
}

// ---------------------------------------------------------------------------
// Brand DNA
// ---------------------------------------------------------------------------

/// The foundational descriptive fields, written as one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandDna {
    pub mission: String,
    #[serde(default)]
    pub vision: Option<String>,
    #[serde(default)]
    pub values: Option<Vec<String>>,
    #[serde(default)]
    pub target_audience: Option<String>,
    #[serde(default)]
    pub usp: Option<String>,
    #[serde(default)]
    pub personality_traits: Option<Vec<String>>,
}

/// A single owner-scoped mutation of a brand.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    /// Overwrite all six DNA fields.
    Dna(BrandDna),
    /// Overwrite one structured artifact field.
    Json(JsonField, Value),
    /// Overwrite one long-form artifact field.
    Markdown(MarkdownField, String),
}

impl FieldUpdate {
    /// Fields written by this update.
    pub fn fields(&self) -> Vec<BrandField> {
        match self {
            Self::Dna(_) => vec![
                BrandField::Mission,
                BrandField::Vision,
                BrandField::Values,
                BrandField::TargetAudience,
                BrandField::Usp,
                BrandField::PersonalityTraits,
            ],
            Self::Json(field, _) => vec![field.field()],
            Self::Markdown(field, _) => vec![field.field()],
        }
    }

    /// Written fields as a JSON object keyed by wire name.
    pub fn patch(&self) -> Value {
        let mut out = Map::new();
        match self {
            Self::Dna(dna) => {
                if let Ok(Value::Object(fields)) = serde_json::to_value(dna) {
                    out.extend(fields);
                }
            }
            Self::Json(field, value) => {
                out.insert(field.field().as_str().to_string(), value.clone());
            }
            Self::Markdown(field, text) => {
                out.insert(field.field().as_str().to_string(), Value::String(text.clone()));
            }
        }
        Value::Object(out)
    }
}

// ---------------------------------------------------------------------------
// Brand
// ---------------------------------------------------------------------------

/// The Brand aggregate root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    pub id: BrandId,
    #[serde(rename = "userId")]
    pub owner_id: OwnerId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,

    // DNA
    #[serde(default)]
    pub mission: Option<String>,
    #[serde(default)]
    pub vision: Option<String>,
    #[serde(default)]
    pub values: Option<Vec<String>>,
    #[serde(default)]
    pub target_audience: Option<String>,
    #[serde(default)]
    pub usp: Option<String>,
    #[serde(default)]
    pub personality_traits: Option<Vec<String>>,

    // Structured artifacts
    #[serde(default)]
    pub messaging_matrix: Option<Value>,
    #[serde(default)]
    pub slogans: Option<Value>,
    #[serde(default)]
    pub logo_ideas: Option<Value>,
    #[serde(default)]
    pub color_palettes: Option<Value>,
    #[serde(default)]
    pub typography_pairings: Option<Value>,
    #[serde(default)]
    pub content_pillars: Option<Value>,
    #[serde(default)]
    pub post_ideas: Option<Value>,
    #[serde(default)]
    pub imagery_and_art_direction: Option<Value>,

    // Long-form Markdown artifacts
    #[serde(default)]
    pub brand_book: Option<String>,
    #[serde(default)]
    pub messaging_guide: Option<String>,
    #[serde(default)]
    pub persona_sheets: Option<String>,
    #[serde(default)]
    pub press_kit: Option<String>,
    #[serde(default)]
    pub sales_deck: Option<String>,
    #[serde(default)]
    pub website_copy: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Brand {
    /// Create an empty brand for `owner`.
    pub fn new(owner: OwnerId, name: impl Into<String>, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: BrandId::generate(),
            owner_id: owner,
            name: name.into(),
            description,
            mission: None,
            vision: None,
            values: None,
            target_audience: None,
            usp: None,
            personality_traits: None,
            messaging_matrix: None,
            slogans: None,
            logo_ideas: None,
            color_palettes: None,
            typography_pairings: None,
            content_pillars: None,
            post_ideas: None,
            imagery_and_art_direction: None,
            brand_book: None,
            messaging_guide: None,
            persona_sheets: None,
            press_kit: None,
            sales_deck: None,
            website_copy: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `mission` is set, the canonical "Brand DNA exists" signal.
    pub fn has_dna(&self) -> bool {
        self.is_present(BrandField::Mission)
    }

    /// Whether `field` currently holds a value.
    ///
    /// Text fields must be non-blank; JSON fields must not be JSON `null`.
    pub fn is_present(&self, field: BrandField) -> bool {
        match field {
            BrandField::Name => !self.name.trim().is_empty(),
            BrandField::Description => text_present(&self.description),
            BrandField::Mission => text_present(&self.mission),
            BrandField::Vision => text_present(&self.vision),
            BrandField::Values => self.values.is_some(),
            BrandField::TargetAudience => text_present(&self.target_audience),
            BrandField::Usp => text_present(&self.usp),
            BrandField::PersonalityTraits => self.personality_traits.is_some(),
            BrandField::MessagingMatrix => json_present(&self.messaging_matrix),
            BrandField::Slogans => json_present(&self.slogans),
            BrandField::LogoIdeas => json_present(&self.logo_ideas),
            BrandField::ColorPalettes => json_present(&self.color_palettes),
            BrandField::TypographyPairings => json_present(&self.typography_pairings),
            BrandField::ContentPillars => json_present(&self.content_pillars),
            BrandField::PostIdeas => json_present(&self.post_ideas),
            BrandField::ImageryAndArtDirection => json_present(&self.imagery_and_art_direction),
            BrandField::BrandBook => text_present(&self.brand_book),
            BrandField::MessagingGuide => text_present(&self.messaging_guide),
            BrandField::PersonaSheets => text_present(&self.persona_sheets),
            BrandField::PressKit => text_present(&self.press_kit),
            BrandField::SalesDeck => text_present(&self.sales_deck),
            BrandField::WebsiteCopy => text_present(&self.website_copy),
        }
    }

    /// Current value of `field` as JSON (`null` when absent).
    pub fn field_value(&self, field: BrandField) -> Value {
        match field {
            BrandField::Name => Value::String(self.name.clone()),
            BrandField::Description => text_value(&self.description),
            BrandField::Mission => text_value(&self.mission),
            BrandField::Vision => text_value(&self.vision),
            BrandField::Values => list_value(&self.values),
            BrandField::TargetAudience => text_value(&self.target_audience),
            BrandField::Usp => text_value(&self.usp),
            BrandField::PersonalityTraits => list_value(&self.personality_traits),
            BrandField::MessagingMatrix => json_value(&self.messaging_matrix),
            BrandField::Slogans => json_value(&self.slogans),
            BrandField::LogoIdeas => json_value(&self.logo_ideas),
            BrandField::ColorPalettes => json_value(&self.color_palettes),
            BrandField::TypographyPairings => json_value(&self.typography_pairings),
            BrandField::ContentPillars => json_value(&self.content_pillars),
            BrandField::PostIdeas => json_value(&self.post_ideas),
            BrandField::ImageryAndArtDirection => json_value(&self.imagery_and_art_direction),
            BrandField::BrandBook => text_value(&self.brand_book),
            BrandField::MessagingGuide => text_value(&self.messaging_guide),
            BrandField::PersonaSheets => text_value(&self.persona_sheets),
            BrandField::PressKit => text_value(&self.press_kit),
            BrandField::SalesDeck => text_value(&self.sales_deck),
            BrandField::WebsiteCopy => text_value(&self.website_copy),
        }
    }

    /// Project exactly `fields` into a JSON object, absent fields as `null`.
    pub fn project(&self, fields: &[BrandField]) -> Value {
        let mut out = Map::new();
        for field in fields {
            out.insert(field.as_str().to_string(), self.field_value(*field));
        }
        Value::Object(out)
    }

    /// Apply `update`, fully overwriting the targeted field(s).
    pub fn apply(&mut self, update: FieldUpdate) {
        match update {
            FieldUpdate::Dna(dna) => {
                self.mission = Some(dna.mission);
                self.vision = dna.vision;
                self.values = dna.values;
                self.target_audience = dna.target_audience;
                self.usp = dna.usp;
                self.personality_traits = dna.personality_traits;
            }
            FieldUpdate::Json(field, value) => {
                let slot = match field {
                    JsonField::MessagingMatrix => &mut self.messaging_matrix,
                    JsonField::Slogans => &mut self.slogans,
                    JsonField::LogoIdeas => &mut self.logo_ideas,
                    JsonField::ColorPalettes => &mut self.color_palettes,
                    JsonField::TypographyPairings => &mut self.typography_pairings,
                    JsonField::ContentPillars => &mut self.content_pillars,
                    JsonField::PostIdeas => &mut self.post_ideas,
                    JsonField::ImageryAndArtDirection => &mut self.imagery_and_art_direction,
                };
                *slot = Some(value);
            }
            FieldUpdate::Markdown(field, text) => {
                let slot = match field {
                    MarkdownField::BrandBook => &mut self.brand_book,
                    MarkdownField::MessagingGuide => &mut self.messaging_guide,
                    MarkdownField::PersonaSheets => &mut self.persona_sheets,
                    MarkdownField::PressKit => &mut self.press_kit,
                    MarkdownField::SalesDeck => &mut self.sales_deck,
                    MarkdownField::WebsiteCopy => &mut self.website_copy,
                };
                *slot = Some(text);
            }
        }
        self.updated_at = Utc::now();
    }
}

fn text_present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

fn json_present(value: &Option<Value>) -> bool {
    value.as_ref().is_some_and(|v| !v.is_null())
}

fn text_value(value: &Option<String>) -> Value {
    value.clone().map(Value::String).unwrap_or(Value::Null)
}

fn list_value(value: &Option<Vec<String>>) -> Value {
    value
        .as_ref()
        .map(|items| Value::Array(items.iter().cloned().map(Value::String).collect()))
        .unwrap_or(Value::Null)
}

fn json_value(value: &Option<Value>) -> Value {
    value.clone().unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn brand() -> Brand {
        Brand::new(OwnerId::new("user-1"), "Acme", Some("Rockets for roadrunners".into()))
    }

    #[test]
    fn test_new_brand_is_empty() {
        let b = brand();
        assert!(!b.has_dna());
        assert!(b.is_present(BrandField::Name));
        assert!(b.is_present(BrandField::Description));
        assert!(!b.is_present(BrandField::MessagingMatrix));
        assert!(!b.is_present(BrandField::BrandBook));
    }

    #[test]
    fn test_blank_and_null_values_are_absent() {
        let mut b = brand();
        b.mission = Some("   ".into());
        b.messaging_matrix = Some(Value::Null);
        assert!(!b.is_present(BrandField::Mission));
        assert!(!b.is_present(BrandField::MessagingMatrix));

        b.content_pillars = Some(json!([]));
        assert!(b.is_present(BrandField::ContentPillars));
    }

    #[test]
    fn test_project_only_named_fields() {
        let mut b = brand();
        b.usp = Some("Fastest delivery".into());
        b.brand_book = Some("# Secret".into());

        let projected = b.project(&[BrandField::Name, BrandField::Usp, BrandField::Mission]);
        let obj = projected.as_object().unwrap();
        assert_eq!(obj.len(), 3);
        assert_eq!(obj["name"], "Acme");
        assert_eq!(obj["usp"], "Fastest delivery");
        assert_eq!(obj["mission"], Value::Null);
        assert!(!obj.contains_key("brandBook"));
    }

    #[test]
    fn test_apply_dna_overwrites_group() {
        let mut b = brand();
        b.vision = Some("old vision".into());
        b.apply(FieldUpdate::Dna(BrandDna {
            mission: "Deliver joy".into(),
            vision: None,
            values: Some(vec!["speed".into(), "safety".into()]),
            target_audience: Some("coyotes".into()),
            usp: None,
            personality_traits: None,
        }));

        assert!(b.has_dna());
        assert_eq!(b.vision, None);
        assert_eq!(b.values.as_deref().unwrap(), ["speed", "safety"]);
        assert_eq!(b.target_audience.as_deref(), Some("coyotes"));
    }

    #[test]
    fn test_apply_json_replaces_previous_value() {
        let mut b = brand();
        b.apply(FieldUpdate::Json(
            JsonField::MessagingMatrix,
            json!({"masterTagline": "one", "boilerplate": "x"}),
        ));
        b.apply(FieldUpdate::Json(
            JsonField::MessagingMatrix,
            json!({"masterTagline": "two"}),
        ));
        assert_eq!(b.messaging_matrix, Some(json!({"masterTagline": "two"})));
    }

    #[test]
    fn test_serializes_camel_case_with_user_id() {
        let mut b = brand();
        b.apply(FieldUpdate::Markdown(MarkdownField::PressKit, "# Kit".into()));
        let json = serde_json::to_value(&b).unwrap();
        assert_eq!(json["userId"], "user-1");
        assert_eq!(json["pressKit"], "# Kit");
        assert!(json.get("targetAudience").is_some());
        assert!(json.get("imageryAndArtDirection").is_some());

        let back: Brand = serde_json::from_value(json).unwrap();
        assert_eq!(back, b);
    }

    #[test]
    fn test_patch_matches_apply() {
        let update = FieldUpdate::Dna(BrandDna {
            mission: "m".into(),
            vision: None,
            values: Some(vec!["v".into()]),
            target_audience: None,
            usp: None,
            personality_traits: None,
        });
        let patch = update.patch();
        let mut b = brand();
        b.apply(update.clone());
        for field in update.fields() {
            assert_eq!(patch[field.as_str()], b.field_value(field), "{field}");
        }
        assert_eq!(patch.as_object().unwrap().len(), 6);

        let patch = FieldUpdate::Json(JsonField::PostIdeas, json!([1])).patch();
        assert_eq!(patch, json!({"postIdeas": [1]}));
    }

    #[test]
    fn test_update_fields() {
        assert_eq!(
            FieldUpdate::Markdown(MarkdownField::SalesDeck, String::new()).fields(),
            vec![BrandField::SalesDeck]
        );
        assert_eq!(
            FieldUpdate::Dna(BrandDna {
                mission: "m".into(),
                vision: None,
                values: None,
                target_audience: None,
                usp: None,
                personality_traits: None,
            })
            .fields()
            .len(),
            6
        );
    }
}
