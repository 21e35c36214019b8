//! Artifact type registry.
//!
//! One static [`ArtifactDescriptor`] per [`ArtifactKind`]. The gate, the
//! prompt builder and the generator all read from this table; nothing else
//! encodes which fields an artifact depends on, reads, or writes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::brand::{Brand, BrandField, JsonField, MarkdownField};

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

/// Every artifact the pipeline can generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    BrandDna,
    MessagingMatrix,
    Slogans,
    LogoIdeas,
    ColorPalettes,
    TypographyPairings,
    ContentPillars,
    PostIdeas,
    ImageryArtDirection,
    BrandBook,
    MessagingGuide,
    PersonaSheets,
    PressKit,
    SalesDeck,
    WebsiteCopy,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 15] = [
        Self::BrandDna,
        Self::MessagingMatrix,
        Self::Slogans,
        Self::LogoIdeas,
        Self::ColorPalettes,
        Self::TypographyPairings,
        Self::ContentPillars,
        Self::PostIdeas,
        Self::ImageryArtDirection,
        Self::BrandBook,
        Self::MessagingGuide,
        Self::PersonaSheets,
        Self::PressKit,
        Self::SalesDeck,
        Self::WebsiteCopy,
    ];

    /// URL slug, e.g. `brand-book`.
    pub const fn slug(self) -> &'static str {
        match self {
            Self::BrandDna => "brand-dna",
            Self::MessagingMatrix => "messaging-matrix",
            Self::Slogans => "slogans",
            Self::LogoIdeas => "logo-ideas",
            Self::ColorPalettes => "color-palettes",
            Self::TypographyPairings => "typography-pairings",
            Self::ContentPillars => "content-pillars",
            Self::PostIdeas => "post-ideas",
            Self::ImageryArtDirection => "imagery-art-direction",
            Self::BrandBook => "brand-book",
            Self::MessagingGuide => "messaging-guide",
            Self::PersonaSheets => "persona-sheets",
            Self::PressKit => "press-kit",
            Self::SalesDeck => "sales-deck",
            Self::WebsiteCopy => "website-copy",
        }
    }

    pub fn descriptor(self) -> &'static ArtifactDescriptor {
        descriptor(self)
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Returned when a slug names no artifact.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown artifact kind: {0}")]
pub struct UnknownArtifactKind(pub String);

impl FromStr for ArtifactKind {
    type Err = UnknownArtifactKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.slug() == s)
            .ok_or_else(|| UnknownArtifactKind(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Descriptor parts
// ---------------------------------------------------------------------------

/// Persisted shape of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputShape {
    Json,
    Markdown,
}

/// Required top-level JSON container of a structured artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonContainer {
    Object,
    Array,
}

impl JsonContainer {
    pub fn matches(self, value: &serde_json::Value) -> bool {
        match self {
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
        }
    }
}

impl fmt::Display for JsonContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Object => "object",
            Self::Array => "array",
        })
    }
}

/// Brand field(s) an artifact writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactTarget {
    /// The six DNA fields, written together.
    Dna,
    Json(JsonField),
    Markdown(MarkdownField),
}

impl ArtifactTarget {
    /// Field reported as "the" target in logs and responses.
    pub fn primary_field(self) -> BrandField {
        match self {
            Self::Dna => BrandField::Mission,
            Self::Json(field) => field.field(),
            Self::Markdown(field) => field.field(),
        }
    }
}

/// Dependency predicate evaluated against a brand snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependency {
    /// The field must be present (see [`Brand::is_present`]).
    Present(BrandField),
}

impl Dependency {
    pub fn field(self) -> BrandField {
        match self {
            Self::Present(field) => field,
        }
    }

    pub fn holds(self, brand: &Brand) -> bool {
        match self {
            Self::Present(field) => brand.is_present(field),
        }
    }
}

/// Cost/quality class of model an artifact asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Fast,
    Quality,
}

/// What the output instructions pin down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputContract {
    /// Inline JSON schema example.
    Schema(&'static str),
    /// Required Markdown section headings, in order.
    Sections(&'static [&'static str]),
}

/// Static registry entry for one artifact kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactDescriptor {
    pub kind: ArtifactKind,
    pub name: &'static str,
    pub output: OutputShape,
    /// `Some` exactly when `output` is JSON.
    pub container: Option<JsonContainer>,
    pub dependencies: &'static [Dependency],
    pub prompt_fields: &'static [BrandField],
    pub target: ArtifactTarget,
    pub model: ModelTier,
    /// Opening instruction of the prompt.
    pub brief: &'static str,
    pub contract: OutputContract,
}

impl ArtifactDescriptor {
    pub fn dependency_fields(&self) -> Vec<BrandField> {
        self.dependencies.iter().map(|d| d.field()).collect()
    }
}

// ---------------------------------------------------------------------------
// Field sets
// ---------------------------------------------------------------------------

use BrandField as F;

const NEEDS_NOTHING: &[Dependency] = &[];
const NEEDS_DNA: &[Dependency] = &[Dependency::Present(F::Mission)];
const NEEDS_DNA_AND_MATRIX: &[Dependency] = &[
    Dependency::Present(F::Mission),
    Dependency::Present(F::MessagingMatrix),
];
const NEEDS_PILLARS: &[Dependency] = &[Dependency::Present(F::ContentPillars)];

const SEED_FIELDS: &[BrandField] = &[F::Name, F::Description];

const DNA_FIELDS: &[BrandField] = &[
    F::Name,
    F::Mission,
    F::Vision,
    F::Values,
    F::TargetAudience,
    F::Usp,
    F::PersonalityTraits,
];

const TYPOGRAPHY_FIELDS: &[BrandField] = &[
    F::Name,
    F::Description,
    F::Mission,
    F::Vision,
    F::TargetAudience,
    F::PersonalityTraits,
];

const PILLAR_FIELDS: &[BrandField] = &[
    F::Name,
    F::Description,
    F::Mission,
    F::Vision,
    F::Values,
    F::TargetAudience,
    F::Usp,
    F::PersonalityTraits,
    F::MessagingMatrix,
    F::Slogans,
    F::ColorPalettes,
    F::LogoIdeas,
];

const POST_FIELDS: &[BrandField] = &[F::Name, F::TargetAudience, F::ContentPillars];

const IMAGERY_FIELDS: &[BrandField] = &[
    F::Name,
    F::Description,
    F::Mission,
    F::Vision,
    F::PersonalityTraits,
    F::Usp,
    F::TargetAudience,
    F::ColorPalettes,
    F::TypographyPairings,
];

const BRAND_BOOK_FIELDS: &[BrandField] = &[
    F::Name,
    F::Description,
    F::Mission,
    F::Vision,
    F::Values,
    F::TargetAudience,
    F::Usp,
    F::PersonalityTraits,
    F::MessagingMatrix,
    F::ContentPillars,
];

const GUIDE_FIELDS: &[BrandField] = &[
    F::Name,
    F::Mission,
    F::Vision,
    F::Values,
    F::TargetAudience,
    F::Usp,
    F::PersonalityTraits,
    F::MessagingMatrix,
];

const PERSONA_FIELDS: &[BrandField] = &[
    F::Name,
    F::Description,
    F::TargetAudience,
    F::PersonalityTraits,
    F::Values,
];

/// Full identity, also used by the consistency analysis.
pub const IDENTITY_FIELDS: &[BrandField] = &[
    F::Name,
    F::Description,
    F::Mission,
    F::Vision,
    F::Values,
    F::TargetAudience,
    F::Usp,
    F::PersonalityTraits,
    F::MessagingMatrix,
    F::Slogans,
    F::LogoIdeas,
    F::ColorPalettes,
    F::TypographyPairings,
    F::ImageryAndArtDirection,
];

// ---------------------------------------------------------------------------
// Output contracts
// ---------------------------------------------------------------------------

const DNA_SCHEMA: &str = r#"{
  "mission": "One-sentence mission statement.",
  "vision": "One-sentence vision statement.",
  "values": ["Core value 1", "Core value 2", "Core value 3"],
  "targetAudience": "Who the brand serves.",
  "usp": "The unique selling proposition.",
  "personalityTraits": ["Trait 1", "Trait 2", "Trait 3"]
}"#;

const MESSAGING_MATRIX_SCHEMA: &str = r#"{
  "masterTagline": "A memorable, concise tagline for the brand.",
  "elevatorPitch": {
    "p15s": "A 15-second version of the elevator pitch.",
    "p30s": "A 30-second version of the elevator pitch.",
    "p60s": "A 60-second version of the elevator pitch."
  },
  "boilerplate": "A standard, reusable 'about us' paragraph.",
  "benefitStack": [
    { "title": "Benefit title", "description": "Description of the benefit." }
  ],
  "narrativeThemes": ["3-5 overarching story angles or message pillars."],
  "sayDontSay": {
    "say": ["Words or phrases to use."],
    "dontSay": ["Words or phrases to avoid."]
  }
}"#;

const SLOGANS_SCHEMA: &str = r#"["A short, catchy slogan.", "A second slogan.", "A third slogan."]"#;

const LOGO_IDEAS_SCHEMA: &str = r#"[
  { "concept": "Short name of the logo idea.", "description": "Textual description of the mark and its visual style." }
]"#;

const COLOR_PALETTES_SCHEMA: &str = r##"[
  { "name": "Palette name", "colors": ["#1A2B3C", "#4D5E6F", "#A1B2C3"] }
]"##;

const TYPOGRAPHY_SCHEMA: &str = r#"[
  { "headingFont": "Primary font for headings.", "bodyFont": "Secondary font for body text.", "rationale": "Why the pairing fits the brand." }
]"#;

const CONTENT_PILLARS_SCHEMA: &str = r#"[
  {
    "title": "Pillar title",
    "description": "The pillar's focus.",
    "exampleTopics": ["3-5 example topics or angles."],
    "connection": "How the pillar connects to the mission, vision and values."
  }
]"#;

const POST_IDEAS_SCHEMA: &str = r#"[
  {
    "pillar": "Title of the content pillar this post relates to.",
    "format": "Suggested format, e.g. 'Instagram Carousel' or 'LinkedIn Article'.",
    "hook": "Attention-grabbing first line.",
    "body": "2-3 sentence description of the post.",
    "cta": "Clear call to action."
  }
]"#;

const IMAGERY_SCHEMA: &str = r#"{
  "moodBoardDescription": "Overall mood board: visual themes, emotions, aesthetic references.",
  "photographyStyle": "Recommended photography style.",
  "photographyPrompts": ["Specific photography or image-generation prompt."],
  "illustrationStyle": "Recommended illustration style.",
  "illustrationPrompts": ["Specific illustration prompt."]
}"#;

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

static DESCRIPTORS: [ArtifactDescriptor; 15] = [
    ArtifactDescriptor {
        kind: ArtifactKind::BrandDna,
        name: "Brand DNA",
        output: OutputShape::Json,
        container: Some(JsonContainer::Object),
        dependencies: NEEDS_NOTHING,
        prompt_fields: SEED_FIELDS,
        target: ArtifactTarget::Dna,
        model: ModelTier::Quality,
        brief: "As a brand strategist, define the foundational Brand DNA for the following brand: a mission statement, a vision statement, 3-4 core values, the target audience, the unique selling proposition and 3-5 personality traits.",
        contract: OutputContract::Schema(DNA_SCHEMA),
    },
    ArtifactDescriptor {
        kind: ArtifactKind::MessagingMatrix,
        name: "Messaging Matrix",
        output: OutputShape::Json,
        container: Some(JsonContainer::Object),
        dependencies: NEEDS_DNA,
        prompt_fields: DNA_FIELDS,
        target: ArtifactTarget::Json(JsonField::MessagingMatrix),
        model: ModelTier::Fast,
        brief: "Based on the following Brand DNA, generate a comprehensive messaging matrix.",
        contract: OutputContract::Schema(MESSAGING_MATRIX_SCHEMA),
    },
    ArtifactDescriptor {
        kind: ArtifactKind::Slogans,
        name: "Slogans",
        output: OutputShape::Json,
        container: Some(JsonContainer::Array),
        dependencies: NEEDS_NOTHING,
        prompt_fields: SEED_FIELDS,
        target: ArtifactTarget::Json(JsonField::Slogans),
        model: ModelTier::Fast,
        brief: "Create 3 short, catchy brand slogans for the following brand.",
        contract: OutputContract::Schema(SLOGANS_SCHEMA),
    },
    ArtifactDescriptor {
        kind: ArtifactKind::LogoIdeas,
        name: "Logo Ideas",
        output: OutputShape::Json,
        container: Some(JsonContainer::Array),
        dependencies: NEEDS_NOTHING,
        prompt_fields: SEED_FIELDS,
        target: ArtifactTarget::Json(JsonField::LogoIdeas),
        model: ModelTier::Fast,
        brief: "Generate 3-4 creative logo ideas (textual descriptions) for the following brand. Focus on conveying the brand's essence and visual style.",
        contract: OutputContract::Schema(LOGO_IDEAS_SCHEMA),
    },
    ArtifactDescriptor {
        kind: ArtifactKind::ColorPalettes,
        name: "Color Palettes",
        output: OutputShape::Json,
        container: Some(JsonContainer::Array),
        dependencies: NEEDS_NOTHING,
        prompt_fields: SEED_FIELDS,
        target: ArtifactTarget::Json(JsonField::ColorPalettes),
        model: ModelTier::Fast,
        brief: "Generate 2-3 color palettes, each with 3 hex codes, that match the mood of the following brand.",
        contract: OutputContract::Schema(COLOR_PALETTES_SCHEMA),
    },
    ArtifactDescriptor {
        kind: ArtifactKind::TypographyPairings,
        name: "Typography Pairings",
        output: OutputShape::Json,
        container: Some(JsonContainer::Array),
        dependencies: NEEDS_NOTHING,
        prompt_fields: TYPOGRAPHY_FIELDS,
        target: ArtifactTarget::Json(JsonField::TypographyPairings),
        model: ModelTier::Quality,
        brief: "Generate 2-3 typography pairings (heading font and body font) for the following brand, considering its mission, vision, audience and personality traits.",
        contract: OutputContract::Schema(TYPOGRAPHY_SCHEMA),
    },
    ArtifactDescriptor {
        kind: ArtifactKind::ContentPillars,
        name: "Content Pillars",
        output: OutputShape::Json,
        container: Some(JsonContainer::Array),
        dependencies: NEEDS_NOTHING,
        prompt_fields: PILLAR_FIELDS,
        target: ArtifactTarget::Json(JsonField::ContentPillars),
        model: ModelTier::Quality,
        brief: "Generate 4-6 core content pillars for the following brand, incorporating all provided information.",
        contract: OutputContract::Schema(CONTENT_PILLARS_SCHEMA),
    },
    ArtifactDescriptor {
        kind: ArtifactKind::PostIdeas,
        name: "Post Ideas",
        output: OutputShape::Json,
        container: Some(JsonContainer::Array),
        dependencies: NEEDS_PILLARS,
        prompt_fields: POST_FIELDS,
        target: ArtifactTarget::Json(JsonField::PostIdeas),
        model: ModelTier::Fast,
        brief: "As a creative social media strategist, generate 10 diverse and engaging social media post ideas for the following brand, based on its content pillars.",
        contract: OutputContract::Schema(POST_IDEAS_SCHEMA),
    },
    ArtifactDescriptor {
        kind: ArtifactKind::ImageryArtDirection,
        name: "Imagery & Art Direction",
        output: OutputShape::Json,
        container: Some(JsonContainer::Object),
        dependencies: NEEDS_DNA,
        prompt_fields: IMAGERY_FIELDS,
        target: ArtifactTarget::Json(JsonField::ImageryAndArtDirection),
        model: ModelTier::Fast,
        brief: "As a professional art director and brand strategist, generate detailed imagery and art direction guidelines for the following brand. Use its DNA, color palettes and typography pairings to keep the visual identity consistent.",
        contract: OutputContract::Schema(IMAGERY_SCHEMA),
    },
    ArtifactDescriptor {
        kind: ArtifactKind::BrandBook,
        name: "Brand Book",
        output: OutputShape::Markdown,
        container: None,
        dependencies: NEEDS_DNA_AND_MATRIX,
        prompt_fields: BRAND_BOOK_FIELDS,
        target: ArtifactTarget::Markdown(MarkdownField::BrandBook),
        model: ModelTier::Fast,
        brief: "As a professional brand strategist, create a comprehensive Brand Book for the following brand, with clear headings, subheadings and bullet points.",
        contract: OutputContract::Sections(&[
            "Brand Overview",
            "Core Values",
            "Target Audience",
            "Unique Selling Proposition",
            "Brand Personality",
            "Messaging Guidelines",
            "Content Strategy",
            "Suggested Next Steps",
        ]),
    },
    ArtifactDescriptor {
        kind: ArtifactKind::MessagingGuide,
        name: "Messaging Guide",
        output: OutputShape::Markdown,
        container: None,
        dependencies: NEEDS_DNA_AND_MATRIX,
        prompt_fields: GUIDE_FIELDS,
        target: ArtifactTarget::Markdown(MarkdownField::MessagingGuide),
        model: ModelTier::Fast,
        brief: "As a professional brand strategist, create a comprehensive Messaging Guide for the following brand. Lean on the Messaging Matrix above all.",
        contract: OutputContract::Sections(&[
            "Master Tagline",
            "Elevator Pitches",
            "Boilerplate Description",
            "Key Benefits & Value Proposition",
            "Narrative Themes & Storytelling",
            "Brand Voice & Tone",
            "Say/Don't Say Guidelines",
        ]),
    },
    ArtifactDescriptor {
        kind: ArtifactKind::PersonaSheets,
        name: "Persona Sheets",
        output: OutputShape::Markdown,
        container: None,
        dependencies: NEEDS_DNA,
        prompt_fields: PERSONA_FIELDS,
        target: ArtifactTarget::Markdown(MarkdownField::PersonaSheets),
        model: ModelTier::Fast,
        brief: "As a professional marketing strategist, create 2-3 detailed buyer persona sheets for the following brand, drawing on its target audience, personality traits and values. Repeat the sections below for each persona.",
        contract: OutputContract::Sections(&[
            "Persona Name",
            "Demographics",
            "Psychographics",
            "Brand Interaction",
            "Quotes",
            "Bio",
        ]),
    },
    ArtifactDescriptor {
        kind: ArtifactKind::PressKit,
        name: "Press Kit",
        output: OutputShape::Markdown,
        container: None,
        dependencies: NEEDS_DNA_AND_MATRIX,
        prompt_fields: IDENTITY_FIELDS,
        target: ArtifactTarget::Markdown(MarkdownField::PressKit),
        model: ModelTier::Fast,
        brief: "As a professional PR specialist, create a comprehensive Press Kit for the following brand. Suggest placeholders where information is not available.",
        contract: OutputContract::Sections(&[
            "Company Overview",
            "Key Messaging",
            "Brand Story",
            "Leadership/Founders",
            "Visual Identity",
            "Target Audience",
            "Contact Information",
            "Call to Action",
        ]),
    },
    ArtifactDescriptor {
        kind: ArtifactKind::SalesDeck,
        name: "Sales Deck",
        output: OutputShape::Markdown,
        container: None,
        dependencies: NEEDS_DNA_AND_MATRIX,
        prompt_fields: IDENTITY_FIELDS,
        target: ArtifactTarget::Markdown(MarkdownField::SalesDeck),
        model: ModelTier::Fast,
        brief: "As a professional sales strategist, create a Sales Deck outline for the following brand, suitable for a presentation.",
        contract: OutputContract::Sections(&[
            "Introduction",
            "About Us",
            "The Problem",
            "Our Solution",
            "Key Features/Benefits",
            "Target Audience",
            "Case Studies/Testimonials",
            "Call to Action",
            "Contact Information",
        ]),
    },
    ArtifactDescriptor {
        kind: ArtifactKind::WebsiteCopy,
        name: "Website Copy",
        output: OutputShape::Markdown,
        container: None,
        dependencies: NEEDS_DNA_AND_MATRIX,
        prompt_fields: IDENTITY_FIELDS,
        target: ArtifactTarget::Markdown(MarkdownField::WebsiteCopy),
        model: ModelTier::Fast,
        brief: "As a professional copywriter, create website copy for the key pages of the following brand.",
        contract: OutputContract::Sections(&[
            "Homepage",
            "About Us Page",
            "Services/Products Page",
            "Contact Us Page",
        ]),
    },
];

/// Descriptor for `kind`.
pub fn descriptor(kind: ArtifactKind) -> &'static ArtifactDescriptor {
    // DESCRIPTORS is ordered like ArtifactKind::ALL; see test_registry_order.
    &DESCRIPTORS[kind as usize]
}

/// All descriptors, in declaration order.
pub fn descriptors() -> &'static [ArtifactDescriptor] {
    &DESCRIPTORS
}
