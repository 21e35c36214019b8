//! Self-repair diagnostic loop.
//!
//! Sends one fixed introspection prompt through the same generator and
//! normalizer as artifact generation. Unlike artifact generation it never
//! fails: unusable output degrades to a default report, and partial output
//! is merged over that default one check at a time.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::artifacts::normalizer::{normalize, NormalizedValue, SNIPPET_CHARS};
use crate::artifacts::registry::OutputShape;
use crate::llms::{preview, TextGenerator};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum characters of serialized caller context embedded in the prompt.
pub const CONTEXT_CHARS: usize = 4000;

const NO_OVERALL_MESSAGE: &str = "No overall status provided.";

const REPORT_SHAPE: &str = r#"{
  "timestamp": "<ISO timestamp>",
  "mode": "development|production",
  "overall": "✅|⚠️|❌ + short message",
  "checks": {
    "codebase": {
      "message": "short status",
      "deprecatedReferences": 0,
      "matches": [{"file": "...", "line": 123, "snippet": "..."}]
    },
    "environment": {
      "file": ".env",
      "message": "short status",
      "fixes": ["..."]
    },
    "sdk": {
      "version": "x.y.z",
      "message": "short status",
      "response": "short preview"
    }
  }
}"#;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Request flags for one diagnostic run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelfRepairInput {
    #[serde(default)]
    pub repair: bool,
    /// Free-form hints for the model; capped when embedded.
    #[serde(default)]
    pub context: Option<Value>,
}

/// Three-level status used by diagnostic reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Ok,
    Warn,
    Error,
}

impl HealthStatus {
    /// Classify a free-form status such as `"✅ All systems nominal"`.
    ///
    /// Anything unrecognized is `Warn`.
    pub fn classify(text: &str) -> Self {
        let t = text.trim_start();
        if t.starts_with('✅') {
            return Self::Ok;
        }
        if t.starts_with('❌') {
            return Self::Error;
        }
        if t.starts_with('⚠') {
            return Self::Warn;
        }
        let word: String = t
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_ascii_uppercase();
        match word.as_str() {
            "OK" | "HEALTHY" | "NOMINAL" | "PASS" => Self::Ok,
            "ERROR" | "FAIL" | "FAILED" | "CRITICAL" => Self::Error,
            _ => Self::Warn,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Ok => "✅",
            Self::Warn => "⚠️",
            Self::Error => "❌",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ok => "OK",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverallStatus {
    pub status: HealthStatus,
    pub message: String,
}

impl OverallStatus {
    fn new(status: HealthStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Read a model-supplied `overall`, either a string or `{status, message}`.
    fn from_model(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.trim().is_empty() => {
                let status = HealthStatus::classify(s);
                let message = s
                    .trim()
                    .trim_start_matches(|c: char| !c.is_alphanumeric())
                    .trim();
                Some(Self::new(status, message_or_default(message)))
            }
            Value::Object(obj) => {
                let status = obj
                    .get("status")
                    .and_then(Value::as_str)
                    .map(HealthStatus::classify)?;
                let message = obj
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .unwrap_or_default();
                Some(Self::new(status, message_or_default(message)))
            }
            _ => None,
        }
    }
}

fn message_or_default(message: &str) -> String {
    if message.is_empty() {
        NO_OVERALL_MESSAGE.to_string()
    } else {
        message.to_string()
    }
}

/// One check: a short message plus whatever structured detail came with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub message: String,
    #[serde(flatten)]
    pub detail: Map<String, Value>,
}

impl CheckResult {
    fn new(message: impl Into<String>, detail: Value) -> Self {
        Self {
            message: message.into(),
            detail: match detail {
                Value::Object(map) => map,
                _ => Map::new(),
            },
        }
    }

    /// Overlay `parsed` on `self`: present fields win, absent ones keep
    /// the default. One level deep only.
    fn merged_with(mut self, parsed: Option<&Value>) -> Self {
        let Some(Value::Object(parsed)) = parsed else {
            return self;
        };
        for (key, value) in parsed {
            if value.is_null() {
                continue;
            }
            if key == "message" {
                if let Some(message) = value.as_str().filter(|m| !m.trim().is_empty()) {
                    self.message = message.to_string();
                }
            } else {
                self.detail.insert(key.clone(), value.clone());
            }
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checks {
    pub codebase: CheckResult,
    pub environment: CheckResult,
    pub sdk: CheckResult,
}

/// Result of one self-repair run. Never persisted on a brand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    pub timestamp: DateTime<Utc>,
    pub mode: String,
    pub overall: OverallStatus,
    pub checks: Checks,
}

// ---------------------------------------------------------------------------
// SelfRepair
// ---------------------------------------------------------------------------

/// Runs the introspection prompt and builds a [`DiagnosticReport`].
#[derive(Debug, Clone)]
pub struct SelfRepair {
    generator: Arc<dyn TextGenerator>,
    model: String,
    mode: String,
    sdk_version: Option<String>,
}

impl SelfRepair {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        model: impl Into<String>,
        mode: impl Into<String>,
        sdk_version: Option<String>,
    ) -> Self {
        Self {
            generator,
            model: model.into(),
            mode: mode.into(),
            sdk_version,
        }
    }

    /// Render the introspection prompt.
    pub fn build_prompt(&self, input: &SelfRepairInput) -> String {
        let context = match &input.context {
            Some(ctx) if !ctx.is_null() => {
                format!("Context: {}", preview(&ctx.to_string(), CONTEXT_CHARS))
            }
            _ => "Context: none".to_string(),
        };
        [
            "You are a self-repair assistant for a brand artifact generation service backed by a generative text API and a brand record store.",
            "Analyze the service's state and produce a compact JSON summary with the following shape:",
            REPORT_SHAPE,
            "",
            "Constraints:",
            "- Keep messages short and actionable.",
            "- If you are unsure of a field, still return the key with a safe default.",
            "- Do not include markdown; return only JSON.",
            "",
            &format!("Flags: repair={}", input.repair),
            &context,
        ]
        .join("\n")
    }

    /// Run one diagnostic pass. Never fails.
    pub async fn run(&self, input: &SelfRepairInput) -> DiagnosticReport {
        let prompt = self.build_prompt(input);
        let now = Utc::now();

        let raw = match self.generator.generate(&prompt, &self.model).await {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Self-repair generation failed ({}): {}", e.kind(), e);
                let mut report = self.default_report(now, None);
                report.overall = OverallStatus::new(
                    HealthStatus::Error,
                    format!("Generative service unavailable ({}).", e.kind()),
                );
                report.checks.sdk.message = format!("❌ {e}");
                return report;
            }
        };

        let parsed = match normalize(&raw, OutputShape::Json) {
            Ok(NormalizedValue::Json(Value::Object(obj))) => obj,
            Ok(_) | Err(_) => {
                log::warn!(
                    "Self-repair output was not a JSON object; raw output starts: {:?}",
                    preview(&raw, SNIPPET_CHARS)
                );
                return self.default_report(now, Some(&raw));
            }
        };

        self.merge(now, &raw, &parsed)
    }

    /// Safe default report, used as-is when the model output is unusable.
    pub fn default_report(&self, now: DateTime<Utc>, raw: Option<&str>) -> DiagnosticReport {
        let response = raw
            .map(|r| preview(r, SNIPPET_CHARS))
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| "No model text returned.".to_string());
        DiagnosticReport {
            timestamp: now,
            mode: self.mode.clone(),
            overall: OverallStatus::new(
                HealthStatus::Warn,
                "Could not parse model output. Using defaults.",
            ),
            checks: Checks {
                codebase: CheckResult::new(
                    "⚠️ Unable to analyze codebase details from model output.",
                    serde_json::json!({"deprecatedReferences": 0, "matches": []}),
                ),
                environment: CheckResult::new(
                    "⚠️ Unable to verify environment variables from model output.",
                    serde_json::json!({"file": ".env", "fixes": []}),
                ),
                sdk: CheckResult::new(
                    "⚠️ Could not verify SDK health.",
                    serde_json::json!({
                        "version": self.sdk_version.as_deref().unwrap_or("unknown"),
                        "response": response,
                    }),
                ),
            },
        }
    }

    fn merge(&self, now: DateTime<Utc>, raw: &str, parsed: &Map<String, Value>) -> DiagnosticReport {
        let fallback = self.default_report(now, Some(raw));
        let checks = parsed.get("checks");
        let check = |name: &str| checks.and_then(|c| c.get(name));

        DiagnosticReport {
            timestamp: now,
            mode: self.mode.clone(),
            overall: parsed
                .get("overall")
                .and_then(OverallStatus::from_model)
                .unwrap_or_else(|| {
                    OverallStatus::new(HealthStatus::Warn, NO_OVERALL_MESSAGE)
                }),
            checks: Checks {
                codebase: fallback.checks.codebase.merged_with(check("codebase")),
                environment: fallback.checks.environment.merged_with(check("environment")),
                sdk: fallback.checks.sdk.merged_with(check("sdk")),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llms::testing::ScriptedGenerator;
    use crate::llms::GenerationError;
    use serde_json::json;

    fn repair(generator: ScriptedGenerator) -> (SelfRepair, Arc<ScriptedGenerator>) {
        let generator = Arc::new(generator);
        (
            SelfRepair::new(generator.clone(), "diag-model", "test", Some("1.2.3".into())),
            generator,
        )
    }

    #[test]
    fn test_classify() {
        assert_eq!(HealthStatus::classify("✅ All systems nominal"), HealthStatus::Ok);
        assert_eq!(HealthStatus::classify("⚠️ Missing key"), HealthStatus::Warn);
        assert_eq!(HealthStatus::classify("❌ Down"), HealthStatus::Error);
        assert_eq!(HealthStatus::classify("ok - fine"), HealthStatus::Ok);
        assert_eq!(HealthStatus::classify("ERROR: db"), HealthStatus::Error);
        assert_eq!(HealthStatus::classify("looks fine I guess"), HealthStatus::Warn);
    }

    #[test]
    fn test_bare_symbol_overall_keeps_default_message() {
        let ok = OverallStatus::from_model(&json!("✅")).unwrap();
        assert_eq!(ok.status, HealthStatus::Ok);
        assert_eq!(ok.message, "No overall status provided.");

        let structured = OverallStatus::from_model(&json!({"status": "ERROR", "message": "  "})).unwrap();
        assert_eq!(structured.status, HealthStatus::Error);
        assert_eq!(structured.message, "No overall status provided.");

        let worded = OverallStatus::from_model(&json!("⚠️ Disk nearly full")).unwrap();
        assert_eq!(worded.message, "Disk nearly full");
    }

    #[test]
    fn test_prompt_flags_and_context_cap() {
        let (sr, _) = repair(ScriptedGenerator::new());
        let prompt = sr.build_prompt(&SelfRepairInput::default());
        assert!(prompt.ends_with("Flags: repair=false\nContext: none"));

        let big = json!({"blob": "y".repeat(10_000)});
        let prompt = sr.build_prompt(&SelfRepairInput {
            repair: true,
            context: Some(big),
        });
        assert!(prompt.contains("Flags: repair=true"));
        let context_line = prompt.lines().last().unwrap();
        assert_eq!(context_line.chars().count(), "Context: ".len() + CONTEXT_CHARS);
    }

    #[tokio::test]
    async fn test_full_report_is_used() {
        let body = json!({
            "overall": "✅ All systems nominal",
            "checks": {
                "codebase": {"message": "clean", "deprecatedReferences": 2},
                "environment": {"message": "all set", "fixes": ["none"]},
                "sdk": {"message": "ok", "version": "9.9.9", "response": "pong"}
            }
        });
        let (sr, generator) = repair(ScriptedGenerator::new().reply(body.to_string()));
        let report = sr.run(&SelfRepairInput::default()).await;

        assert_eq!(report.overall.status, HealthStatus::Ok);
        assert_eq!(report.overall.message, "All systems nominal");
        assert_eq!(report.checks.codebase.message, "clean");
        assert_eq!(report.checks.codebase.detail["deprecatedReferences"], 2);
        assert_eq!(report.checks.sdk.detail["version"], "9.9.9");
        assert_eq!(report.mode, "test");
        assert_eq!(generator.calls()[0].1, "diag-model");
    }

    #[tokio::test]
    async fn test_partial_report_merges_per_check() {
        let raw = "```json\n{\"checks\": {\"sdk\": {\"message\": \"SDK fine\"}, \"codebase\": \"garbage\"}}\n```";
        let (sr, _) = repair(ScriptedGenerator::new().reply(raw));
        let report = sr.run(&SelfRepairInput::default()).await;

        assert_eq!(report.checks.sdk.message, "SDK fine");
        assert_eq!(report.checks.sdk.detail["version"], "1.2.3");
        assert!(report.checks.sdk.detail["response"].as_str().unwrap().contains("SDK fine"));
        assert!(report.checks.codebase.message.contains("Unable to analyze"));
        assert_eq!(report.checks.codebase.detail["deprecatedReferences"], 0);
        assert!(report.checks.environment.message.contains("Unable to verify"));
        assert_eq!(report.overall.status, HealthStatus::Warn);
        assert_eq!(report.overall.message, "No overall status provided.");
    }

    #[tokio::test]
    async fn test_unparsable_output_falls_back_to_default() {
        let (sr, _) = repair(ScriptedGenerator::new().reply("Everything is awesome!"));
        let report = sr.run(&SelfRepairInput::default()).await;

        assert_eq!(report.overall.status, HealthStatus::Warn);
        assert!(report.overall.message.contains("Could not parse"));
        assert_eq!(report.checks.sdk.detail["response"], "Everything is awesome!");
    }

    #[tokio::test]
    async fn test_transport_error_still_returns_report() {
        let (sr, _) = repair(
            ScriptedGenerator::new().fail(GenerationError::Transport("connection refused".into())),
        );
        let report = sr.run(&SelfRepairInput::default()).await;

        assert_eq!(report.overall.status, HealthStatus::Error);
        assert!(report.overall.message.contains("transport"));
        assert!(report.checks.sdk.message.contains("connection refused"));
        assert_eq!(report.checks.sdk.detail["response"], "No model text returned.");
    }

    #[tokio::test]
    async fn test_structured_overall_and_null_fields() {
        let body = json!({
            "overall": {"status": "error", "message": "db down"},
            "checks": {"environment": {"message": null, "file": null, "fixes": ["set DATABASE_URL"]}}
        });
        let (sr, _) = repair(ScriptedGenerator::new().reply(body.to_string()));
        let report = sr.run(&SelfRepairInput::default()).await;

        assert_eq!(report.overall, OverallStatus::new(HealthStatus::Error, "db down"));
        assert!(report.checks.environment.message.contains("Unable to verify"));
        assert_eq!(report.checks.environment.detail["file"], ".env");
        assert_eq!(report.checks.environment.detail["fixes"], json!(["set DATABASE_URL"]));
    }

    #[test]
    fn test_report_serializes_flat_checks() {
        let (sr, _) = repair(ScriptedGenerator::new());
        let report = sr.default_report(Utc::now(), Some("raw"));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["overall"]["status"], "WARN");
        assert_eq!(json["checks"]["sdk"]["response"], "raw");
        assert!(json["checks"]["sdk"]["message"].is_string());

        let back: DiagnosticReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
    }
}
