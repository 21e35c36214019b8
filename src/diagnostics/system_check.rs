//! Live system check.
//!
//! Probes each dependency once: required environment variables, a one-word
//! generation round trip, a store ping, and the latest self-repair report.
//! The service is `Operational` only when every probe passes.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::llms::{preview, TextGenerator};
use crate::store::BrandStore;

use super::history::DiagnosticLog;
use super::self_repair::HealthStatus;

/// Characters of the ping response echoed back.
pub const PING_PREVIEW_CHARS: usize = 50;

const PING_PROMPT: &str = "ping";

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProbeStatus {
    Operational,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SystemStatus {
    Operational,
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvVarsCheck {
    pub vars: BTreeMap<String, bool>,
    pub all_present: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResult {
    pub status: ProbeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ProbeResult {
    fn ok(detail: Option<String>) -> Self {
        Self {
            status: ProbeStatus::Operational,
            detail,
        }
    }

    fn error(detail: impl Into<String>) -> Self {
        Self {
            status: ProbeStatus::Error,
            detail: Some(detail.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ProbeStatus::Operational
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastDiagnostic {
    pub last_run: Option<DateTime<Utc>>,
    pub status: Option<HealthStatus>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemHealth {
    pub env_vars: EnvVarsCheck,
    pub generative_service: ProbeResult,
    pub store: ProbeResult,
    pub last_diagnostic: LastDiagnostic,
    pub overall_status: SystemStatus,
}

// ---------------------------------------------------------------------------
// SystemCheck
// ---------------------------------------------------------------------------

type EnvProbe = Arc<dyn Fn(&str) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct SystemCheck {
    generator: Arc<dyn TextGenerator>,
    model: String,
    store: Arc<dyn BrandStore>,
    log: Arc<DiagnosticLog>,
    required_env: Vec<String>,
    env_present: EnvProbe,
}

impl fmt::Debug for SystemCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemCheck")
            .field("generator", &self.generator.provider())
            .field("model", &self.model)
            .field("store", &self.store.backend())
            .field("required_env", &self.required_env)
            .finish_non_exhaustive()
    }
}

impl SystemCheck {
    /// Probe the real process environment.
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        model: impl Into<String>,
        store: Arc<dyn BrandStore>,
        log: Arc<DiagnosticLog>,
        required_env: Vec<String>,
    ) -> Self {
        Self {
            generator,
            model: model.into(),
            store,
            log,
            required_env,
            env_present: Arc::new(|key| {
                std::env::var(key).map(|v| !v.trim().is_empty()).unwrap_or(false)
            }),
        }
    }

    /// Replace the environment probe.
    pub fn with_env_probe<F>(mut self, probe: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.env_present = Arc::new(probe);
        self
    }

    pub async fn run(&self) -> SystemHealth {
        let vars: BTreeMap<String, bool> = self
            .required_env
            .iter()
            .map(|name| (name.clone(), (self.env_present)(name)))
            .collect();
        let env_vars = EnvVarsCheck {
            all_present: vars.values().all(|present| *present),
            vars,
        };

        let (generative_service, store) = tokio::join!(self.probe_generator(), self.probe_store());
        let last_diagnostic = self.last_diagnostic();

        let healthy = env_vars.all_present
            && generative_service.is_ok()
            && store.is_ok()
            && last_diagnostic.status == Some(HealthStatus::Ok);
        let overall_status = if healthy {
            SystemStatus::Operational
        } else {
            SystemStatus::Degraded
        };
        if !healthy {
            log::info!(
                "System check degraded: env={} generator={:?} store={:?} last={:?}",
                env_vars.all_present,
                generative_service.status,
                store.status,
                last_diagnostic.status
            );
        }

        SystemHealth {
            env_vars,
            generative_service,
            store,
            last_diagnostic,
            overall_status,
        }
    }

    async fn probe_generator(&self) -> ProbeResult {
        match self.generator.generate(PING_PROMPT, &self.model).await {
            Ok(text) => {
                let mut shown = preview(&text, PING_PREVIEW_CHARS);
                if shown.len() < text.len() {
                    shown.push_str("...");
                }
                ProbeResult::ok(Some(shown))
            }
            Err(e) => ProbeResult::error(format!("{}: {}", e.kind(), e)),
        }
    }

    async fn probe_store(&self) -> ProbeResult {
        match self.store.ping().await {
            Ok(()) => ProbeResult::ok(Some(self.store.backend().to_string())),
            Err(e) => ProbeResult::error(e.to_string()),
        }
    }

    fn last_diagnostic(&self) -> LastDiagnostic {
        match self.log.last() {
            Some(report) => LastDiagnostic {
                last_run: Some(report.timestamp),
                status: Some(report.overall.status),
                message: report.overall.message,
            },
            None => LastDiagnostic {
                last_run: None,
                status: None,
                message: "No diagnostic recorded yet".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::self_repair::{OverallStatus, SelfRepair};
    use crate::llms::testing::ScriptedGenerator;
    use crate::llms::GenerationError;
    use crate::store::MemoryBrandStore;

    async fn log_with(status: HealthStatus) -> Arc<DiagnosticLog> {
        let log = Arc::new(DiagnosticLog::new());
        let mut report = SelfRepair::new(Arc::new(ScriptedGenerator::new()), "m", "test", None)
            .default_report(Utc::now(), None);
        report.overall = OverallStatus {
            status,
            message: "All systems nominal".into(),
        };
        log.record(report).await;
        log
    }

    fn check(generator: ScriptedGenerator, log: Arc<DiagnosticLog>) -> SystemCheck {
        SystemCheck::new(
            Arc::new(generator),
            "ping-model",
            Arc::new(MemoryBrandStore::new()),
            log,
            vec!["DATABASE_URL".into(), "GEMINI_API_KEY".into()],
        )
        .with_env_probe(|_| true)
    }

    #[tokio::test]
    async fn test_all_green_is_operational() {
        let long = "p".repeat(80);
        let health = check(
            ScriptedGenerator::new().reply(long),
            log_with(HealthStatus::Ok).await,
        )
        .run()
        .await;

        assert_eq!(health.overall_status, SystemStatus::Operational);
        assert!(health.env_vars.all_present);
        let detail = health.generative_service.detail.unwrap();
        assert_eq!(detail, format!("{}...", "p".repeat(PING_PREVIEW_CHARS)));
        assert_eq!(health.store.detail.as_deref(), Some("memory"));
        assert_eq!(health.last_diagnostic.status, Some(HealthStatus::Ok));
    }

    #[tokio::test]
    async fn test_short_ping_has_no_ellipsis() {
        let health = check(ScriptedGenerator::new().reply("pong"), log_with(HealthStatus::Ok).await)
            .run()
            .await;
        assert_eq!(health.generative_service.detail.as_deref(), Some("pong"));
    }

    #[tokio::test]
    async fn test_missing_env_var_degrades() {
        let health = check(ScriptedGenerator::new().reply("pong"), log_with(HealthStatus::Ok).await)
            .with_env_probe(|key| key != "GEMINI_API_KEY")
            .run()
            .await;

        assert_eq!(health.overall_status, SystemStatus::Degraded);
        assert_eq!(health.env_vars.vars["GEMINI_API_KEY"], false);
        assert_eq!(health.env_vars.vars["DATABASE_URL"], true);
    }

    #[tokio::test]
    async fn test_generator_failure_degrades() {
        let health = check(
            ScriptedGenerator::new().fail(GenerationError::Auth("key rejected".into())),
            log_with(HealthStatus::Ok).await,
        )
        .run()
        .await;

        assert_eq!(health.generative_service.status, ProbeStatus::Error);
        assert!(health.generative_service.detail.unwrap().starts_with("auth:"));
        assert_eq!(health.overall_status, SystemStatus::Degraded);
    }

    #[tokio::test]
    async fn test_last_diagnostic_must_be_ok() {
        let health = check(ScriptedGenerator::new().reply("pong"), log_with(HealthStatus::Warn).await)
            .run()
            .await;
        assert_eq!(health.overall_status, SystemStatus::Degraded);

        let health = check(ScriptedGenerator::new().reply("pong"), Arc::new(DiagnosticLog::new()))
            .run()
            .await;
        assert_eq!(health.last_diagnostic.status, None);
        assert_eq!(health.overall_status, SystemStatus::Degraded);
    }

    #[tokio::test]
    async fn test_serialized_shape() {
        let health = check(ScriptedGenerator::new().reply("pong"), log_with(HealthStatus::Ok).await)
            .run()
            .await;
        let json = serde_json::to_value(&health).unwrap();
        assert_eq!(json["overallStatus"], "Operational");
        assert_eq!(json["generativeService"]["status"], "Operational");
        assert_eq!(json["envVars"]["vars"]["DATABASE_URL"], true);
        assert_eq!(json["lastDiagnostic"]["status"], "OK");
    }
}
