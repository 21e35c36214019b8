//! Axum route handlers for the brandforge HTTP server.
//!
//! # Routes
//!
//! - `GET  /health`                      - Liveness probe
//! - `GET  /system-check`                - Live dependency probes
//! - `POST /brands`                      - Create a brand
//! - `GET  /brands`                      - List the caller's brands
//! - `GET  /brands/:id`                  - Fetch one brand
//! - `POST /brands/:id/artifacts/:kind`  - Generate and persist an artifact
//! - `POST /brands/:id/consistency`      - Score content against the brand
//! - `POST /diagnostics/self-repair`     - Run and record a self-repair report
//! - `GET  /diagnostics/history`         - Recorded self-repair reports

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, State},
    http::{request::Parts, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::artifacts::registry::UnknownArtifactKind;
use crate::artifacts::{ArtifactError, ArtifactGenerator, ArtifactKind, ConsistencyReport};
use crate::brand::{Brand, BrandId, OwnerId};
use crate::config::AppConfig;
use crate::diagnostics::{
    DiagnosticLog, DiagnosticReport, SelfRepair, SelfRepairInput, SystemCheck, SystemHealth,
};
use crate::llms::TextGenerator;
use crate::store::BrandStore;

use super::error::ApiError;

/// Header carrying the authenticated caller id.
pub const OWNER_HEADER: &str = "x-user-id";

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Shared application state for the HTTP server.
#[derive(Debug, Clone)]
pub struct AppState {
    pub artifacts: Arc<ArtifactGenerator>,
    pub self_repair: Arc<SelfRepair>,
    pub diagnostics: Arc<DiagnosticLog>,
    pub system_check: Arc<SystemCheck>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn BrandStore>,
        generator: Arc<dyn TextGenerator>,
        config: &AppConfig,
    ) -> Self {
        let diagnostics = Arc::new(match &config.selfrepair_log {
            Some(path) => DiagnosticLog::open(path),
            None => DiagnosticLog::new(),
        });
        let models = config.models.clone();

        Self {
            self_repair: Arc::new(SelfRepair::new(
                generator.clone(),
                models.diagnostics.clone(),
                config.app_env.clone(),
                config.sdk_version.clone(),
            )),
            system_check: Arc::new(SystemCheck::new(
                generator.clone(),
                models.diagnostics.clone(),
                store.clone(),
                diagnostics.clone(),
                config.required_env.clone(),
            )),
            artifacts: Arc::new(ArtifactGenerator::new(store, generator, models)),
            diagnostics,
        }
    }

    fn store(&self) -> &Arc<dyn BrandStore> {
        self.artifacts.store()
    }
}

/// Build the axum router with all routes.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/system-check", get(system_check_handler))
        .route("/brands", post(create_brand_handler).get(list_brands_handler))
        .route("/brands/:id", get(get_brand_handler))
        .route("/brands/:id/artifacts/:kind", post(generate_artifact_handler))
        .route("/brands/:id/consistency", post(consistency_handler))
        .route("/diagnostics/self-repair", post(self_repair_handler))
        .route("/diagnostics/history", get(diagnostic_history_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Owner extraction
// ---------------------------------------------------------------------------

/// Caller identity from the [`OWNER_HEADER`]. Missing or blank is a 401.
#[derive(Debug, Clone)]
pub struct Owner(pub OwnerId);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Owner {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| Owner(OwnerId::new(v)))
            .ok_or_else(ApiError::unauthorized)
    }
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateBrandRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConsistencyRequest {
    pub content: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /health - liveness probe.
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
        "service": "brandforge",
    }))
}

/// GET /system-check - probe every dependency once.
async fn system_check_handler(State(state): State<AppState>) -> Json<SystemHealth> {
    Json(state.system_check.run().await)
}

/// POST /brands
async fn create_brand_handler(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Json(request): Json<CreateBrandRequest>,
) -> Result<(StatusCode, Json<Brand>), ApiError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("brand name is required"));
    }
    let description = request
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());

    let brand = state
        .store()
        .create_brand(&owner, name, description)
        .await
        .map_err(ArtifactError::from)?;
    log::info!("Brand {} created for owner {}", brand.id, owner);
    Ok((StatusCode::CREATED, Json(brand)))
}

/// GET /brands
async fn list_brands_handler(
    State(state): State<AppState>,
    Owner(owner): Owner,
) -> Result<Json<Vec<Brand>>, ApiError> {
    let brands = state
        .store()
        .list_brands(&owner)
        .await
        .map_err(ArtifactError::from)?;
    Ok(Json(brands))
}

/// GET /brands/:id
async fn get_brand_handler(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(id): Path<String>,
) -> Result<Json<Brand>, ApiError> {
    state
        .store()
        .find_brand(&BrandId::new(id), &owner)
        .await
        .map_err(ArtifactError::from)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("brand not found"))
}

/// POST /brands/:id/artifacts/:kind - run the full generation pipeline.
async fn generate_artifact_handler(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path((id, kind)): Path<(String, String)>,
) -> Result<Json<Brand>, ApiError> {
    let kind: ArtifactKind = kind
        .parse()
        .map_err(|e: UnknownArtifactKind| ApiError::not_found(e.to_string()))?;
    let brand = state
        .artifacts
        .generate(&owner, &BrandId::new(id), kind)
        .await?;
    Ok(Json(brand))
}

/// POST /brands/:id/consistency
async fn consistency_handler(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(id): Path<String>,
    Json(request): Json<ConsistencyRequest>,
) -> Result<Json<ConsistencyReport>, ApiError> {
    let report = state
        .artifacts
        .analyze_consistency(&owner, &BrandId::new(id), &request.content)
        .await?;
    Ok(Json(report))
}

/// POST /diagnostics/self-repair - never fails; the report is recorded.
async fn self_repair_handler(
    State(state): State<AppState>,
    request: Option<Json<SelfRepairInput>>,
) -> Json<DiagnosticReport> {
    let input = request.map(|Json(input)| input).unwrap_or_default();
    let report = state.self_repair.run(&input).await;
    log::info!(
        "Self-repair finished: {} {}",
        report.overall.status,
        report.overall.message
    );
    state.diagnostics.record(report.clone()).await;
    Json(report)
}

/// GET /diagnostics/history - oldest first.
async fn diagnostic_history_handler(State(state): State<AppState>) -> Json<Vec<DiagnosticReport>> {
    Json(state.diagnostics.entries())
}
