use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::AppState;
use crate::db::MAX_PAGE_SIZE;
use crate::generator::GenerateOptions;
use crate::models::*;
use crate::pipeline::{PipelineRequest, Stage};
use crate::store::StoreError;

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
            details: None,
            timestamp: None,
        }),
    )
}

/// Map a store failure to a response. Validation and store messages are
/// returned to the client; a poisoned lock is not.
fn store_error(e: StoreError) -> ApiError {
    match e {
        StoreError::Validation(_) => {
            tracing::warn!("Validation error: {}", e);
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
        StoreError::NotFound { .. } => error_response(StatusCode::NOT_FOUND, e.to_string()),
        StoreError::LockPoisoned => {
            tracing::error!("Internal error: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
        StoreError::Unavailable(_) | StoreError::Database(_) => {
            tracing::warn!("Store error: {}", e);
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
    }
}

/// A 500 carrying the underlying message as `details`.
fn failure_with_details(message: &str, e: impl std::fmt::Display) -> ApiError {
    tracing::error!("{}: {}", message, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: message.to_string(),
            details: Some(e.to_string()),
            timestamp: Some(Utc::now()),
        }),
    )
}

/// Malformed feature bodies (wrong field types, non-UUID ids) are
/// validation failures, not 422s.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        tracing::warn!("Rejected request body: {}", rejection.body_text());
        error_response(
            StatusCode::BAD_REQUEST,
            format!("Invalid request body: {}", rejection.body_text()),
        )
    })
}

fn present(prompt: Option<String>) -> Option<String> {
    prompt.filter(|p| !p.is_empty())
}

#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    fn new(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

// ============================================================
// Features
// ============================================================

#[derive(Debug, Deserialize)]
pub struct ListFeaturesQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub category: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FeatureListResponse {
    pub success: bool,
    pub data: Vec<Feature>,
    pub count: i64,
    pub page: u32,
    pub limit: u32,
}

pub async fn list_features(
    State(state): State<AppState>,
    Query(query): Query<ListFeaturesQuery>,
) -> Result<Json<FeatureListResponse>, ApiError> {
    let page = query.page.unwrap_or(1).clamp(1, u32::MAX as i64) as u32;
    let limit = query.limit.unwrap_or(10).clamp(1, MAX_PAGE_SIZE as i64) as u32;

    let search = query.search.filter(|s| !s.is_empty());
    let category = query.category.filter(|c| !c.is_empty() && c != "all");

    let (data, count) = if let Some(search) = search {
        let data = state.store.search_features(&search).map_err(store_error)?;
        let count = data.len() as i64;
        (data, count)
    } else if let Some(category) = category {
        // An unknown category matches nothing.
        let data = match FeatureCategory::from_str(&category) {
            Some(category) => state
                .store
                .features_by_category(category)
                .map_err(store_error)?,
            None => Vec::new(),
        };
        let count = data.len() as i64;
        (data, count)
    } else {
        let page = state
            .store
            .list_features(page, limit)
            .map_err(store_error)?;
        (page.data, page.count)
    };

    Ok(Json(FeatureListResponse {
        success: true,
        data,
        count,
        page,
        limit,
    }))
}

pub async fn create_feature(
    State(state): State<AppState>,
    input: Result<Json<CreateFeatureInput>, JsonRejection>,
) -> Result<(StatusCode, Json<DataResponse<Feature>>), ApiError> {
    let input = json_body(input)?;
    state
        .store
        .create_feature(input)
        .map(|f| (StatusCode::CREATED, DataResponse::new(f)))
        .map_err(store_error)
}

pub async fn feature_stats(
    State(state): State<AppState>,
) -> Result<Json<DataResponse<FeatureStats>>, ApiError> {
    state
        .store
        .feature_stats()
        .map(DataResponse::new)
        .map_err(store_error)
}

pub async fn get_feature(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DataResponse<Feature>>, ApiError> {
    state
        .store
        .get_feature(id)
        .map_err(store_error)?
        .map(DataResponse::new)
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "Feature not found"))
}

pub async fn update_feature(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    input: Result<Json<UpdateFeatureInput>, JsonRejection>,
) -> Result<Json<DataResponse<Feature>>, ApiError> {
    let input = json_body(input)?;
    state
        .store
        .update_feature(id, input)
        .map(DataResponse::new)
        .map_err(store_error)
}

pub async fn delete_feature(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DataResponse<Feature>>, ApiError> {
    state
        .store
        .soft_delete_feature(id)
        .map(DataResponse::new)
        .map_err(store_error)
}

// ============================================================
// Generation
// ============================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PromptRequest {
    pub prompt: Option<String>,
}

pub async fn generate(
    State(state): State<AppState>,
    Json(request): Json<PromptRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let prompt = present(request.prompt)
        .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "Prompt is required"))?;

    let output = state
        .workflow
        .generate_and_refine(&prompt)
        .map_err(|e| failure_with_details("Failed to generate component", e))?;

    Ok(Json(json!({
        "success": true,
        "component": output.component,
        "refined": output.refined,
    })))
}

pub async fn generate_workflow(
    State(state): State<AppState>,
    Json(request): Json<PromptRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let prompt = present(request.prompt)
        .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "Prompt is required"))?;

    state
        .workflow
        .generate_and_refine(&prompt)
        .map(Json)
        .map_err(|e| failure_with_details("Failed to generate component", e))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CursorIntegrationRequest {
    pub prompt: Option<String>,
    pub options: GenerateOptions,
}

pub async fn cursor_integration(
    State(state): State<AppState>,
    Json(request): Json<CursorIntegrationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let prompt = present(request.prompt)
        .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "Prompt is required"))?;
    tracing::info!(framework = ?request.options.framework, "Cursor integration request");

    let component = state
        .workflow
        .sync_component(&prompt, &request.options)
        .map_err(|e| failure_with_details("Internal server error", e))?;

    Ok(Json(json!({
        "success": true,
        "message": "Component generated and synced successfully",
        "urls": {
            "component": component.file_path,
            "types": component.types_path,
        },
        "component": component,
    })))
}

pub async fn cursor_integration_docs() -> impl IntoResponse {
    Json(json!({
        "message": "V0-Cursor Integration API",
        "description": "Generate components and sync them into an editor project",
        "endpoints": {
            "POST": {
                "description": "Generate and sync a component",
                "body": {
                    "prompt": "string (required) - Description of the component to generate",
                    "options": {
                        "framework": "nextjs | react | vue | svelte",
                        "styling": "tailwind | css | styled-components",
                        "typescript": "boolean",
                        "features": "string[]",
                    },
                },
            },
        },
        "examples": {
            "generate": {
                "url": "/api/v0/cursor-integration",
                "method": "POST",
                "body": {
                    "prompt": "Create a tree planting dashboard with statistics and progress tracking",
                    "options": { "framework": "nextjs", "styling": "tailwind" },
                },
            },
        },
    }))
}

// ============================================================
// Master workflow
// ============================================================

pub async fn execute_orchestrator(
    State(state): State<AppState>,
    Json(request): Json<PipelineRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(prompt) = present(request.prompt.clone()) else {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Prompt is required for workflow execution",
        ));
    };
    tracing::info!("Starting master workflow for prompt: {}", prompt);

    let report = state
        .orchestrator
        .execute(&request)
        .await
        .map_err(|e| failure_with_details("Master workflow execution failed", e))?;

    Ok(Json(json!({
        "success": true,
        "message": "Master workflow executed successfully",
        "degraded": report.is_degraded(),
        "stages": report.stages,
        "result": report.run,
        "timestamp": Utc::now(),
    })))
}

pub async fn orchestrator_docs() -> impl IntoResponse {
    let stack: Vec<_> = Stage::ALL
        .iter()
        .map(|stage| {
            json!({
                "step": stage.step(),
                "stage": stage,
                "label": stage.label(),
                "fatalOnFailure": stage.is_fatal_on_failure(),
            })
        })
        .collect();

    Json(json!({
        "message": "Master Workflow Orchestrator API",
        "endpoints": {
            "POST": "/api/orchestrator/execute",
            "description": "Execute the full-stack workflow: generate, refine, store, process, deploy and monitor a component",
        },
        "stack": stack,
    }))
}
