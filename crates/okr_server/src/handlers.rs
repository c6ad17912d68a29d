//! Route handlers. Each one parses input, takes the storage lock through
//! [`AppState`], and answers with the service result as JSON.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use log::info;
use okr_core::{
    CommandOutcome, Dashboard, GenerateOkrsRequest, GeneratedObjective, Initiative,
    InitiativeDraft, KeyResultDraft, KeyResultTree, Objective, ObjectiveDraft, ObjectiveTree,
};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ProgressUpdate {
    pub current_value: f64,
}

#[derive(Debug, Serialize)]
pub struct GeneratedOkrsResponse {
    pub generated_okrs: Vec<GeneratedObjective>,
}

#[derive(Debug, Serialize)]
pub struct CreatedOkrsResponse {
    pub created_objectives: Vec<ObjectiveTree>,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: okr_core::core_version(),
        timestamp: epoch_millis(SystemTime::now()),
    })
}

pub async fn dashboard(State(state): State<AppState>) -> ApiResult<Dashboard> {
    state
        .with_dashboard_service(|service| Ok(service.dashboard()?))
        .await
        .map(Json)
}

pub async fn list_objectives(State(state): State<AppState>) -> ApiResult<Vec<Objective>> {
    state
        .with_okr_service(|service| Ok(service.list_objectives()?))
        .await
        .map(Json)
}

pub async fn create_objective(
    State(state): State<AppState>,
    body: Result<Json<ObjectiveDraft>, JsonRejection>,
) -> ApiResult<ObjectiveTree> {
    let Json(draft) = body?;
    state
        .with_okr_service(move |service| Ok(service.create_objective(draft)?))
        .await
        .map(Json)
}

pub async fn get_objective(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ObjectiveTree> {
    let id = parse_id(&id)?;
    state
        .with_okr_service(move |service| Ok(service.objective_tree(id)?))
        .await
        .map(Json)
}

pub async fn update_objective(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ObjectiveDraft>, JsonRejection>,
) -> ApiResult<ObjectiveTree> {
    let id = parse_id(&id)?;
    let Json(draft) = body?;
    state
        .with_okr_service(move |service| Ok(service.update_objective(id, draft)?))
        .await
        .map(Json)
}

pub async fn delete_objective(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<MessageResponse> {
    let id = parse_id(&id)?;
    state
        .with_okr_service(move |service| Ok(service.delete_objective(id)?))
        .await?;
    Ok(deleted("Objective"))
}

pub async fn create_key_result(
    State(state): State<AppState>,
    Path(objective_id): Path<String>,
    body: Result<Json<KeyResultDraft>, JsonRejection>,
) -> ApiResult<CommandOutcome<KeyResultTree>> {
    let objective_id = parse_id(&objective_id)?;
    let Json(draft) = body?;
    state
        .with_okr_service(move |service| Ok(service.create_key_result(objective_id, draft)?))
        .await
        .map(Json)
}

pub async fn update_key_result(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<KeyResultDraft>, JsonRejection>,
) -> ApiResult<CommandOutcome<KeyResultTree>> {
    let id = parse_id(&id)?;
    let Json(draft) = body?;
    state
        .with_okr_service(move |service| Ok(service.update_key_result(id, draft)?))
        .await
        .map(Json)
}

pub async fn update_key_result_progress(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ProgressUpdate>, JsonRejection>,
) -> ApiResult<CommandOutcome<KeyResultTree>> {
    let id = parse_id(&id)?;
    let Json(update) = body?;
    state
        .with_okr_service(move |service| {
            Ok(service.update_key_result_progress(id, update.current_value)?)
        })
        .await
        .map(Json)
}

pub async fn delete_key_result(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<MessageResponse> {
    let id = parse_id(&id)?;
    state
        .with_okr_service(move |service| Ok(service.delete_key_result(id)?))
        .await?;
    Ok(deleted("Key result"))
}

pub async fn create_initiative(
    State(state): State<AppState>,
    Path(key_result_id): Path<String>,
    body: Result<Json<InitiativeDraft>, JsonRejection>,
) -> ApiResult<CommandOutcome<Initiative>> {
    let key_result_id = parse_id(&key_result_id)?;
    let Json(draft) = body?;
    state
        .with_okr_service(move |service| Ok(service.create_initiative(key_result_id, draft)?))
        .await
        .map(Json)
}

pub async fn update_initiative(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<InitiativeDraft>, JsonRejection>,
) -> ApiResult<CommandOutcome<Initiative>> {
    let id = parse_id(&id)?;
    let Json(draft) = body?;
    state
        .with_okr_service(move |service| Ok(service.update_initiative(id, draft)?))
        .await
        .map(Json)
}

pub async fn delete_initiative(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<MessageResponse> {
    let id = parse_id(&id)?;
    state
        .with_okr_service(move |service| Ok(service.delete_initiative(id)?))
        .await?;
    Ok(deleted("Initiative"))
}

pub async fn generate_okrs(
    State(state): State<AppState>,
    body: Result<Json<GenerateOkrsRequest>, JsonRejection>,
) -> ApiResult<GeneratedOkrsResponse> {
    let Json(request) = body?;
    request.validate()?;
    let generated_okrs = state.generator().generate(&request).await?;
    Ok(Json(GeneratedOkrsResponse { generated_okrs }))
}

/// Generates proposals, then persists all of them or none.
pub async fn generate_and_create_okrs(
    State(state): State<AppState>,
    body: Result<Json<GenerateOkrsRequest>, JsonRejection>,
) -> ApiResult<CreatedOkrsResponse> {
    let Json(request) = body?;
    request.validate()?;
    // Generator runs before the storage lock is taken.
    let generated = state.generator().generate(&request).await?;
    let created_objectives = state
        .with_okr_service(move |service| Ok(service.create_generated(&generated)?))
        .await?;
    info!(
        "event=generate_and_create module=server status=ok objectives={}",
        created_objectives.len()
    );
    Ok(Json(CreatedOkrsResponse { created_objectives }))
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::BadRequest {
        message: format!("invalid id `{raw}`; expected a UUID"),
        field: Some("id"),
    })
}

/// Milliseconds since the Unix epoch, saturating at both ends.
fn epoch_millis(now: SystemTime) -> i64 {
    match now.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX),
        Err(_) => 0,
    }
}

fn deleted(label: &str) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: format!("{label} deleted successfully"),
    })
}
