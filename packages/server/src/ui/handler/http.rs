//! HTTP API handlers.
//!
//! The policy endpoints form the administrative collaborator interface:
//! the caller's identity (`x-user-id`, `x-role` headers) is established by
//! the external authentication step in front of this subsystem.

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};

use crate::{
    domain::Role,
    infrastructure::dto::http::{MessageTypeRolesDto, StatsResponseDto},
    ui::state::AppState,
    usecase::PolicyUpdateError,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get gateway statistics
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponseDto> {
    Json(StatsResponseDto::from(state.stats.snapshot()))
}

/// Get the current message-type role mapping (privileged)
pub async fn get_message_type_roles(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<MessageTypeRolesDto>, StatusCode> {
    let (caller_id, caller_role) = caller_identity(&headers)?;

    let message_type_roles = state
        .update_policy_usecase
        .get(&caller_id, &caller_role)
        .map_err(policy_error_status)?;

    Ok(Json(MessageTypeRolesDto { message_type_roles }))
}

/// Atomically replace the message-type role mapping (privileged)
pub async fn put_message_type_roles(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<MessageTypeRolesDto>,
) -> Result<StatusCode, StatusCode> {
    let (caller_id, caller_role) = caller_identity(&headers)?;

    state
        .update_policy_usecase
        .replace(&caller_id, &caller_role, body.message_type_roles)
        .map_err(policy_error_status)?;

    tracing::info!("Message type role mapping replaced via admin API");
    Ok(StatusCode::NO_CONTENT)
}

/// Extract the externally-authenticated caller identity from headers.
fn caller_identity(headers: &HeaderMap) -> Result<(String, Role), StatusCode> {
    let user_id = headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;
    let raw_role = headers
        .get("x-role")
        .and_then(|value| value.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;
    let role = Role::new(raw_role.to_string()).map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok((user_id.to_string(), role))
}

fn policy_error_status(error: PolicyUpdateError) -> StatusCode {
    match error {
        PolicyUpdateError::Forbidden(_) => StatusCode::FORBIDDEN,
        PolicyUpdateError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        PolicyUpdateError::InvalidRole(_) => StatusCode::BAD_REQUEST,
    }
}
