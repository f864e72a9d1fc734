//! Authentication handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::CurrentSession;
use crate::services::auth::LoginResponse;
use crate::services::AuthService;
use crate::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub factory_code: String,
    pub employee_id: String,
    pub password: String,
}

/// Login endpoint handler
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let auth_service = AuthService::new(state.personnel, state.sessions, &state.config);
    let response = auth_service
        .login(&body.factory_code, &body.employee_id, &body.password)
        .await?;
    Ok(Json(response))
}

/// Logout endpoint handler
pub async fn logout(
    State(state): State<AppState>,
    current: CurrentSession,
) -> StatusCode {
    let auth_service = AuthService::new(state.personnel, state.sessions, &state.config);
    auth_service.logout(current.0.session_id).await;
    StatusCode::NO_CONTENT
}

/// Current operator
pub async fn me(current: CurrentSession) -> Json<shared::Session> {
    Json(current.0.session)
}
