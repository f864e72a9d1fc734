//! Authentication middleware
//!
//! Validates the bearer token and resolves it to a live operator session

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use shared::Session;

use crate::error::{ErrorDetail, ErrorResponse};
use crate::services::auth::decode_token;
use crate::AppState;

/// Authenticated operator attached to the request
#[derive(Clone, Debug)]
pub struct AuthSession {
    pub session_id: Uuid,
    pub session: Session,
}

/// Authentication middleware that validates session tokens.
/// A token is only accepted while its session is still open.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => token,
        None => return unauthorized_response("Missing or invalid Authorization header"),
    };

    let claims = match decode_token(token, &state.config.jwt.secret) {
        Ok(claims) => claims,
        Err(_) => return unauthorized_response("Invalid or expired token"),
    };

    let session_id = match Uuid::parse_str(&claims.sub) {
        Ok(id) => id,
        Err(_) => return unauthorized_response("Invalid session ID in token"),
    };

    let session = match state.sessions.get(session_id).await {
        Some(session) => session,
        None => return unauthorized_response("Session has ended"),
    };

    request
        .extensions_mut()
        .insert(AuthSession { session_id, session });

    next.run(request).await
}

/// Create unauthorized response
fn unauthorized_response(message: &str) -> Response {
    tracing::warn!("Rejected request: {}", message);

    let error = ErrorResponse {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message_en: message.to_string(),
            message_vi: "Vui lòng đăng nhập".to_string(),
            field: None,
        },
    };

    (StatusCode::UNAUTHORIZED, Json(error)).into_response()
}

/// Extractor for the authenticated operator
#[derive(Clone, Debug)]
pub struct CurrentSession(pub AuthSession);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthSession>()
            .cloned()
            .map(CurrentSession)
            .ok_or_else(|| unauthorized_response("Authentication required"))
    }
}
