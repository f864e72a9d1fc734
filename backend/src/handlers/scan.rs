//! HTTP handlers for QR scan transitions

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::CurrentSession;
use crate::services::lifecycle::{RelocateOutcome, ScanReceipt};
use crate::services::LifecycleService;
use crate::AppState;

/// Raw scanner input
#[derive(Deserialize)]
pub struct ScanRequest {
    pub code: String,
}

/// Release a roll for cutting
pub async fn release(
    State(state): State<AppState>,
    current: CurrentSession,
    Json(body): Json<ScanRequest>,
) -> AppResult<Json<ScanReceipt>> {
    let service = LifecycleService::new(state.rolls);
    let receipt = service.release(&current.0.session, &body.code).await?;
    Ok(Json(receipt))
}

/// Ship a roll out of the warehouse
pub async fn ship_out(
    State(state): State<AppState>,
    current: CurrentSession,
    Json(body): Json<ScanRequest>,
) -> AppResult<Json<ScanReceipt>> {
    let service = LifecycleService::new(state.rolls);
    let receipt = service.ship_out(&current.0.session, &body.code).await?;
    Ok(Json(receipt))
}

/// Position token or roll ID in the relocation context
pub async fn relocate(
    State(state): State<AppState>,
    current: CurrentSession,
    Json(body): Json<ScanRequest>,
) -> AppResult<Json<RelocateOutcome>> {
    let service = LifecycleService::new(state.rolls);
    let outcome = service
        .relocate(
            &state.sessions,
            current.0.session_id,
            &current.0.session,
            &body.code,
        )
        .await?;
    Ok(Json(outcome))
}
