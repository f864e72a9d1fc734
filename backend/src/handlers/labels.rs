//! HTTP handlers for label printing

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::handlers::rolls::SelectionRequest;
use crate::middleware::CurrentSession;
use crate::services::label::PrintReport;
use crate::services::LabelService;
use crate::AppState;

/// Print labels for the selected rolls
pub async fn print_labels(
    State(state): State<AppState>,
    current: CurrentSession,
    Json(body): Json<SelectionRequest>,
) -> AppResult<Json<PrintReport>> {
    let service = LabelService::new(
        state.rolls,
        state.printer,
        state.config.printer.qr_module_size,
    );
    let report = service
        .print(&current.0.session, &body.ids, body.confirm)
        .await?;
    Ok(Json(report))
}
