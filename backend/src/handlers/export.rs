//! HTTP handlers for spreadsheet downloads

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};

use shared::SearchCriteria;

use crate::error::AppResult;
use crate::handlers::rolls::{parse_profile, search_criteria};
use crate::middleware::CurrentSession;
use crate::services::export::ExportFile;
use crate::services::{ExportService, SearchService};
use crate::AppState;

/// `attachment` disposition with an RFC 5987 encoded UTF-8 file name
pub(crate) fn content_disposition(file_name: &str) -> String {
    let mut encoded = String::with_capacity(file_name.len() * 3);
    for byte in file_name.bytes() {
        if byte.is_ascii_alphanumeric() || b"-._~".contains(&byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }
    format!("attachment; filename*=UTF-8''{}", encoded)
}

fn download(file: ExportFile) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(&file.file_name)),
        ],
        file.bytes,
    )
        .into_response()
}

fn export_service(state: &AppState) -> ExportService {
    ExportService::new(
        SearchService::new(state.rolls.clone()),
        state.config.warehouse.offset(),
    )
}

/// Download one inventory view
pub async fn export_rolls(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(profile): Path<String>,
    query: Result<Query<SearchCriteria>, QueryRejection>,
) -> AppResult<Response> {
    let profile = parse_profile(&profile)?;
    let criteria = search_criteria(query)?;
    let file = export_service(&state)
        .export(profile, &criteria, &current.0.session)
        .await?;
    Ok(download(file))
}

/// Download the empty import template
pub async fn export_template(
    State(state): State<AppState>,
    _current: CurrentSession,
) -> AppResult<Response> {
    let file = export_service(&state).template()?;
    Ok(download(file))
}
