//! HTTP handlers for roll search, import and deletion

use std::collections::BTreeSet;

use axum::{
    extract::{rejection::QueryRejection, Multipart, Path, Query, State},
    Json,
};
use serde::Deserialize;

use shared::{RollId, SearchCriteria, SearchProfile};

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentSession;
use crate::services::import::ImportReport;
use crate::services::rolls::DeleteReport;
use crate::services::search::SearchResult;
use crate::services::{ImportService, RollService, SearchService};
use crate::AppState;

/// Selection of rolls for an irreversible action
#[derive(Deserialize)]
pub struct SelectionRequest {
    pub ids: BTreeSet<RollId>,
    #[serde(default)]
    pub confirm: bool,
}

pub(crate) fn parse_profile(slug: &str) -> AppResult<SearchProfile> {
    SearchProfile::from_slug(slug).ok_or_else(|| AppError::NotFound(format!("view '{}'", slug)))
}

/// Surface malformed filter input as a bilingual validation error
pub(crate) fn search_criteria(
    query: Result<Query<SearchCriteria>, QueryRejection>,
) -> AppResult<SearchCriteria> {
    query
        .map(|Query(criteria)| criteria)
        .map_err(|rejection| AppError::Validation {
            field: "query".to_string(),
            message: rejection.body_text(),
            message_vi: "Điều kiện tìm kiếm không hợp lệ".to_string(),
        })
}

/// Search one inventory view
pub async fn search_rolls(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(profile): Path<String>,
    query: Result<Query<SearchCriteria>, QueryRejection>,
) -> AppResult<Json<SearchResult>> {
    let profile = parse_profile(&profile)?;
    let criteria = search_criteria(query)?;
    let service = SearchService::new(state.rolls);
    let result = service
        .search(profile, &criteria, &current.0.session)
        .await?;
    Ok(Json(result))
}

/// Import rolls from an uploaded CSV (multipart field `file`)
pub async fn import_rolls(
    State(state): State<AppState>,
    current: CurrentSession,
    mut multipart: Multipart,
) -> AppResult<Json<ImportReport>> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::ValidationError(format!("Malformed upload: {}", e)))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::ValidationError(format!("Malformed upload: {}", e)))?;
            upload = Some(bytes);
        }
    }

    let bytes = upload.ok_or_else(|| AppError::Validation {
        field: "file".to_string(),
        message: "No file uploaded".to_string(),
        message_vi: "Vui lòng chọn file nhập".to_string(),
    })?;

    let service = ImportService::new(state.rolls);
    let report = service.import_csv(&current.0.session, &bytes).await?;
    Ok(Json(report))
}

/// Hard delete selected rolls
pub async fn delete_rolls(
    State(state): State<AppState>,
    current: CurrentSession,
    Json(body): Json<SelectionRequest>,
) -> AppResult<Json<DeleteReport>> {
    let service = RollService::new(state.rolls);
    let report = service
        .delete(&current.0.session, &body.ids, body.confirm)
        .await?;
    Ok(Json(report))
}
