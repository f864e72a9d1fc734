//! Spreadsheet export of search results

use chrono::{DateTime, FixedOffset, Utc};

use shared::export::ExportLayout;
use shared::{Roll, SearchCriteria, SearchProfile, Session};

use crate::error::{AppError, AppResult};
use crate::services::SearchService;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A rendered download
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Render rolls as CSV with a BOM so spreadsheet tools pick up UTF-8
pub fn render_csv(
    layout: ExportLayout,
    rolls: &[Roll],
    offset: FixedOffset,
    now: DateTime<Utc>,
) -> AppResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(UTF8_BOM.to_vec());

    writer
        .write_record(layout.headers())
        .map_err(|e| AppError::Internal(format!("CSV write failed: {}", e)))?;
    for roll in rolls {
        writer
            .write_record(layout.render_row(roll, offset, now))
            .map_err(|e| AppError::Internal(format!("CSV write failed: {}", e)))?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV flush failed: {}", e)))
}

#[derive(Clone)]
pub struct ExportService {
    search: SearchService,
    offset: FixedOffset,
}

impl ExportService {
    pub fn new(search: SearchService, offset: FixedOffset) -> Self {
        Self { search, offset }
    }

    /// Export the rows of one inventory view
    pub async fn export(
        &self,
        profile: SearchProfile,
        criteria: &SearchCriteria,
        session: &Session,
    ) -> AppResult<ExportFile> {
        let rolls = self.search.rolls(profile, criteria, session).await?;
        let now = Utc::now();
        let layout = ExportLayout::from(profile);

        let bytes = render_csv(layout, &rolls, self.offset, now)?;
        tracing::info!(?profile, rows = rolls.len(), "Export rendered");

        Ok(ExportFile {
            file_name: layout.file_name(now.with_timezone(&self.offset).naive_local()),
            bytes,
        })
    }

    /// Empty import template
    pub fn template(&self) -> AppResult<ExportFile> {
        let now = Utc::now();
        let layout = ExportLayout::ImportTemplate;

        Ok(ExportFile {
            file_name: layout.file_name(now.with_timezone(&self.offset).naive_local()),
            bytes: render_csv(layout, &[], self.offset, now)?,
        })
    }
}
