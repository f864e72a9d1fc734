//! Operator-driven roll maintenance

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use shared::{RollId, Session};

use crate::error::{AppError, AppResult};
use crate::repository::RollRepository;
use crate::services::require_confirmation;

#[derive(Debug, Clone, Serialize)]
pub struct DeleteReport {
    pub deleted: u64,
}

#[derive(Clone)]
pub struct RollService {
    rolls: Arc<dyn RollRepository>,
}

impl RollService {
    pub fn new(rolls: Arc<dyn RollRepository>) -> Self {
        Self { rolls }
    }

    /// Hard delete the selected rolls of this warehouse
    pub async fn delete(
        &self,
        session: &Session,
        ids: &BTreeSet<RollId>,
        confirm: bool,
    ) -> AppResult<DeleteReport> {
        if ids.is_empty() {
            return Err(AppError::ValidationError("No rolls selected".to_string()));
        }
        require_confirmation("delete", ids.len(), confirm)?;

        let deleted = self
            .rolls
            .delete_by_ids(&session.warehouse_scope, ids)
            .await?;

        tracing::info!(
            scope = %session.warehouse_scope,
            employee = %session.employee_id,
            requested = ids.len(),
            deleted,
            "Rolls deleted"
        );
        Ok(DeleteReport { deleted })
    }
}
