//! Roll lifecycle service
//!
//! Drives the scan transitions `Received -> Released -> ShippedOut` and the
//! two-scan relocation handshake. Preconditions are enforced by the
//! repository's conditional updates, so a concurrent or replayed scan
//! surfaces as [`AppError::InvalidCode`] and never mutates the roll.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use shared::{validate_position, PositionCode, Roll, RollId, ScanToken, Session, Transition};

use crate::error::{AppError, AppResult};
use crate::repository::RollRepository;
use crate::services::SessionStore;

/// Result of an accepted transition
#[derive(Debug, Clone, Serialize)]
pub struct ScanReceipt {
    pub transition: Transition,
    pub roll: Roll,
}

/// Result of one scan in the relocation context
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RelocateOutcome {
    /// A position token was scanned and is now pending
    PositionSet { position: PositionCode },
    /// A roll was moved to the pending position
    Relocated(ScanReceipt),
}

#[derive(Clone)]
pub struct LifecycleService {
    rolls: Arc<dyn RollRepository>,
}

fn empty_scan() -> AppError {
    AppError::Validation {
        field: "code".to_string(),
        message: "Scanned code is empty".to_string(),
        message_vi: "Mã QR trống".to_string(),
    }
}

fn roll_token(raw: &str) -> AppResult<RollId> {
    let token = raw.trim();
    if token.is_empty() {
        return Err(empty_scan());
    }
    Ok(RollId::from(token))
}

impl LifecycleService {
    pub fn new(rolls: Arc<dyn RollRepository>) -> Self {
        Self { rolls }
    }

    /// Release a received roll for cutting
    pub async fn release(&self, session: &Session, raw: &str) -> AppResult<ScanReceipt> {
        let id = roll_token(raw)?;
        let scope = session.warehouse_scope.as_str();

        if !self.rolls.update_status_release(scope, &id, Utc::now()).await? {
            return Err(AppError::InvalidCode(id.to_string()));
        }

        tracing::info!(roll_id = %id, scope, employee = %session.employee_id, "Roll released");
        self.receipt(scope, &id, Transition::Release).await
    }

    /// Ship a received or released roll out of the warehouse
    pub async fn ship_out(&self, session: &Session, raw: &str) -> AppResult<ScanReceipt> {
        let id = roll_token(raw)?;
        let scope = session.warehouse_scope.as_str();

        if !self.rolls.update_status_ship_out(scope, &id, Utc::now()).await? {
            return Err(AppError::InvalidCode(id.to_string()));
        }

        tracing::info!(roll_id = %id, scope, employee = %session.employee_id, "Roll shipped out");
        self.receipt(scope, &id, Transition::ShipOut).await
    }

    /// Handle one scan in the relocation context.
    ///
    /// Position tokens replace the session's pending position. Roll IDs are
    /// moved to the pending position; without one the scan is rejected
    /// before the store is touched.
    pub async fn relocate(
        &self,
        sessions: &SessionStore,
        session_id: Uuid,
        session: &Session,
        raw: &str,
    ) -> AppResult<RelocateOutcome> {
        let token = ScanToken::classify(raw).ok_or_else(empty_scan)?;
        let scope = session.warehouse_scope.as_str();

        match token {
            ScanToken::Position(position) => {
                validate_position(position.as_str()).map_err(|e| AppError::Validation {
                    field: "code".to_string(),
                    message: e.to_string(),
                    message_vi: "Mã vị trí dài quá 20 ký tự".to_string(),
                })?;
                if !sessions.set_position(session_id, position.clone()).await {
                    return Err(AppError::Unauthorized {
                        message: "Session has ended".to_string(),
                        message_vi: "Phiên đăng nhập đã kết thúc".to_string(),
                    });
                }
                tracing::debug!(position = %position, "Pending position set");
                Ok(RelocateOutcome::PositionSet { position })
            }
            ScanToken::Roll(id) => {
                let position = sessions
                    .pending_position(session_id)
                    .await
                    .ok_or(AppError::PositionRequired)?;

                if !self.rolls.update_position(scope, &id, &position).await? {
                    return Err(AppError::InvalidCode(id.to_string()));
                }

                tracing::info!(roll_id = %id, position = %position, scope, "Roll relocated");
                self.receipt(scope, &id, Transition::Relocate)
                    .await
                    .map(RelocateOutcome::Relocated)
            }
        }
    }

    async fn receipt(
        &self,
        scope: &str,
        id: &RollId,
        transition: Transition,
    ) -> AppResult<ScanReceipt> {
        let roll = self
            .rolls
            .find_by_id(scope, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("roll {}", id)))?;

        Ok(ScanReceipt { transition, roll })
    }
}
