//! Roll store access
//!
//! Every read and write of `DANH_SACH_CUON_VAI` goes through [`RollRepository`].
//! Transition updates are single-row conditional statements: `Ok(false)` means
//! the precondition did not hold (missing roll, wrong status or another
//! scanner got there first) and callers must surface it as a rejection.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use shared::{NewRoll, PositionCode, Roll, RollFilter, RollId};

use crate::error::AppResult;

pub mod postgres;

pub use postgres::PgRollRepository;

/// Outcome of a bulk insert
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InsertOutcome {
    pub inserted: u64,
    pub skipped_duplicates: u64,
}

#[async_trait]
pub trait RollRepository: Send + Sync {
    async fn find_by_id(&self, scope: &str, id: &RollId) -> AppResult<Option<Roll>>;

    /// Append rolls as Received, skipping any whose natural key already exists
    /// in the batch or the store. Runs as one transaction.
    async fn insert_batch(&self, rolls: &[NewRoll]) -> AppResult<InsertOutcome>;

    /// Hard delete; returns the number of rows removed
    async fn delete_by_ids(&self, scope: &str, ids: &BTreeSet<RollId>) -> AppResult<u64>;

    async fn update_status_release(
        &self,
        scope: &str,
        id: &RollId,
        at: DateTime<Utc>,
    ) -> AppResult<bool>;

    async fn update_status_ship_out(
        &self,
        scope: &str,
        id: &RollId,
        at: DateTime<Utc>,
    ) -> AppResult<bool>;

    async fn update_position(
        &self,
        scope: &str,
        id: &RollId,
        position: &PositionCode,
    ) -> AppResult<bool>;

    /// All matching rolls ordered by received date then ID
    async fn search(&self, filter: &RollFilter) -> AppResult<Vec<Roll>>;
}
