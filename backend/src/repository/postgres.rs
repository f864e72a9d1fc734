//! PostgreSQL roll repository

use std::collections::{BTreeSet, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use shared::{
    validate_yards, DateField, NewRoll, PositionCode, Roll, RollFilter, RollId, RollStatus,
    Transition,
};

use super::{InsertOutcome, RollRepository};
use crate::error::{AppError, AppResult};

const SELECT_ROLL: &str = r#"
    SELECT ID, NGAY_NHAN, STYLE, MO, LOAI_VAI, DVT, LOT, MAU, CUON_SO, SO_YARD,
           VI_TRI, NHA_MAY, THOI_GIAN_XA, THOI_GIAN_XUAT_KHO, TRANG_THAI
    FROM DANH_SACH_CUON_VAI
"#;

/// Roll repository backed by the `DANH_SACH_CUON_VAI` table
#[derive(Clone)]
pub struct PgRollRepository {
    db: PgPool,
    offset: FixedOffset,
}

/// Row as returned by PostgreSQL (unquoted identifiers fold to lowercase)
#[derive(Debug, FromRow)]
struct RollRow {
    #[sqlx(rename = "id")]
    id: String,
    #[sqlx(rename = "ngay_nhan")]
    received_date: NaiveDate,
    #[sqlx(rename = "style")]
    style: String,
    #[sqlx(rename = "mo")]
    mo: String,
    #[sqlx(rename = "loai_vai")]
    fabric_type: String,
    #[sqlx(rename = "dvt")]
    unit: String,
    #[sqlx(rename = "lot")]
    lot: String,
    #[sqlx(rename = "mau")]
    color: String,
    #[sqlx(rename = "cuon_so")]
    roll_number: i32,
    #[sqlx(rename = "so_yard")]
    yards: Decimal,
    #[sqlx(rename = "vi_tri")]
    position: Option<String>,
    #[sqlx(rename = "nha_may")]
    factory: String,
    #[sqlx(rename = "thoi_gian_xa")]
    released_at: Option<DateTime<Utc>>,
    #[sqlx(rename = "thoi_gian_xuat_kho")]
    shipped_out_at: Option<DateTime<Utc>>,
    #[sqlx(rename = "trang_thai")]
    status: String,
}

impl TryFrom<RollRow> for Roll {
    type Error = AppError;

    fn try_from(row: RollRow) -> Result<Self, Self::Error> {
        let status = RollStatus::from_db_str(&row.status).ok_or_else(|| {
            AppError::Internal(format!("Unknown status '{}' on roll {}", row.status, row.id))
        })?;

        Ok(Roll {
            id: RollId::from(row.id),
            received_date: row.received_date,
            style: row.style,
            mo: row.mo,
            fabric_type: row.fabric_type,
            unit: row.unit,
            lot: row.lot,
            color: row.color,
            roll_number: row.roll_number,
            yards: row.yards,
            position: row.position,
            factory: row.factory,
            released_at: row.released_at,
            shipped_out_at: row.shipped_out_at,
            status,
        })
    }
}

impl PgRollRepository {
    /// Create a repository; `offset` is the warehouse-local offset used for
    /// date-range filters over timestamp columns
    pub fn new(db: PgPool, offset: FixedOffset) -> Self {
        Self { db, offset }
    }
}

fn allowed_statuses(transition: Transition) -> Vec<String> {
    transition
        .allowed_from()
        .iter()
        .map(|s| s.as_db_str().to_string())
        .collect()
}

/// Escape LIKE wildcards so operator input is matched literally
pub(crate) fn contains_pattern(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('%');
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn push_contains(qb: &mut QueryBuilder<'static, Postgres>, column: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    qb.push(" AND ")
        .push(column)
        .push(" ILIKE ")
        .push_bind(contains_pattern(value));
}

/// Build the parameterized search statement for a filter
pub(crate) fn build_search_query(
    filter: &RollFilter,
    offset: FixedOffset,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(SELECT_ROLL);
    qb.push(" WHERE TRUE");

    if let Some(date) = &filter.date {
        match date.field {
            DateField::Received => {
                qb.push(" AND NGAY_NHAN BETWEEN ")
                    .push_bind(date.range.start)
                    .push(" AND ")
                    .push_bind(date.range.end);
            }
            DateField::ReleasedAt | DateField::ShippedOutAt => {
                let column = if date.field == DateField::ReleasedAt {
                    "THOI_GIAN_XA"
                } else {
                    "THOI_GIAN_XUAT_KHO"
                };
                let (lower, upper) = date.range.utc_bounds(offset);
                qb.push(" AND ")
                    .push(column)
                    .push(" >= ")
                    .push_bind(lower)
                    .push(" AND ")
                    .push(column)
                    .push(" < ")
                    .push_bind(upper);
            }
        }
    }

    push_contains(&mut qb, "STYLE", &filter.style);
    push_contains(&mut qb, "MO", &filter.mo);
    push_contains(&mut qb, "LOT", &filter.lot);
    push_contains(&mut qb, "MAU", &filter.color);
    push_contains(&mut qb, "COALESCE(VI_TRI, '')", &filter.position);
    push_contains(&mut qb, "NHA_MAY", &filter.factory);

    if let Some(status) = filter.status {
        qb.push(" AND TRANG_THAI = ").push_bind(status.as_db_str());
    }

    // IDs are sequence numbers stored as text
    qb.push(" ORDER BY NGAY_NHAN, LENGTH(ID), ID");
    qb
}

#[async_trait]
impl RollRepository for PgRollRepository {
    async fn find_by_id(&self, scope: &str, id: &RollId) -> AppResult<Option<Roll>> {
        let row = sqlx::query_as::<_, RollRow>(&format!(
            "{} WHERE ID = $1 AND NHA_MAY = $2",
            SELECT_ROLL
        ))
        .bind(id.as_str())
        .bind(scope)
        .fetch_optional(&self.db)
        .await?;

        row.map(Roll::try_from).transpose()
    }

    async fn insert_batch(&self, rolls: &[NewRoll]) -> AppResult<InsertOutcome> {
        // SO_YARD is DECIMAL(6,2); values outside it never reach the table
        let yards = rolls
            .iter()
            .map(|r| validate_yards(r.yards))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|msg| AppError::Validation {
                field: "SO_YARD".to_string(),
                message: msg.to_string(),
                message_vi: "Số yard không hợp lệ".to_string(),
            })?;

        let mut outcome = InsertOutcome::default();
        let mut seen = HashSet::new();
        let mut tx = self.db.begin().await?;

        for (roll, yards) in rolls.iter().zip(yards) {
            if !seen.insert(roll.key()) {
                outcome.skipped_duplicates += 1;
                continue;
            }

            let result = sqlx::query(
                r#"
                INSERT INTO DANH_SACH_CUON_VAI
                    (NGAY_NHAN, STYLE, MO, LOAI_VAI, DVT, LOT, MAU, CUON_SO, SO_YARD, NHA_MAY, TRANG_THAI)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                ON CONFLICT (STYLE, MO, LOAI_VAI, LOT, MAU, CUON_SO) DO NOTHING
                "#,
            )
            .bind(roll.received_date)
            .bind(&roll.style)
            .bind(&roll.mo)
            .bind(&roll.fabric_type)
            .bind(&roll.unit)
            .bind(&roll.lot)
            .bind(&roll.color)
            .bind(roll.roll_number)
            .bind(yards)
            .bind(&roll.factory)
            .bind(RollStatus::Received.as_db_str())
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                outcome.skipped_duplicates += 1;
            } else {
                outcome.inserted += 1;
            }
        }

        tx.commit().await?;
        Ok(outcome)
    }

    async fn delete_by_ids(&self, scope: &str, ids: &BTreeSet<RollId>) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let ids: Vec<String> = ids.iter().map(|id| id.as_str().to_string()).collect();

        let result = sqlx::query("DELETE FROM DANH_SACH_CUON_VAI WHERE ID = ANY($1) AND NHA_MAY = $2")
            .bind(&ids)
            .bind(scope)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected())
    }

    async fn update_status_release(
        &self,
        scope: &str,
        id: &RollId,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE DANH_SACH_CUON_VAI
            SET THOI_GIAN_XA = $1, TRANG_THAI = $2, VI_TRI = ''
            WHERE ID = $3 AND NHA_MAY = $4 AND TRANG_THAI = ANY($5)
            "#,
        )
        .bind(at)
        .bind(RollStatus::Released.as_db_str())
        .bind(id.as_str())
        .bind(scope)
        .bind(allowed_statuses(Transition::Release))
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_status_ship_out(
        &self,
        scope: &str,
        id: &RollId,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE DANH_SACH_CUON_VAI
            SET THOI_GIAN_XUAT_KHO = $1, TRANG_THAI = $2, VI_TRI = ''
            WHERE ID = $3 AND NHA_MAY = $4 AND TRANG_THAI = ANY($5)
            "#,
        )
        .bind(at)
        .bind(RollStatus::ShippedOut.as_db_str())
        .bind(id.as_str())
        .bind(scope)
        .bind(allowed_statuses(Transition::ShipOut))
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_position(
        &self,
        scope: &str,
        id: &RollId,
        position: &PositionCode,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE DANH_SACH_CUON_VAI
            SET VI_TRI = $1
            WHERE ID = $2 AND NHA_MAY = $3 AND TRANG_THAI = ANY($4)
            "#,
        )
        .bind(position.as_str())
        .bind(id.as_str())
        .bind(scope)
        .bind(allowed_statuses(Transition::Relocate))
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn search(&self, filter: &RollFilter) -> AppResult<Vec<Roll>> {
        let mut qb = build_search_query(filter, self.offset);
        let rows = qb.build_query_as::<RollRow>().fetch_all(&self.db).await?;

        rows.into_iter().map(Roll::try_from).collect()
    }
}
