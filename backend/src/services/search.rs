//! Inventory search service
//!
//! Runs the four fixed query profiles against the roll repository.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use shared::{total_yards, Roll, SearchCriteria, SearchProfile, Session};

use crate::error::AppResult;
use crate::repository::RollRepository;

/// One result row; release timing is only present for the released view
#[derive(Debug, Clone, Serialize)]
pub struct RollView {
    #[serde(flatten)]
    pub roll: Roll,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours_since_release: Option<Decimal>,
    pub overdue: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub profile: SearchProfile,
    pub rows: Vec<RollView>,
    pub row_count: usize,
    /// Only reported for the on-hand view
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_yards: Option<Decimal>,
}

#[derive(Clone)]
pub struct SearchService {
    rolls: Arc<dyn RollRepository>,
}

impl SearchService {
    pub fn new(rolls: Arc<dyn RollRepository>) -> Self {
        Self { rolls }
    }

    /// Raw rows for a profile, scoped to the session's warehouse
    pub async fn rolls(
        &self,
        profile: SearchProfile,
        criteria: &SearchCriteria,
        session: &Session,
    ) -> AppResult<Vec<Roll>> {
        let filter = profile.build_filter(criteria, &session.warehouse_scope)?;
        let rolls = self.rolls.search(&filter).await?;

        tracing::debug!(?profile, rows = rolls.len(), "Search completed");
        Ok(rolls)
    }

    pub async fn search(
        &self,
        profile: SearchProfile,
        criteria: &SearchCriteria,
        session: &Session,
    ) -> AppResult<SearchResult> {
        let rolls = self.rolls(profile, criteria, session).await?;
        Ok(summarize(profile, rolls, Utc::now()))
    }
}

/// Shape a profile's rows into the response, adding aggregates
pub fn summarize(profile: SearchProfile, rolls: Vec<Roll>, now: DateTime<Utc>) -> SearchResult {
    let total = (profile == SearchProfile::OnHand).then(|| total_yards(&rolls));

    let rows: Vec<RollView> = rolls
        .into_iter()
        .map(|roll| {
            let (hours_since_release, overdue) = if profile == SearchProfile::Released {
                (roll.hours_since_release(now), roll.is_release_overdue(now))
            } else {
                (None, false)
            };
            RollView {
                roll,
                hours_since_release,
                overdue,
            }
        })
        .collect();

    SearchResult {
        profile,
        row_count: rows.len(),
        rows,
        total_yards: total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use shared::{RollId, RollStatus};
    use std::str::FromStr;

    fn roll(id: &str, yards: &str, status: RollStatus) -> Roll {
        Roll {
            id: RollId::from(id),
            received_date: NaiveDate::from_ymd_opt(2024, 11, 2).unwrap(),
            style: "ABC".to_string(),
            mo: "MO1".to_string(),
            fabric_type: "KNIT".to_string(),
            unit: "YD".to_string(),
            lot: "L1".to_string(),
            color: "RED".to_string(),
            roll_number: 1,
            yards: Decimal::from_str(yards).unwrap(),
            position: None,
            factory: "F1".to_string(),
            released_at: None,
            shipped_out_at: None,
            status,
        }
    }

    #[test]
    fn test_on_hand_reports_total() {
        let rolls = vec![
            roll("1", "10.00", RollStatus::Received),
            roll("2", "20.50", RollStatus::Received),
            roll("3", "5.25", RollStatus::Received),
        ];
        let result = summarize(SearchProfile::OnHand, rolls, Utc::now());
        assert_eq!(result.row_count, 3);
        assert_eq!(result.total_yards, Some(Decimal::from_str("35.75").unwrap()));
    }

    #[test]
    fn test_inbound_has_no_total() {
        let rolls = vec![roll("1", "10.00", RollStatus::Released)];
        let result = summarize(SearchProfile::Inbound, rolls, Utc::now());
        assert_eq!(result.total_yards, None);
        assert!(result.rows[0].hours_since_release.is_none());
    }

    #[test]
    fn test_released_rows_flag_overdue() {
        let now = Utc::now();
        let mut fresh = roll("1", "10.00", RollStatus::Released);
        fresh.released_at = Some(now - Duration::hours(2));
        let mut stale = roll("2", "10.00", RollStatus::Released);
        stale.released_at = Some(now - Duration::hours(30));

        let result = summarize(SearchProfile::Released, vec![fresh, stale], now);
        assert!(!result.rows[0].overdue);
        assert!(result.rows[1].overdue);
        assert_eq!(
            result.rows[1].hours_since_release,
            Some(Decimal::from_str("30.00").unwrap())
        );
    }
}
