//! Common types used across the tracker

use chrono::{DateTime, Days, FixedOffset, NaiveDate, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Inclusive date range for queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: chrono::NaiveDate,
    pub end: chrono::NaiveDate,
}

impl DateRange {
    /// Half-open UTC interval `[start 00:00, end+1 00:00)` in the given local offset.
    ///
    /// Timestamp columns are compared against these bounds so that a roll
    /// released at 23:30 local time falls on the local calendar day.
    pub fn utc_bounds(&self, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
        let lower = local_midnight(self.start, offset);
        let upper = self
            .end
            .checked_add_days(Days::new(1))
            .map(|next| local_midnight(next, offset))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        (lower, upper)
    }
}

fn local_midnight(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let naive = date.and_time(chrono::NaiveTime::MIN);
    // a fixed offset maps every local time to exactly one instant
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

/// Build a `FixedOffset` from minutes east of UTC, falling back to UTC when out of range
pub fn offset_from_minutes(minutes: i32) -> FixedOffset {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix())
}
