//! Fabric roll models and the roll lifecycle

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Hours after release at which a roll is flagged as overdue for cutting
pub const RELEASE_OVERDUE_HOURS: i64 = 24;

/// Roll identifier, also the literal QR payload printed on the label
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RollId(String);

impl RollId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RollId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RollId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RollId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Lifecycle status of a roll (`TRANG_THAI`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollStatus {
    /// Nhập kho
    Received,
    /// Xả vải
    Released,
    /// Xuất kho
    ShippedOut,
}

impl RollStatus {
    /// Value stored in the `TRANG_THAI` column
    pub fn as_db_str(&self) -> &'static str {
        match self {
            RollStatus::Received => "Nhập kho",
            RollStatus::Released => "Xả vải",
            RollStatus::ShippedOut => "Xuất kho",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim() {
            "Nhập kho" => Some(RollStatus::Received),
            "Xả vải" => Some(RollStatus::Released),
            "Xuất kho" => Some(RollStatus::ShippedOut),
            _ => None,
        }
    }

    /// Position along the lifecycle, used to check forward-only movement
    pub fn rank(&self) -> u8 {
        match self {
            RollStatus::Received => 0,
            RollStatus::Released => 1,
            RollStatus::ShippedOut => 2,
        }
    }
}

impl std::fmt::Display for RollStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db_str())
    }
}

/// A scan-driven operation on a single roll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Release,
    ShipOut,
    Relocate,
}

impl Transition {
    /// Statuses from which this transition may fire
    pub fn allowed_from(&self) -> &'static [RollStatus] {
        match self {
            Transition::Release => &[RollStatus::Received],
            Transition::ShipOut | Transition::Relocate => {
                &[RollStatus::Received, RollStatus::Released]
            }
        }
    }

    pub fn is_allowed_from(&self, status: RollStatus) -> bool {
        self.allowed_from().contains(&status)
    }

    /// Resulting status, or `None` when the transition is rejected.
    /// Relocation never changes the status.
    pub fn apply(&self, from: RollStatus) -> Option<RollStatus> {
        if !self.is_allowed_from(from) {
            return None;
        }
        Some(match self {
            Transition::Release => RollStatus::Released,
            Transition::ShipOut => RollStatus::ShippedOut,
            Transition::Relocate => from,
        })
    }

    /// Whether a successful transition clears `VI_TRI`
    pub fn clears_position(&self) -> bool {
        !matches!(self, Transition::Relocate)
    }
}

/// One physical fabric roll (row of `DANH_SACH_CUON_VAI`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roll {
    pub id: RollId,
    /// NGAY_NHAN
    pub received_date: NaiveDate,
    pub style: String,
    pub mo: String,
    /// LOAI_VAI
    pub fabric_type: String,
    /// DVT
    pub unit: String,
    pub lot: String,
    /// MAU
    pub color: String,
    /// CUON_SO
    pub roll_number: i32,
    /// SO_YARD, DECIMAL(6,2)
    pub yards: Decimal,
    /// VI_TRI; `None` and `""` both mean unassigned
    pub position: Option<String>,
    /// NHA_MAY
    pub factory: String,
    /// THOI_GIAN_XA
    pub released_at: Option<DateTime<Utc>>,
    /// THOI_GIAN_XUAT_KHO
    pub shipped_out_at: Option<DateTime<Utc>>,
    pub status: RollStatus,
}

impl Roll {
    pub fn key(&self) -> RollKey {
        RollKey {
            style: self.style.clone(),
            mo: self.mo.clone(),
            fabric_type: self.fabric_type.clone(),
            lot: self.lot.clone(),
            color: self.color.clone(),
            roll_number: self.roll_number,
        }
    }

    pub fn position_label(&self) -> &str {
        self.position.as_deref().unwrap_or("")
    }

    /// Hours elapsed since release, to two decimal places
    pub fn hours_since_release(&self, now: DateTime<Utc>) -> Option<Decimal> {
        self.released_at.map(|released| {
            let minutes = (now - released).num_minutes();
            let mut hours = (Decimal::from(minutes) / Decimal::from(60))
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            hours.rescale(2);
            hours
        })
    }

    /// Released rolls left uncut for a day or more
    pub fn is_release_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == RollStatus::Released
            && self
                .hours_since_release(now)
                .is_some_and(|h| h >= Decimal::from(RELEASE_OVERDUE_HOURS))
    }
}

/// A validated roll ready for insertion; status starts as Received
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRoll {
    pub received_date: NaiveDate,
    pub style: String,
    pub mo: String,
    pub fabric_type: String,
    pub unit: String,
    pub lot: String,
    pub color: String,
    pub roll_number: i32,
    pub yards: Decimal,
    pub factory: String,
}

impl NewRoll {
    pub fn key(&self) -> RollKey {
        RollKey {
            style: self.style.clone(),
            mo: self.mo.clone(),
            fabric_type: self.fabric_type.clone(),
            lot: self.lot.clone(),
            color: self.color.clone(),
            roll_number: self.roll_number,
        }
    }
}

/// Natural key of a roll: (STYLE, MO, LOAI_VAI, LOT, MAU, CUON_SO)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RollKey {
    pub style: String,
    pub mo: String,
    pub fabric_type: String,
    pub lot: String,
    pub color: String,
    pub roll_number: i32,
}

/// Sum of roll lengths in exact decimal arithmetic
pub fn total_yards<'a>(rolls: impl IntoIterator<Item = &'a Roll>) -> Decimal {
    rolls.into_iter().map(|r| r.yards).sum()
}
