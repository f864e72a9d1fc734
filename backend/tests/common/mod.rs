//! In-memory collaborators for integration tests

#![allow(dead_code)]

use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

use fabric_warehouse_backend::error::AppResult;
use fabric_warehouse_backend::repository::{InsertOutcome, RollRepository};
use fabric_warehouse_backend::services::{LabelPrinter, PersonnelDirectory};
use shared::{
    offset_from_minutes, DateField, NewRoll, PositionCode, Roll, RollFilter, RollId, RollStatus,
    Session, Transition,
};

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn session(scope: &str) -> Session {
    Session {
        factory_code: scope.to_string(),
        employee_id: "12345".to_string(),
        display_name: "Nguyen Van A".to_string(),
        department: Some("Kho vải".to_string()),
        warehouse_scope: scope.to_string(),
    }
}

pub fn new_roll(style: &str, roll_number: i32, yards: &str) -> NewRoll {
    NewRoll {
        received_date: date(2024, 11, 5),
        style: style.to_string(),
        mo: "MO1".to_string(),
        fabric_type: "KNIT".to_string(),
        unit: "YD".to_string(),
        lot: "L1".to_string(),
        color: "RED".to_string(),
        roll_number,
        yards: dec(yards),
        factory: "F1".to_string(),
    }
}

fn contains_ci(value: &str, needle: &str) -> bool {
    needle.is_empty() || value.to_lowercase().contains(&needle.to_lowercase())
}

/// Roll store with the same contract as the PostgreSQL repository
pub struct MemoryRollRepository {
    rows: Mutex<Vec<Roll>>,
    next_id: AtomicU64,
    offset: FixedOffset,
}

impl Default for MemoryRollRepository {
    fn default() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(100),
            offset: offset_from_minutes(420),
        }
    }
}

impl MemoryRollRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Insert a roll with a chosen ID and status
    pub fn seed(&self, id: &str, status: RollStatus, factory: &str, yards: &str) -> Roll {
        let roll = Roll {
            id: RollId::from(id),
            received_date: date(2024, 11, 5),
            style: "ABC".to_string(),
            mo: "MO1".to_string(),
            fabric_type: "KNIT".to_string(),
            unit: "YD".to_string(),
            lot: "L1".to_string(),
            color: "RED".to_string(),
            roll_number: self.rows.lock().unwrap().len() as i32 + 1,
            yards: dec(yards),
            position: None,
            factory: factory.to_string(),
            released_at: None,
            shipped_out_at: None,
            status,
        };
        self.rows.lock().unwrap().push(roll.clone());
        roll
    }

    pub fn get(&self, id: &str) -> Option<Roll> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id.as_str() == id)
            .cloned()
    }

    pub fn all(&self) -> Vec<Roll> {
        self.rows.lock().unwrap().clone()
    }

    fn transition(
        &self,
        scope: &str,
        id: &RollId,
        transition: Transition,
        apply: impl FnOnce(&mut Roll),
    ) -> bool {
        let mut rows = self.rows.lock().unwrap();
        match rows
            .iter_mut()
            .find(|r| &r.id == id && r.factory == scope && transition.is_allowed_from(r.status))
        {
            Some(roll) => {
                apply(roll);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl RollRepository for MemoryRollRepository {
    async fn find_by_id(&self, scope: &str, id: &RollId) -> AppResult<Option<Roll>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| &r.id == id && r.factory == scope)
            .cloned())
    }

    async fn insert_batch(&self, rolls: &[NewRoll]) -> AppResult<InsertOutcome> {
        let mut rows = self.rows.lock().unwrap();
        let mut keys: HashSet<_> = rows.iter().map(|r| r.key()).collect();
        let mut outcome = InsertOutcome::default();

        for roll in rolls {
            if !keys.insert(roll.key()) {
                outcome.skipped_duplicates += 1;
                continue;
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            rows.push(Roll {
                id: RollId::from(id.to_string()),
                received_date: roll.received_date,
                style: roll.style.clone(),
                mo: roll.mo.clone(),
                fabric_type: roll.fabric_type.clone(),
                unit: roll.unit.clone(),
                lot: roll.lot.clone(),
                color: roll.color.clone(),
                roll_number: roll.roll_number,
                yards: roll.yards,
                position: None,
                factory: roll.factory.clone(),
                released_at: None,
                shipped_out_at: None,
                status: RollStatus::Received,
            });
            outcome.inserted += 1;
        }
        Ok(outcome)
    }

    async fn delete_by_ids(&self, scope: &str, ids: &BTreeSet<RollId>) -> AppResult<u64> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| !(r.factory == scope && ids.contains(&r.id)));
        Ok((before - rows.len()) as u64)
    }

    async fn update_status_release(
        &self,
        scope: &str,
        id: &RollId,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        Ok(self.transition(scope, id, Transition::Release, |r| {
            r.released_at = Some(at);
            r.status = RollStatus::Released;
            r.position = Some(String::new());
        }))
    }

    async fn update_status_ship_out(
        &self,
        scope: &str,
        id: &RollId,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        Ok(self.transition(scope, id, Transition::ShipOut, |r| {
            r.shipped_out_at = Some(at);
            r.status = RollStatus::ShippedOut;
            r.position = Some(String::new());
        }))
    }

    async fn update_position(
        &self,
        scope: &str,
        id: &RollId,
        position: &PositionCode,
    ) -> AppResult<bool> {
        Ok(self.transition(scope, id, Transition::Relocate, |r| {
            r.position = Some(position.as_str().to_string());
        }))
    }

    async fn search(&self, filter: &RollFilter) -> AppResult<Vec<Roll>> {
        let rows = self.rows.lock().unwrap();
        let mut found: Vec<Roll> = rows
            .iter()
            .filter(|r| {
                let in_range = match &filter.date {
                    None => true,
                    Some(d) => {
                        let (lower, upper) = d.range.utc_bounds(self.offset);
                        let within = |ts: Option<DateTime<Utc>>| {
                            ts.is_some_and(|t| t >= lower && t < upper)
                        };
                        match d.field {
                            DateField::Received => {
                                d.range.start <= r.received_date && r.received_date <= d.range.end
                            }
                            DateField::ReleasedAt => within(r.released_at),
                            DateField::ShippedOutAt => within(r.shipped_out_at),
                        }
                    }
                };
                in_range
                    && contains_ci(&r.style, &filter.style)
                    && contains_ci(&r.mo, &filter.mo)
                    && contains_ci(&r.lot, &filter.lot)
                    && contains_ci(&r.color, &filter.color)
                    && contains_ci(r.position_label(), &filter.position)
                    && contains_ci(&r.factory, &filter.factory)
                    && filter.status.map_or(true, |s| r.status == s)
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            let key = |r: &Roll| (r.received_date, r.id.as_str().len(), r.id.clone());
            key(a).cmp(&key(b))
        });
        Ok(found)
    }
}

/// Printer that keeps every job in memory
#[derive(Default)]
pub struct RecordingPrinter {
    pub jobs: Mutex<Vec<Vec<u8>>>,
}

#[async_trait]
impl LabelPrinter for RecordingPrinter {
    async fn print(&self, data: &[u8]) -> AppResult<()> {
        self.jobs.lock().unwrap().push(data.to_vec());
        Ok(())
    }
}

/// Personnel store with a single operator
pub struct StaticDirectory {
    pub password: String,
    pub session: Session,
}

impl StaticDirectory {
    pub fn new(scope: &str, password: &str) -> Self {
        Self {
            password: password.to_string(),
            session: session(scope),
        }
    }
}

#[async_trait]
impl PersonnelDirectory for StaticDirectory {
    async fn authenticate(
        &self,
        factory_code: &str,
        employee_id: &str,
        password: &str,
    ) -> AppResult<Option<Session>> {
        let matches = factory_code == self.session.factory_code
            && employee_id == self.session.employee_id
            && password == self.password;
        Ok(matches.then(|| self.session.clone()))
    }
}
