//! Operator session and scan context

use serde::{Deserialize, Serialize};

use super::{PositionCode, RollId};

/// An authenticated operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// MACONGTY
    pub factory_code: String,
    /// MASOTHE
    pub employee_id: String,
    /// HOTEN
    pub display_name: String,
    /// PHONGBAN
    pub department: Option<String>,
    /// Value every roll query is scoped by (`NHA_MAY`)
    pub warehouse_scope: String,
}

/// A classified scanner input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanToken {
    Position(PositionCode),
    Roll(RollId),
}

impl ScanToken {
    /// Classify a raw scan in the relocation context.
    ///
    /// A token starting with an uppercase Latin letter names a storage
    /// position; anything else is a roll ID. Empty input yields `None`.
    pub fn classify(raw: &str) -> Option<Self> {
        let token = raw.trim();
        let first = token.chars().next()?;
        if first.is_ascii_uppercase() {
            Some(ScanToken::Position(PositionCode::new(token)))
        } else {
            Some(ScanToken::Roll(RollId::from(token)))
        }
    }
}

/// Per-session scanner state for the relocation handshake
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanContext {
    pending_position: Option<PositionCode>,
}

impl ScanContext {
    pub fn pending_position(&self) -> Option<&PositionCode> {
        self.pending_position.as_ref()
    }

    /// Replace the pending position. It is never cleared otherwise.
    pub fn set_position(&mut self, position: PositionCode) {
        self.pending_position = Some(position);
    }
}
