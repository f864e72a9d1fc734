//! Search filters and the fixed inventory query profiles

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use super::RollStatus;
use crate::types::DateRange;

/// Column a date range applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateField {
    /// NGAY_NHAN
    Received,
    /// THOI_GIAN_XA
    ReleasedAt,
    /// THOI_GIAN_XUAT_KHO
    ShippedOutAt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateFilter {
    pub field: DateField,
    pub range: DateRange,
}

/// Filter handed to the repository. Empty text fields impose no constraint;
/// non-empty ones are case-insensitive substring matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollFilter {
    pub date: Option<DateFilter>,
    pub style: String,
    pub mo: String,
    pub lot: String,
    pub color: String,
    pub position: String,
    pub factory: String,
    pub status: Option<RollStatus>,
}

/// Free-text and date inputs typed by the operator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchCriteria {
    #[serde(deserialize_with = "blank_as_none")]
    pub from: Option<NaiveDate>,
    #[serde(deserialize_with = "blank_as_none")]
    pub to: Option<NaiveDate>,
    pub style: String,
    pub mo: String,
    pub lot: String,
    pub color: String,
    pub position: String,
}

/// Date pickers submit an empty value when cleared
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<NaiveDate>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CriteriaError {
    #[error("both a start and an end date are required")]
    IncompleteDateRange,

    #[error("start date {from} is after end date {to}")]
    InvertedDateRange { from: NaiveDate, to: NaiveDate },
}

/// The four inventory views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchProfile {
    /// Nhập kho: everything received in the date range
    Inbound,
    /// Xả vải
    Released,
    /// Xuất kho
    ShippedOut,
    /// Tồn kho: rolls still on hand
    OnHand,
}

impl SearchProfile {
    pub fn date_field(&self) -> Option<DateField> {
        match self {
            SearchProfile::Inbound => Some(DateField::Received),
            SearchProfile::Released => Some(DateField::ReleasedAt),
            SearchProfile::ShippedOut => Some(DateField::ShippedOutAt),
            SearchProfile::OnHand => None,
        }
    }

    pub fn status(&self) -> Option<RollStatus> {
        match self {
            SearchProfile::Inbound => None,
            SearchProfile::Released => Some(RollStatus::Released),
            SearchProfile::ShippedOut => Some(RollStatus::ShippedOut),
            SearchProfile::OnHand => Some(RollStatus::Received),
        }
    }

    /// Shipped-out rolls have no position left to filter on
    pub fn filters_position(&self) -> bool {
        !matches!(self, SearchProfile::ShippedOut)
    }

    pub fn from_slug(s: &str) -> Option<Self> {
        match s {
            "inbound" => Some(SearchProfile::Inbound),
            "released" => Some(SearchProfile::Released),
            "shipped_out" => Some(SearchProfile::ShippedOut),
            "on_hand" => Some(SearchProfile::OnHand),
            _ => None,
        }
    }

    /// Turn operator input into a repository filter scoped to a warehouse
    pub fn build_filter(
        &self,
        criteria: &SearchCriteria,
        warehouse_scope: &str,
    ) -> Result<RollFilter, CriteriaError> {
        let date = match self.date_field() {
            Some(field) => match (criteria.from, criteria.to) {
                (Some(from), Some(to)) => {
                    if from > to {
                        return Err(CriteriaError::InvertedDateRange { from, to });
                    }
                    Some(DateFilter {
                        field,
                        range: DateRange { start: from, end: to },
                    })
                }
                (None, None) => None,
                _ => return Err(CriteriaError::IncompleteDateRange),
            },
            None => None,
        };

        let position = if self.filters_position() {
            criteria.position.trim().to_string()
        } else {
            String::new()
        };

        Ok(RollFilter {
            date,
            style: criteria.style.trim().to_string(),
            mo: criteria.mo.trim().to_string(),
            lot: criteria.lot.trim().to_string(),
            color: criteria.color.trim().to_string(),
            position,
            factory: warehouse_scope.to_string(),
            status: self.status(),
        })
    }
}
