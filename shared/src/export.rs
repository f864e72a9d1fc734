//! Spreadsheet layouts shared by the export and import paths

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Roll, SearchProfile};

pub const H_RECEIVED_DATE: &str = "Ngày nhận";
pub const H_STYLE: &str = "Style";
pub const H_MO: &str = "MO";
pub const H_FABRIC_TYPE: &str = "Loại vải";
pub const H_UNIT: &str = "ĐVT";
pub const H_LOT: &str = "Lot";
pub const H_COLOR: &str = "Màu";
pub const H_ROLL_NUMBER: &str = "Cuộn số";
pub const H_YARDS: &str = "Số yard";
pub const H_POSITION: &str = "Vị trí";
pub const H_ID: &str = "ID";
pub const H_RELEASED_AT: &str = "Thời gian xả vải";
pub const H_SHIPPED_OUT_AT: &str = "Thời gian xuất kho";
pub const H_STATUS: &str = "Trạng thái";
pub const H_HOURS_SINCE_RELEASE: &str = "Số giờ xả";

/// Columns an import file must provide, in template order
pub const IMPORT_HEADERS: [&str; 9] = [
    H_RECEIVED_DATE,
    H_STYLE,
    H_MO,
    H_FABRIC_TYPE,
    H_UNIT,
    H_LOT,
    H_COLOR,
    H_ROLL_NUMBER,
    H_YARDS,
];

const INBOUND_HEADERS: [&str; 14] = [
    H_RECEIVED_DATE,
    H_STYLE,
    H_MO,
    H_FABRIC_TYPE,
    H_UNIT,
    H_LOT,
    H_COLOR,
    H_ROLL_NUMBER,
    H_YARDS,
    H_POSITION,
    H_ID,
    H_RELEASED_AT,
    H_SHIPPED_OUT_AT,
    H_STATUS,
];

const RELEASED_HEADERS: [&str; 13] = [
    H_RECEIVED_DATE,
    H_STYLE,
    H_MO,
    H_FABRIC_TYPE,
    H_UNIT,
    H_LOT,
    H_COLOR,
    H_ROLL_NUMBER,
    H_YARDS,
    H_POSITION,
    H_ID,
    H_RELEASED_AT,
    H_HOURS_SINCE_RELEASE,
];

const SHIPPED_OUT_HEADERS: [&str; 13] = [
    H_RECEIVED_DATE,
    H_STYLE,
    H_MO,
    H_FABRIC_TYPE,
    H_UNIT,
    H_LOT,
    H_COLOR,
    H_ROLL_NUMBER,
    H_YARDS,
    H_POSITION,
    H_ID,
    H_RELEASED_AT,
    H_SHIPPED_OUT_AT,
];

const ON_HAND_HEADERS: [&str; 11] = [
    H_RECEIVED_DATE,
    H_STYLE,
    H_MO,
    H_FABRIC_TYPE,
    H_UNIT,
    H_LOT,
    H_COLOR,
    H_ROLL_NUMBER,
    H_YARDS,
    H_POSITION,
    H_ID,
];

/// Timestamp format used in exported cells
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The five spreadsheet layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportLayout {
    Inbound,
    Released,
    ShippedOut,
    OnHand,
    ImportTemplate,
}

impl From<SearchProfile> for ExportLayout {
    fn from(profile: SearchProfile) -> Self {
        match profile {
            SearchProfile::Inbound => ExportLayout::Inbound,
            SearchProfile::Released => ExportLayout::Released,
            SearchProfile::ShippedOut => ExportLayout::ShippedOut,
            SearchProfile::OnHand => ExportLayout::OnHand,
        }
    }
}

impl ExportLayout {
    pub fn headers(&self) -> &'static [&'static str] {
        match self {
            ExportLayout::Inbound => &INBOUND_HEADERS,
            ExportLayout::Released => &RELEASED_HEADERS,
            ExportLayout::ShippedOut => &SHIPPED_OUT_HEADERS,
            ExportLayout::OnHand => &ON_HAND_HEADERS,
            ExportLayout::ImportTemplate => &IMPORT_HEADERS,
        }
    }

    /// Prefix of the downloaded file name
    pub fn title(&self) -> &'static str {
        match self {
            ExportLayout::Inbound => "Nhập kho vải",
            ExportLayout::Released => "Xả vải",
            ExportLayout::ShippedOut => "Xuất kho",
            ExportLayout::OnHand => "Tồn kho",
            ExportLayout::ImportTemplate => "Mẫu file nhập",
        }
    }

    /// e.g. "Xả vải 05-11-2024 14-03-22.csv"
    pub fn file_name(&self, at: NaiveDateTime) -> String {
        format!("{} {}.csv", self.title(), at.format("%d-%m-%Y %H-%M-%S"))
    }

    /// Render one roll as cells matching `headers()`
    pub fn render_row(&self, roll: &Roll, offset: FixedOffset, now: DateTime<Utc>) -> Vec<String> {
        let mut cells = vec![
            roll.received_date.format("%Y-%m-%d").to_string(),
            roll.style.clone(),
            roll.mo.clone(),
            roll.fabric_type.clone(),
            roll.unit.clone(),
            roll.lot.clone(),
            roll.color.clone(),
            roll.roll_number.to_string(),
            roll.yards.to_string(),
        ];
        if *self == ExportLayout::ImportTemplate {
            return cells;
        }

        cells.push(roll.position_label().to_string());
        cells.push(roll.id.to_string());

        match self {
            ExportLayout::Inbound => {
                cells.push(format_timestamp(roll.released_at, offset));
                cells.push(format_timestamp(roll.shipped_out_at, offset));
                cells.push(roll.status.as_db_str().to_string());
            }
            ExportLayout::Released => {
                cells.push(format_timestamp(roll.released_at, offset));
                cells.push(
                    roll.hours_since_release(now)
                        .map(|h| h.to_string())
                        .unwrap_or_default(),
                );
            }
            ExportLayout::ShippedOut => {
                cells.push(format_timestamp(roll.released_at, offset));
                cells.push(format_timestamp(roll.shipped_out_at, offset));
            }
            ExportLayout::OnHand | ExportLayout::ImportTemplate => {}
        }
        cells
    }
}

/// Format a stored instant in warehouse-local time; missing values become empty cells
pub fn format_timestamp(ts: Option<DateTime<Utc>>, offset: FixedOffset) -> String {
    ts.map(|t| t.with_timezone(&offset).format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default()
}
