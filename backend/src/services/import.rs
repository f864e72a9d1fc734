//! Bulk roll import from an uploaded spreadsheet (CSV)
//!
//! The header row may be preceded by a single title row. Structural problems
//! abort the whole upload; bad rows are rejected individually and reported
//! with their line number.

use std::sync::Arc;

use serde::Serialize;

use shared::export::{
    H_COLOR, H_FABRIC_TYPE, H_LOT, H_MO, H_RECEIVED_DATE, H_ROLL_NUMBER, H_STYLE, H_UNIT, H_YARDS,
};
use shared::{
    parse_received_date, parse_roll_number, parse_yards, validate_text_field,
    validate_warehouse_scope, NewRoll, Session, MAX_COLOR_LEN, MAX_FABRIC_TYPE_LEN, MAX_LOT_LEN,
    MAX_MO_LEN, MAX_STYLE_LEN, MAX_UNIT_LEN,
};

use crate::error::{AppError, AppResult};
use crate::repository::RollRepository;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Rows searched for the header
const HEADER_SEARCH_ROWS: usize = 2;

/// Import columns: (spreadsheet header, table column)
const COLUMNS: [(&str, &str); 9] = [
    (H_RECEIVED_DATE, "NGAY_NHAN"),
    (H_STYLE, "STYLE"),
    (H_MO, "MO"),
    (H_FABRIC_TYPE, "LOAI_VAI"),
    (H_UNIT, "DVT"),
    (H_LOT, "LOT"),
    (H_COLOR, "MAU"),
    (H_ROLL_NUMBER, "CUON_SO"),
    (H_YARDS, "SO_YARD"),
];

const COL_DATE: usize = 0;
const COL_STYLE: usize = 1;
const COL_MO: usize = 2;
const COL_FABRIC_TYPE: usize = 3;
const COL_UNIT: usize = 4;
const COL_LOT: usize = 5;
const COL_COLOR: usize = 6;
const COL_ROLL_NUMBER: usize = 7;
const COL_YARDS: usize = 8;

/// A row that failed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowRejection {
    pub line: u64,
    pub reason: String,
}

/// Rows that passed validation plus those that did not
#[derive(Debug, Clone, Default)]
pub struct ParsedBatch {
    pub rolls: Vec<NewRoll>,
    pub rejected: Vec<RowRejection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub inserted: u64,
    pub skipped_duplicates: u64,
    pub rejected: Vec<RowRejection>,
}

fn structural(message: impl Into<String>, message_vi: impl Into<String>) -> AppError {
    AppError::Validation {
        field: "file".to_string(),
        message: message.into(),
        message_vi: message_vi.into(),
    }
}

fn normalize(cell: &str) -> String {
    cell.trim().to_lowercase()
}

/// Record positions of the import columns
struct ColumnMap([usize; 9]);

impl ColumnMap {
    /// Match a candidate header record; returns the missing headers on failure
    fn from_record(record: &csv::StringRecord) -> Result<Self, Vec<&'static str>> {
        let cells: Vec<String> = record.iter().map(normalize).collect();
        let mut indexes = [0usize; 9];
        let mut missing = Vec::new();

        for (slot, (header, column)) in COLUMNS.iter().enumerate() {
            let header = normalize(header);
            let column = normalize(column);
            match cells.iter().position(|c| *c == header || *c == column) {
                Some(idx) => indexes[slot] = idx,
                None => missing.push(COLUMNS[slot].0),
            }
        }

        if missing.is_empty() {
            Ok(Self(indexes))
        } else {
            Err(missing)
        }
    }

    fn cell<'r>(&self, record: &'r csv::StringRecord, column: usize) -> &'r str {
        record.get(self.0[column]).unwrap_or("").trim()
    }
}

fn text_cell(
    map: &ColumnMap,
    record: &csv::StringRecord,
    column: usize,
    max_len: usize,
) -> Result<String, String> {
    let value = map.cell(record, column);
    validate_text_field(value, max_len)
        .map_err(|e| format!("{}: {} (max {})", COLUMNS[column].0, e, max_len))?;
    Ok(value.to_string())
}

fn parse_row(map: &ColumnMap, record: &csv::StringRecord, scope: &str) -> Result<NewRoll, String> {
    let received_date = parse_received_date(map.cell(record, COL_DATE))
        .map_err(|e| format!("{}: {}", H_RECEIVED_DATE, e))?;
    let roll_number = parse_roll_number(map.cell(record, COL_ROLL_NUMBER))
        .map_err(|e| format!("{}: {}", H_ROLL_NUMBER, e))?;
    let yards =
        parse_yards(map.cell(record, COL_YARDS)).map_err(|e| format!("{}: {}", H_YARDS, e))?;

    Ok(NewRoll {
        received_date,
        style: text_cell(map, record, COL_STYLE, MAX_STYLE_LEN)?,
        mo: text_cell(map, record, COL_MO, MAX_MO_LEN)?,
        fabric_type: text_cell(map, record, COL_FABRIC_TYPE, MAX_FABRIC_TYPE_LEN)?,
        unit: text_cell(map, record, COL_UNIT, MAX_UNIT_LEN)?,
        lot: text_cell(map, record, COL_LOT, MAX_LOT_LEN)?,
        color: text_cell(map, record, COL_COLOR, MAX_COLOR_LEN)?,
        roll_number,
        yards,
        factory: scope.to_string(),
    })
}

/// Parse an uploaded CSV into validated rolls owned by `scope`
pub fn parse_csv(bytes: &[u8], scope: &str) -> AppResult<ParsedBatch> {
    let data = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    // Cells are decoded per row so one bad byte only rejects its own row
    let records = reader
        .byte_records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            structural(
                format!("Unreadable spreadsheet: {}", e),
                "Không đọc được file nhập",
            )
        })?;

    let mut header: Option<(usize, ColumnMap)> = None;
    let mut fewest_missing: Option<Vec<&'static str>> = None;
    for (idx, record) in records.iter().take(HEADER_SEARCH_ROWS).enumerate() {
        let Ok(record) = csv::StringRecord::from_byte_record(record.clone()) else {
            continue;
        };
        match ColumnMap::from_record(&record) {
            Ok(map) => {
                header = Some((idx, map));
                break;
            }
            Err(missing) => {
                if fewest_missing.as_ref().map_or(true, |m| missing.len() < m.len()) {
                    fewest_missing = Some(missing);
                }
            }
        }
    }

    let (header_idx, map) = header.ok_or_else(|| {
        let missing = fewest_missing
            .map(|m| m.join(", "))
            .unwrap_or_else(|| COLUMNS.map(|(h, _)| h).join(", "));
        structural(
            format!("Missing required columns: {}", missing),
            format!("Thiếu cột bắt buộc: {}", missing),
        )
    })?;

    let mut batch = ParsedBatch::default();
    for (idx, raw) in records.into_iter().enumerate().skip(header_idx + 1) {
        if raw.iter().all(|c| c.iter().all(u8::is_ascii_whitespace)) {
            continue;
        }
        let line = raw
            .position()
            .map(|p| p.line())
            .unwrap_or(idx as u64 + 1);

        let parsed = csv::StringRecord::from_byte_record(raw)
            .map_err(|e| format!("Row is not valid UTF-8 text: {}", e))
            .and_then(|record| parse_row(&map, &record, scope));
        match parsed {
            Ok(roll) => batch.rolls.push(roll),
            Err(reason) => batch.rejected.push(RowRejection { line, reason }),
        }
    }

    if batch.rolls.is_empty() && batch.rejected.is_empty() {
        return Err(structural(
            "The spreadsheet has no data rows",
            "File nhập không có dữ liệu",
        ));
    }

    Ok(batch)
}

#[derive(Clone)]
pub struct ImportService {
    rolls: Arc<dyn RollRepository>,
}

impl ImportService {
    pub fn new(rolls: Arc<dyn RollRepository>) -> Self {
        Self { rolls }
    }

    /// Validate and append the rows of an uploaded CSV as received rolls
    pub async fn import_csv(&self, session: &Session, bytes: &[u8]) -> AppResult<ImportReport> {
        validate_warehouse_scope(&session.warehouse_scope).map_err(|e| AppError::Validation {
            field: "warehouse_scope".to_string(),
            message: e.to_string(),
            message_vi: "Kho không hợp lệ".to_string(),
        })?;

        let batch = parse_csv(bytes, &session.warehouse_scope)?;
        let outcome = if batch.rolls.is_empty() {
            Default::default()
        } else {
            self.rolls.insert_batch(&batch.rolls).await?
        };

        tracing::info!(
            scope = %session.warehouse_scope,
            inserted = outcome.inserted,
            skipped = outcome.skipped_duplicates,
            rejected = batch.rejected.len(),
            "Roll import finished"
        );

        Ok(ImportReport {
            inserted: outcome.inserted,
            skipped_duplicates: outcome.skipped_duplicates,
            rejected: batch.rejected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    const HEADER: &str = "Ngày nhận,Style,MO,Loại vải,ĐVT,Lot,Màu,Cuộn số,Số yard\n";

    #[test]
    fn test_parse_with_bom_and_title_row() {
        let csv = format!(
            "\u{feff}NHẬP,,,,,,,,\n{}2024-11-05,ABC,MO1,KNIT,YD,L1,RED,1,\"1,020.505\"\n",
            HEADER
        );
        let batch = parse_csv(csv.as_bytes(), "F1").unwrap();
        assert_eq!(batch.rolls.len(), 1);
        assert_eq!(batch.rolls[0].yards, Decimal::from_str("1020.51").unwrap());
        assert_eq!(batch.rolls[0].factory, "F1");
    }

    #[test]
    fn test_column_names_are_accepted_in_any_order() {
        let csv = "SO_YARD,CUON_SO,MAU,LOT,DVT,LOAI_VAI,MO,STYLE,NGAY_NHAN,EXTRA\n\
                   10.5,3,RED,L1,YD,KNIT,MO1,ABC,05/11/2024,ignored\n";
        let batch = parse_csv(csv.as_bytes(), "F1").unwrap();
        assert_eq!(batch.rolls[0].roll_number, 3);
        assert_eq!(batch.rolls[0].style, "ABC");
        assert_eq!(batch.rolls[0].yards, Decimal::from_str("10.50").unwrap());
    }

    #[test]
    fn test_bad_rows_are_reported_with_line() {
        let csv = format!(
            "{}2024-11-05,ABC,MO1,KNIT,YD,L1,RED,1,abc\n\
             2024-11-05,ABC,MO1,KNIT,YD,L1,RED,2,10\n\
             not-a-date,ABC,MO1,KNIT,YD,L1,RED,3,10\n\
             2024-11-05,ABC,MO1,KNIT,YD,L1,RED,4,-1\n",
            HEADER
        );
        let batch = parse_csv(csv.as_bytes(), "F1").unwrap();
        assert_eq!(batch.rolls.len(), 1);
        let lines: Vec<u64> = batch.rejected.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![2, 4, 5]);
        assert!(batch.rejected[0].reason.starts_with(H_YARDS));
    }

    #[test]
    fn test_over_length_text_is_rejected() {
        let csv = format!(
            "{}2024-11-05,{},MO1,KNIT,YD,L1,RED,1,10\n",
            HEADER,
            "S".repeat(MAX_STYLE_LEN + 1)
        );
        let batch = parse_csv(csv.as_bytes(), "F1").unwrap();
        assert!(batch.rolls.is_empty());
        assert!(batch.rejected[0].reason.starts_with(H_STYLE));
    }

    #[test]
    fn test_missing_header_aborts() {
        let csv = "Ngày nhận,Style,MO\n2024-11-05,ABC,MO1\n";
        let err = parse_csv(csv.as_bytes(), "F1").unwrap_err();
        assert!(err.to_string().contains("Missing required columns"));
    }

    #[test]
    fn test_header_only_aborts() {
        let err = parse_csv(HEADER.as_bytes(), "F1").unwrap_err();
        assert!(err.to_string().contains("no data rows"));
    }

    #[test]
    fn test_blank_rows_are_skipped() {
        let csv = format!("{},,,,,,,,\n2024-11-05,ABC,MO1,KNIT,YD,L1,RED,1,10\n", HEADER);
        let batch = parse_csv(csv.as_bytes(), "F1").unwrap();
        assert_eq!(batch.rolls.len(), 1);
        assert!(batch.rejected.is_empty());
    }

    #[test]
    fn test_undecodable_row_is_rejected_alone() {
        let mut bytes = HEADER.as_bytes().to_vec();
        bytes.extend_from_slice(b"2024-11-05,ABC,MO1,KNIT,YD,L1,R\xFFD,1,10\n");
        bytes.extend_from_slice(b"2024-11-05,ABC,MO1,KNIT,YD,L1,RED,2,10\n");

        let batch = parse_csv(&bytes, "F1").unwrap();
        assert_eq!(batch.rolls.len(), 1);
        assert_eq!(batch.rolls[0].roll_number, 2);
        assert_eq!(batch.rejected.len(), 1);
        assert_eq!(batch.rejected[0].line, 2);
        assert!(batch.rejected[0].reason.contains("UTF-8"));
    }
}
