//! Validation utilities for imported roll data
//!
//! Column limits mirror the `DANH_SACH_CUON_VAI` table definition.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

pub const MAX_STYLE_LEN: usize = 20;
pub const MAX_MO_LEN: usize = 30;
pub const MAX_FABRIC_TYPE_LEN: usize = 20;
pub const MAX_UNIT_LEN: usize = 10;
pub const MAX_LOT_LEN: usize = 50;
pub const MAX_COLOR_LEN: usize = 20;
pub const MAX_FACTORY_LEN: usize = 5;
pub const MAX_POSITION_LEN: usize = 20;

/// SO_YARD is DECIMAL(6,2)
pub const YARDS_SCALE: u32 = 2;

/// Largest value DECIMAL(6,2) can hold
pub fn max_yards() -> Decimal {
    Decimal::new(999_999, YARDS_SCALE)
}

// ============================================================================
// Field Validations
// ============================================================================

/// Constrain a yard value to DECIMAL(6,2)
pub fn validate_yards(yards: Decimal) -> Result<Decimal, &'static str> {
    if yards < Decimal::ZERO {
        return Err("Yard value cannot be negative");
    }
    let rounded = yards.round_dp_with_strategy(YARDS_SCALE, RoundingStrategy::MidpointAwayFromZero);
    if rounded > max_yards() {
        return Err("Yard value exceeds 9999.99");
    }
    Ok(rounded)
}

/// Parse and constrain a yard cell; thousands separators are accepted
pub fn parse_yards(raw: &str) -> Result<Decimal, &'static str> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Err("Yard value is required");
    }
    let value = Decimal::from_str(&cleaned).map_err(|_| "Yard value must be numeric")?;
    validate_yards(value)
}

/// Parse a roll number; spreadsheet exports often render integers as "3.0"
pub fn parse_roll_number(raw: &str) -> Result<i32, &'static str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("Roll number is required");
    }
    if let Ok(n) = trimmed.parse::<i32>() {
        return Ok(n);
    }
    let value = Decimal::from_str(trimmed).map_err(|_| "Roll number must be an integer")?;
    if !value.fract().is_zero() {
        return Err("Roll number must be an integer");
    }
    value.to_i32().ok_or("Roll number is out of range")
}

/// Date formats accepted for the received date
const RECEIVED_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];

/// Parse a received date. A trailing time part (e.g. "2024-03-01 00:00:00") is ignored.
pub fn parse_received_date(raw: &str) -> Result<NaiveDate, &'static str> {
    let date_part = raw.trim().split_whitespace().next().unwrap_or("");
    if date_part.is_empty() {
        return Err("Received date is required");
    }
    RECEIVED_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
        .ok_or("Received date is not a valid date")
}

/// Validate a text column against its maximum length in characters
pub fn validate_text_field(value: &str, max_len: usize) -> Result<(), &'static str> {
    if value.chars().count() > max_len {
        return Err("Text value is too long for its column");
    }
    Ok(())
}

/// Validate a scanned position code before it is written to VI_TRI
pub fn validate_position(code: &str) -> Result<(), &'static str> {
    if code.chars().count() > MAX_POSITION_LEN {
        return Err("Position code is longer than 20 characters");
    }
    Ok(())
}

/// Validate a warehouse scope value before it is written to NHA_MAY
pub fn validate_warehouse_scope(scope: &str) -> Result<(), &'static str> {
    if scope.trim().is_empty() {
        return Err("Warehouse scope is required");
    }
    validate_text_field(scope, MAX_FACTORY_LEN)
}
