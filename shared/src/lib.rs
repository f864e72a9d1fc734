//! Shared types and models for the fabric warehouse tracker
//!
//! Pure domain code: roll lifecycle rules, scan classification, search
//! profiles, import validation and spreadsheet layouts. No I/O lives here.

pub mod export;
pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
