//! HTTP request handlers

pub mod auth;
pub mod export;
pub mod health;
pub mod labels;
pub mod rolls;
pub mod scan;

pub use auth::{login, logout, me};
pub use export::{export_rolls, export_template};
pub use health::health_check;
pub use labels::print_labels;
pub use rolls::{delete_rolls, import_rolls, search_rolls};
pub use scan::{relocate, release, ship_out};
