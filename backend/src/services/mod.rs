//! Business logic services for the fabric warehouse tracker

pub mod auth;
pub mod export;
pub mod import;
pub mod label;
pub mod lifecycle;
pub mod rolls;
pub mod search;
pub mod session;

pub use auth::{AuthService, PersonnelDirectory, PgPersonnelDirectory};
pub use export::ExportService;
pub use import::ImportService;
pub use label::{LabelPrinter, LabelService, NetworkPrinter};
pub use lifecycle::LifecycleService;
pub use rolls::RollService;
pub use search::SearchService;
pub use session::SessionStore;

use crate::error::{AppError, AppResult};

/// Gate for irreversible actions: nothing runs until the operator confirms
pub fn require_confirmation(action: &str, count: usize, confirm: bool) -> AppResult<()> {
    if confirm {
        Ok(())
    } else {
        Err(AppError::ConfirmationRequired {
            action: action.to_string(),
            count,
        })
    }
}
