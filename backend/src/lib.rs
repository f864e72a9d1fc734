//! Fabric Warehouse Tracker - Backend
//!
//! Local command API for a single-warehouse fabric roll tracker: bulk
//! import, QR scan transitions, relocation, inventory views, spreadsheet
//! export and label printing.

use std::sync::Arc;

use axum::{routing::get, Router};
use sqlx::PgPool;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod repository;
pub mod routes;
pub mod services;

pub use config::Config;

use repository::{PgRollRepository, RollRepository};
use services::{LabelPrinter, NetworkPrinter, PersonnelDirectory, PgPersonnelDirectory, SessionStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub sessions: SessionStore,
    pub rolls: Arc<dyn RollRepository>,
    pub personnel: Arc<dyn PersonnelDirectory>,
    pub printer: Arc<dyn LabelPrinter>,
}

impl AppState {
    /// Wire the PostgreSQL-backed collaborators and the configured printer
    pub fn new(db: PgPool, config: Config) -> Self {
        let rolls = PgRollRepository::new(db.clone(), config.warehouse.offset());
        let personnel = PgPersonnelDirectory::new(db.clone());
        let printer = NetworkPrinter::from_config(&config.printer);

        Self {
            db,
            config: Arc::new(config),
            sessions: SessionStore::new(),
            rolls: Arc::new(rolls),
            personnel: Arc::new(personnel),
            printer: Arc::new(printer),
        }
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Fabric Warehouse Tracker API v1.0"
}
