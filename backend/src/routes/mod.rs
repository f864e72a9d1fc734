//! Route definitions for the fabric warehouse tracker

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes
        .nest("/auth", auth_routes(state.clone()))
        // Protected routes - scanner transitions
        .nest("/scan", scan_routes(state.clone()))
        // Protected routes - roll search, import and deletion
        .nest("/rolls", roll_routes(state.clone()))
        // Protected routes - spreadsheet downloads
        .nest("/exports", export_routes(state.clone()))
        // Protected routes - label printing
        .nest("/labels", label_routes(state))
}

/// Authentication routes
fn auth_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/logout", post(handlers::logout))
        .route("/me", get(handlers::me))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/login", post(handlers::login))
        .merge(protected)
}

/// Scan routes (protected)
fn scan_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/release", post(handlers::release))
        .route("/ship-out", post(handlers::ship_out))
        .route("/relocate", post(handlers::relocate))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Roll routes (protected)
fn roll_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/import", post(handlers::import_rolls))
        .route("/delete", post(handlers::delete_rolls))
        .route("/:profile", get(handlers::search_rolls))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Export routes (protected)
fn export_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/template", get(handlers::export_template))
        .route("/:profile", get(handlers::export_rolls))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Label routes (protected)
fn label_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/print", post(handlers::print_labels))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
