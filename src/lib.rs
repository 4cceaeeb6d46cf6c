//! User registration and authentication backend built with Rust.
//!
//! Registers users, verifies credentials, issues JWT bearer tokens, and
//! manages a fixed set of three roles bootstrapped at startup.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;

pub use config::Config;
pub use error::AppError;
pub use handlers::http::AppState;

use axum::routing::{get, post};
use handlers::http;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the API router (auth, health). Used by main and by integration tests.
pub fn create_app(state: AppState) -> axum::Router {
    let auth_routes = axum::Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me));

    axum::Router::new()
        .route("/health", get(http::health))
        .nest("/auth", auth_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
