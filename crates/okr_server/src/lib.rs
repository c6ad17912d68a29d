//! HTTP surface for the OKR tracker.
//!
//! # Responsibility
//! - Map REST routes onto `okr_core` services.
//! - Translate core errors into JSON error bodies with stable status codes.
//!
//! # Invariants
//! - Storage access is serialized through one connection lock.
//! - Generator calls never run while the storage lock is held.

pub mod config;
pub mod cors;
pub mod error;
pub mod generator;
pub mod handlers;
pub mod state;

use axum::routing::{get, post, put};
use axum::{middleware, Router};

pub use config::ServerConfig;
pub use error::ApiError;
pub use generator::{GeneratorError, HttpOkrGenerator, OkrGenerator, UnavailableGenerator};
pub use state::AppState;

/// Builds the full `/api` router over `state`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/dashboard", get(handlers::dashboard))
        .route(
            "/api/objectives",
            get(handlers::list_objectives).post(handlers::create_objective),
        )
        .route(
            "/api/objectives/{id}",
            get(handlers::get_objective)
                .put(handlers::update_objective)
                .delete(handlers::delete_objective),
        )
        .route(
            "/api/objectives/{id}/key-results",
            post(handlers::create_key_result),
        )
        .route(
            "/api/key-results/{id}",
            put(handlers::update_key_result).delete(handlers::delete_key_result),
        )
        .route(
            "/api/key-results/{id}/progress",
            put(handlers::update_key_result_progress),
        )
        .route(
            "/api/key-results/{id}/initiatives",
            post(handlers::create_initiative),
        )
        .route(
            "/api/initiatives/{id}",
            put(handlers::update_initiative).delete(handlers::delete_initiative),
        )
        .route("/api/generate-okrs", post(handlers::generate_okrs))
        .route(
            "/api/generate-and-create-okrs",
            post(handlers::generate_and_create_okrs),
        )
        .layer(middleware::from_fn(cors::cors_middleware))
        .with_state(state)
}
