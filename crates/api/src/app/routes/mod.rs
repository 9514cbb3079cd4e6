use axum::{Router, routing::get};

pub mod system;
pub mod triggers;
pub mod units;

/// Router for all inventory endpoints (health is mounted separately).
pub fn router() -> Router {
    Router::new()
        .route("/units", get(units::list_units))
        .nest("/units", units::router())
        .nest("/events", triggers::router())
}
