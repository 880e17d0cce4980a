pub mod auth;
pub mod events;
pub mod users;

use axum::Router;
use axum::routing::{get, post};

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/v1/auth/login", post(auth::login))
        // Users
        .route("/api/v1/users", post(users::register).get(users::list))
        .route(
            "/api/v1/users/{id}",
            get(users::get).patch(users::update).delete(users::delete),
        )
        // Events
        .route("/api/v1/events", post(events::upsert).get(events::list))
        .route("/api/v1/events/live", get(events::live))
        .route(
            "/api/v1/events/{id}",
            axum::routing::put(events::update).delete(events::delete),
        )
}
