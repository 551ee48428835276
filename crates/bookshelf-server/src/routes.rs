//! HTTP routing
//!
//! Routes are served both at the root and under `/api`.

use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;

use crate::cors::cors;
use crate::handlers;
use crate::state::AppState;

fn api() -> Router<AppState> {
    Router::new()
        .route("/books/{status}", get(handlers::list_by_status))
        .route("/book", post(handlers::create_book))
        .route(
            "/book/{id}",
            put(handlers::update_book).delete(handlers::delete_book),
        )
        .route("/health", get(handlers::health))
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let origin = state.allowed_origin.clone();

    Router::new()
        .merge(api())
        .nest("/api", api())
        .fallback(handlers::not_found)
        .layer(middleware::from_fn_with_state(origin, cors))
        .with_state(state)
}
