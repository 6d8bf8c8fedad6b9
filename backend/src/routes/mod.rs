mod auth;
mod docs;
mod health;
mod photos;
mod users;

use aide::axum::{
    routing::{get, post},
    ApiRouter,
};
use axum::middleware;

use crate::middleware::auth_middleware;

/// Creates the router with all handler routes
#[must_use]
pub fn handler() -> ApiRouter {
    let public_routes = ApiRouter::new()
        .merge(docs::handler())
        .api_route("/health", get(health::handler))
        .api_route("/signup", post(auth::signup))
        .api_route("/signin", post(auth::signin));

    let protected_routes = ApiRouter::new()
        .api_route("/user", get(users::get_current_user))
        .api_route("/user/{user_id}/photos", get(photos::get_last_photos))
        .api_route("/user/{user_id}/photo", get(photos::get_last_photo))
        // Raw image bytes, not part of the OpenAPI document
        .route("/photo/{*key}", axum::routing::get(photos::download_photo))
        .layer(middleware::from_fn(auth_middleware));

    public_routes.merge(protected_routes)
}
