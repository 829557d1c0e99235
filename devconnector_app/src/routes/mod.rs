mod post_routes;
mod profile_routes;
mod user_routes;

use crate::app::App;

use axum::routing::Router;
use entrait::Impl;

#[derive(serde::Serialize, serde::Deserialize, Debug)]
struct MessageBody {
    msg: String,
}

/// Axum API router for the real app.
pub fn api_router() -> axum::Router {
    Router::new().nest(
        "/api",
        Router::new()
            .nest("/users", user_routes::UserRoutes::<Impl<App>>::router())
            .nest("/profile", profile_routes::ProfileRoutes::<Impl<App>>::router())
            .nest("/posts", post_routes::router()),
    )
}
