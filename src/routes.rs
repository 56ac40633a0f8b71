use axum::Router;
use tower_http::trace::TraceLayer;

use crate::{
    AppState,
    handler::{
        advertisement::{advertisement_handler, my_ads_handler},
        auth::auth_handler,
        review::review_handler,
        users::users_handler,
    },
};

pub fn create_router(app_state: AppState) -> Router {
    let api_route = Router::new()
        .nest("/auth", auth_handler(app_state.clone()))
        .nest("/users", users_handler(app_state.clone()))
        .nest("/ads", advertisement_handler(app_state.clone()))
        .nest("/advs", my_ads_handler(app_state.clone()))
        .nest("/reviews", review_handler(app_state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    Router::new().nest("/api", api_route)
}
