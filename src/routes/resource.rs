//! Resource routes. Paths are parameterized; handlers resolve the resource key through the registry.

use crate::handlers::resource::{
    create, delete as delete_handler, export, import, list, list_resources, read, update,
};
use crate::state::AppState;
use axum::{extract::DefaultBodyLimit, routing::get, routing::post, Router};
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;

/// `/resources/:resource/import` and `/export` take precedence over `/:id`, so a text
/// primary key spelled `import` or `export` is not addressable by id.
pub fn resource_routes(state: AppState) -> Router {
    let body_limit = state.settings.max_body_bytes;
    Router::new()
        .route("/resources", get(list_resources))
        .route("/resources/:resource", get(list).post(create))
        .route("/resources/:resource/import", post(import))
        .route("/resources/:resource/export", get(export))
        .route(
            "/resources/:resource/:id",
            get(read).put(update).patch(update).delete(delete_handler),
        )
        .layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(body_limit)),
        )
        .with_state(state)
}
