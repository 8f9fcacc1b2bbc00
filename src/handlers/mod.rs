// HTTP handlers for the URL filter API

pub mod docs;
pub mod url_check;

use crate::{app::AppState, app_config::AppConfig};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

/// Room for multipart boundaries and headers on top of the document itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

// URL filter routes
pub fn api_routes(config: &AppConfig) -> Router<AppState> {
    let router = Router::new()
        .route("/", get(url_check::api_index))
        .route("/api/check-url", post(url_check::check_url))
        .route(
            "/api/filter-html",
            post(url_check::filter_html).layer(DefaultBodyLimit::max(
                config.filter.max_html_bytes + MULTIPART_OVERHEAD_BYTES,
            )),
        );

    if config.features.enable_api_docs {
        router.route("/api/docs/openapi.json", get(docs::serve_openapi_spec))
    } else {
        router
    }
}
