// OpenAPI document for the URL filter API

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use utoipa::OpenApi;

use crate::models::url_check::{
    CheckUrlRequest, CheckUrlResponse, FilterHtmlResponse, FilterHtmlUpload,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "URL Filter API",
        description = "Heuristic URL classification and HTML link sanitization"
    ),
    paths(
        crate::handlers::url_check::api_index,
        crate::handlers::url_check::check_url,
        crate::handlers::url_check::filter_html,
        crate::health_check,
    ),
    components(
        schemas(
            CheckUrlRequest,
            CheckUrlResponse,
            FilterHtmlResponse,
            FilterHtmlUpload,
        )
    ),
    tags(
        (name = "URL Filter", description = "URL classification and document filtering"),
        (name = "Health", description = "Service health")
    )
)]
pub struct ApiDoc;

/// Serve OpenAPI JSON specification at /api/docs/openapi.json
pub async fn serve_openapi_spec() -> Response {
    match ApiDoc::openapi().to_json() {
        Ok(spec) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            spec,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to render OpenAPI document: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        },
    }
}
