// URL check and HTML filter endpoints

use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection, Multipart, State},
    http::{HeaderName, HeaderValue},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::{info, warn};
use validator::Validate;

use crate::{
    app::AppState,
    models::url_check::{CheckUrlRequest, CheckUrlResponse, FilterHtmlResponse},
    services::url_filter::CacheStatus,
    utils::service_error::ServiceError,
};

/// Multipart field carrying the document
pub const HTML_FILE_FIELD: &str = "html_file";

/// Reports whether a verdict came from the cache
pub const CACHE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-verdict-cache");

// =============================================================================
// URL FILTER HANDLERS
// =============================================================================

/// Check a single URL
/// POST /api/check-url
#[utoipa::path(
    post,
    path = "/api/check-url",
    tag = "URL Filter",
    operation_id = "checkUrl",
    request_body = CheckUrlRequest,
    responses(
        (status = 200, description = "URL classified", body = CheckUrlResponse),
        (status = 400, description = "Malformed request, invalid URL or disallowed scheme"),
        (status = 500, description = "Verdict could not be cached (strict mode) or internal error")
    )
)]
pub async fn check_url(
    State(state): State<AppState>,
    payload: Result<Json<CheckUrlRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ServiceError> {
    let Json(request) = payload?;
    request.validate()?;

    let outcome = state.url_filter.check_url(&request.url).await?;

    let cache_status = match &outcome.cache_status {
        CacheStatus::Hit => "hit",
        CacheStatus::Stored => "stored",
        CacheStatus::StoreFailed(reason) => {
            warn!("Serving uncached verdict for {}: {}", request.url, reason);
            "store-failed"
        },
    };

    let response = CheckUrlResponse::new(request.url, &outcome.verdict);

    Ok((
        [(CACHE_STATUS_HEADER, HeaderValue::from_static(cache_status))],
        Json(response),
    ))
}

/// Filter an uploaded HTML document
/// POST /api/filter-html
#[utoipa::path(
    post,
    path = "/api/filter-html",
    tag = "URL Filter",
    operation_id = "filterHtml",
    request_body(
        content = crate::models::url_check::FilterHtmlUpload,
        content_type = "multipart/form-data"
    ),
    responses(
        (status = 200, description = "Document filtered", body = FilterHtmlResponse),
        (status = 400, description = "Missing html_file field or document is not UTF-8"),
        (status = 413, description = "Document exceeds the configured size limit"),
        (status = 500, description = "Verdict could not be cached (strict mode) or internal error")
    )
)]
pub async fn filter_html(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<FilterHtmlResponse>, ServiceError> {
    let mut multipart = multipart?;
    let mut document = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(HTML_FILE_FIELD) {
            document = Some(field.bytes().await?);
            break;
        }
    }

    let bytes = document.ok_or_else(|| {
        ServiceError::BadRequest(format!("Missing '{}' form field", HTML_FILE_FIELD))
    })?;

    let max_bytes = state.config.filter.max_html_bytes;
    if bytes.len() > max_bytes {
        return Err(ServiceError::PayloadTooLarge(format!(
            "Document is {} bytes, limit is {}",
            bytes.len(),
            max_bytes
        )));
    }

    let html = std::str::from_utf8(&bytes)
        .map_err(|_| ServiceError::BadRequest("Document must be UTF-8 encoded".to_string()))?;

    info!("Filtering uploaded document ({} bytes)", bytes.len());
    let result = state.url_filter.filter_html(html).await?;

    Ok(Json(result.into()))
}

/// Service index
/// GET /
#[utoipa::path(
    get,
    path = "/",
    tag = "URL Filter",
    operation_id = "apiIndex",
    responses(
        (status = 200, description = "Service description and available endpoints")
    )
)]
pub async fn api_index(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "service": "url-filter",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment.to_string(),
        "endpoints": {
            "check_url": "POST /api/check-url",
            "filter_html": format!("POST /api/filter-html (multipart field '{}')", HTML_FILE_FIELD),
            "health": "GET /health"
        }
    }))
}
