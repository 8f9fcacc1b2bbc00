// Request/response bodies for the URL check HTTP API

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::verdict::{FilterResult, UrlVerdict, Verdict};

/// Single URL check request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[schema(example = json!({ "url": "https://example.com/page" }))]
pub struct CheckUrlRequest {
    // Format and scheme policy is applied by the service, not here
    #[validate(length(min = 1, max = 65536, message = "url must be 1-65536 characters"))]
    pub url: String,
}

/// Verdict for a single URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "url": "https://malicious.com",
    "is_malicious": true,
    "reason": "domain is blacklisted"
}))]
pub struct CheckUrlResponse {
    pub url: String,
    pub is_malicious: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
}

impl CheckUrlResponse {
    pub fn new(url: impl Into<String>, verdict: &Verdict) -> Self {
        Self {
            url: url.into(),
            is_malicious: verdict.is_malicious(),
            reason: verdict.reason().to_string(),
        }
    }
}

impl From<UrlVerdict> for CheckUrlResponse {
    fn from(v: UrlVerdict) -> Self {
        Self {
            url: v.url,
            is_malicious: v.is_malicious,
            reason: v.reason,
        }
    }
}

/// Filtered document plus the verdict for every distinct URL in it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FilterHtmlResponse {
    pub filtered_html: String,
    pub url_results: Vec<CheckUrlResponse>,
}

impl From<FilterResult> for FilterHtmlResponse {
    fn from(result: FilterResult) -> Self {
        Self {
            filtered_html: result.filtered_html,
            url_results: result.url_results.into_iter().map(Into::into).collect(),
        }
    }
}

/// Multipart form accepted by the filter endpoint (documentation only)
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct FilterHtmlUpload {
    #[schema(value_type = String, format = Binary)]
    pub html_file: Vec<u8>,
}
