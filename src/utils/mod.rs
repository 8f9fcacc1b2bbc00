// Utility modules for the URL filter

pub mod html_sanitizer;
pub mod service_error;
pub mod url_classifier;
pub mod url_extractor;

pub use html_sanitizer::rewrite_html;
pub use service_error::ServiceError;
pub use url_classifier::{InvalidUrlKind, RuleSet, UrlClassifier};
pub use url_extractor::extract_urls;
