pub mod url_check;
pub mod verdict;

// Re-export common types
pub use url_check::{CheckUrlRequest, CheckUrlResponse, FilterHtmlResponse, FilterHtmlUpload};
pub use verdict::{BlockReason, FilterResult, UrlVerdict, Verdict};
