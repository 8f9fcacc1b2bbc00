// Classification outcomes shared by the classifier, the cache and the filter service

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Why a URL was blocked. Exactly one reason is reported per URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockReason {
    TooLong,
    InvalidFormat,
    InvalidScheme,
    SuspiciousFileType,
    BlacklistedDomain,
    SuspiciousKeywords,
    IpAddressHost,
}

impl BlockReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockReason::TooLong => "URL too long",
            BlockReason::InvalidFormat => "invalid format",
            BlockReason::InvalidScheme => "invalid scheme",
            BlockReason::SuspiciousFileType => "suspicious file type",
            BlockReason::BlacklistedDomain => "domain is blacklisted",
            BlockReason::SuspiciousKeywords => "contains suspicious keywords",
            BlockReason::IpAddressHost => "direct link to an IP address",
        }
    }
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one URL.
///
/// `reason` is empty exactly when `is_malicious` is false; the constructors
/// are the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    is_malicious: bool,
    reason: String,
}

impl Verdict {
    pub fn safe() -> Self {
        Self {
            is_malicious: false,
            reason: String::new(),
        }
    }

    pub fn blocked(reason: BlockReason) -> Self {
        Self {
            is_malicious: true,
            reason: reason.as_str().to_string(),
        }
    }

    /// Rebuild a verdict from stored parts. Returns `None` for a malicious
    /// verdict without a reason, which cannot have been produced by us.
    pub fn from_parts(is_malicious: bool, reason: String) -> Option<Self> {
        match (is_malicious, reason.is_empty()) {
            (false, _) => Some(Self::safe()),
            (true, false) => Some(Self {
                is_malicious,
                reason,
            }),
            (true, true) => None,
        }
    }

    pub fn is_malicious(&self) -> bool {
        self.is_malicious
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Verdict for one distinct URL found in a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UrlVerdict {
    pub url: String,
    pub is_malicious: bool,
    #[serde(default)]
    pub reason: String,
}

impl UrlVerdict {
    pub fn new(url: impl Into<String>, verdict: &Verdict) -> Self {
        Self {
            url: url.into(),
            is_malicious: verdict.is_malicious(),
            reason: verdict.reason().to_string(),
        }
    }
}

/// Output of document filtering: the rewritten document plus one verdict per
/// distinct URL, in order of first appearance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterResult {
    pub filtered_html: String,
    pub url_results: Vec<UrlVerdict>,
}

impl FilterResult {
    pub fn malicious_count(&self) -> usize {
        self.url_results.iter().filter(|r| r.is_malicious).count()
    }
}
