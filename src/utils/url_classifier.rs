// Heuristic URL classification
// Static string/pattern rules only: no fetching, no reputation lookups

use lazy_static::lazy_static;
use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::Ipv6Addr;
use thiserror::Error;
use tracing::debug;

use crate::app_config::{MAX_URL_LENGTH_LIMIT, MIN_URL_LENGTH_LIMIT};
use crate::models::verdict::{BlockReason, Verdict};

// =============================================================================
// STATIC PATTERNS AND RULE TABLES
// =============================================================================

lazy_static! {
    /// Dotted quad host. Octet ranges are not checked here.
    static ref IPV4_HOST_PATTERN: Regex =
        Regex::new(r"^(?:[0-9]{1,3}\.){3}[0-9]{1,3}$").expect("Invalid IPv4 host regex");

    static ref SCHEME_PATTERN: Regex =
        Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*$").expect("Invalid scheme regex");
}

/// Characters that may not appear in a host
const FORBIDDEN_HOST_CHARS: &[char] = &['<', '>', '"', '{', '}', '|', '\\', '^', '`'];

/// Schemes a URL may use
pub const ALLOWED_SCHEMES: &[&str] = &[
    "http", "https", "ftp", "file", "mailto", "data", "irc", "gopher", "telnet", "nntp", "news",
    "ldap", "ssh",
];

/// Hosts that are always blocked (exact match)
pub const BLACKLISTED_DOMAINS: &[&str] = &[
    "malicious.com",
    "phish.net",
    "bad.site",
    "malware.com",
    "trojan-download.com",
];

/// Substrings that mark a URL as suspicious anywhere in it
pub const SUSPICIOUS_KEYWORDS: &[&str] = &[
    "phish", "hack", "malware", "trojan", "virus", "warez", "crack", "keygen",
];

/// Path suffixes of executable or script downloads
pub const SUSPICIOUS_EXTENSIONS: &[&str] =
    &[".exe", ".bat", ".dll", ".scr", ".vbs", ".ps1", ".cmd", ".msi"];

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Structural problems that make a string unusable as a URL
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvalidUrlKind {
    #[error("invalid URL format: {0}")]
    Format(String),

    #[error("URL scheme not allowed: {0}")]
    Scheme(String),
}

impl InvalidUrlKind {
    pub fn block_reason(&self) -> BlockReason {
        match self {
            InvalidUrlKind::Format(_) => BlockReason::InvalidFormat,
            InvalidUrlKind::Scheme(_) => BlockReason::InvalidScheme,
        }
    }
}

// =============================================================================
// RAW URL PARTS
// =============================================================================

/// Scheme, host and path taken straight from the URL text.
///
/// Nothing is normalized beyond lowercasing scheme and host: numeric hosts
/// stay as written, so `999.1.1.1` is still a dotted quad and `0x7f000001`
/// is not one. The path is percent-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlParts {
    pub scheme: String,
    pub host: String,
    pub path: String,
}

impl UrlParts {
    /// Split `scheme://[userinfo@]host[:port][/path][?query][#fragment]`
    pub fn parse(raw: &str) -> Result<Self, InvalidUrlKind> {
        if raw.chars().any(|c| c.is_ascii_control()) {
            return Err(InvalidUrlKind::Format("control character in URL".to_string()));
        }

        let (scheme, rest) = raw
            .split_once("://")
            .ok_or_else(|| InvalidUrlKind::Format("missing scheme or host".to_string()))?;

        if !SCHEME_PATTERN.is_match(scheme) {
            return Err(InvalidUrlKind::Format(format!("malformed scheme: {}", scheme)));
        }

        let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
        let (authority, tail) = rest.split_at(authority_end);

        let host = parse_host(authority)?;

        let path = if tail.starts_with('/') {
            let end = tail.find(['?', '#']).unwrap_or(tail.len());
            percent_decode_str(&tail[..end]).decode_utf8_lossy().into_owned()
        } else {
            String::new()
        };

        Ok(Self {
            scheme: scheme.to_lowercase(),
            host,
            path,
        })
    }
}

/// Host of an authority component, without userinfo, port or IPv6 brackets
fn parse_host(authority: &str) -> Result<String, InvalidUrlKind> {
    let host_port = authority
        .rsplit_once('@')
        .map_or(authority, |(_, host_port)| host_port);

    let (host, port) = if let Some(bracketed) = host_port.strip_prefix('[') {
        let (literal, after) = bracketed
            .split_once(']')
            .ok_or_else(|| InvalidUrlKind::Format("unterminated IPv6 host".to_string()))?;

        let address = literal.split('%').next().unwrap_or_default();
        if address.parse::<Ipv6Addr>().is_err() {
            return Err(InvalidUrlKind::Format(format!("invalid IPv6 host: {}", literal)));
        }

        let port = match after {
            "" => None,
            _ => Some(after.strip_prefix(':').ok_or_else(|| {
                InvalidUrlKind::Format(format!("unexpected text after host: {}", after))
            })?),
        };
        (literal, port)
    } else {
        match host_port.rsplit_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (host_port, None),
        }
    };

    if let Some(port) = port {
        if !port.chars().all(|c| c.is_ascii_digit()) {
            return Err(InvalidUrlKind::Format(format!("invalid port: {}", port)));
        }
    }

    if host.is_empty() {
        return Err(InvalidUrlKind::Format("missing host".to_string()));
    }

    if host.contains(FORBIDDEN_HOST_CHARS) || host.chars().any(char::is_whitespace) {
        return Err(InvalidUrlKind::Format(format!("invalid character in host: {}", host)));
    }

    Ok(host.to_lowercase())
}

// =============================================================================
// RULE SET
// =============================================================================

/// Immutable rule tables, built once and owned by the classifier.
/// All entries are stored lowercased.
#[derive(Debug, Clone)]
pub struct RuleSet {
    allowed_schemes: HashSet<String>,
    blacklist: HashSet<String>,
    keywords: Vec<String>,
    extensions: Vec<String>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new(BLACKLISTED_DOMAINS, SUSPICIOUS_KEYWORDS, SUSPICIOUS_EXTENSIONS)
    }
}

impl RuleSet {
    pub fn new<S: AsRef<str>>(blacklist: &[S], keywords: &[S], extensions: &[S]) -> Self {
        let lower = |s: &S| s.as_ref().to_lowercase();

        Self {
            allowed_schemes: ALLOWED_SCHEMES.iter().map(|s| s.to_string()).collect(),
            blacklist: blacklist.iter().map(lower).collect(),
            keywords: keywords.iter().map(lower).collect(),
            extensions: extensions.iter().map(lower).collect(),
        }
    }

    pub fn is_allowed_scheme(&self, scheme: &str) -> bool {
        self.allowed_schemes.contains(&scheme.to_lowercase())
    }

    fn suspicious_extension(&self, path: &str) -> Option<&str> {
        let path = path.to_lowercase();
        self.extensions
            .iter()
            .find(|ext| path.ends_with(ext.as_str()))
            .map(String::as_str)
    }

    fn is_blacklisted(&self, host: &str) -> bool {
        self.blacklist.contains(&host.to_lowercase())
    }

    fn suspicious_keyword(&self, url: &str) -> Option<&str> {
        let url = url.to_lowercase();
        self.keywords
            .iter()
            .find(|kw| url.contains(kw.as_str()))
            .map(String::as_str)
    }
}

// =============================================================================
// CLASSIFIER
// =============================================================================

/// Decides whether a single URL is malicious.
///
/// Rules are evaluated in a fixed order and the first one that matches
/// determines the reported reason:
///
/// 1. length above the configured maximum
/// 2. no scheme or no host
/// 3. scheme outside the allow-list
/// 4. suspicious file extension on the path
/// 5. blacklisted host
/// 6. suspicious keyword anywhere in the URL
/// 7. IPv4 literal host
///
/// The classifier holds no mutable state and is safe to share between tasks.
#[derive(Debug, Clone)]
pub struct UrlClassifier {
    rules: RuleSet,
    max_url_length: usize,
}

impl Default for UrlClassifier {
    fn default() -> Self {
        Self::new(RuleSet::default(), MAX_URL_LENGTH_LIMIT)
    }
}

impl UrlClassifier {
    /// `max_url_length` is clamped into the supported range.
    pub fn new(rules: RuleSet, max_url_length: usize) -> Self {
        Self {
            rules,
            max_url_length: max_url_length.clamp(MIN_URL_LENGTH_LIMIT, MAX_URL_LENGTH_LIMIT),
        }
    }

    pub fn max_url_length(&self) -> usize {
        self.max_url_length
    }

    /// Check structure and scheme only
    pub fn validate(&self, url_str: &str) -> Result<UrlParts, InvalidUrlKind> {
        let parts = UrlParts::parse(url_str)?;

        if !self.rules.is_allowed_scheme(&parts.scheme) {
            return Err(InvalidUrlKind::Scheme(parts.scheme));
        }

        Ok(parts)
    }

    /// Classify a URL
    pub fn classify(&self, url_str: &str) -> Verdict {
        match self.first_matching_rule(url_str) {
            Some(reason) => {
                debug!("URL {} classified as malicious: {}", url_str, reason);
                Verdict::blocked(reason)
            },
            None => Verdict::safe(),
        }
    }

    fn first_matching_rule(&self, url_str: &str) -> Option<BlockReason> {
        if url_str.len() > self.max_url_length {
            return Some(BlockReason::TooLong);
        }

        let parts = match self.validate(url_str) {
            Ok(parts) => parts,
            Err(kind) => return Some(kind.block_reason()),
        };

        if self.rules.suspicious_extension(&parts.path).is_some() {
            return Some(BlockReason::SuspiciousFileType);
        }

        let host = parts.host.as_str();

        if self.rules.is_blacklisted(host) {
            return Some(BlockReason::BlacklistedDomain);
        }

        if self.rules.suspicious_keyword(url_str).is_some() {
            return Some(BlockReason::SuspiciousKeywords);
        }

        if IPV4_HOST_PATTERN.is_match(host) {
            return Some(BlockReason::IpAddressHost);
        }

        None
    }
}

// =============================================================================
// TESTS
// =============================================================================
