// URL extraction from HTML or plain text documents
// Pattern-based scan over the raw text; no DOM parsing

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

lazy_static! {
    /// Candidate URL pattern.
    ///
    /// The first alternative covers bracketed IPv6 hosts, which contain `:` and
    /// would otherwise be cut at the opening bracket. The second covers every
    /// allowed scheme plus bare `www.` prefixes. A match stops at whitespace,
    /// quotes, angle brackets and the other delimiters markup uses around URLs.
    static ref URL_PATTERN: Regex = Regex::new(concat!(
        r#"(?i:https?|ftp)://\[[0-9A-Fa-f:.]+\][^\s"'<>(){}\[\],;]*"#,
        r"|",
        r#"(?:(?i:https?|ftp|file|mailto|data|irc|gopher|telnet|nntp|news|ldap|ssh)://|(?i:www)\.)[^\s"'<>(){}\[\],;]+"#,
    ))
    .expect("Invalid URL extraction regex");
}

/// Return every distinct URL-like substring of `document`, in order of first
/// appearance. Matches are returned exactly as they appear in the text.
pub fn extract_urls(document: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    let mut total = 0usize;

    for m in URL_PATTERN.find_iter(document) {
        total += 1;
        if seen.insert(m.as_str()) {
            urls.push(m.as_str().to_string());
        }
    }

    debug!(
        "Extracted {} distinct URLs ({} occurrences) from {} bytes",
        urls.len(),
        total,
        document.len()
    );

    urls
}
