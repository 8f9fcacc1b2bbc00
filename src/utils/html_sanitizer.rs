// Rewrites malicious URLs in a document using the verdicts computed for it.
//
// Two passes over one combined pattern of every checked URL:
//   1. href/src attribute values are neutralized and annotated
//   2. every remaining literal occurrence is wrapped in a visible marker
// Matching is textual, not DOM-aware. Safe URLs are part of the pattern too,
// so a malicious URL that is a prefix of a safe one never matches inside it.

use regex::{Captures, Regex, RegexBuilder};
use std::collections::HashMap;
use tracing::debug;

use crate::models::verdict::UrlVerdict;

/// Upper bound for the compiled alternation of all checked URLs
const PATTERN_SIZE_LIMIT: usize = 64 * (1 << 20);

/// Rewrite `document` so that no malicious URL from `verdicts` stays
/// clickable or unmarked. Everything that is not a malicious URL is copied
/// through byte for byte.
pub fn rewrite_html(document: &str, verdicts: &[UrlVerdict]) -> Result<String, regex::Error> {
    if !verdicts.iter().any(|v| v.is_malicious) {
        return Ok(document.to_string());
    }

    let by_url: HashMap<&str, &UrlVerdict> = verdicts
        .iter()
        .filter(|v| !v.url.is_empty())
        .map(|v| (v.url.as_str(), v))
        .collect();

    let alternation = url_alternation(by_url.keys().copied());
    let attribute_pattern = build_pattern(&format!(
        r#"(?i:(href|src))=["']({})["']"#,
        alternation
    ))?;
    let literal_pattern = build_pattern(&alternation)?;

    let rewritten = attribute_pattern.replace_all(document, |caps: &Captures| {
        match by_url.get(&caps[2]) {
            Some(v) if v.is_malicious => blocked_attribute(&caps[1], &caps[2], &v.reason),
            _ => caps[0].to_string(),
        }
    });

    // Second pass also reaches the URL copied into data-original-url
    let rewritten = literal_pattern.replace_all(&rewritten, |caps: &Captures| {
        let url = &caps[0];
        match by_url.get(url) {
            Some(v) if v.is_malicious => blocked_marker(url, &v.reason),
            _ => url.to_string(),
        }
    });

    debug!(
        "Rewrote document: {} bytes in, {} bytes out",
        document.len(),
        rewritten.len()
    );

    Ok(rewritten.into_owned())
}

/// Longest URLs first so that a URL never loses to one of its own prefixes.
fn url_alternation<'a>(urls: impl Iterator<Item = &'a str>) -> String {
    let mut urls: Vec<&str> = urls.collect();
    urls.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    urls.into_iter()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|")
}

fn build_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .size_limit(PATTERN_SIZE_LIMIT)
        .dfa_size_limit(PATTERN_SIZE_LIMIT)
        .build()
}

fn blocked_attribute(attr: &str, url: &str, reason: &str) -> String {
    format!(
        r##"{}="#" data-malicious="true" data-original-url="{}" title="{}""##,
        attr, url, reason
    )
}

fn blocked_marker(url: &str, reason: &str) -> String {
    format!(
        r#"<span class="blocked-url" data-original="{}" data-reason="{}">[BLOCKED: {}]</span>"#,
        url, reason, reason
    )
}
