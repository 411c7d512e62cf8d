//! Onion link extraction
//!
//! This module pulls hidden-service URLs out of fetched pages:
//! - `extract_onion_links` scans raw text, whatever its markup
//! - `extract_anchor_onion_links` also looks inside `<a href>` values, including
//!   percent-encoded redirect targets that search engines wrap results in
//!
//! Only v3 addresses (56 base32 characters) are recognised. Matches are
//! lowercased, which is the only normalization applied to URLs anywhere.

use regex::Regex;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use std::sync::OnceLock;
use url::form_urlencoded;

fn onion_regex() -> &'static Regex {
    static ONION_RE: OnceLock<Regex> = OnceLock::new();
    ONION_RE.get_or_init(|| {
        Regex::new(r"(?i)https?://[a-z2-7]{56}\.onion").expect("onion pattern is valid")
    })
}

/// Extracts every onion URL found in a piece of text
///
/// Pure and total: empty input yields an empty set.
///
/// # Example
///
/// ```
/// use onion_archive::crawler::extract_onion_links;
///
/// let addr = "a".repeat(56);
/// let html = format!(r#"<a href="http://{}.onion/about">x</a>"#, addr);
/// let links = extract_onion_links(&html);
/// assert!(links.contains(&format!("http://{}.onion", addr)));
/// ```
pub fn extract_onion_links(text: &str) -> BTreeSet<String> {
    if text.is_empty() {
        return BTreeSet::new();
    }

    onion_regex()
        .find_iter(text)
        .map(|m| m.as_str().to_ascii_lowercase())
        .collect()
}

/// Extracts onion URLs from a search results page
///
/// Combines a raw-text scan with a pass over anchor targets, decoding query
/// parameters so links like `/redirect?url=http%3A%2F%2F...onion` are found.
pub fn extract_anchor_onion_links(html: &str) -> BTreeSet<String> {
    let mut links = extract_onion_links(html);

    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        links.extend(extract_onion_links(href));

        if let Some((_, query)) = href.split_once('?') {
            for (_, value) in form_urlencoded::parse(query.as_bytes()) {
                links.extend(extract_onion_links(&value));
            }
        }
    }

    links
}
