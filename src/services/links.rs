// src/services/links.rs

//! Link discovery for second-level crawling.

use std::collections::BTreeSet;

use scraper::{Html, Selector};
use url::Url;

/// Collect every hyperlink on the page, resolved against `base`.
///
/// Only absolute `http`/`https` results are kept. No origin filtering happens
/// here; that is a coordinator policy.
pub fn discover_links(html: &str, base: &Url) -> BTreeSet<Url> {
    let document = Html::parse_document(html);
    discover_document_links(&document, base)
}

/// Same as [`discover_links`] for an already parsed document.
pub fn discover_document_links(document: &Html, base: &Url) -> BTreeSet<Url> {
    let Ok(anchor) = Selector::parse("a[href]") else {
        return BTreeSet::new();
    };

    document
        .select(&anchor)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| base.join(href.trim()).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .collect()
}

/// Whether two URLs share scheme, host and port.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}
