// src/utils/url.rs

//! URL manipulation utilities.

use url::Url;

/// Build the blob key for a raw page.
///
/// The scheme is dropped and path separators become underscores, so
/// `https://catalog.example.edu/ug/cs/` under `pages` becomes
/// `pages/catalog.example.edu_ug_cs_.html`.
///
/// # Examples
/// ```
/// use catalog_crawler::utils::url::page_key;
/// use url::Url;
///
/// let url = Url::parse("https://catalog.example.edu/ug/").unwrap();
/// assert_eq!(page_key("pages", &url), "pages/catalog.example.edu_ug_.html");
/// ```
pub fn page_key(prefix: &str, url: &Url) -> String {
    let without_scheme = url
        .as_str()
        .strip_prefix(url.scheme())
        .and_then(|rest| rest.strip_prefix("://"))
        .unwrap_or(url.as_str());

    let name: String = without_scheme
        .chars()
        .map(|c| match c {
            '/' | '\\' | '?' | '#' | '*' | ':' | '"' | '<' | '>' | '|' => '_',
            other => other,
        })
        .collect();

    join_key(prefix, &format!("{name}.html"))
}

/// Join a key prefix and a name with exactly one `/`.
pub fn join_key(prefix: &str, name: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}
