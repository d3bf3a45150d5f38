// src/services/fetcher.rs

//! Page fetcher.
//!
//! Performs one HTTP GET per call with no retry and classifies failures as
//! [`AppError::Fetch`]. Nothing is cached here; caching keys on content, not URLs.

use encoding_rs::{Encoding, UTF_8};
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use url::Url;

use crate::error::{AppError, FetchCause, Result};
use crate::models::CrawlerConfig;
use crate::utils::http::create_async_client;

/// A fetched page: raw bytes plus the decoded text.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: Url,
    /// Response body exactly as received
    pub body: Vec<u8>,
    /// Charset declared in the Content-Type header, lowercased
    pub encoding: Option<String>,
    /// Body decoded with the declared (or default UTF-8) charset; malformed
    /// sequences become U+FFFD
    pub text: String,
}

/// HTTP page fetcher.
#[derive(Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    /// Create a fetcher with a client configured from crawler settings.
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        Ok(Self::with_client(create_async_client(config)?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Fetch a URL. Non-2xx responses and transport errors surface as
    /// `AppError::Fetch`.
    pub async fn fetch(&self, url: &Url) -> Result<Page> {
        log::debug!("Fetching {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| AppError::fetch(url.as_str(), FetchCause::from_reqwest(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::fetch(
                url.as_str(),
                FetchCause::Status(status.as_u16()),
            ));
        }

        let encoding = declared_charset(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::fetch(url.as_str(), FetchCause::from_reqwest(&e)))?
            .to_vec();

        let text = decode(&body, encoding.as_deref());

        log::debug!("Fetched {} ({} bytes)", url, body.len());

        Ok(Page {
            url: url.clone(),
            body,
            encoding,
            text,
        })
    }
}

/// Read the `charset` parameter of the Content-Type header.
fn declared_charset(headers: &HeaderMap) -> Option<String> {
    let content_type = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches('"').to_ascii_lowercase())
        } else {
            None
        }
    })
}

/// Decode a body with the declared charset. Unknown labels fall back to UTF-8,
/// and a byte-order mark overrides the label.
fn decode(body: &[u8], charset: Option<&str>) -> String {
    let encoding = charset
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);
    let (text, used, malformed) = encoding.decode(body);
    if malformed {
        log::debug!("Body is not valid {}; replaced malformed sequences", used.name());
    }
    text.into_owned()
}
