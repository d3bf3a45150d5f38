//! Seed URL list.

use std::fs;
use std::path::Path;

use url::Url;

use crate::error::{AppError, Result};

/// Ordered list of depth-0 URLs read from a text file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedList {
    pub urls: Vec<Url>,
}

impl SeedList {
    /// Load seed URLs from a text file, one per line.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse seed URLs. Blank lines and `#` comments are skipped.
    pub fn parse(content: &str) -> Result<Self> {
        let mut urls = Vec::new();

        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let url = Url::parse(line).map_err(|e| {
                AppError::validation(format!("seed line {}: '{}': {}", idx + 1, line, e))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(AppError::validation(format!(
                    "seed line {}: '{}' is not an http(s) URL",
                    idx + 1,
                    line
                )));
            }
            urls.push(url);
        }

        Ok(Self { urls })
    }

    /// Validate that the list is usable for a crawl.
    pub fn validate(&self) -> Result<()> {
        if self.urls.is_empty() {
            return Err(AppError::validation("No seed URLs defined"));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}
