// src/models/crawl.rs

//! Crawl unit bookkeeping.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

/// One URL scheduled for fetching.
#[derive(Debug, Clone)]
pub struct CrawlUnit {
    pub url: Url,
    /// 0 for seed pages, 1 for links discovered on them
    pub depth: u8,
    /// Seed this unit descends from (diagnostics only)
    pub seed: Arc<Url>,
}

impl CrawlUnit {
    /// Create a depth-0 unit for a seed URL.
    pub fn seed(url: Url) -> Self {
        let seed = Arc::new(url.clone());
        Self {
            url,
            depth: 0,
            seed,
        }
    }

    /// Create a depth-1 unit discovered on this unit's page.
    pub fn child(&self, url: Url) -> Self {
        Self {
            url,
            depth: self.depth + 1,
            seed: Arc::clone(&self.seed),
        }
    }

    pub fn is_seed(&self) -> bool {
        self.depth == 0
    }
}

/// Lifecycle of a crawl unit.
///
/// `Pending → Fetching → {Cached | Extracting} → Merged`, or
/// `Pending → Fetching → Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitState {
    Pending,
    Fetching,
    Cached,
    Extracting,
    Merged,
    Failed,
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Cached => "cached",
            Self::Extracting => "extracting",
            Self::Merged => "merged",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A unit that ended in `Failed`.
#[derive(Debug, Clone, Serialize)]
pub struct UnitFailure {
    pub url: String,
    pub depth: u8,
    pub seed: String,
    pub cause: String,
}

/// Summary counts for one crawl run.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlStats {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Units created (seeds plus discovered links)
    pub discovered: usize,
    /// Units whose page was fetched
    pub fetched: usize,
    /// Units that ran the extractor (cache misses)
    pub extracted: usize,
    /// Units served from the content cache
    pub cached: usize,
    /// Units that failed to fetch
    pub failed: usize,
    /// Records in the aggregate
    pub records: usize,
    /// Units whose fingerprint was already merged this run
    pub duplicate_content: usize,
}

impl CrawlStats {
    pub fn new(start_time: DateTime<Utc>) -> Self {
        Self {
            start_time,
            end_time: start_time,
            discovered: 0,
            fetched: 0,
            extracted: 0,
            cached: 0,
            failed: 0,
            records: 0,
            duplicate_content: 0,
        }
    }

    /// Fraction of units that fetched successfully.
    pub fn success_rate(&self) -> f64 {
        let finished = self.fetched + self.failed;
        if finished == 0 {
            return 1.0;
        }
        self.fetched as f64 / finished as f64
    }
}
