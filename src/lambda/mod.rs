// src/lambda/mod.rs

//! AWS Lambda handler for the crawler.
//!
//! One invocation runs a full batch:
//! 1. Loads the seed list bundled with the function (or `SEEDS_PATH`)
//! 2. Crawls seeds and their links
//! 3. Publishes raw pages and the course aggregate to S3-compatible storage
//! 4. Optionally exports the section schedule

use std::path::PathBuf;

use lambda_runtime::{Error as LambdaError, LambdaEvent};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::error::Result;
use crate::models::{Config, SeedList};
use crate::pipeline::{open_cache, run_crawler, run_sections};
use crate::services::PageFetcher;
use crate::storage::s3::S3BlobStore;

/// Lambda is only allowed to write under /tmp.
const DEFAULT_CACHE_DIR: &str = "/tmp/catalog-cache";

/// Lambda invocation payload.
#[derive(Debug, Default, Deserialize)]
pub struct CrawlRequest {
    /// Also export the section schedule after the crawl
    #[serde(default)]
    pub include_sections: bool,
}

/// Lambda response payload.
#[derive(Debug, Default, Serialize)]
pub struct CrawlResponse {
    /// Whether the crawl and publish succeeded
    pub success: bool,

    pub seeds: usize,
    pub fetched: usize,
    pub extracted: usize,
    pub cached: usize,
    pub failed: usize,

    /// Number of courses in the published aggregate
    pub records: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate_location: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sections: Option<usize>,

    /// Error message if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Execution time in milliseconds
    pub execution_time_ms: u64,
}

/// Main Lambda handler function.
#[instrument(skip(event))]
pub async fn handler(
    event: LambdaEvent<CrawlRequest>,
) -> std::result::Result<CrawlResponse, LambdaError> {
    let start = std::time::Instant::now();
    let (request, _context) = event.into_parts();

    info!("Starting crawl: include_sections={}", request.include_sections);

    match run_crawl(&request).await {
        Ok(mut response) => {
            response.execution_time_ms = start.elapsed().as_millis() as u64;
            info!(
                "Crawl completed: {} record(s), {} failure(s) in {}ms",
                response.records, response.failed, response.execution_time_ms
            );
            Ok(response)
        }
        Err(e) => {
            error!("Crawl failed: {}", e);
            Ok(CrawlResponse {
                success: false,
                error: Some(e.to_string()),
                execution_time_ms: start.elapsed().as_millis() as u64,
                ..Default::default()
            })
        }
    }
}

async fn run_crawl(request: &CrawlRequest) -> Result<CrawlResponse> {
    let store = S3BlobStore::from_env().await?;
    let config = load_lambda_config();
    config.validate()?;

    let seeds = SeedList::load(&config.paths.seeds_file)?;
    let cache = open_cache(&config);
    let summary = run_crawler(&config, &seeds, cache, &store).await?;
    let stats = &summary.report.stats;

    let sections = if request.include_sections {
        let fetcher = PageFetcher::new(&config.crawler)?;
        let catalog = run_sections(&config.sections, &fetcher, &store).await?;
        Some(catalog.sections.len())
    } else {
        None
    };

    Ok(CrawlResponse {
        success: true,
        seeds: seeds.len(),
        fetched: stats.fetched,
        extracted: stats.extracted,
        cached: stats.cached,
        failed: stats.failed,
        records: stats.records,
        aggregate_location: Some(summary.publish.aggregate_location.clone()),
        sections,
        error: None,
        execution_time_ms: 0,
    })
}

/// Configuration for the Lambda environment: defaults plus env overrides.
fn load_lambda_config() -> Config {
    let mut config = Config::default();

    if let Some(secs) = env_parse("CRAWL_TIMEOUT_SECS") {
        config.crawler.timeout_secs = secs;
    }
    if let Some(n) = env_parse("MAX_CONCURRENT") {
        config.crawler.max_concurrent = n;
    }
    if let Some(ms) = env_parse("REQUEST_DELAY_MS") {
        config.crawler.request_delay_ms = ms;
    }
    if let Ok(path) = std::env::var("SEEDS_PATH") {
        config.paths.seeds_file = PathBuf::from(path);
    }

    config.cache.dir = std::env::var("CACHE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CACHE_DIR));

    config
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|value| value.parse().ok())
}
