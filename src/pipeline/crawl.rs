// src/pipeline/crawl.rs

//! Two-level catalog crawl.
//!
//! Seed pages (depth 0) are fetched, fingerprinted, and either served from the
//! content cache or run through the extractor. Links found on seed pages become
//! depth-1 units; depth-1 pages are never scanned for links. A fixed-size pool
//! of tasks processes units as they are queued, and a single collector owns the
//! aggregate, so no lock guards the record list.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use scraper::Html;
use tokio::task::{Id as TaskId, JoinError, JoinSet};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{
    Config, CourseRecord, CrawlStats, CrawlUnit, CrawlerConfig, LinkPolicy, SeedList,
    UnitFailure, UnitState,
};
use crate::pipeline::publish::{PublishReport, Publisher};
use crate::services::links::{discover_document_links, same_origin};
use crate::services::{CourseExtractor, Page, PageFetcher};
use crate::storage::{BlobStore, ContentCache, DiskCache, Fingerprint, MemoryCache};
use crate::utils::report;

/// Raw body of one fetched page, kept for publishing.
#[derive(Debug, Clone)]
pub struct RawPage {
    pub url: Url,
    pub body: Vec<u8>,
}

/// Everything one crawl run produced.
#[derive(Debug)]
pub struct CrawlReport {
    /// The aggregate: records from every distinct fingerprint, in merge order
    pub records: Vec<CourseRecord>,
    /// Every page fetched, one entry per successful unit
    pub pages: Vec<RawPage>,
    pub failures: Vec<UnitFailure>,
    pub stats: CrawlStats,
}

impl CrawlReport {
    /// Log the run-end summary.
    pub fn log_summary(&self) {
        report::summary(
            "Crawl",
            &[
                ("Discovered", self.stats.discovered.to_string()),
                ("Fetched", self.stats.fetched.to_string()),
                ("Extracted", self.stats.extracted.to_string()),
                ("Cache hits", self.stats.cached.to_string()),
                ("Duplicate content", self.stats.duplicate_content.to_string()),
                ("Failed", self.stats.failed.to_string()),
                ("Records", self.stats.records.to_string()),
                (
                    "Success rate",
                    format!("{:.1}%", self.stats.success_rate() * 100.0),
                ),
                (
                    "Duration",
                    format!(
                        "{}s",
                        (self.stats.end_time - self.stats.start_time).num_seconds()
                    ),
                ),
            ],
        );
        for failure in &self.failures {
            report::sub_item(&format!(
                "✗ {} (depth {}, seed {}): {}",
                failure.url, failure.depth, failure.seed, failure.cause
            ));
        }
    }
}

/// How a fetched unit obtained its records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Cached,
    Extracted,
}

impl From<Resolution> for UnitState {
    fn from(resolution: Resolution) -> Self {
        match resolution {
            Resolution::Cached => UnitState::Cached,
            Resolution::Extracted => UnitState::Extracting,
        }
    }
}

/// A successfully fetched and processed unit, before merging.
struct ProcessedPage {
    raw: RawPage,
    fingerprint: Fingerprint,
    records: Vec<CourseRecord>,
    resolution: Resolution,
    links: Vec<Url>,
}

struct UnitOutcome {
    unit: CrawlUnit,
    result: Result<ProcessedPage>,
}

/// Per-unit work shared by all pool tasks.
struct Worker {
    fetcher: PageFetcher,
    extractor: CourseExtractor,
    cache: Arc<dyn ContentCache>,
    link_policy: LinkPolicy,
}

impl Worker {
    async fn run(self: Arc<Self>, unit: CrawlUnit) -> UnitOutcome {
        let result = match self.fetcher.fetch(&unit.url).await {
            Ok(page) => Ok(self.process(&unit, page)),
            Err(e) => Err(e),
        };
        UnitOutcome { unit, result }
    }

    /// Fingerprint, consult the cache, extract on miss, discover links on seeds.
    fn process(&self, unit: &CrawlUnit, page: Page) -> ProcessedPage {
        let fingerprint = Fingerprint::of(&page.text);
        let mut document: Option<Html> = None;

        let cached = match self.cache.lookup(&fingerprint) {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Cache lookup failed for {}, extracting: {}", unit.url, e);
                None
            }
        };

        let (records, resolution) = match cached {
            Some(entry) => {
                log::debug!("[{}] {} -> {}", unit.url, UnitState::Fetching, UnitState::Cached);
                (entry.records, Resolution::Cached)
            }
            None => {
                log::debug!(
                    "[{}] {} -> {}",
                    unit.url,
                    UnitState::Fetching,
                    UnitState::Extracting
                );
                let doc = document.get_or_insert_with(|| Html::parse_document(&page.text));
                let records = self.extractor.extract_document(doc);
                if let Err(e) = self.cache.store(&fingerprint, &records) {
                    log::warn!("Cache store failed for {}: {}", unit.url, e);
                }
                (records, Resolution::Extracted)
            }
        };

        let links = if unit.is_seed() {
            let doc = document.get_or_insert_with(|| Html::parse_document(&page.text));
            self.follow(unit, doc)
        } else {
            Vec::new()
        };

        ProcessedPage {
            raw: RawPage {
                url: page.url,
                body: page.body,
            },
            fingerprint,
            records,
            resolution,
            links,
        }
    }

    /// Links on a seed page that the policy allows into the queue.
    fn follow(&self, unit: &CrawlUnit, document: &Html) -> Vec<Url> {
        discover_document_links(document, &unit.url)
            .into_iter()
            .filter(|link| match self.link_policy {
                LinkPolicy::All => true,
                LinkPolicy::SameOrigin => same_origin(link, &unit.url),
            })
            .collect()
    }
}

/// Owns the aggregate and all run bookkeeping.
struct Collector {
    records: Vec<CourseRecord>,
    pages: Vec<RawPage>,
    failures: Vec<UnitFailure>,
    merged: HashSet<Fingerprint>,
    stats: CrawlStats,
}

impl Collector {
    fn new(discovered: usize) -> Self {
        let mut stats = CrawlStats::new(Utc::now());
        stats.discovered = discovered;
        Self {
            records: Vec::new(),
            pages: Vec::new(),
            failures: Vec::new(),
            merged: HashSet::new(),
            stats,
        }
    }

    /// Merge one finished unit; children of seed pages go to `pending`.
    fn merge(&mut self, outcome: UnitOutcome, pending: &mut VecDeque<CrawlUnit>) {
        let UnitOutcome { unit, result } = outcome;

        let processed = match result {
            Ok(processed) => processed,
            Err(e) => {
                log::warn!("[{}] {} (depth {}): {}", unit.url, UnitState::Failed, unit.depth, e);
                self.fail(&unit, failure_cause(&e));
                return;
            }
        };

        self.stats.fetched += 1;
        match processed.resolution {
            Resolution::Cached => self.stats.cached += 1,
            Resolution::Extracted => self.stats.extracted += 1,
        }

        let count = processed.records.len();
        if self.merged.insert(processed.fingerprint.clone()) {
            self.records.extend(processed.records);
        } else {
            self.stats.duplicate_content += 1;
            log::debug!(
                "[{}] content {} already merged this run",
                unit.url,
                processed.fingerprint
            );
        }
        self.pages.push(processed.raw);

        for link in processed.links {
            pending.push_back(unit.child(link));
            self.stats.discovered += 1;
        }

        log::debug!(
            "[{}] {} -> {} ({} record(s))",
            unit.url,
            UnitState::from(processed.resolution),
            UnitState::Merged,
            count
        );
    }

    /// Account for one joined pool task. A task that panicked or was
    /// cancelled is failed with the unit it was running.
    fn settle(
        &mut self,
        joined: std::result::Result<(TaskId, UnitOutcome), JoinError>,
        running: &mut HashMap<TaskId, CrawlUnit>,
        pending: &mut VecDeque<CrawlUnit>,
    ) {
        match joined {
            Ok((id, outcome)) => {
                running.remove(&id);
                self.merge(outcome, pending);
            }
            Err(e) => {
                log::error!("Crawl task aborted: {}", e);
                match running.remove(&e.id()) {
                    Some(unit) => self.fail(&unit, format!("task aborted: {e}")),
                    None => self.stats.failed += 1,
                }
            }
        }
    }

    /// Record a unit that produced no page.
    fn fail(&mut self, unit: &CrawlUnit, cause: String) {
        self.stats.failed += 1;
        self.failures.push(UnitFailure {
            url: unit.url.to_string(),
            depth: unit.depth,
            seed: unit.seed.to_string(),
            cause,
        });
    }

    fn finish(mut self) -> CrawlReport {
        self.stats.end_time = Utc::now();
        self.stats.records = self.records.len();
        CrawlReport {
            records: self.records,
            pages: self.pages,
            failures: self.failures,
            stats: self.stats,
        }
    }
}

fn failure_cause(error: &AppError) -> String {
    match error {
        AppError::Fetch { cause, .. } => cause.to_string(),
        other => other.to_string(),
    }
}

/// Schedules crawl units over a bounded worker pool.
///
/// Construct one per run; it holds no state between runs other than the
/// shared content cache handle.
pub struct CrawlCoordinator {
    worker: Arc<Worker>,
    max_concurrent: usize,
    request_delay: Duration,
}

impl CrawlCoordinator {
    pub fn new(
        fetcher: PageFetcher,
        extractor: CourseExtractor,
        cache: Arc<dyn ContentCache>,
        config: &CrawlerConfig,
    ) -> Self {
        Self {
            worker: Arc::new(Worker {
                fetcher,
                extractor,
                cache,
                link_policy: config.link_policy,
            }),
            max_concurrent: config.max_concurrent.max(1),
            request_delay: Duration::from_millis(config.request_delay_ms),
        }
    }

    /// Crawl the seeds and their direct links to completion.
    ///
    /// Never fails: fetch errors are recorded per unit in the report.
    pub async fn run(&self, seeds: &[Url]) -> CrawlReport {
        let mut pending: VecDeque<CrawlUnit> =
            seeds.iter().cloned().map(CrawlUnit::seed).collect();
        let mut collector = Collector::new(pending.len());
        let mut in_flight = JoinSet::new();
        let mut running: HashMap<TaskId, CrawlUnit> = HashMap::new();

        log::info!(
            "Crawling {} seed(s) with {} worker(s)",
            seeds.len(),
            self.max_concurrent
        );

        loop {
            // Top up the pool from the queue.
            while in_flight.len() < self.max_concurrent {
                let Some(unit) = pending.pop_front() else {
                    break;
                };
                if !self.request_delay.is_zero() {
                    tokio::time::sleep(self.request_delay).await;
                }
                log::debug!("[{}] {} -> {}", unit.url, UnitState::Pending, UnitState::Fetching);
                let task = in_flight.spawn(Arc::clone(&self.worker).run(unit.clone()));
                running.insert(task.id(), unit);
            }

            let Some(joined) = in_flight.join_next_with_id().await else {
                break;
            };

            collector.settle(joined, &mut running, &mut pending);
        }

        collector.finish()
    }
}

/// Open the configured content cache, degrading to an in-memory cache.
pub fn open_cache(config: &Config) -> Arc<dyn ContentCache> {
    if !config.cache.enabled {
        log::info!("Content cache disabled; using in-memory cache for this run");
        return Arc::new(MemoryCache::new());
    }

    match DiskCache::open(&config.cache.dir) {
        Ok(cache) => Arc::new(cache),
        Err(e) => {
            log::warn!(
                "Cannot open cache at {}: {}. Using in-memory cache.",
                config.cache.dir.display(),
                e
            );
            Arc::new(MemoryCache::new())
        }
    }
}

/// Outcome of a full crawl-and-publish run.
#[derive(Debug)]
pub struct CrawlSummary {
    pub report: CrawlReport,
    pub publish: PublishReport,
}

/// Run the crawler and publish its output.
///
/// Only configuration and publish failures are returned as errors.
pub async fn run_crawler(
    config: &Config,
    seeds: &SeedList,
    cache: Arc<dyn ContentCache>,
    storage: &dyn BlobStore,
) -> Result<CrawlSummary> {
    report::header("Catalog crawl starting");
    seeds.validate()?;

    let fetcher = PageFetcher::new(&config.crawler)?;
    let extractor = CourseExtractor::new(&config.extractor)?;
    let coordinator = CrawlCoordinator::new(fetcher, extractor, cache, &config.crawler);

    let crawl_report = coordinator.run(&seeds.urls).await;
    crawl_report.log_summary();

    let publisher = Publisher::new(storage, &config.storage);
    let publish = publisher
        .publish(&crawl_report.pages, &crawl_report.records)
        .await?;

    log::info!(
        "Published {} course(s) to {}",
        crawl_report.records.len(),
        publish.aggregate_location
    );

    Ok(CrawlSummary {
        report: crawl_report,
        publish,
    })
}
