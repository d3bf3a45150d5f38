mod common;

use std::sync::Arc;

use catalog_crawler::error::AppError;
use catalog_crawler::models::{
    Config, CourseDataset, CourseRecord, CrawlerConfig, ExtractorConfig, LinkPolicy, SeedList,
};
use catalog_crawler::pipeline::{CrawlCoordinator, CrawlReport, run_crawler};
use catalog_crawler::services::{CourseExtractor, PageFetcher};
use catalog_crawler::storage::{ContentCache, DiskCache, Fingerprint, MemoryCache};
use catalog_crawler::utils::url::page_key;
use common::{FailingCache, FailingStore, MemoryStore, catalog_page, course_block};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

async fn serve(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

fn url(server: &MockServer, route: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), route)).unwrap()
}

fn crawler_config(max_concurrent: usize) -> CrawlerConfig {
    CrawlerConfig {
        max_concurrent,
        timeout_secs: 5,
        ..CrawlerConfig::default()
    }
}

async fn crawl(
    seeds: &[Url],
    cache: Arc<dyn ContentCache>,
    config: &CrawlerConfig,
) -> CrawlReport {
    let fetcher = PageFetcher::new(config).unwrap();
    let extractor = CourseExtractor::new(&ExtractorConfig::default()).unwrap();
    CrawlCoordinator::new(fetcher, extractor, cache, config)
        .run(seeds)
        .await
}

fn sorted(records: &[CourseRecord]) -> Vec<CourseRecord> {
    let mut records = records.to_vec();
    records.sort();
    records
}

#[tokio::test]
async fn test_end_to_end_single_course() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/ug/",
        catalog_page(
            &[course_block(
                "CS 100. Intro to Computing.",
                "An introduction. Prerequisites: MATH 111. Restrictions: Freshmen only.",
            )],
            &[],
        ),
    )
    .await;

    let seeds = SeedList {
        urls: vec![url(&server, "/ug/")],
    };
    let store = MemoryStore::new();
    let config = Config {
        crawler: crawler_config(5),
        ..Config::default()
    };

    let summary = run_crawler(&config, &seeds, Arc::new(MemoryCache::new()), &store)
        .await
        .unwrap();

    assert_eq!(
        summary.report.records,
        vec![CourseRecord {
            course_id: "CS 100".to_string(),
            title: "Intro to Computing".to_string(),
            description: "An introduction.".to_string(),
            prerequisites: "MATH 111".to_string(),
            corequisites: "None".to_string(),
            restrictions: "Freshmen only".to_string(),
        }]
    );
    assert!(summary.report.failures.is_empty());

    let aggregate = store.get(&config.storage.aggregate_key).unwrap();
    assert_eq!(aggregate.content_type, "application/json");
    let dataset: CourseDataset = serde_json::from_slice(&aggregate.body).unwrap();
    assert_eq!(dataset.count, 1);
    assert_eq!(dataset.courses, summary.report.records);

    let raw_key = page_key(&config.storage.raw_prefix, &url(&server, "/ug/"));
    let raw = store.get(&raw_key).unwrap();
    assert_eq!(raw.content_type, "text/html");
    assert!(String::from_utf8(raw.body).unwrap().contains("CS 100. Intro to Computing."));
}

#[tokio::test]
async fn test_links_followed_one_level_only() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/",
        catalog_page(
            &[course_block("CS 100. Intro.", "Basics.")],
            &["/cs/", "/math/"],
        ),
    )
    .await;
    serve(
        &server,
        "/cs/",
        catalog_page(
            &[course_block("CS 241. Foundations.", "Proofs.")],
            &["/cs/deep/"],
        ),
    )
    .await;
    serve(
        &server,
        "/math/",
        catalog_page(&[course_block("MATH 111. Calculus I.", "Limits.")], &[]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/cs/deep/"))
        .respond_with(html(catalog_page(&[], &[])))
        .expect(0)
        .mount(&server)
        .await;

    let report = crawl(
        &[url(&server, "/")],
        Arc::new(MemoryCache::new()),
        &crawler_config(5),
    )
    .await;

    assert_eq!(report.stats.discovered, 3);
    assert_eq!(report.stats.fetched, 3);
    assert_eq!(report.stats.failed, 0);

    let ids: Vec<String> = sorted(&report.records)
        .into_iter()
        .map(|r| r.course_id)
        .collect();
    assert_eq!(ids, vec!["CS 100", "CS 241", "MATH 111"]);
}

#[tokio::test]
async fn test_failed_units_do_not_abort_run() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/ug/",
        catalog_page(
            &[course_block("CS 100. Intro.", "Basics.")],
            &["/ug/missing/"],
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/ug/missing/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let unreachable = Url::parse("http://127.0.0.1:1/catalog/").unwrap();
    let seed = url(&server, "/ug/");
    let report = crawl(
        &[unreachable.clone(), seed.clone()],
        Arc::new(MemoryCache::new()),
        &crawler_config(5),
    )
    .await;

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].course_id, "CS 100");
    assert_eq!(report.stats.fetched, 1);
    assert_eq!(report.stats.failed, 2);

    let seed_failure = report
        .failures
        .iter()
        .find(|f| f.url == unreachable.as_str())
        .unwrap();
    assert_eq!(seed_failure.depth, 0);

    let child_failure = report
        .failures
        .iter()
        .find(|f| f.url.ends_with("/ug/missing/"))
        .unwrap();
    assert_eq!(child_failure.depth, 1);
    assert_eq!(child_failure.seed, seed.as_str());
    assert_eq!(child_failure.cause, "HTTP status 404");
}

#[tokio::test]
async fn test_rerun_with_disk_cache_extracts_nothing() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/",
        catalog_page(
            &[course_block("CS 100. Intro.", "Basics. Corequisites: CS 100L.")],
            &["/cs/", "/empty/"],
        ),
    )
    .await;
    serve(
        &server,
        "/cs/",
        catalog_page(&[course_block("CS 241. Foundations.", "Proofs.")], &[]),
    )
    .await;
    serve(&server, "/empty/", catalog_page(&[], &[])).await;

    let tmp = TempDir::new().unwrap();
    let seeds = [url(&server, "/")];
    let config = crawler_config(5);

    let first = crawl(
        &seeds,
        Arc::new(DiskCache::open(tmp.path()).unwrap()),
        &config,
    )
    .await;
    assert_eq!(first.stats.extracted, 3);
    assert_eq!(first.stats.cached, 0);

    let second = crawl(
        &seeds,
        Arc::new(DiskCache::open(tmp.path()).unwrap()),
        &config,
    )
    .await;
    assert_eq!(second.stats.extracted, 0);
    assert_eq!(second.stats.cached, 3);
    assert_eq!(sorted(&second.records), sorted(&first.records));
    assert_eq!(second.records[0].corequisites, "CS 100L");
}

#[tokio::test]
async fn test_cache_errors_fall_back_to_extraction() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/",
        catalog_page(&[course_block("CS 100. Intro.", "Basics.")], &["/cs/"]),
    )
    .await;
    serve(
        &server,
        "/cs/",
        catalog_page(&[course_block("CS 241. Foundations.", "Proofs.")], &[]),
    )
    .await;

    let report = crawl(&[url(&server, "/")], Arc::new(FailingCache), &crawler_config(5)).await;

    assert_eq!(report.stats.fetched, 2);
    assert_eq!(report.stats.extracted, 2);
    assert_eq!(report.stats.cached, 0);
    assert_eq!(report.stats.failed, 0);
    assert!(report.failures.is_empty());

    let ids: Vec<String> = sorted(&report.records)
        .into_iter()
        .map(|r| r.course_id)
        .collect();
    assert_eq!(ids, vec!["CS 100", "CS 241"]);
}

#[tokio::test]
async fn test_corrupt_cache_entry_is_repaired() {
    let server = MockServer::start().await;
    let page = catalog_page(&[course_block("CS 100. Intro.", "Basics.")], &[]);
    serve(&server, "/", page.clone()).await;

    let tmp = TempDir::new().unwrap();
    let entry_path = tmp.path().join(format!("{}.json", Fingerprint::of(&page)));
    std::fs::write(&entry_path, b"{truncated").unwrap();

    let seeds = [url(&server, "/")];
    let config = crawler_config(5);

    let first = crawl(
        &seeds,
        Arc::new(DiskCache::open(tmp.path()).unwrap()),
        &config,
    )
    .await;
    assert_eq!(first.stats.extracted, 1);
    assert_eq!(first.stats.failed, 0);
    assert_eq!(first.records[0].course_id, "CS 100");

    let second = crawl(
        &seeds,
        Arc::new(DiskCache::open(tmp.path()).unwrap()),
        &config,
    )
    .await;
    assert_eq!(second.stats.cached, 1);
    assert_eq!(second.stats.extracted, 0);
    assert_eq!(second.records, first.records);
}

#[tokio::test]
async fn test_windows_1252_page_is_extracted() {
    let server = MockServer::start().await;
    let page = catalog_page(
        &[course_block("ENG 101. Writing.", "Students' first essays.")],
        &[],
    );
    // Swap the ASCII apostrophe for the windows-1252 right single quote.
    let body: Vec<u8> = page
        .bytes()
        .map(|b| if b == b'\'' { 0x92 } else { b })
        .collect();
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=windows-1252"),
        )
        .mount(&server)
        .await;

    let report = crawl(
        &[url(&server, "/")],
        Arc::new(MemoryCache::new()),
        &crawler_config(5),
    )
    .await;

    assert_eq!(report.stats.failed, 0);
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].description, "Students\u{2019} first essays.");
}

#[tokio::test]
async fn test_identical_content_extracted_once() {
    let server = MockServer::start().await;
    let shared = catalog_page(&[course_block("CS 280. Programming.", "Java.")], &[]);
    serve(
        &server,
        "/",
        catalog_page(
            &[course_block("CS 100. Intro.", "Basics.")],
            &["/mirror-a/", "/mirror-b/"],
        ),
    )
    .await;
    serve(&server, "/mirror-a/", shared.clone()).await;
    serve(&server, "/mirror-b/", shared).await;

    // One worker makes the cache store for the first mirror happen before
    // the second mirror is looked up.
    let report = crawl(
        &[url(&server, "/")],
        Arc::new(MemoryCache::new()),
        &crawler_config(1),
    )
    .await;

    assert_eq!(report.stats.fetched, 3);
    assert_eq!(report.stats.extracted, 2);
    assert_eq!(report.stats.cached, 1);
    assert_eq!(report.stats.duplicate_content, 1);

    let ids: Vec<String> = report.records.iter().map(|r| r.course_id.clone()).collect();
    assert_eq!(ids, vec!["CS 100", "CS 280"]);
}

#[tokio::test]
async fn test_identical_content_merged_once_under_concurrency() {
    let server = MockServer::start().await;
    let shared = catalog_page(&[course_block("CS 280. Programming.", "Java.")], &[]);
    let mirrors: Vec<String> = (0..6).map(|i| format!("/mirror-{i}/")).collect();
    let links: Vec<&str> = mirrors.iter().map(String::as_str).collect();

    serve(&server, "/", catalog_page(&[], &links)).await;
    for mirror in &mirrors {
        serve(&server, mirror, shared.clone()).await;
    }

    let report = crawl(
        &[url(&server, "/")],
        Arc::new(MemoryCache::new()),
        &crawler_config(5),
    )
    .await;

    assert_eq!(report.stats.fetched, 7);
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.stats.duplicate_content, 5);
}

#[tokio::test]
async fn test_same_origin_policy_skips_foreign_links() {
    let catalog = MockServer::start().await;
    let foreign = MockServer::start().await;

    let foreign_link = format!("{}/elsewhere/", foreign.uri());
    serve(
        &catalog,
        "/",
        catalog_page(
            &[course_block("CS 100. Intro.", "Basics.")],
            &["/local/", &foreign_link],
        ),
    )
    .await;
    serve(
        &catalog,
        "/local/",
        catalog_page(&[course_block("CS 101. More.", "More.")], &[]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/elsewhere/"))
        .respond_with(html(catalog_page(&[], &[])))
        .expect(0)
        .mount(&foreign)
        .await;

    let config = CrawlerConfig {
        link_policy: LinkPolicy::SameOrigin,
        ..crawler_config(5)
    };
    let report = crawl(&[url(&catalog, "/")], Arc::new(MemoryCache::new()), &config).await;

    assert_eq!(report.stats.fetched, 2);
    assert_eq!(report.records.len(), 2);
}

#[tokio::test]
async fn test_publish_failure_is_reported() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/",
        catalog_page(&[course_block("CS 100. Intro.", "Basics.")], &[]),
    )
    .await;

    let seeds = SeedList {
        urls: vec![url(&server, "/")],
    };
    let config = Config {
        crawler: crawler_config(5),
        ..Config::default()
    };

    let err = run_crawler(&config, &seeds, Arc::new(MemoryCache::new()), &FailingStore)
        .await
        .unwrap_err();

    match err {
        AppError::Publish { failed, .. } => {
            assert_eq!(failed.len(), 2);
            assert!(failed.contains(&config.storage.aggregate_key));
        }
        other => panic!("expected publish error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_seed_list_is_rejected() {
    let config = Config::default();
    let store = MemoryStore::new();

    let result = run_crawler(
        &config,
        &SeedList::default(),
        Arc::new(MemoryCache::new()),
        &store,
    )
    .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(store.keys().is_empty());
}
