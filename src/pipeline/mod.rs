//! Pipeline entry points for crawler operations.
//!
//! - `run_crawler`: Crawl seed pages and their links, then publish
//! - `run_sections`: Fetch the section schedule and publish it as JSON

pub mod crawl;
pub mod publish;
pub mod sections;

pub use crawl::{
    CrawlCoordinator, CrawlReport, CrawlSummary, RawPage, open_cache, run_crawler,
};
pub use publish::{PublishReport, Publisher};
pub use sections::run_sections;
