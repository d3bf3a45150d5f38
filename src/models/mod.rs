// src/models/mod.rs

//! Domain models for the crawler application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod course;
mod crawl;
mod section;
mod seed;

// Re-export all public types
pub use config::{
    CacheConfig, Config, CrawlerConfig, ExtractorConfig, LinkPolicy, LoggingConfig, PathsConfig,
    SectionsConfig, StorageBackend, StorageConfig,
};
pub use course::{CourseDataset, CourseRecord, NONE_VALUE};
pub use crawl::{CrawlStats, CrawlUnit, UnitFailure, UnitState};
pub use section::{SectionCatalog, SectionRow};
pub use seed::SeedList;
