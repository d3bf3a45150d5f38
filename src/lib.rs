// src/lib.rs

//! Catalog Crawler Library
//!
//! Crawls university course catalog pages two levels deep, extracts course
//! blocks into structured records, and publishes raw pages plus one
//! aggregated dataset to a blob store.

pub mod config;
pub mod error;
#[cfg(feature = "lambda")]
pub mod lambda;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
