//! Utility functions and helpers.

pub mod http;
pub mod report;
pub mod url;
