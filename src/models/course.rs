//! Course record data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Value stored for a requisite field the description does not mention.
pub const NONE_VALUE: &str = "None";

/// One catalog course extracted from a course block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CourseRecord {
    /// Course code, e.g. "CS 100"
    pub course_id: String,

    /// Course title without the code
    pub title: String,

    /// Description with requisite sentences removed
    pub description: String,

    pub prerequisites: String,
    pub corequisites: String,
    pub restrictions: String,
}

/// The aggregated dataset handed to the blob store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseDataset {
    /// ISO 8601 timestamp of the crawl that produced it
    pub generated_at: DateTime<Utc>,
    /// Total course count
    pub count: usize,
    /// The courses, in merge order
    pub courses: Vec<CourseRecord>,
}

impl CourseDataset {
    pub fn new(courses: Vec<CourseRecord>) -> Self {
        Self {
            generated_at: Utc::now(),
            count: courses.len(),
            courses,
        }
    }
}
