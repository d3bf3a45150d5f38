//! Course section schedule structures.

use serde::{Deserialize, Serialize};

/// One scheduled section of a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRow {
    pub course_code: String,
    pub course_name: String,
    pub credits: String,
    pub section_code: String,
    pub section_number: String,
    pub crn: String,
    pub enrollment: String,
    pub professor: String,
    pub notes: String,
    /// Meetings joined with "; ", e.g. "Mon 10:00-11:20 at KUPF 207"
    pub schedule: String,
}

/// All sections published by the schedule data service for one term.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionCatalog {
    pub term: String,
    /// Upstream "last updated" marker
    pub update: String,
    pub sections: Vec<SectionRow>,
}
