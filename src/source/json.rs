//! Course data loaded from a JSON export.
//!
//! The export holds the course records (with their assignments) and a flat
//! list of submissions linked to assignments by id:
//!
//! ```json
//! {
//!   "courses": [{"id": 1, "name": "COS126", "period": "F2019",
//!                "assignments": [{"id": 10, "name": "Hello", "sortKey": 0}]}],
//!   "submissions": [{"id": 100, "assignment": 10, "grader": "g@x.com",
//!                    "isFinalized": true, "files": []}]
//! }
//! ```

use super::CourseSource;
use crate::error::{StatsError, StatsResult};
use crate::models::{Assignment, Course, Submission};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

/// Contents of a course export.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub submissions: Vec<Submission>,
}

/// A [`CourseSource`] backed by an in-memory [`Dataset`].
#[derive(Debug, Clone, Default)]
pub struct JsonSource {
    dataset: Dataset,
    known_assignments: BTreeSet<u64>,
}

impl JsonSource {
    pub fn from_dataset(dataset: Dataset) -> Self {
        let known_assignments = dataset
            .courses
            .iter()
            .flat_map(|c| c.assignments.iter().map(|a| a.id))
            .collect();

        Self {
            dataset,
            known_assignments,
        }
    }

    /// Parse an export from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let dataset: Dataset = serde_json::from_str(json).context("Failed to parse dataset")?;
        Ok(Self::from_dataset(dataset))
    }

    /// Load an export from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dataset: {}", path.display()))?;

        let dataset: Dataset = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse dataset: {}", path.display()))?;

        debug!(
            "Loaded dataset with {} courses and {} submissions",
            dataset.courses.len(),
            dataset.submissions.len()
        );

        Ok(Self::from_dataset(dataset))
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }
}

impl CourseSource for JsonSource {
    fn find_courses(&self, name: &str, term: &str) -> StatsResult<Vec<Course>> {
        Ok(self
            .dataset
            .courses
            .iter()
            .filter(|c| c.name == name && c.period == term)
            .cloned()
            .collect())
    }

    fn list_submissions(&self, assignment: &Assignment) -> StatsResult<Vec<Submission>> {
        if !self.known_assignments.contains(&assignment.id) {
            return Err(StatsError::source(format!(
                "assignment '{}' (id {}) is not part of the dataset",
                assignment.name, assignment.id
            )));
        }

        Ok(self
            .dataset
            .submissions
            .iter()
            .filter(|s| s.assignment == assignment.id)
            .cloned()
            .collect())
    }
}
