//! Retrieval of the course hierarchy.
//!
//! The traversal driver only talks to a [`CourseSource`]; where the records
//! come from is up to the implementation.

pub mod json;

pub use json::{Dataset, JsonSource};

use crate::error::StatsResult;
use crate::models::{Assignment, Course, Submission};

/// Supplies the hierarchy records walked by the event loop.
pub trait CourseSource {
    /// Courses matching `name` offered in `term` (zero or more).
    fn find_courses(&self, name: &str, term: &str) -> StatsResult<Vec<Course>>;

    /// Submissions turned in for `assignment`.
    fn list_submissions(&self, assignment: &Assignment) -> StatsResult<Vec<Submission>>;
}

impl<S: CourseSource + ?Sized> CourseSource for &S {
    fn find_courses(&self, name: &str, term: &str) -> StatsResult<Vec<Course>> {
        (**self).find_courses(name, term)
    }

    fn list_submissions(&self, assignment: &Assignment) -> StatsResult<Vec<Submission>> {
        (**self).list_submissions(assignment)
    }
}
