//! Hierarchy records visited during a traversal.
//!
//! These mirror the codePost object model (course, assignment, submission,
//! file, comment). The engine treats them as read-only; only analyzers look
//! at individual fields.

use serde::{Deserialize, Serialize};

/// A course offering, identified by name and period (term).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    /// Course identifier.
    pub id: u64,
    /// Course name, e.g. `COS126`.
    pub name: String,
    /// Term the course is offered in, e.g. `F2019`.
    pub period: String,
    /// Assignments of the course, in no particular order.
    #[serde(default)]
    pub assignments: Vec<Assignment>,
}

impl Course {
    /// Returns the assignments in canonical (sort key) order.
    pub fn sorted_assignments(&self) -> Vec<&Assignment> {
        let mut assignments: Vec<&Assignment> = self.assignments.iter().collect();
        assignments.sort_by_key(|a| a.sort_key);
        assignments
    }

    /// Returns the assignment names in canonical order.
    pub fn assignment_names(&self) -> Vec<String> {
        self.sorted_assignments()
            .into_iter()
            .map(|a| a.name.clone())
            .collect()
    }

    /// Looks up an assignment by its exact name.
    pub fn assignment_by_name(&self, name: &str) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.name == name)
    }
}

/// An assignment of a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    /// Assignment identifier.
    pub id: u64,
    /// Display name, also used as the counter subcategory.
    pub name: String,
    /// Position of the assignment within the course.
    #[serde(default)]
    pub sort_key: i64,
    /// Maximum number of points.
    #[serde(default)]
    pub points: f64,
}

/// A student submission for an assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    /// Submission identifier.
    pub id: u64,
    /// Identifier of the assignment this submission belongs to.
    pub assignment: u64,
    /// Students who turned in the submission.
    #[serde(default)]
    pub students: Vec<String>,
    /// Grader assigned to the submission, if any.
    #[serde(default)]
    pub grader: Option<String>,
    /// Whether grading has been finalized.
    #[serde(default)]
    pub is_finalized: bool,
    /// Files of the submission.
    #[serde(default)]
    pub files: Vec<File>,
}

impl Submission {
    /// Returns the grader of a finalized submission.
    ///
    /// Submissions without a grader or still in progress count for nobody.
    pub fn finalized_grader(&self) -> Option<&str> {
        if self.is_finalized {
            self.grader.as_deref()
        } else {
            None
        }
    }
}

/// A source file within a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    /// File identifier.
    pub id: u64,
    /// File name.
    pub name: String,
    /// File extension (without dot).
    #[serde(default)]
    pub extension: String,
    /// Comments left on the file.
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// A comment left on a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Comment identifier.
    pub id: u64,
    /// Comment body.
    #[serde(default)]
    pub text: String,
    /// Author of the comment (an email address).
    pub author: String,
    /// Linked rubric comment, if the comment was applied from the rubric.
    #[serde(default)]
    pub rubric_comment: Option<u64>,
    /// Point adjustment carried by the comment.
    #[serde(default)]
    pub point_delta: Option<f64>,
}

impl Comment {
    /// Whether the comment is linked to a rubric entry.
    pub fn is_rubric(&self) -> bool {
        self.rubric_comment.is_some()
    }

    /// Number of characters in the comment text.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Number of whitespace-separated words in the comment text.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Builders for hierarchy records used across test modules.

    use super::*;

    pub const GRADER: &str = "grader@domain.com";
    pub const OTHER_GRADER: &str = "other.grader@domain.com";

    pub fn assignment(id: u64, name: &str, sort_key: i64) -> Assignment {
        Assignment {
            id,
            name: name.to_string(),
            sort_key,
            points: 10.0,
        }
    }

    pub fn course(name: &str, period: &str, assignments: Vec<Assignment>) -> Course {
        Course {
            id: 1,
            name: name.to_string(),
            period: period.to_string(),
            assignments,
        }
    }

    pub fn comment(id: u64, author: &str, text: &str, rubric: Option<u64>) -> Comment {
        Comment {
            id,
            text: text.to_string(),
            author: author.to_string(),
            rubric_comment: rubric,
            point_delta: None,
        }
    }

    pub fn file(id: u64, comments: Vec<Comment>) -> File {
        File {
            id,
            name: format!("File{}.java", id),
            extension: "java".to_string(),
            comments,
        }
    }

    pub fn submission(
        id: u64,
        assignment: u64,
        grader: Option<&str>,
        is_finalized: bool,
        files: Vec<File>,
    ) -> Submission {
        Submission {
            id,
            assignment,
            students: vec![format!("student{}@domain.com", id)],
            grader: grader.map(String::from),
            is_finalized,
            files,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_sorted_assignments_follow_sort_key() {
        let course = course(
            "COS126",
            "F2019",
            vec![
                assignment(3, "Loops", 2),
                assignment(1, "Hello", 0),
                assignment(2, "Conditionals", 1),
            ],
        );

        assert_eq!(
            course.assignment_names(),
            vec!["Hello", "Conditionals", "Loops"]
        );
        assert_eq!(course.assignment_by_name("Loops").map(|a| a.id), Some(3));
        assert!(course.assignment_by_name("loops").is_none());
    }

    #[test]
    fn test_finalized_grader() {
        let mut sub = submission(1, 1, Some(GRADER), true, vec![]);
        assert_eq!(sub.finalized_grader(), Some(GRADER));

        sub.is_finalized = false;
        assert_eq!(sub.finalized_grader(), None);

        sub.is_finalized = true;
        sub.grader = None;
        assert_eq!(sub.finalized_grader(), None);
    }

    #[test]
    fn test_comment_counts() {
        let c = comment(1, GRADER, "  this is   some text ", None);
        assert_eq!(c.word_count(), 4);
        assert_eq!(c.char_count(), 22);
        assert!(!c.is_rubric());
        assert!(comment(2, GRADER, "", Some(7)).is_rubric());
    }

    #[test]
    fn test_deserialize_codepost_field_names() {
        let json = r#"{
            "id": 9,
            "assignment": 4,
            "grader": "g@x.com",
            "isFinalized": true,
            "files": [
                {"id": 1, "name": "Hello.java",
                 "comments": [{"id": 5, "text": "nice", "author": "g@x.com", "rubricComment": 12}]}
            ]
        }"#;

        let sub: Submission = serde_json::from_str(json).unwrap();
        assert!(sub.is_finalized);
        assert!(sub.students.is_empty());
        assert_eq!(sub.files[0].comments[0].rubric_comment, Some(12));
    }
}
