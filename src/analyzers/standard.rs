//! Built-in counting analyzers.
//!
//! - `submissions.graded`: finalized submissions per grader and assignment.
//! - `comments.counter`: comments per author and assignment, optionally
//!   restricted to rubric (`comments.counter.rubric`) or custom
//!   (`comments.counter.custom`) comments.

use super::base::{Analyzer, Record};
use super::counter::CounterAnalyzer;
use crate::error::{StatsError, StatsResult};
use crate::models::{Assignment, Comment, Course, File, Submission};
use std::collections::BTreeSet;

pub const SUBMISSIONS_GRADED: &str = "submissions.graded";
pub const COMMENTS_COUNTER: &str = "comments.counter";
pub const RUBRIC_COMMENTS_COUNTER: &str = "comments.counter.rubric";
pub const CUSTOM_COMMENTS_COUNTER: &str = "comments.counter.custom";

/// Names accepted by [`builtin`].
pub const BUILTIN_ANALYZERS: [&str; 4] = [
    SUBMISSIONS_GRADED,
    COMMENTS_COUNTER,
    RUBRIC_COMMENTS_COUNTER,
    CUSTOM_COMMENTS_COUNTER,
];

/// Counts finalized submissions per grader, by assignment.
#[derive(Debug, Clone)]
pub struct SubmissionsGradedCounter {
    counter: CounterAnalyzer,
}

impl Default for SubmissionsGradedCounter {
    fn default() -> Self {
        Self {
            counter: CounterAnalyzer::new("SubmissionsGradedCounter"),
        }
    }
}

impl SubmissionsGradedCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self) -> &CounterAnalyzer {
        &self.counter
    }
}

impl Analyzer for SubmissionsGradedCounter {
    fn name(&self) -> Option<&str> {
        Some(SUBMISSIONS_GRADED)
    }

    fn reset(&mut self) -> StatsResult<bool> {
        self.counter.reset()
    }

    fn on_course(&mut self, course: &Course) -> StatsResult<()> {
        self.counter.on_course(course)
    }

    fn on_submission(
        &mut self,
        assignment: &Assignment,
        submission: &Submission,
    ) -> StatsResult<()> {
        let Some(grader) = submission.finalized_grader() else {
            return Ok(());
        };

        self.counter.increment(grader, &assignment.name)?;
        Ok(())
    }

    fn names(&self) -> BTreeSet<String> {
        self.counter.names()
    }

    fn get_by_name(&self, name: &str) -> Record {
        self.counter.get_by_name(name)
    }
}

/// Which comments a [`CommentsCounter`] takes into account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentKind {
    /// Every comment.
    #[default]
    Any,
    /// Only comments applied from the rubric.
    Rubric,
    /// Only comments written by hand (no rubric link).
    Custom,
}

impl CommentKind {
    pub fn accepts(&self, comment: &Comment) -> bool {
        match self {
            CommentKind::Any => true,
            CommentKind::Rubric => comment.is_rubric(),
            CommentKind::Custom => !comment.is_rubric(),
        }
    }

    /// Registration name of the counter for this kind.
    pub fn analyzer_name(&self) -> &'static str {
        match self {
            CommentKind::Any => COMMENTS_COUNTER,
            CommentKind::Rubric => RUBRIC_COMMENTS_COUNTER,
            CommentKind::Custom => CUSTOM_COMMENTS_COUNTER,
        }
    }

    fn owner(&self) -> &'static str {
        match self {
            CommentKind::Any => "GenericCommentsCounter",
            CommentKind::Rubric => "RubricCommentsCounter",
            CommentKind::Custom => "CustomCommentsCounter",
        }
    }
}

/// Filters applied by comment counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentSettings {
    /// Minimum number of characters for a comment to count.
    pub min_characters: Option<usize>,
    /// Minimum number of words for a comment to count.
    pub min_words: Option<usize>,
    /// Only count comments written by the submission's grader.
    pub only_graders: bool,
}

impl Default for CommentSettings {
    fn default() -> Self {
        Self {
            min_characters: None,
            min_words: None,
            only_graders: true,
        }
    }
}

impl CommentSettings {
    /// Builds settings from raw thresholds; negative values leave a threshold unset.
    pub fn from_thresholds(
        min_characters: Option<i64>,
        min_words: Option<i64>,
        only_graders: bool,
    ) -> Self {
        Self {
            min_characters: int_like(min_characters),
            min_words: int_like(min_words),
            only_graders,
        }
    }
}

/// Counts comments per author, by assignment.
///
/// Comments on submissions without a grader, or not yet finalized, never
/// count.
#[derive(Debug, Clone)]
pub struct CommentsCounter {
    counter: CounterAnalyzer,
    kind: CommentKind,
    settings: CommentSettings,
}

impl Default for CommentsCounter {
    fn default() -> Self {
        Self::new(CommentKind::Any)
    }
}

impl CommentsCounter {
    pub fn new(kind: CommentKind) -> Self {
        Self {
            counter: CounterAnalyzer::new(kind.owner()),
            kind,
            settings: CommentSettings::default(),
        }
    }

    pub fn generic() -> Self {
        Self::new(CommentKind::Any)
    }

    pub fn rubric() -> Self {
        Self::new(CommentKind::Rubric)
    }

    pub fn custom() -> Self {
        Self::new(CommentKind::Custom)
    }

    pub fn with_settings(mut self, settings: CommentSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn kind(&self) -> CommentKind {
        self.kind
    }

    pub fn counter(&self) -> &CounterAnalyzer {
        &self.counter
    }

    pub fn min_characters(&self) -> Option<usize> {
        self.settings.min_characters
    }

    /// Sets the character threshold; a negative value clears it.
    pub fn set_min_characters(&mut self, value: Option<i64>) {
        self.settings.min_characters = int_like(value);
    }

    pub fn min_words(&self) -> Option<usize> {
        self.settings.min_words
    }

    /// Sets the word threshold; a negative value clears it.
    pub fn set_min_words(&mut self, value: Option<i64>) {
        self.settings.min_words = int_like(value);
    }

    pub fn only_graders(&self) -> bool {
        self.settings.only_graders
    }

    pub fn set_only_graders(&mut self, value: bool) {
        self.settings.only_graders = value;
    }

    fn counts(&self, grader: &str, comment: &Comment) -> bool {
        if !self.kind.accepts(comment) {
            return false;
        }

        if self.settings.only_graders && grader != comment.author {
            return false;
        }

        if let Some(min) = self.settings.min_characters {
            if comment.char_count() < min {
                return false;
            }
        }

        if let Some(min) = self.settings.min_words {
            if comment.word_count() < min {
                return false;
            }
        }

        true
    }
}

impl Analyzer for CommentsCounter {
    fn name(&self) -> Option<&str> {
        Some(self.kind.analyzer_name())
    }

    fn reset(&mut self) -> StatsResult<bool> {
        self.counter.reset()
    }

    fn on_course(&mut self, course: &Course) -> StatsResult<()> {
        self.counter.on_course(course)
    }

    fn on_comment(
        &mut self,
        assignment: &Assignment,
        submission: &Submission,
        _file: &File,
        comment: &Comment,
    ) -> StatsResult<()> {
        let Some(grader) = submission.finalized_grader() else {
            return Ok(());
        };

        if self.counts(grader, comment) {
            self.counter.increment(&comment.author, &assignment.name)?;
        }

        Ok(())
    }

    fn names(&self) -> BTreeSet<String> {
        self.counter.names()
    }

    fn get_by_name(&self, name: &str) -> Record {
        self.counter.get_by_name(name)
    }
}

/// Negative thresholds mean "no threshold".
fn int_like(value: Option<i64>) -> Option<usize> {
    value.and_then(|v| usize::try_from(v).ok())
}

/// Constructs a built-in analyzer from its registration name.
pub fn builtin(name: &str, settings: &CommentSettings) -> StatsResult<Box<dyn Analyzer>> {
    let analyzer: Box<dyn Analyzer> = match name {
        SUBMISSIONS_GRADED => Box::new(SubmissionsGradedCounter::new()),
        COMMENTS_COUNTER => Box::new(CommentsCounter::generic().with_settings(settings.clone())),
        RUBRIC_COMMENTS_COUNTER => {
            Box::new(CommentsCounter::rubric().with_settings(settings.clone()))
        }
        CUSTOM_COMMENTS_COUNTER => {
            Box::new(CommentsCounter::custom().with_settings(settings.clone()))
        }
        other => {
            return Err(StatsError::RegistrationType(format!(
                "`{}` is not a known analyzer (expected one of: {})",
                other,
                BUILTIN_ANALYZERS.join(", ")
            )))
        }
    };

    Ok(analyzer)
}
