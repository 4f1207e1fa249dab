//! The analyzer contract and the typed events delivered to it.

use crate::error::{StatsError, StatsResult};
use crate::models::{Assignment, Comment, Course, File, Submission};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Per-subcategory values an analyzer reports for one name.
pub type Record = BTreeMap<String, Value>;

/// The levels of the hierarchy walk, plus the reset signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    Reset,
    Course,
    Assignment,
    Submission,
    File,
    Comment,
}

impl EventKind {
    /// Every event kind, in traversal order.
    pub const ALL: [EventKind; 6] = [
        EventKind::Reset,
        EventKind::Course,
        EventKind::Assignment,
        EventKind::Submission,
        EventKind::File,
        EventKind::Comment,
    ];

    /// Name of the handler this kind is delivered to.
    pub fn handler_name(&self) -> &'static str {
        match self {
            EventKind::Reset => "reset",
            EventKind::Course => "event_course",
            EventKind::Assignment => "event_assignment",
            EventKind::Submission => "event_submission",
            EventKind::File => "event_file",
            EventKind::Comment => "event_comment",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.handler_name())
    }
}

/// A hierarchy visit, carrying the records of every enclosing level.
#[derive(Debug, Clone, Copy)]
pub enum Event<'a> {
    Reset,
    Course {
        course: &'a Course,
    },
    Assignment {
        assignment: &'a Assignment,
    },
    Submission {
        assignment: &'a Assignment,
        submission: &'a Submission,
    },
    File {
        assignment: &'a Assignment,
        submission: &'a Submission,
        file: &'a File,
    },
    Comment {
        assignment: &'a Assignment,
        submission: &'a Submission,
        file: &'a File,
        comment: &'a Comment,
    },
}

impl Event<'_> {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Reset => EventKind::Reset,
            Event::Course { .. } => EventKind::Course,
            Event::Assignment { .. } => EventKind::Assignment,
            Event::Submission { .. } => EventKind::Submission,
            Event::File { .. } => EventKind::File,
            Event::Comment { .. } => EventKind::Comment,
        }
    }

    /// Delivers the event to the matching handler of `analyzer`.
    ///
    /// A reset that reports `false` is turned into a handler error.
    pub fn dispatch(&self, analyzer: &mut dyn Analyzer) -> StatsResult<()> {
        match *self {
            Event::Reset => {
                if analyzer.reset()? {
                    Ok(())
                } else {
                    Err(StatsError::handler("reset reported failure"))
                }
            }
            Event::Course { course } => analyzer.on_course(course),
            Event::Assignment { assignment } => analyzer.on_assignment(assignment),
            Event::Submission {
                assignment,
                submission,
            } => analyzer.on_submission(assignment, submission),
            Event::File {
                assignment,
                submission,
                file,
            } => analyzer.on_file(assignment, submission, file),
            Event::Comment {
                assignment,
                submission,
                file,
                comment,
            } => analyzer.on_comment(assignment, submission, file, comment),
        }
    }
}

/// A unit reacting to hierarchy visits and accumulating its own statistics.
///
/// Every handler has a no-op default, so an implementation only overrides
/// the levels it cares about. Handlers report problems through their
/// `Result`; the pool contains those errors (and panics) per analyzer.
pub trait Analyzer {
    /// Declared name, used for registration when no explicit name is given.
    fn name(&self) -> Option<&str> {
        None
    }

    /// Whether this analyzer has a handler for `kind`.
    ///
    /// An event no registered analyzer handles is reported as
    /// [`StatsError::UnknownEvent`] by the pool.
    fn handles(&self, _kind: EventKind) -> bool {
        true
    }

    /// Clears accumulated state. Returns whether the reset succeeded.
    fn reset(&mut self) -> StatsResult<bool> {
        Ok(true)
    }

    fn on_course(&mut self, _course: &Course) -> StatsResult<()> {
        Ok(())
    }

    fn on_assignment(&mut self, _assignment: &Assignment) -> StatsResult<()> {
        Ok(())
    }

    fn on_submission(
        &mut self,
        _assignment: &Assignment,
        _submission: &Submission,
    ) -> StatsResult<()> {
        Ok(())
    }

    fn on_file(
        &mut self,
        _assignment: &Assignment,
        _submission: &Submission,
        _file: &File,
    ) -> StatsResult<()> {
        Ok(())
    }

    fn on_comment(
        &mut self,
        _assignment: &Assignment,
        _submission: &Submission,
        _file: &File,
        _comment: &Comment,
    ) -> StatsResult<()> {
        Ok(())
    }

    /// Names recorded since the last reset.
    fn names(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    /// Values recorded for `name`, keyed by normalized subcategory.
    fn get_by_name(&self, _name: &str) -> Record {
        Record::new()
    }
}

/// Normalizes a display key: trimmed, lowercased, spaces become dashes.
pub fn normalize_key(s: &str) -> String {
    s.trim().to_lowercase().replace(' ', "-")
}
