//! Traversal driver.
//!
//! Walks one course depth-first (course, assignments, submissions, files,
//! comments) and fires the matching event on the analyzer pool at every
//! level. Analyzer failures are tallied, never fatal; lookup and source
//! failures end the run.

use crate::analyzers::{Analyzer, AnalyzerPool, EventKind, FireOutcome, Record};
use crate::error::{StatsError, StatsResult};
use crate::models::Course;
use crate::source::CourseSource;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// Counts of what a run visited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub assignments: usize,
    pub submissions: usize,
    pub files: usize,
    pub comments: usize,
    /// Analyzer handler invocations that failed across all events.
    pub handler_failures: usize,
}

/// Hooks called while a run progresses. All default to no-ops.
pub trait TraversalObserver {
    fn on_assignment_start(&mut self, _name: &str, _submissions: usize) {}

    fn on_submission_done(&mut self) {}

    fn on_assignment_done(&mut self, _name: &str) {}

    fn on_run_done(&mut self, _summary: &RunSummary) {}
}

/// Observer that ignores every hook.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl TraversalObserver for NoopObserver {}

/// Drives an [`AnalyzerPool`] over one course of a [`CourseSource`].
pub struct CourseEventLoop<S> {
    source: S,
    pool: AnalyzerPool,
    course_name: String,
    course_term: String,
    course: Course,
    assignments: Vec<String>,
    max_submissions: Option<usize>,
    names: BTreeSet<String>,
}

impl<S: CourseSource> CourseEventLoop<S> {
    /// Resolve the course `(name, term)` and select all of its assignments.
    pub fn new(source: S, course_name: &str, course_term: &str) -> StatsResult<Self> {
        if course_name.trim().is_empty() {
            return Err(StatsError::MissingConfig("course name"));
        }
        if course_term.trim().is_empty() {
            return Err(StatsError::MissingConfig("course term"));
        }

        let course = resolve_course(&source, course_name, course_term)?;
        let assignments = course.assignment_names();

        Ok(Self {
            source,
            pool: AnalyzerPool::new(),
            course_name: course_name.to_string(),
            course_term: course_term.to_string(),
            course,
            assignments,
            max_submissions: None,
            names: BTreeSet::new(),
        })
    }

    pub fn course(&self) -> &Course {
        &self.course
    }

    pub fn course_name(&self) -> &str {
        &self.course_name
    }

    pub fn course_term(&self) -> &str {
        &self.course_term
    }

    /// Assignments walked by [`CourseEventLoop::run`], in canonical order.
    pub fn assignments(&self) -> &[String] {
        &self.assignments
    }

    /// Restrict the walk to `names`; unknown names are dropped.
    ///
    /// `None` selects no assignment at all.
    pub fn set_assignments(&mut self, names: Option<Vec<String>>) {
        self.assignments = match names {
            Some(names) => self.existing_assignments(&names),
            None => Vec::new(),
        };
    }

    /// Cap the number of submissions walked per assignment.
    pub fn set_max_submissions(&mut self, max: Option<usize>) {
        self.max_submissions = max;
    }

    pub fn pool(&self) -> &AnalyzerPool {
        &self.pool
    }

    /// Register an analyzer; see [`AnalyzerPool::register`].
    pub fn register(
        &mut self,
        analyzer: Option<Box<dyn Analyzer>>,
        name: Option<&str>,
    ) -> Option<String> {
        self.pool.register(analyzer, name)
    }

    pub fn register_instance<A>(&mut self, analyzer: A, name: Option<&str>) -> String
    where
        A: Analyzer + 'static,
    {
        self.pool.register_instance(analyzer, name)
    }

    /// Register a default-constructed `A`.
    pub fn register_default<A>(&mut self, name: Option<&str>) -> String
    where
        A: Analyzer + Default + 'static,
    {
        self.pool.register_instance(A::default(), name)
    }

    pub fn register_with<F>(&mut self, factory: F, name: Option<&str>) -> StatsResult<String>
    where
        F: FnOnce() -> StatsResult<Box<dyn Analyzer>>,
    {
        self.pool.register_with(factory, name)
    }

    /// Reset every analyzer and forget the names seen by the last run.
    pub fn reset(&mut self) -> StatsResult<FireOutcome> {
        self.names.clear();
        self.pool.fire_reset()
    }

    pub fn run(&mut self) -> StatsResult<RunSummary> {
        self.run_with(&mut NoopObserver)
    }

    /// Walk the course, reporting progress to `observer`.
    pub fn run_with(&mut self, observer: &mut dyn TraversalObserver) -> StatsResult<RunSummary> {
        self.refresh_course()?;

        let course = self.course.clone();
        let selected = self.assignments.clone();
        let mut summary = RunSummary::default();

        info!(
            "Walking {} assignment(s) of {} ({}) with {} analyzer(s)",
            selected.len(),
            course.name,
            course.period,
            self.pool.len()
        );

        let outcome = self.pool.fire_course(&course)?;
        tally(&mut summary, EventKind::Course, outcome);

        for name in &selected {
            let Some(assignment) = course.assignment_by_name(name) else {
                warn!("Assignment '{}' disappeared from the course, skipping", name);
                continue;
            };

            let outcome = self.pool.fire_assignment(assignment)?;
            tally(&mut summary, EventKind::Assignment, outcome);
            summary.assignments += 1;

            let mut submissions = self.source.list_submissions(assignment)?;
            if let Some(max) = self.max_submissions {
                submissions.truncate(max);
            }

            debug!("'{}' has {} submission(s)", name, submissions.len());
            observer.on_assignment_start(name, submissions.len());

            for submission in &submissions {
                let outcome = self.pool.fire_submission(assignment, submission)?;
                tally(&mut summary, EventKind::Submission, outcome);
                summary.submissions += 1;

                for file in &submission.files {
                    let outcome = self.pool.fire_file(assignment, submission, file)?;
                    tally(&mut summary, EventKind::File, outcome);
                    summary.files += 1;

                    for comment in &file.comments {
                        let outcome = self
                            .pool
                            .fire_comment(assignment, submission, file, comment)?;
                        tally(&mut summary, EventKind::Comment, outcome);
                        summary.comments += 1;
                    }
                }

                observer.on_submission_done();
            }

            observer.on_assignment_done(name);
        }

        self.refresh_names();
        observer.on_run_done(&summary);

        info!(
            "Run complete: {} submission(s), {} comment(s), {} handler failure(s)",
            summary.submissions, summary.comments, summary.handler_failures
        );

        Ok(summary)
    }

    /// Names recorded by any analyzer during the last run.
    pub fn names(&self) -> &BTreeSet<String> {
        &self.names
    }

    /// Each analyzer's values for `name`, keyed by registration name.
    pub fn get_by_name(&self, name: &str) -> BTreeMap<String, Record> {
        self.pool
            .items()
            .into_iter()
            .map(|(analyzer_name, analyzer)| {
                (analyzer_name.to_string(), analyzer.get_by_name(name))
            })
            .collect()
    }

    fn refresh_course(&mut self) -> StatsResult<()> {
        self.course = resolve_course(&self.source, &self.course_name, &self.course_term)?;
        self.assignments = self.existing_assignments(&self.assignments);
        Ok(())
    }

    fn refresh_names(&mut self) {
        self.names = self
            .pool
            .values()
            .into_iter()
            .flat_map(|analyzer| analyzer.names())
            .collect();
    }

    fn existing_assignments(&self, wanted: &[String]) -> Vec<String> {
        self.course
            .assignment_names()
            .into_iter()
            .filter(|name| wanted.contains(name))
            .collect()
    }
}

fn resolve_course<S: CourseSource>(source: &S, name: &str, term: &str) -> StatsResult<Course> {
    let mut matches = source.find_courses(name, term)?;

    if matches.is_empty() {
        return Err(StatsError::CourseNotFound {
            name: name.to_string(),
            term: term.to_string(),
        });
    }

    if matches.len() > 1 {
        warn!(
            "{} courses match '{}' ({}), using the first one",
            matches.len(),
            name,
            term
        );
    }

    Ok(matches.swap_remove(0))
}

fn tally(summary: &mut RunSummary, kind: EventKind, outcome: FireOutcome) {
    for failure in &outcome.failed {
        debug!("{}: {} failed: {}", kind, failure.analyzer, failure.reason);
    }
    summary.handler_failures += outcome.failure;
}
