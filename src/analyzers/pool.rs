//! Registry of analyzers and the fault-isolating event broadcast.

use super::base::{Analyzer, Event, EventKind};
use crate::error::{StatsError, StatsResult};
use crate::models::{Assignment, Comment, Course, File, Submission};
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// Result of delivering one event to one analyzer.
#[derive(Debug)]
pub enum HandlerOutcome {
    /// The handler ran and returned `Ok`.
    Handled,
    /// The analyzer has no handler for the event.
    NotFound,
    /// The handler returned an error.
    Failed(StatsError),
    /// The handler panicked; carries the panic message when it was a string.
    Panicked(String),
}

impl fmt::Display for HandlerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerOutcome::Handled => write!(f, "handled"),
            HandlerOutcome::NotFound => write!(f, "no handler for this event"),
            HandlerOutcome::Failed(e) => write!(f, "{}", e),
            HandlerOutcome::Panicked(msg) if msg.is_empty() => write!(f, "panicked"),
            HandlerOutcome::Panicked(msg) => write!(f, "panicked: {}", msg),
        }
    }
}

/// An analyzer counted as a failure by a broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFailure {
    /// Registration name of the analyzer.
    pub analyzer: String,
    pub reason: String,
}

/// Tally of one broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FireOutcome {
    pub success: usize,
    pub failure: usize,
    pub failed: Vec<HandlerFailure>,
}

impl FireOutcome {
    /// `(success, failure)` pair.
    pub fn counts(&self) -> (usize, usize) {
        (self.success, self.failure)
    }

    pub fn has_failures(&self) -> bool {
        self.failure > 0
    }

    /// Registration names of the failed analyzers, in delivery order.
    pub fn failed_names(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.analyzer.as_str()).collect()
    }

    /// Adds the counts of another broadcast into this one.
    pub fn absorb(&mut self, other: FireOutcome) {
        self.success += other.success;
        self.failure += other.failure;
        self.failed.extend(other.failed);
    }

    fn record_failure(&mut self, analyzer: &str, outcome: &HandlerOutcome) {
        self.failure += 1;
        self.failed.push(HandlerFailure {
            analyzer: analyzer.to_string(),
            reason: outcome.to_string(),
        });
    }
}

/// Analyzers registered under unique names.
///
/// Broadcasting delivers an event to every analyzer in name order. Errors
/// and panics raised by one analyzer's handler are contained and counted;
/// they never stop delivery to the others.
#[derive(Default)]
pub struct AnalyzerPool {
    registered: BTreeMap<String, Box<dyn Analyzer>>,
}

impl AnalyzerPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.registered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    pub fn keys(&self) -> Vec<&str> {
        self.registered.keys().map(String::as_str).collect()
    }

    pub fn values(&self) -> Vec<&dyn Analyzer> {
        self.registered.values().map(|a| a.as_ref()).collect()
    }

    pub fn items(&self) -> Vec<(&str, &dyn Analyzer)> {
        self.registered
            .iter()
            .map(|(name, a)| (name.as_str(), a.as_ref()))
            .collect()
    }

    /// Same as [`AnalyzerPool::values`].
    pub fn analyzers(&self) -> Vec<&dyn Analyzer> {
        self.values()
    }

    pub fn get(&self, name: &str) -> Option<&dyn Analyzer> {
        self.registered.get(name).map(|a| a.as_ref())
    }

    /// Removes every registration.
    pub fn clear(&mut self) {
        self.registered.clear();
    }

    /// Registers `analyzer` and returns the name it was bound to.
    ///
    /// The name is, in order of priority: `name`, the analyzer's declared
    /// name, or a generated `unnamed-analyzer-<n>` not yet in use. An
    /// existing binding under the same name is replaced. `None` is ignored.
    pub fn register(
        &mut self,
        analyzer: Option<Box<dyn Analyzer>>,
        name: Option<&str>,
    ) -> Option<String> {
        let analyzer = analyzer?;

        let name = match name.or_else(|| analyzer.name()) {
            Some(name) => name.to_string(),
            None => self.unused_placeholder(),
        };

        self.registered.insert(name.clone(), analyzer);
        Some(name)
    }

    /// Registers a concrete analyzer instance.
    pub fn register_instance<A>(&mut self, analyzer: A, name: Option<&str>) -> String
    where
        A: Analyzer + 'static,
    {
        let boxed: Box<dyn Analyzer> = Box::new(analyzer);
        self.register(Some(boxed), name).unwrap_or_default()
    }

    /// Registers an analyzer produced by `factory`.
    ///
    /// A factory error means the analyzer could not be constructed and is
    /// reported as [`StatsError::RegistrationType`].
    pub fn register_with<F>(&mut self, factory: F, name: Option<&str>) -> StatsResult<String>
    where
        F: FnOnce() -> StatsResult<Box<dyn Analyzer>>,
    {
        let analyzer = factory().map_err(|e| match e {
            StatsError::RegistrationType(msg) => StatsError::RegistrationType(msg),
            other => StatsError::RegistrationType(format!("construction failed: {}", other)),
        })?;

        Ok(self.register(Some(analyzer), name).unwrap_or_default())
    }

    fn unused_placeholder(&self) -> String {
        let mut i = self.registered.len();
        loop {
            let candidate = format!("unnamed-analyzer-{}", i);
            if !self.registered.contains_key(&candidate) {
                return candidate;
            }
            i += 1;
        }
    }

    /// Delivers `event` to every registered analyzer.
    ///
    /// Analyzers without a handler for the event count as failures, unless
    /// no analyzer handles it at all: that almost certainly means the wrong
    /// event was fired, and is reported as [`StatsError::UnknownEvent`].
    pub fn fire_event(&mut self, event: Event<'_>) -> StatsResult<FireOutcome> {
        let kind = event.kind();
        let mut outcome = FireOutcome::default();
        let mut not_found = Vec::new();

        for (name, analyzer) in self.registered.iter_mut() {
            match deliver(&event, analyzer.as_mut()) {
                HandlerOutcome::Handled => outcome.success += 1,
                HandlerOutcome::NotFound => not_found.push(name.as_str()),
                failed => outcome.record_failure(name, &failed),
            }
        }

        if outcome.success == 0 && outcome.failure == 0 && !not_found.is_empty() {
            return Err(StatsError::UnknownEvent(kind));
        }

        for name in not_found {
            outcome.record_failure(name, &HandlerOutcome::NotFound);
        }

        Ok(outcome)
    }

    pub fn fire_reset(&mut self) -> StatsResult<FireOutcome> {
        self.fire_event(Event::Reset)
    }

    pub fn fire_course(&mut self, course: &Course) -> StatsResult<FireOutcome> {
        self.fire_event(Event::Course { course })
    }

    pub fn fire_assignment(&mut self, assignment: &Assignment) -> StatsResult<FireOutcome> {
        self.fire_event(Event::Assignment { assignment })
    }

    pub fn fire_submission(
        &mut self,
        assignment: &Assignment,
        submission: &Submission,
    ) -> StatsResult<FireOutcome> {
        self.fire_event(Event::Submission {
            assignment,
            submission,
        })
    }

    pub fn fire_file(
        &mut self,
        assignment: &Assignment,
        submission: &Submission,
        file: &File,
    ) -> StatsResult<FireOutcome> {
        self.fire_event(Event::File {
            assignment,
            submission,
            file,
        })
    }

    pub fn fire_comment(
        &mut self,
        assignment: &Assignment,
        submission: &Submission,
        file: &File,
        comment: &Comment,
    ) -> StatsResult<FireOutcome> {
        self.fire_event(Event::Comment {
            assignment,
            submission,
            file,
            comment,
        })
    }
}

/// Runs `f` with panic reports sent to `debug!` instead of stderr.
///
/// Handler panics are still counted by the pool. The previous hook is
/// restored when `f` returns.
pub fn with_panics_logged<R>(f: impl FnOnce() -> R) -> R {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(|info| {
        tracing::debug!("analyzer {}", info);
    }));

    let result = f();

    panic::set_hook(previous);
    result
}

/// Runs one handler behind a panic boundary.
fn deliver(event: &Event<'_>, analyzer: &mut dyn Analyzer) -> HandlerOutcome {
    if !analyzer.handles(event.kind()) {
        return HandlerOutcome::NotFound;
    }

    match panic::catch_unwind(AssertUnwindSafe(|| event.dispatch(analyzer))) {
        Ok(Ok(())) => HandlerOutcome::Handled,
        Ok(Err(e)) => HandlerOutcome::Failed(e),
        Err(payload) => {
            let msg = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_default();
            HandlerOutcome::Panicked(msg)
        }
    }
}
