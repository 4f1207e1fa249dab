//! codepost-stats - grading statistics for codePost courses
//!
//! A course is walked depth-first (course, assignments, submissions,
//! files, comments) by a [`CourseEventLoop`]. At every level it fires an
//! event on an [`AnalyzerPool`], which delivers it to each registered
//! [`Analyzer`] while isolating their failures. Counting analyzers keep
//! their tallies in a [`KeyedCounterStore`].

pub mod analyzers;
pub mod cli;
pub mod config;
pub mod error;
pub mod event_loop;
pub mod models;
pub mod progress;
pub mod report;
pub mod source;

pub use analyzers::{Analyzer, AnalyzerPool, CounterAnalyzer, KeyedCounterStore};
pub use error::{StatsError, StatsResult};
pub use event_loop::{CourseEventLoop, RunSummary, TraversalObserver};
pub use source::{CourseSource, JsonSource};
