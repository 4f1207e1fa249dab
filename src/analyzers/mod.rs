//! Analyzers and the machinery delivering traversal events to them.

pub mod base;
pub mod counter;
pub mod pool;
pub mod standard;
pub mod store;

pub use base::{normalize_key, Analyzer, Event, EventKind, Record};
pub use counter::{Count, CounterAnalyzer};
pub use pool::{with_panics_logged, AnalyzerPool, FireOutcome, HandlerFailure, HandlerOutcome};
pub use standard::{
    builtin, CommentKind, CommentSettings, CommentsCounter, SubmissionsGradedCounter,
    BUILTIN_ANALYZERS,
};
pub use store::KeyedCounterStore;
