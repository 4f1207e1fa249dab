//! Rendering of collected statistics.

mod generator;

pub use generator::{generate_json_report, generate_markdown_report};

use crate::analyzers::Record;
use crate::event_loop::{CourseEventLoop, RunSummary};
use crate::source::CourseSource;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Context of a run, printed at the top of a report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub course: String,
    pub term: String,
    pub assignments: Vec<String>,
    pub generated_at: DateTime<Utc>,
    pub duration_seconds: f64,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub metadata: ReportMetadata,
    pub summary: RunSummary,
    /// Registration names of the analyzers, in pool order.
    pub analyzers: Vec<String>,
    /// name -> analyzer -> record
    pub records: BTreeMap<String, BTreeMap<String, Record>>,
}

impl StatsReport {
    /// Collect the results of the last run of `event_loop`.
    pub fn collect<S: CourseSource>(
        event_loop: &CourseEventLoop<S>,
        summary: RunSummary,
        duration_seconds: f64,
    ) -> Self {
        let metadata = ReportMetadata {
            course: event_loop.course_name().to_string(),
            term: event_loop.course_term().to_string(),
            assignments: event_loop.assignments().to_vec(),
            generated_at: Utc::now(),
            duration_seconds,
        };

        let records = event_loop
            .names()
            .iter()
            .map(|name| (name.clone(), event_loop.get_by_name(name)))
            .collect();

        Self {
            metadata,
            summary,
            analyzers: event_loop
                .pool()
                .keys()
                .into_iter()
                .map(String::from)
                .collect(),
            records,
        }
    }

    /// Records of one analyzer, keyed by name. Names it never counted are left out.
    pub fn analyzer_records(&self, analyzer: &str) -> BTreeMap<&str, &Record> {
        self.records
            .iter()
            .filter_map(|(name, by_analyzer)| {
                by_analyzer
                    .get(analyzer)
                    .filter(|record| !record.is_empty())
                    .map(|record| (name.as_str(), record))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::{CommentsCounter, SubmissionsGradedCounter};
    use crate::models::fixtures::*;
    use crate::source::{Dataset, JsonSource};

    #[test]
    fn test_collect_from_event_loop() {
        let dataset = Dataset {
            courses: vec![course(
                "COS126",
                "F2019",
                vec![assignment(10, "Hello World", 0)],
            )],
            submissions: vec![submission(
                100,
                10,
                Some(GRADER),
                true,
                vec![file(1, vec![comment(1, GRADER, "nice", None)])],
            )],
        };

        let source = JsonSource::from_dataset(dataset);
        let mut event_loop = CourseEventLoop::new(&source, "COS126", "F2019").unwrap();
        event_loop.register_default::<SubmissionsGradedCounter>(None);
        event_loop.register_instance(CommentsCounter::rubric(), None);
        let summary = event_loop.run().unwrap();

        let report = StatsReport::collect(&event_loop, summary, 0.5);

        assert_eq!(report.metadata.course, "COS126");
        assert_eq!(report.metadata.assignments, vec!["Hello World"]);
        assert_eq!(
            report.analyzers,
            vec!["comments.counter.rubric", "submissions.graded"]
        );
        assert_eq!(report.summary.comments, 1);

        let graded = report.analyzer_records("submissions.graded");
        assert_eq!(graded[GRADER]["hello-world"], serde_json::json!(1));
        assert!(report.analyzer_records("comments.counter.rubric").is_empty());
    }
}
