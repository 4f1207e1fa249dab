//! Markdown and JSON report generation.

use super::{ReportMetadata, StatsReport};
use crate::analyzers::normalize_key;
use crate::event_loop::RunSummary;
use anyhow::Result;
use serde_json::Value;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &StatsReport) -> String {
    let mut output = String::new();

    output.push_str("# Grading Statistics\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_summary_section(&report.summary));

    output.push_str("## Analyzers\n\n");
    if report.analyzers.is_empty() {
        output.push_str("No analyzers were registered.\n\n");
    }
    for analyzer in &report.analyzers {
        output.push_str(&generate_analyzer_section(report, analyzer));
    }

    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Course:** {}\n", metadata.course));
    section.push_str(&format!("- **Term:** {}\n", metadata.term));
    if metadata.assignments.is_empty() {
        section.push_str("- **Assignments:** none selected\n");
    } else {
        section.push_str(&format!(
            "- **Assignments:** {}\n",
            metadata.assignments.join(", ")
        ));
    }
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn generate_summary_section(summary: &RunSummary) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str("| Assignments | Submissions | Files | Comments | Handler Failures |\n");
    section.push_str("|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} | {} |\n\n",
        summary.assignments,
        summary.submissions,
        summary.files,
        summary.comments,
        summary.handler_failures
    ));

    section
}

/// One table per analyzer: a row per name, a column per assignment.
fn generate_analyzer_section(report: &StatsReport, analyzer: &str) -> String {
    let mut section = String::new();

    section.push_str(&format!("### `{}`\n\n", analyzer));

    let rows = report.analyzer_records(analyzer);
    if rows.is_empty() {
        section.push_str("*Nothing recorded.*\n\n");
        return section;
    }

    let columns: Vec<String> = report
        .metadata
        .assignments
        .iter()
        .map(|a| normalize_key(a))
        .collect();

    section.push_str("| Name |");
    for assignment in &report.metadata.assignments {
        section.push_str(&format!(" {} |", assignment));
    }
    section.push_str(" **Total** |\n");

    section.push_str("|:---|");
    section.push_str(&":---:|".repeat(columns.len()));
    section.push_str(":---:|\n");

    for (name, record) in rows {
        section.push_str(&format!("| {} |", name));

        let mut total = 0.0;
        for column in &columns {
            let cell = record.get(column);
            total += cell.and_then(Value::as_f64).unwrap_or(0.0);
            section.push_str(&format!(" {} |", format_cell(cell)));
        }

        section.push_str(&format!(" **{}** |\n", format_number(total)));
    }
    section.push('\n');

    section
}

fn format_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "0".to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by codepost-stats v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &StatsReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::Record;
    use chrono::Utc;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn create_test_metadata() -> ReportMetadata {
        ReportMetadata {
            course: "COS126".to_string(),
            term: "F2019".to_string(),
            assignments: vec!["Hello World".to_string(), "Loops".to_string()],
            generated_at: Utc::now(),
            duration_seconds: 1.25,
        }
    }

    fn record(pairs: &[(&str, i64)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), json!(v)))
            .collect()
    }

    fn create_test_report() -> StatsReport {
        let mut records = BTreeMap::new();
        records.insert(
            "g@x.com".to_string(),
            [
                (
                    "submissions.graded".to_string(),
                    record(&[("hello-world", 3), ("loops", 2)]),
                ),
                ("comments.counter".to_string(), Record::new()),
            ]
            .into_iter()
            .collect(),
        );
        records.insert(
            "h@x.com".to_string(),
            [(
                "submissions.graded".to_string(),
                record(&[("loops", 4)]),
            )]
            .into_iter()
            .collect(),
        );

        StatsReport {
            metadata: create_test_metadata(),
            summary: RunSummary {
                assignments: 2,
                submissions: 9,
                files: 12,
                comments: 30,
                handler_failures: 1,
            },
            analyzers: vec![
                "comments.counter".to_string(),
                "submissions.graded".to_string(),
            ],
            records,
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let markdown = generate_markdown_report(&create_test_report());

        assert!(markdown.contains("# Grading Statistics"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Summary"));
        assert!(markdown.contains("### `submissions.graded`"));
        assert!(markdown.contains("| Name | Hello World | Loops | **Total** |"));
        assert!(markdown.contains("| g@x.com | 3 | 2 | **5** |"));
        assert!(markdown.contains("| h@x.com | 0 | 4 | **4** |"));
    }

    #[test]
    fn test_empty_analyzer_section() {
        let markdown = generate_markdown_report(&create_test_report());
        let section = markdown
            .split("### `comments.counter`")
            .nth(1)
            .unwrap_or_default();
        assert!(section.trim_start().starts_with("*Nothing recorded.*"));
    }

    #[test]
    fn test_generate_metadata_section() {
        let section = generate_metadata_section(&create_test_metadata());

        assert!(section.contains("COS126"));
        assert!(section.contains("F2019"));
        assert!(section.contains("Hello World, Loops"));
        assert!(section.contains("1.2s") || section.contains("1.3s"));
    }

    #[test]
    fn test_summary_section_counts() {
        let section = generate_summary_section(&create_test_report().summary);
        assert!(section.contains("| 2 | 9 | 12 | 30 | 1 |"));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(2.5), "2.50");
    }

    #[test]
    fn test_generate_json_report() {
        let json = generate_json_report(&create_test_report()).unwrap();

        assert!(json.contains("\"metadata\""));
        assert!(json.contains("\"handler_failures\": 1"));
        assert!(json.contains("\"hello-world\": 3"));
    }
}
