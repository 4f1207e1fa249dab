//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::analyzers::BUILTIN_ANALYZERS;
use clap::Parser;
use std::path::PathBuf;

/// codepost-stats - grading statistics for codePost courses
///
/// Walks every submission, file and comment of a course export and counts
/// graded submissions and grader comments per assignment.
///
/// Examples:
///   codepost-stats --dataset export.json --course COS126 --term F2019
///   codepost-stats --dataset export.json --course COS126 --term F2019 --assignments Hello,Loops
///   codepost-stats --dataset export.json --course COS126 --term F2019 --format json -o stats.json
///   codepost-stats --list-analyzers
///   codepost-stats --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// JSON export holding courses and submissions
    #[arg(
        short,
        long,
        value_name = "FILE",
        required_unless_present_any = ["init_config", "list_analyzers"]
    )]
    pub dataset: Option<PathBuf>,

    /// Course name, e.g. COS126
    #[arg(long, value_name = "NAME", env = "CODEPOST_STATS_COURSE")]
    pub course: Option<String>,

    /// Course term (period), e.g. F2019
    #[arg(long, value_name = "TERM", env = "CODEPOST_STATS_TERM")]
    pub term: Option<String>,

    /// Assignments to walk (comma-separated)
    ///
    /// Names the course does not have are ignored. Defaults to all of them.
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub assignments: Option<Vec<String>>,

    /// Analyzers to register (comma-separated)
    ///
    /// See --list-analyzers. Defaults to every built-in analyzer.
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub analyzers: Option<Vec<String>>,

    /// Ignore comments shorter than this many characters
    ///
    /// A negative value removes the threshold.
    #[arg(long, value_name = "COUNT", allow_negative_numbers = true)]
    pub min_characters: Option<i64>,

    /// Ignore comments with fewer words than this
    ///
    /// A negative value removes the threshold.
    #[arg(long, value_name = "COUNT", allow_negative_numbers = true)]
    pub min_words: Option<i64>,

    /// Count comments from every author, not only the submission's grader
    #[arg(long)]
    pub all_authors: bool,

    /// Walk at most this many submissions per assignment
    #[arg(long, value_name = "COUNT")]
    pub max_submissions: Option<usize>,

    /// Output file path for the report
    ///
    /// Defaults to the `[general] output` config value, then to
    /// `codepost_stats.md` or `codepost_stats.json` depending on --format.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .codepost-stats.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Do not draw progress bars
    #[arg(long)]
    pub no_progress: bool,

    /// Print the built-in analyzer names and exit
    #[arg(long)]
    pub list_analyzers: bool,

    /// Exit with code 2 if any analyzer handler failed during the run
    #[arg(long)]
    pub fail_on_analyzer_errors: bool,

    /// Generate a default .codepost-stats.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// File extension of reports in this format.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config || self.list_analyzers {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref dataset) = self.dataset {
            if !dataset.is_file() {
                return Err(format!("Dataset file does not exist: {}", dataset.display()));
            }
        }

        if matches!(self.course.as_deref(), Some(name) if name.trim().is_empty()) {
            return Err("Course name must not be empty".to_string());
        }

        if matches!(self.term.as_deref(), Some(term) if term.trim().is_empty()) {
            return Err("Course term must not be empty".to_string());
        }

        if self.max_submissions == Some(0) {
            return Err("Max submissions must be at least 1".to_string());
        }

        if let Some(ref analyzers) = self.analyzers {
            if analyzers.is_empty() {
                return Err("At least one analyzer is required".to_string());
            }
            if let Some(unknown) = analyzers
                .iter()
                .find(|name| !BUILTIN_ANALYZERS.contains(&name.as_str()))
            {
                return Err(format!(
                    "Unknown analyzer '{}' (available: {})",
                    unknown,
                    BUILTIN_ANALYZERS.join(", ")
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
