//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.codepost-stats.toml` files.

use crate::analyzers::{CommentSettings, BUILTIN_ANALYZERS};
use crate::cli::OutputFormat;
use crate::error::{StatsError, StatsResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".codepost-stats.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Which course to walk.
    #[serde(default)]
    pub course: CourseConfig,

    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Traversal settings.
    #[serde(default)]
    pub run: RunConfig,

    /// Analyzer selection and tuning.
    #[serde(default)]
    pub analyzers: AnalyzersConfig,
}

/// Course selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseConfig {
    #[serde(default)]
    pub name: Option<String>,

    /// Term the course was offered in, e.g. `F2019`.
    #[serde(default)]
    pub term: Option<String>,

    /// Assignment allow-list. Unset means every assignment.
    #[serde(default)]
    pub assignments: Option<Vec<String>>,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Output file path. Unset means `codepost_stats.<ext>` for the chosen format.
    #[serde(default)]
    pub output: Option<String>,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Stem of the report file written when no output path is configured.
const DEFAULT_OUTPUT_STEM: &str = "codepost_stats";

/// Traversal settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Per-assignment cap on the submissions walked.
    #[serde(default)]
    pub max_submissions: Option<usize>,

    /// Draw progress bars on interactive terminals.
    #[serde(default = "default_true")]
    pub progress: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_submissions: None,
            progress: true,
        }
    }
}

/// Analyzer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzersConfig {
    /// Built-in analyzers to register, by name.
    #[serde(default = "default_enabled")]
    pub enabled: Vec<String>,

    /// Filters shared by the comment counters.
    #[serde(default)]
    pub comments: CommentsConfig,
}

impl Default for AnalyzersConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            comments: CommentsConfig::default(),
        }
    }
}

fn default_enabled() -> Vec<String> {
    BUILTIN_ANALYZERS.iter().map(|s| s.to_string()).collect()
}

/// Comment counter filters. Negative thresholds mean "no threshold".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentsConfig {
    #[serde(default)]
    pub min_characters: Option<i64>,

    #[serde(default)]
    pub min_words: Option<i64>,

    /// Only count comments written by the submission's grader.
    #[serde(default = "default_true")]
    pub only_graders: bool,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            min_characters: None,
            min_words: None,
            only_graders: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the current directory.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load configuration from `dir`.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref name) = args.course {
            self.course.name = Some(name.clone());
        }
        if let Some(ref term) = args.term {
            self.course.term = Some(term.clone());
        }
        if let Some(ref assignments) = args.assignments {
            self.course.assignments = Some(assignments.clone());
        }

        if let Some(ref analyzers) = args.analyzers {
            self.analyzers.enabled = analyzers.clone();
        }
        if args.min_characters.is_some() {
            self.analyzers.comments.min_characters = args.min_characters;
        }
        if args.min_words.is_some() {
            self.analyzers.comments.min_words = args.min_words;
        }
        if args.all_authors {
            self.analyzers.comments.only_graders = false;
        }

        if args.max_submissions.is_some() {
            self.run.max_submissions = args.max_submissions;
        }
        if args.no_progress || args.quiet {
            self.run.progress = false;
        }

        if let Some(ref output) = args.output {
            self.general.output = Some(output.display().to_string());
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// The `(name, term)` of the course to walk.
    pub fn course_selection(&self) -> StatsResult<(&str, &str)> {
        let name = non_empty(self.course.name.as_deref()).ok_or(StatsError::MissingConfig(
            "course name (--course or [course] name)",
        ))?;
        let term = non_empty(self.course.term.as_deref()).ok_or(StatsError::MissingConfig(
            "course term (--term or [course] term)",
        ))?;
        Ok((name, term))
    }

    /// Where the report goes: the configured path, else a default named
    /// after `format`.
    pub fn output_path(&self, format: OutputFormat) -> String {
        match self.general.output.as_deref() {
            Some(path) if !path.trim().is_empty() => path.to_string(),
            _ => format!("{}.{}", DEFAULT_OUTPUT_STEM, format.extension()),
        }
    }

    /// Settings handed to the built-in comment counters.
    pub fn comment_settings(&self) -> CommentSettings {
        let comments = &self.analyzers.comments;
        CommentSettings::from_thresholds(
            comments.min_characters,
            comments.min_words,
            comments.only_graders,
        )
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::tests::make_args;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.general.output.is_none());
        assert_eq!(config.output_path(OutputFormat::Markdown), "codepost_stats.md");
        assert!(config.run.progress);
        assert!(config.analyzers.comments.only_graders);
        assert_eq!(config.analyzers.enabled.len(), BUILTIN_ANALYZERS.len());
        assert!(config.course.name.is_none());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[course]
name = "COS126"
term = "F2019"
assignments = ["Hello", "Loops"]

[general]
output = "custom_report.md"
verbose = true

[run]
max_submissions = 10

[analyzers]
enabled = ["comments.counter"]

[analyzers.comments]
min_words = 3
only_graders = false
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.course_selection().unwrap(), ("COS126", "F2019"));
        assert_eq!(
            config.course.assignments,
            Some(vec!["Hello".to_string(), "Loops".to_string()])
        );
        assert_eq!(config.general.output.as_deref(), Some("custom_report.md"));
        assert!(config.general.verbose);
        assert_eq!(config.run.max_submissions, Some(10));
        assert!(config.run.progress);
        assert_eq!(config.analyzers.enabled, vec!["comments.counter"]);
        assert_eq!(config.analyzers.comments.min_words, Some(3));
        assert!(!config.analyzers.comments.only_graders);
    }

    #[test]
    fn test_course_selection_missing() {
        let mut config = Config::default();
        assert!(matches!(
            config.course_selection(),
            Err(StatsError::MissingConfig(_))
        ));

        config.course.name = Some("COS126".to_string());
        config.course.term = Some("".to_string());
        assert!(matches!(
            config.course_selection(),
            Err(StatsError::MissingConfig(msg)) if msg.starts_with("course term")
        ));
    }

    #[test]
    fn test_merge_only_explicit_values() {
        let mut config: Config = toml::from_str(
            r#"
[course]
name = "COS217"
term = "S2020"
assignments = ["Shell"]

[analyzers.comments]
min_characters = 20
"#,
        )
        .unwrap();

        let mut args = make_args();
        args.term = None;
        args.min_words = Some(-1);
        args.all_authors = true;
        args.no_progress = true;

        config.merge_with_args(&args);

        assert_eq!(config.course_selection().unwrap(), ("COS126", "S2020"));
        assert_eq!(config.course.assignments, Some(vec!["Shell".to_string()]));
        assert!(!config.run.progress);

        let settings = config.comment_settings();
        assert_eq!(settings.min_characters, Some(20));
        assert_eq!(settings.min_words, None);
        assert!(!settings.only_graders);
    }

    #[test]
    fn test_default_output_follows_format() {
        let mut config = Config::default();
        assert_eq!(config.output_path(OutputFormat::Json), "codepost_stats.json");

        let mut args = make_args();
        args.format = OutputFormat::Json;
        config.merge_with_args(&args);
        assert_eq!(config.output_path(args.format), "codepost_stats.json");

        args.output = Some("stats/out.txt".into());
        config.merge_with_args(&args);
        assert_eq!(config.output_path(OutputFormat::Json), "stats/out.txt");
        assert_eq!(config.output_path(OutputFormat::Markdown), "stats/out.txt");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[course]\nname = \"COS126\"\nterm = \"F2019\"\n")
            .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.course.name.as_deref(), Some("COS126"));
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempdir().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[run]\nprogress = false\n").unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert!(!config.run.progress);

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[run\n").unwrap();
        assert!(Config::load_from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[run]"));
        assert!(toml_str.contains("[analyzers]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.analyzers.enabled, Config::default().analyzers.enabled);
    }
}
