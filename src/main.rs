//! codepost-stats - grading statistics for codePost courses
//!
//! A CLI tool that walks a codePost course export and reports how many
//! submissions each grader finalized and how many comments they left.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (config, dataset, unknown course, etc.)
//!   2 - Analyzer handlers failed and --fail-on-analyzer-errors is set

use anyhow::{Context, Result};
use codepost_stats::analyzers::{builtin, with_panics_logged, BUILTIN_ANALYZERS};
use codepost_stats::cli::{Args, OutputFormat};
use codepost_stats::config::{Config, CONFIG_FILE_NAME};
use codepost_stats::event_loop::CourseEventLoop;
use codepost_stats::progress::ProgressObserver;
use codepost_stats::report::{self, StatsReport};
use codepost_stats::source::JsonSource;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config and --list-analyzers early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }
    if args.list_analyzers {
        for name in BUILTIN_ANALYZERS {
            println!("{}", name);
        }
        return Ok(());
    }

    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(&args, &config)?;

    info!("codepost-stats v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {:?}", config);

    match run_stats(&args, &config) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .codepost-stats.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Set [course] name and term, then pick analyzers and thresholds.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) -> Result<()> {
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    Ok(Config::load_default()?.unwrap_or_default())
}

/// Walk the course and write the report. Returns exit code (0 or 2).
fn run_stats(args: &Args, config: &Config) -> Result<i32> {
    let start_time = Instant::now();

    let (course, term) = config.course_selection()?;
    let dataset = args
        .dataset
        .as_deref()
        .context("No dataset given (--dataset)")?;

    // Step 1: Load the export
    println!("📥 Loading dataset: {}", dataset.display());
    let source = JsonSource::load(dataset)?;

    // Step 2: Resolve the course and register analyzers
    let mut event_loop = CourseEventLoop::new(source, course, term)?;
    if let Some(ref assignments) = config.course.assignments {
        event_loop.set_assignments(Some(assignments.clone()));
    }
    event_loop.set_max_submissions(config.run.max_submissions);

    let settings = config.comment_settings();
    for name in &config.analyzers.enabled {
        let registered = event_loop.register_with(|| builtin(name, &settings), None)?;
        debug!("Registered analyzer {}", registered);
    }

    println!(
        "🔬 Walking {} ({}): {} assignment(s), {} analyzer(s)",
        course,
        term,
        event_loop.assignments().len(),
        event_loop.pool().len()
    );

    // Step 3: Walk the course
    let mut progress = ProgressObserver::new(config.run.progress);
    let summary = with_panics_logged(|| event_loop.run_with(&mut progress))?;
    drop(progress);

    // Step 4: Build and save the report
    let duration = start_time.elapsed().as_secs_f64();
    let report = StatsReport::collect(&event_loop, summary.clone(), duration);

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    let output_path = config.output_path(args.format);
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path))?;

    // Print summary
    println!("\n📊 Run Summary:");
    println!("   Assignments: {}", summary.assignments);
    println!("   Submissions: {}", summary.submissions);
    println!("   Comments: {}", summary.comments);
    println!("   Names recorded: {}", report.records.len());
    if summary.handler_failures > 0 {
        println!("   Analyzer failures: {}", summary.handler_failures);
    }
    println!("   Duration: {:.1}s", duration);
    println!("\n✅ Done! Report saved to: {}", output_path);

    if args.fail_on_analyzer_errors && summary.handler_failures > 0 {
        eprintln!(
            "\n⛔ {} analyzer handler(s) failed. Failing (exit code 2).",
            summary.handler_failures
        );
        return Ok(2);
    }

    Ok(0)
}
