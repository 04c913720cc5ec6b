use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use docscout::{
    launcher, logging, ConfigOverrides, FileTypeFilter, KeywordLogic, ScanEvent, ScanState,
    SearchConfig, SearchEngine, SearchReport,
};
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
struct CliSearchConfig {
    /// Root directory to search in [default: .]
    root: Option<PathBuf>,

    /// Keyword to search for
    #[arg(short = 'k', long = "keyword")]
    keyword1: Option<String>,

    /// Optional second keyword
    #[arg(short = 'K', long = "keyword2")]
    keyword2: Option<String>,

    /// How the two keywords combine (and|or)
    #[arg(short = 'l', long)]
    logic: Option<KeywordLogic>,

    /// Match whole words only
    #[arg(short = 'w', long, overrides_with = "substring")]
    whole_word: bool,

    /// Match anywhere inside words
    #[arg(long, overrides_with = "whole_word")]
    substring: bool,

    /// Match case exactly
    #[arg(short = 'c', long, overrides_with = "ignore_case")]
    case_sensitive: bool,

    /// Ignore case when matching
    #[arg(long, overrides_with = "case_sensitive")]
    ignore_case: bool,

    /// Search formula text instead of cached cell values
    #[arg(long, overrides_with = "values_only")]
    include_formulas: bool,

    /// Search cached cell values only
    #[arg(long, overrides_with = "include_formulas")]
    values_only: bool,

    /// Document formats to search (excel|pdf|both)
    #[arg(short = 't', long = "type")]
    file_type: Option<FileTypeFilter>,

    /// Only search the top-level directory
    #[arg(long, overrides_with = "recurse")]
    no_recurse: bool,

    /// Descend into subdirectories
    #[arg(long, overrides_with = "no_recurse")]
    recurse: bool,

    /// Number of files to evaluate concurrently
    #[arg(short = 'j', long)]
    threads: Option<NonZeroUsize>,

    /// Patterns to ignore (glob format)
    #[arg(short, long)]
    ignore: Vec<String>,

    /// Configuration file layered over the default locations
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Write the effective configuration to this file before searching
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search spreadsheets and PDFs for keywords
    Search(Box<CliSearchConfig>),

    /// Open a file with its default application
    Open {
        /// File to open
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Search(args) => run_search(*args),
        Commands::Open { path } => {
            logging::init("warn");
            launcher::open_with_default_application(&path)?;
            println!("Opened {}", path.display());
            Ok(())
        }
    }
}

/// `Some` when one of a pair of opposing flags was given
fn flag_pair(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

impl CliSearchConfig {
    fn to_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            root_path: self.root.clone(),
            keyword1: self.keyword1.clone(),
            keyword2: self.keyword2.clone(),
            logic: self.logic,
            whole_word: flag_pair(self.whole_word, self.substring),
            case_sensitive: flag_pair(self.case_sensitive, self.ignore_case),
            content_only: flag_pair(self.values_only, self.include_formulas),
            file_type: self.file_type,
            recurse: flag_pair(self.recurse, self.no_recurse),
            ignore_patterns: self.ignore.clone(),
            thread_count: self.threads,
            log_level: self.log_level.clone(),
        }
    }
}

fn run_search(args: CliSearchConfig) -> Result<()> {
    let config = SearchConfig::load_from(args.config.as_deref())
        .context("Failed to load configuration")?
        .merge_with_cli(args.to_overrides());
    logging::init(&config.log_level);

    debug!("Effective configuration: {:?}", config);

    if let Some(path) = &args.save_config {
        config.save_to(path)?;
    }

    let started = Instant::now();
    let engine = SearchEngine::new();
    let handle = engine.start_with_config(&config)?;

    let cancel = handle.cancellation_token();
    ctrlc::set_handler(move || {
        warn!("Interrupted, stopping search");
        cancel.cancel();
    })
    .context("Failed to set Ctrl+C handler")?;

    let progress = if args.json {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} files")?
                .progress_chars("#>-"),
        );
        bar
    };

    let mut report = SearchReport::new();
    for event in handle.events() {
        match &event {
            ScanEvent::Status(text) => progress.set_message(text.clone()),
            ScanEvent::Progress { processed, total } => {
                progress.set_length(*total as u64);
                progress.set_position(*processed as u64);
            }
            _ => {}
        }
        report.apply(event);
    }
    progress.finish_and_clear();

    let summary = handle.wait();
    let elapsed = Duration::from_millis(started.elapsed().as_millis() as u64);
    report.summary = Some(summary);
    report.sort_by_matches();

    if args.json {
        print_json(&report)?;
    } else {
        print_search_results(&report, &config, elapsed);
    }

    if summary.state == ScanState::Failed {
        bail!("Search failed: {}", report.errors.iter().join("; "));
    }
    Ok(())
}

fn print_json(report: &SearchReport) -> Result<()> {
    let output = serde_json::json!({
        "files": report.file_results,
        "total_matches": report.total_matches,
        "files_with_matches": report.files_with_matches,
        "files_processed": report.progress.0,
        "files_total": report.progress.1,
        "stopped": report.stopped,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_search_results(report: &SearchReport, config: &SearchConfig, elapsed: Duration) {
    let has_keyword2 = !config.keyword2.trim().is_empty();

    for result in &report.file_results {
        println!("\n{}", result.path.display().to_string().blue());
        println!(
            "  {} | {} matches | {}",
            result.file_type,
            result.total_match_count.to_string().green(),
            result.display_location
        );
        if has_keyword2 {
            println!(
                "  {}: {}, {}: {}",
                config.keyword1.trim(),
                result.keyword1_count,
                config.keyword2.trim(),
                result.keyword2_count
            );
        }
    }

    for error in &report.errors {
        eprintln!("{}", error.red());
    }

    if report.stopped {
        println!("\n{}", "Search stopped".yellow());
    }

    let by_type = report
        .file_results
        .iter()
        .counts_by(|r| r.file_type)
        .into_iter()
        .sorted_by_key(|(file_type, _)| file_type.to_string())
        .map(|(file_type, count)| format!("{} {}", count, file_type))
        .join(", ");

    println!(
        "\nFound {} matches in {} of {} files{} in {}",
        report.total_matches,
        report.files_with_matches,
        report.progress.1,
        if by_type.is_empty() {
            String::new()
        } else {
            format!(" ({})", by_type)
        },
        humantime::format_duration(elapsed)
    );
}
