use clap::{Parser, ValueEnum};
use colored::Colorize;
use pathscout::{
    report::permission_denied_line, search_with_reporter, ConfigOverrides, Reporter,
    SearchConfig, SearchError, SearchOutcome,
};
use std::io::{self, IsTerminal, Write};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

type Result<T> = std::result::Result<T, SearchError>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Find files whose name contains a term, using a fixed pool of threads",
    long_about = None
)]
struct Cli {
    /// Root directory to search
    root: PathBuf,

    /// Substring to look for in file and symlink names (case-sensitive)
    term: String,

    /// Number of search threads (default: config file, then CPU count)
    threads: Option<NonZeroUsize>,

    /// Configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long)]
    log_level: Option<String>,

    /// Show only statistics, not matches
    #[arg(short, long)]
    stats: bool,

    /// Print the outcome as JSON instead of the summary line (match lines are suppressed)
    #[arg(long)]
    json: bool,

    /// When to colour output
    #[arg(long, value_enum, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Clone, Copy, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

/// Prints matches and skipped directories as they are found
struct ConsoleReporter {
    show_matches: bool,
    /// Keep stdout for the JSON document only
    json: bool,
}

impl ConsoleReporter {
    fn emit(&self, line: &str) {
        let result = if self.json {
            writeln!(io::stderr().lock(), "{}", line)
        } else {
            writeln!(io::stdout().lock(), "{}", line)
        };
        if let Err(e) = result {
            debug!("Failed to write search output: {}", e);
        }
    }
}

impl Reporter for ConsoleReporter {
    fn on_match(&self, path: &Path) {
        if self.show_matches && !self.json {
            self.emit(&path.display().to_string().blue().to_string());
        }
    }

    fn on_permission_denied(&self, path: &Path) {
        self.emit(&permission_denied_line(path).yellow().to_string());
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(outcome) if outcome.all_workers_succeeded => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<SearchOutcome> {
    let config = SearchConfig::load_from(cli.config.as_deref())?.merge_with_cli(ConfigOverrides {
        root_path: Some(cli.root),
        term: Some(cli.term),
        thread_count: cli.threads,
        log_level: cli.log_level,
        stats_only: cli.stats,
    });

    init_logging(&config.log_level);
    set_color(cli.color);

    let reporter = Arc::new(ConsoleReporter {
        show_matches: !config.stats_only,
        json: cli.json,
    });
    let outcome = search_with_reporter(&config, reporter)?;

    for failure in &outcome.failures {
        eprintln!("{}", format!("Worker {}: {}", failure.worker, failure.message).red());
    }

    if cli.json {
        println!("{}", outcome.to_json()?);
    } else {
        println!("{}", outcome.summary_line());
    }

    if config.stats_only {
        print_stats(&outcome);
    }
    Ok(outcome)
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("pathscout={},warn", level)))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn set_color(choice: ColorChoice) {
    match choice {
        ColorChoice::Always => colored::control::set_override(true),
        ColorChoice::Never => colored::control::set_override(false),
        ColorChoice::Auto => {
            if !io::stdout().is_terminal() {
                colored::control::set_override(false);
            }
        }
    }
}

fn print_stats(outcome: &SearchOutcome) {
    let stats = &outcome.stats;
    eprintln!(
        "Scanned {} directories ({} entries) in {}",
        stats.dirs_scanned,
        stats.entries_seen,
        humantime::format_duration(outcome.elapsed)
    );
    eprintln!(
        "Skipped {} unreadable directories, {} worker(s) failed",
        stats.permission_denied, stats.worker_failures
    );
    eprintln!(
        "Queued {} directories, at most {} pending at once",
        outcome.queue.enqueued, outcome.queue.peak_len
    );
}
