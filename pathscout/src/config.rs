use config::{Config as ConfigBuilder, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::errors::{SearchError, SearchResult};

/// Configuration for a search.
///
/// # Configuration Locations
///
/// The configuration can be loaded from multiple locations in order of precedence:
/// 1. Custom config file specified via `--config` flag
/// 2. Local `.pathscout.yaml` in the current directory
/// 3. Global `$HOME/.config/pathscout/config.yaml`
///
/// # Configuration Format
///
/// The configuration uses YAML format. Example:
/// ```yaml
/// # Substring to look for in entry names (case-sensitive)
/// term: "foo"
///
/// # Root directory to search in
/// root_path: "."
///
/// # Size of the worker pool (default: CPU cores)
/// thread_count: 4
///
/// # Only print the summary, not each matching path
/// stats_only: false
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "info"
/// ```
///
/// # CLI Integration
///
/// Command-line arguments take precedence over config file values. The
/// merging behavior is defined in [`SearchConfig::merge_with_cli`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Root directory to start search from
    #[serde(default = "default_root_path")]
    pub root_path: PathBuf,

    /// Substring matched against the base name of files and symlinks
    #[serde(default)]
    pub term: String,

    /// Number of worker threads in the pool.
    /// Defaults to number of CPU cores if not specified
    #[serde(default = "default_thread_count")]
    pub thread_count: NonZeroUsize,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to only show statistics instead of individual matches
    #[serde(default)]
    pub stats_only: bool,
}

/// Values supplied on the command line. `None` leaves the file value alone.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub root_path: Option<PathBuf>,
    pub term: Option<String>,
    pub thread_count: Option<NonZeroUsize>,
    pub log_level: Option<String>,
    pub stats_only: bool,
}

fn default_root_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_thread_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            root_path: default_root_path(),
            term: String::new(),
            thread_count: default_thread_count(),
            log_level: default_log_level(),
            stats_only: false,
        }
    }
}

impl SearchConfig {
    /// Builds a configuration for searching `root_path` for `term` with `thread_count` workers
    pub fn new(
        root_path: impl Into<PathBuf>,
        term: impl Into<String>,
        thread_count: NonZeroUsize,
    ) -> Self {
        Self {
            root_path: root_path.into(),
            term: term.into(),
            thread_count,
            ..Self::default()
        }
    }

    /// Loads configuration from the default locations plus an optional explicit file
    pub fn load_from(config_path: Option<&Path>) -> SearchResult<Self> {
        let mut builder = ConfigBuilder::builder();

        let default_files = [
            // Global config
            dirs::config_dir().map(|p| p.join("pathscout/config.yaml")),
            // Local config
            Some(PathBuf::from(".pathscout.yaml")),
        ];

        for path in default_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        // An explicit file must exist
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Merges CLI arguments with configuration file values
    pub fn merge_with_cli(mut self, cli: ConfigOverrides) -> Self {
        if let Some(root_path) = cli.root_path {
            self.root_path = root_path;
        }
        if let Some(term) = cli.term {
            self.term = term;
        }
        if let Some(thread_count) = cli.thread_count {
            self.thread_count = thread_count;
        }
        if let Some(log_level) = cli.log_level {
            self.log_level = log_level;
        }
        if cli.stats_only {
            self.stats_only = true;
        }
        self
    }

    /// Checks the values that serde cannot
    pub fn validate(&self) -> SearchResult<()> {
        if self.root_path.as_os_str().is_empty() {
            return Err(SearchError::config_error("root_path must not be empty"));
        }
        Ok(())
    }
}
