use config::{Config as ConfigBuilder, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::errors::{ScanError, ScanResult, TERMS_ENV_VAR};
use crate::filters::default_skip_dirs;

/// Read limit applied to every Makefile when none is configured (1 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1 << 20;

/// Configuration for a scan.
///
/// # Configuration Locations
///
/// Values are layered, later sources overriding earlier ones:
/// 1. Global `$CONFIG_DIR/depsearch/config.yaml`
/// 2. Local `.depsearch.yaml` in the current directory
/// 3. A file passed with `--config`
/// 4. Command-line flags, applied through [`ScanConfig::merge_with_cli`]
///
/// # Configuration Format
///
/// ```yaml
/// # Regex terms, one per line
/// terms_path: "/usr/local/etc/depsearch/terms.txt"
///
/// # Root of the ports tree
/// root_path: "/usr/ports"
///
/// # Matcher threads (0 = one per CPU)
/// workers: 8
///
/// # Makefiles larger than this are skipped unread
/// max_file_size: 1048576
///
/// # Capture the text of matching lines
/// show_lines: false
///
/// # Directory names never descended into
/// skip_dirs: ["distfiles", ".git", "work"]
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "warn"
/// ```
///
/// A zero `workers` or `max_file_size` means "use the default"; the scan
/// resolves both once through [`ScanConfig::normalized`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Term file to load; falls back to `$DEPSEARCH_TERMS`
    #[serde(default)]
    pub terms_path: Option<PathBuf>,

    /// Root directory to walk
    #[serde(default = "default_root_path")]
    pub root_path: PathBuf,

    /// Number of matcher threads (0 selects the host parallelism)
    #[serde(default)]
    pub workers: usize,

    /// Maximum Makefile size in bytes (0 selects 1 MiB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Whether to capture matching line text in results
    #[serde(default)]
    pub show_lines: bool,

    /// Directory names whose subtrees are never scanned
    #[serde(default = "default_skip_dirs")]
    pub skip_dirs: BTreeSet<String>,

    /// Report skipped oversized files and per-file diagnostics
    #[serde(default)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Values given on the command line; `None`/`false` leaves the file value alone
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub terms_path: Option<PathBuf>,
    pub root_path: Option<PathBuf>,
    pub workers: Option<usize>,
    pub max_file_size: Option<u64>,
    pub show_lines: bool,
    pub skip_dirs: Option<BTreeSet<String>>,
    pub verbose: bool,
}

fn default_root_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            terms_path: None,
            root_path: default_root_path(),
            workers: 0,
            max_file_size: default_max_file_size(),
            show_lines: false,
            skip_dirs: default_skip_dirs(),
            verbose: false,
            log_level: default_log_level(),
        }
    }
}

impl ScanConfig {
    /// Creates a default configuration rooted at `root_path`
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
            ..Self::default()
        }
    }

    /// Loads configuration from the default locations plus an optional
    /// explicit file.
    ///
    /// The explicit file must exist; the default locations are optional.
    pub fn load_from(config_path: Option<&Path>) -> ScanResult<Self> {
        let mut builder = ConfigBuilder::builder();

        let defaults = [
            dirs::config_dir().map(|p| p.join("depsearch/config.yaml")),
            Some(PathBuf::from(".depsearch.yaml")),
        ];
        for path in defaults.iter().flatten() {
            builder = builder.add_source(File::from(path.as_path()).required(false));
        }
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Merges command-line values over the loaded configuration
    pub fn merge_with_cli(mut self, cli: ConfigOverrides) -> Self {
        if cli.terms_path.is_some() {
            self.terms_path = cli.terms_path;
        }
        if let Some(root) = cli.root_path {
            self.root_path = root;
        }
        if let Some(workers) = cli.workers {
            self.workers = workers;
        }
        if let Some(max) = cli.max_file_size {
            self.max_file_size = max;
        }
        if let Some(skip) = cli.skip_dirs {
            self.skip_dirs = skip;
        }
        self.show_lines |= cli.show_lines;
        self.verbose |= cli.verbose;
        self
    }

    /// Worker count with the zero default resolved
    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get().max(1)
        } else {
            self.workers
        }
    }

    /// Size limit with the zero default resolved
    pub fn effective_max_file_size(&self) -> u64 {
        if self.max_file_size == 0 {
            DEFAULT_MAX_FILE_SIZE
        } else {
            self.max_file_size
        }
    }

    /// Returns a copy with every defaulted field resolved
    pub fn normalized(&self) -> Self {
        Self {
            workers: self.effective_workers(),
            max_file_size: self.effective_max_file_size(),
            ..self.clone()
        }
    }

    /// Resolves the term file: configured path first, then `$DEPSEARCH_TERMS`
    pub fn resolve_terms_path(&self) -> ScanResult<PathBuf> {
        self.terms_path_or(std::env::var_os(TERMS_ENV_VAR))
    }

    fn terms_path_or(&self, fallback: Option<OsString>) -> ScanResult<PathBuf> {
        if let Some(path) = &self.terms_path {
            return Ok(path.clone());
        }
        fallback
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .ok_or(ScanError::TermsNotConfigured)
    }
}
