/// Error types shared by the scan engine and the command-line front end.
///
/// Errors fall into two families that callers must tell apart:
///
/// 1. **Configuration errors** happen before any scan starts: no term
///    source, an unreadable term file, a regex that fails to compile, or a
///    malformed configuration file.
/// 2. **Scan errors** happen while the tree is being walked. A traversal
///    error is carried inside [`crate::ScanOutcome`] next to the results
///    that were collected before it, so it never hides partial output.
///
/// Per-file read failures are not represented here at all: the matcher
/// treats an unreadable Makefile as a non-match.
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable consulted when no term file is configured.
pub const TERMS_ENV_VAR: &str = "DEPSEARCH_TERMS";

/// Result type for scan operations
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors that can occur while configuring or running a scan
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("no terms file provided and DEPSEARCH_TERMS not set")]
    TermsNotConfigured,
    #[error("failed to read terms file {}: {source}", path.display())]
    TermsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid regex at {source_name}:{line}: {source}")]
    InvalidTerm {
        source_name: String,
        line: usize,
        #[source]
        source: regex::Error,
    },
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),
    #[error("traversal failed: {0}")]
    Traversal(#[from] ignore::Error),
    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ScanError {
    pub fn terms_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::TermsIo {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_term(source_name: impl Into<String>, line: usize, source: regex::Error) -> Self {
        Self::InvalidTerm {
            source_name: source_name.into(),
            line,
            source,
        }
    }

    /// Whether this error was raised before scanning could begin.
    ///
    /// The CLI maps these to a dedicated exit status so scripts can tell a
    /// bad invocation from a tree that could not be fully walked.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::TermsNotConfigured
                | Self::TermsIo { .. }
                | Self::InvalidTerm { .. }
                | Self::ConfigError(_)
        )
    }
}
