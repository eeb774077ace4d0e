use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::errors::ScanError;
use crate::metrics::ScanStats;

/// One Makefile in which at least one term matched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanMatch {
    /// Grandparent directory name of the Makefile
    pub category: String,
    /// Parent directory name of the Makefile
    pub port: String,
    /// Directory containing the Makefile
    pub path: PathBuf,
    /// The Makefile's own name, as found on disk
    pub file: String,
    /// Source text of every term that matched
    pub matched_terms: BTreeSet<String>,
    /// Matching lines, present only when line capture is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<String>>,
}

impl ScanMatch {
    /// Full path of the matched Makefile
    pub fn file_path(&self) -> PathBuf {
        self.path.join(&self.file)
    }

    /// `category/port` label used by the table output
    pub fn coordinates(&self) -> String {
        format!("{}/{}", self.category, self.port)
    }
}

/// Everything a scan produced.
///
/// A traversal error stops the walk but not the matching of files already
/// queued, so `matches` may be non-empty even when `error` is set.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Matched Makefiles in no particular order
    pub matches: Vec<ScanMatch>,
    /// Error that cut the directory walk short, if any
    pub error: Option<ScanError>,
    /// Counters collected during the scan
    pub stats: ScanStats,
}

impl ScanOutcome {
    /// Whether the whole tree was walked
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Derives the (category, port) coordinates of a Makefile from its two
/// parent directory names.
pub fn derive_port_coords(makefile: &Path) -> (String, String) {
    let dir = containing_dir(makefile);
    let port = base_name(&dir);
    let category = base_name(&containing_dir(&dir));
    (category, port)
}

/// Parent directory of `path`, with `.` standing in for an empty parent
pub fn containing_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        None if path.has_root() => path.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_match() -> ScanMatch {
        ScanMatch {
            category: "devel".to_string(),
            port: "foo-lib".to_string(),
            path: PathBuf::from("/usr/ports/devel/foo-lib"),
            file: "Makefile".to_string(),
            matched_terms: BTreeSet::from(["gmake".to_string()]),
            lines: None,
        }
    }

    #[test]
    fn test_derive_port_coords() {
        assert_eq!(
            derive_port_coords(Path::new("/usr/ports/devel/foo-lib/Makefile")),
            ("devel".to_string(), "foo-lib".to_string())
        );
        assert_eq!(
            derive_port_coords(Path::new("category/portA/Makefile")),
            ("category".to_string(), "portA".to_string())
        );
        assert_eq!(
            derive_port_coords(Path::new("portA/Makefile")),
            (".".to_string(), "portA".to_string())
        );
        assert_eq!(
            derive_port_coords(Path::new("Makefile")),
            (".".to_string(), ".".to_string())
        );
    }

    #[test]
    fn test_containing_dir() {
        assert_eq!(
            containing_dir(Path::new("a/b/Makefile")),
            PathBuf::from("a/b")
        );
        assert_eq!(containing_dir(Path::new("Makefile")), PathBuf::from("."));
    }

    #[test]
    fn test_match_paths() {
        let m = sample_match();
        assert_eq!(
            m.file_path(),
            PathBuf::from("/usr/ports/devel/foo-lib/Makefile")
        );
        assert_eq!(m.coordinates(), "devel/foo-lib");
    }

    #[test]
    fn test_json_shape() {
        let mut m = sample_match();
        let value = serde_json::to_value(&m).unwrap();
        assert_eq!(value["category"], "devel");
        assert_eq!(value["matched_terms"][0], "gmake");
        assert!(value.get("lines").is_none());

        m.lines = Some(vec!["USES= gmake".to_string()]);
        let value = serde_json::to_value(&m).unwrap();
        assert_eq!(value["lines"][0], "USES= gmake");
    }

    #[test]
    fn test_outcome_completeness() {
        let outcome = ScanOutcome::default();
        assert!(outcome.is_complete());
        assert!(outcome.matches.is_empty());
    }
}
