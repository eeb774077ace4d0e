/// Name-based predicates used by the walker, the matcher and the term loader.
///
/// None of these touch the filesystem; they decide purely from names and
/// line text so they can be shared by every stage of a scan.
use std::collections::BTreeSet;
use std::ffi::OsStr;

/// File name that marks a build-description file (compared case-insensitively)
pub const MAKEFILE_NAME: &str = "Makefile";

/// Directory names skipped when none are configured
pub const DEFAULT_SKIP_DIRS: &[&str] = &["distfiles", ".git", ".idea", ".vscode", "packages", "work"];

/// Checks if a file name denotes a Makefile, ignoring case
pub fn is_makefile(name: &OsStr) -> bool {
    name.to_str()
        .is_some_and(|n| n.eq_ignore_ascii_case(MAKEFILE_NAME))
}

/// Checks if a directory name is in the skip set (exact, case-sensitive)
pub fn is_skipped_dir(name: &OsStr, skip_dirs: &BTreeSet<String>) -> bool {
    name.to_str().is_some_and(|n| skip_dirs.contains(n))
}

/// Whether a line can contribute a match: not blank and not a `#` comment
pub fn is_relevant_line(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && !trimmed.starts_with('#')
}

/// Builds a skip set from a comma separated list, dropping blank entries
pub fn parse_skip_dirs(list: &str) -> BTreeSet<String> {
    list.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn default_skip_dirs() -> BTreeSet<String> {
    DEFAULT_SKIP_DIRS.iter().map(|d| d.to_string()).collect()
}
