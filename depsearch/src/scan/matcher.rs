use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::{debug, info, trace};

use crate::config::ScanConfig;
use crate::filters::is_relevant_line;
use crate::metrics::ScanMetrics;
use crate::results::{containing_dir, derive_port_coords, ScanMatch};
use crate::terms::TermSet;

const BUFFER_CAPACITY: usize = 8192;

/// Matches the terms of one scan against individual Makefiles
#[derive(Debug)]
pub struct MakefileMatcher<'a> {
    terms: &'a TermSet,
    metrics: &'a ScanMetrics,
    max_file_size: u64,
    show_lines: bool,
    verbose: bool,
}

impl<'a> MakefileMatcher<'a> {
    pub fn new(config: &ScanConfig, terms: &'a TermSet, metrics: &'a ScanMetrics) -> Self {
        Self {
            terms,
            metrics,
            max_file_size: config.effective_max_file_size(),
            show_lines: config.show_lines,
            verbose: config.verbose,
        }
    }

    /// Tests one Makefile against every term.
    ///
    /// Returns `None` when nothing matched, when the file is larger than the
    /// size limit, or when it cannot be stat'ed or opened. Reading stops at
    /// the size limit or at the first read error; whatever was read up to
    /// that point still counts.
    pub fn match_file(&self, path: &Path) -> Option<ScanMatch> {
        trace!("Matching {}", path.display());

        let size = match fs::metadata(path) {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                debug!("Cannot stat {}: {}", path.display(), e);
                self.metrics.record_unreadable();
                return None;
            }
        };
        if size > self.max_file_size {
            if self.verbose {
                info!("skip large file: {} ({} bytes)", path.display(), size);
            }
            self.metrics.record_oversized();
            return None;
        }

        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                debug!("Cannot open {}: {}", path.display(), e);
                self.metrics.record_unreadable();
                return None;
            }
        };

        let mut reader = BufReader::with_capacity(BUFFER_CAPACITY, file.take(self.max_file_size));
        let mut matched_terms: BTreeSet<String> = BTreeSet::new();
        let mut lines = Vec::new();
        let mut buffer = Vec::with_capacity(256);

        loop {
            buffer.clear();
            match reader.read_until(b'\n', &mut buffer) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!("Read of {} stopped early: {}", path.display(), e);
                    break;
                }
            }

            let line = String::from_utf8_lossy(strip_line_ending(&buffer));
            if !is_relevant_line(&line) {
                continue;
            }
            for term in self.terms.iter() {
                if !term.is_match(&line) {
                    continue;
                }
                if !matched_terms.contains(term.as_str()) {
                    matched_terms.insert(term.as_str().to_string());
                }
                if self.show_lines {
                    lines.push(line.clone().into_owned());
                }
            }
        }

        if matched_terms.is_empty() {
            return None;
        }

        self.metrics.record_match();
        let (category, port) = derive_port_coords(path);
        Some(ScanMatch {
            category,
            port,
            path: containing_dir(path),
            file: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            matched_terms,
            lines: self.show_lines.then_some(lines),
        })
    }
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    fn port_makefile(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let port_dir = dir.path().join("category").join("portA");
        fs::create_dir_all(&port_dir).unwrap();
        let path = port_dir.join("Makefile");
        fs::write(&path, content).unwrap();
        path
    }

    fn terms(text: &str) -> TermSet {
        TermSet::parse("test", text).unwrap()
    }

    #[test]
    fn test_matching_line_produces_result() {
        let dir = tempdir().unwrap();
        let path = port_makefile(
            &dir,
            "# comment\nPORTNAME= portA\nDEPENDS+= foo-lib>=1.0:devel/foo-lib\n",
        );
        let terms = terms(r"^DEPENDS\+=.*\bfoo-lib\b");
        let metrics = ScanMetrics::new();
        let matcher = MakefileMatcher::new(&ScanConfig::default(), &terms, &metrics);

        let result = matcher.match_file(&path).unwrap();
        assert_eq!(result.category, "category");
        assert_eq!(result.port, "portA");
        assert_eq!(result.file, "Makefile");
        assert_eq!(result.path, path.parent().unwrap());
        assert_eq!(
            result.matched_terms.iter().collect::<Vec<_>>(),
            vec![r"^DEPENDS\+=.*\bfoo-lib\b"]
        );
        assert_eq!(result.lines, None);
        assert_eq!(metrics.snapshot(Default::default()).matched, 1);
    }

    #[test]
    fn test_comments_and_blank_lines_never_match() {
        let dir = tempdir().unwrap();
        let path = port_makefile(&dir, "# DEPENDS+= foo-lib\n   # foo-lib\n\n   \n");
        let terms = terms("foo-lib\n^\\s*$");
        let metrics = ScanMetrics::new();
        let matcher = MakefileMatcher::new(&ScanConfig::default(), &terms, &metrics);

        assert!(matcher.match_file(&path).is_none());
    }

    #[test]
    fn test_size_gate() {
        let dir = tempdir().unwrap();
        let content = "USES= gmake\n"; // 12 bytes
        let path = port_makefile(&dir, content);
        let terms = terms("gmake");
        let metrics = ScanMetrics::new();

        let at_limit = ScanConfig {
            max_file_size: content.len() as u64,
            ..ScanConfig::default()
        };
        let matcher = MakefileMatcher::new(&at_limit, &terms, &metrics);
        assert!(matcher.match_file(&path).is_some());

        let below = ScanConfig {
            max_file_size: content.len() as u64 - 1,
            ..ScanConfig::default()
        };
        let matcher = MakefileMatcher::new(&below, &terms, &metrics);
        assert!(matcher.match_file(&path).is_none());
        assert_eq!(metrics.snapshot(Default::default()).oversized, 1);
    }

    #[test]
    fn test_show_lines_captures_once_per_matching_term() {
        let dir = tempdir().unwrap();
        let path = port_makefile(
            &dir,
            "USES= gmake iconv\r\nUSES= gmake iconv\r\nPORTNAME= x\r\n",
        );
        let terms = terms("gmake\niconv");
        let metrics = ScanMetrics::new();
        let config = ScanConfig {
            show_lines: true,
            ..ScanConfig::default()
        };
        let matcher = MakefileMatcher::new(&config, &terms, &metrics);

        let result = matcher.match_file(&path).unwrap();
        assert_eq!(result.matched_terms.len(), 2);
        let lines = result.lines.unwrap();
        assert_eq!(lines.len(), 4);
        assert!(lines.iter().all(|l| l == "USES= gmake iconv"));
    }

    #[test]
    fn test_raw_line_text_is_kept() {
        let dir = tempdir().unwrap();
        let path = port_makefile(&dir, "\tUSES=\tgmake   \n");
        let terms = terms("gmake");
        let metrics = ScanMetrics::new();
        let config = ScanConfig {
            show_lines: true,
            ..ScanConfig::default()
        };
        let matcher = MakefileMatcher::new(&config, &terms, &metrics);

        let result = matcher.match_file(&path).unwrap();
        assert_eq!(result.lines, Some(vec!["\tUSES=\tgmake   ".to_string()]));
    }

    #[test]
    fn test_missing_file_is_silently_skipped() {
        let dir = tempdir().unwrap();
        let terms = terms("anything");
        let metrics = ScanMetrics::new();
        let matcher = MakefileMatcher::new(&ScanConfig::default(), &terms, &metrics);

        assert!(matcher.match_file(&dir.path().join("gone/Makefile")).is_none());
        assert_eq!(metrics.snapshot(Default::default()).unreadable, 1);
    }

    #[test]
    fn test_invalid_utf8_does_not_stop_matching() {
        let dir = tempdir().unwrap();
        let port_dir = dir.path().join("misc").join("latin1");
        fs::create_dir_all(&port_dir).unwrap();
        let path = port_dir.join("Makefile");
        fs::write(&path, b"COMMENT= caf\xe9\nUSES= gmake\n").unwrap();

        let terms = terms("gmake");
        let metrics = ScanMetrics::new();
        let matcher = MakefileMatcher::new(&ScanConfig::default(), &terms, &metrics);

        let result = matcher.match_file(&path).unwrap();
        assert_eq!(result.port, "latin1");
    }

    #[test]
    fn test_strip_line_ending() {
        assert_eq!(strip_line_ending(b"abc\r\n"), b"abc");
        assert_eq!(strip_line_ending(b"abc\n"), b"abc");
        assert_eq!(strip_line_ending(b"abc"), b"abc");
    }
}
