use regex::Regex;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::errors::{ScanError, ScanResult};
use crate::filters::is_relevant_line;

/// Source name reported for patterns appended with [`TermSet::with_added`]
pub const EXTRA_TERMS_SOURCE: &str = "<extra>";

/// A compiled search term together with the text it was compiled from.
///
/// The source text doubles as the term's identifier in scan results.
#[derive(Debug, Clone)]
pub struct Term {
    source: String,
    regex: Regex,
}

impl Term {
    /// Compiles a single pattern
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            source: pattern.to_string(),
            regex: Regex::new(pattern)?,
        })
    }

    /// The pattern text, used as the term's identifier
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the pattern matches anywhere in `line`
    pub fn is_match(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }
}

/// Ordered, immutable collection of compiled terms
#[derive(Debug, Clone, Default)]
pub struct TermSet {
    terms: Vec<Term>,
}

impl TermSet {
    /// Loads a term file: one regex per line, blank lines and `#` comments ignored.
    ///
    /// Fails on the first line that does not compile; nothing is returned
    /// for the lines before it.
    pub fn load(path: &Path) -> ScanResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| ScanError::terms_io(path, e))?;
        let terms = Self::parse(&path.display().to_string(), &text)?;
        debug!("Loaded {} terms from {}", terms.len(), path.display());
        Ok(terms)
    }

    /// Parses term definitions from an in-memory source.
    ///
    /// `source_name` only appears in error messages.
    pub fn parse(source_name: &str, text: &str) -> ScanResult<Self> {
        let mut terms = Vec::new();
        for (index, line) in text.lines().enumerate() {
            if !is_relevant_line(line) {
                continue;
            }
            let term = Term::new(line.trim())
                .map_err(|e| ScanError::invalid_term(source_name, index + 1, e))?;
            terms.push(term);
        }
        Ok(Self { terms })
    }

    /// Returns a new set with `extra` patterns compiled and appended.
    ///
    /// The receiver is left untouched, so a base term file can be combined
    /// with ad-hoc patterns without reading it again.
    pub fn with_added<S: AsRef<str>>(&self, extra: &[S]) -> ScanResult<Self> {
        let mut terms = Vec::with_capacity(self.terms.len() + extra.len());
        terms.extend(self.terms.iter().cloned());
        for (index, pattern) in extra.iter().enumerate() {
            let term = Term::new(pattern.as_ref())
                .map_err(|e| ScanError::invalid_term(EXTRA_TERMS_SOURCE, index + 1, e))?;
            terms.push(term);
        }
        Ok(Self { terms })
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Term> {
        self.terms.iter()
    }
}
