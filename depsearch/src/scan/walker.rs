use ignore::WalkBuilder;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::ScanResult;
use crate::filters::{is_makefile, is_skipped_dir};

/// Walks `root` and hands every Makefile to `on_candidate`.
///
/// Directories named in `skip_dirs` are pruned before descent, the root
/// included. The first I/O error ends the walk and is returned; candidates
/// already handed out stay handed out. Symlinks are not followed and no
/// ignore files are consulted.
pub fn walk_makefiles<F>(root: &Path, skip_dirs: &BTreeSet<String>, on_candidate: F) -> ScanResult<()>
where
    F: FnMut(PathBuf),
{
    // filter_entry never sees the root itself
    let root_skipped = root
        .file_name()
        .is_some_and(|name| is_skipped_dir(name, skip_dirs));
    if root_skipped && root.is_dir() {
        debug!("Root {} is in the skip set", root.display());
        return Ok(());
    }

    let skip = skip_dirs.clone();
    let mut builder = WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .follow_links(false)
        .filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            !(is_dir && is_skipped_dir(entry.file_name(), &skip))
        });

    debug!("Walking {}", root.display());
    let candidates = builder.build().map(|entry| {
        entry.map(|entry| {
            let is_file = entry.file_type().is_some_and(|ft| ft.is_file());
            (is_file && is_makefile(entry.file_name())).then(|| entry.into_path())
        })
    });
    deliver(candidates, on_candidate)
}

/// Hands out candidates in walk order until the first error
fn deliver<I, F>(candidates: I, mut on_candidate: F) -> ScanResult<()>
where
    I: IntoIterator<Item = Result<Option<PathBuf>, ignore::Error>>,
    F: FnMut(PathBuf),
{
    for candidate in candidates {
        if let Some(path) = candidate? {
            on_candidate(path);
        }
    }
    Ok(())
}
