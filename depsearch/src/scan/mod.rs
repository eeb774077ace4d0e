//! The concurrent scan engine.
//!
//! A scan has three stages:
//!
//! 1. [`walker`] traverses the tree and yields every Makefile outside the
//!    skipped directories.
//! 2. [`matcher`] reads one Makefile under the size limit and tests each
//!    non-comment line against the term set.
//! 3. [`engine`] wires the two together: the walker feeds a bounded queue,
//!    a fixed pool of matcher threads drains it, and matches are collected
//!    under a mutex until the walk and the queue are both exhausted.
pub mod engine;
pub mod matcher;
pub mod walker;

pub use engine::scan;
pub use matcher::MakefileMatcher;
pub use walker::walk_makefiles;
