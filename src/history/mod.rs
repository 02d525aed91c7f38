//! Version-control history mining.
//!
//! Answers one question: when was a symbol introduced into the file that
//! declares it? The answer comes from walking the commits reachable from
//! HEAD, oldest first, and looking for the run of commits, ending at the
//! newest one, whose copy of the file mentions the symbol.
//!
//! - `HistorySource`: read-only access to commits and blobs (git via libgit2)
//! - `HistoryResolver`: the introduction search
//! - `IntroductionCache`: run-wide memo with in-flight deduplication

mod cache;
mod git;
mod resolver;

pub use cache::{IntroductionCache, IntroductionKey};
pub use git::GitHistory;
pub use resolver::{relative_path, HistoryLimits, HistoryResolver};

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Errors raised while reading history.
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("cannot open repository at {path}: {source}")]
    Open { path: PathBuf, source: git2::Error },
    #[error("repository at {0} has no working directory")]
    Bare(PathBuf),
    #[error("git error: {0}")]
    Git(#[from] git2::Error),
    #[error("repository handle poisoned by a panicked reader")]
    Poisoned,
    #[error("deadline passed while listing commits")]
    Timeout,
}

/// When a symbol was introduced, if history could tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Introduction {
    Found(DateTime<Utc>),
    NotFound,
}

impl Introduction {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Introduction::Found(t) => Some(*t),
            Introduction::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Introduction::Found(_))
    }
}

/// A commit as seen by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub id: String,
    /// Author timestamp.
    pub authored_at: DateTime<Utc>,
}

/// Identifies a file's content; equal ids mean equal content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobId(pub String);

/// Commits reachable from HEAD, oldest first.
#[derive(Debug, Clone, Default)]
pub struct CommitLog {
    pub commits: Vec<CommitInfo>,
    /// Whether older commits were left out because of a depth limit.
    pub truncated: bool,
}

/// Read-only access to a repository's history.
///
/// Implementations must be shareable between worker threads.
pub trait HistorySource: Send + Sync {
    /// Root of the working tree; history paths are relative to it.
    fn root(&self) -> &Path;

    /// Commits reachable from HEAD, oldest first, keeping at most the
    /// `limit` newest ones. Fails with `Timeout` once `deadline` passes.
    fn commits(
        &self,
        limit: Option<usize>,
        deadline: Option<Instant>,
    ) -> Result<CommitLog, HistoryError>;

    /// Blob for `path` (relative, `/`-separated) in `commit`'s tree.
    /// `Ok(None)` when the file does not exist in that commit.
    fn blob_id(&self, commit: &CommitInfo, path: &str) -> Result<Option<BlobId>, HistoryError>;

    /// Raw content of a blob.
    fn blob_contents(&self, id: &BlobId) -> Result<Vec<u8>, HistoryError>;
}
