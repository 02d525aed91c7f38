//! Introduction search over commit history.

use std::path::{Component, Path};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use memchr::memmem::Finder;
use once_cell::sync::OnceCell;

use super::{BlobId, CommitInfo, CommitLog, HistorySource, Introduction};

/// Bounds on a single introduction search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryLimits {
    /// Examine at most this many of the newest commits.
    pub max_commits: Option<usize>,
    /// Give up (and report `NotFound`) after this much wall-clock time.
    pub timeout: Option<Duration>,
}

/// Finds the commit that introduced a symbol into a file.
///
/// Commits are scanned oldest to newest. Every commit whose copy of the file
/// contains the symbol extends the current presence run; a commit where the
/// file is missing or lacks the symbol ends it. The answer is the earliest
/// author time of the run that is still open at the newest commit, so a
/// symbol that was removed and later re-added dates from its re-addition.
///
/// The commit list is read once, by the first search, and shared by every
/// later one. A listing that fails or runs out of time is not retried.
pub struct HistoryResolver {
    source: Arc<dyn HistorySource>,
    limits: HistoryLimits,
    log: OnceCell<Option<CommitLog>>,
}

impl HistoryResolver {
    pub fn new(source: Arc<dyn HistorySource>, limits: HistoryLimits) -> Self {
        Self {
            source,
            limits,
            log: OnceCell::new(),
        }
    }

    /// Root of the repository working tree.
    pub fn root(&self) -> &Path {
        self.source.root()
    }

    pub fn limits(&self) -> HistoryLimits {
        self.limits
    }

    /// Path of `file` relative to the repository root, `/`-separated.
    pub fn relative_path(&self, file: &Path) -> Option<String> {
        relative_path(self.source.root(), file)
    }

    /// Search history for the introduction of `symbol` into `path`.
    ///
    /// `path` is relative to the repository root. Read failures on single
    /// commits are logged and those commits skipped; any failure to list
    /// history or an exceeded timeout yields `NotFound`.
    pub fn resolve_introduction(&self, symbol: &str, path: &str) -> Introduction {
        let deadline = self.limits.timeout.map(|t| Instant::now() + t);

        let log = match self.commit_log(deadline) {
            Some(log) => log,
            None => return Introduction::NotFound,
        };

        let finder = Finder::new(symbol.as_bytes());
        let mut run_start: Option<DateTime<Utc>> = None;
        let mut last_blob: Option<(BlobId, bool)> = None;

        for commit in &log.commits {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                log::warn!(
                    "history search for '{}' in {} timed out after {:?}",
                    symbol,
                    path,
                    self.limits.timeout.unwrap_or_default()
                );
                return Introduction::NotFound;
            }

            let present = match self.presence(commit, path, &finder, &mut last_blob) {
                Some(present) => present,
                None => continue,
            };

            if present {
                let t = commit.authored_at;
                run_start = Some(run_start.map_or(t, |start| start.min(t)));
            } else {
                run_start = None;
            }
        }

        match run_start {
            Some(t) => {
                if log.truncated {
                    log::debug!(
                        "history for {} truncated at {} commits; '{}' is at least as old as {}",
                        path,
                        log.commits.len(),
                        symbol,
                        t
                    );
                }
                log::debug!("'{}' introduced into {} at {}", symbol, path, t);
                Introduction::Found(t)
            }
            None => {
                log::debug!("no introduction found for '{}' in {}", symbol, path);
                Introduction::NotFound
            }
        }
    }

    /// Commits reachable from HEAD, listed on first use.
    fn commit_log(&self, deadline: Option<Instant>) -> Option<&CommitLog> {
        self.log
            .get_or_init(|| match self.source.commits(self.limits.max_commits, deadline) {
                Ok(log) => {
                    log::debug!(
                        "listed {} commit(s) in {}",
                        log.commits.len(),
                        self.source.root().display()
                    );
                    Some(log)
                }
                Err(e) => {
                    log::warn!("cannot list history of {}: {}", self.source.root().display(), e);
                    None
                }
            })
            .as_ref()
    }

    /// Whether `commit`'s copy of `path` contains the symbol.
    ///
    /// `None` means the commit could not be read. Consecutive commits that
    /// share a blob reuse the previous answer.
    fn presence(
        &self,
        commit: &CommitInfo,
        path: &str,
        finder: &Finder<'_>,
        last_blob: &mut Option<(BlobId, bool)>,
    ) -> Option<bool> {
        let id = match self.source.blob_id(commit, path) {
            Ok(Some(id)) => id,
            Ok(None) => return Some(false),
            Err(e) => {
                log::warn!("skipping commit {} for {}: {}", commit.id, path, e);
                return None;
            }
        };

        if let Some((prev, hit)) = last_blob.as_ref() {
            if *prev == id {
                return Some(*hit);
            }
        }

        match self.source.blob_contents(&id) {
            Ok(content) => {
                let hit = finder.find(&content).is_some();
                *last_blob = Some((id, hit));
                Some(hit)
            }
            Err(e) => {
                log::warn!("skipping commit {} for {}: {}", commit.id, path, e);
                None
            }
        }
    }
}

/// Strip `root` from `file` and join the rest with `/`.
///
/// Returns None when `file` is not inside `root`.
pub fn relative_path(root: &Path, file: &Path) -> Option<String> {
    let rel = file.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().to_string()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
