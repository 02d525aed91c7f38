//! Git history source backed by libgit2.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

use chrono::{DateTime, Utc};
use git2::{ErrorCode, ObjectType, Oid, Repository, Sort};

use super::{BlobId, CommitInfo, CommitLog, HistoryError, HistorySource};

/// Read-only view of a git repository.
///
/// `git2::Repository` is `Send` but not `Sync`, so concurrent readers take
/// turns on a mutex.
pub struct GitHistory {
    repo: Mutex<Repository>,
    root: PathBuf,
}

impl GitHistory {
    /// Open the repository whose working tree is rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, HistoryError> {
        let path = path.as_ref();
        let repo = Repository::open(path).map_err(|source| HistoryError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_repository(repo, path)
    }

    /// Find the repository containing `path`, searching parent directories.
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self, HistoryError> {
        let path = path.as_ref();
        let repo = Repository::discover(path).map_err(|source| HistoryError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_repository(repo, path)
    }

    fn from_repository(repo: Repository, path: &Path) -> Result<Self, HistoryError> {
        let workdir = repo
            .workdir()
            .ok_or_else(|| HistoryError::Bare(path.to_path_buf()))?;
        // Occurrence paths are canonical, so the root must be too.
        let root = fs::canonicalize(workdir).unwrap_or_else(|_| workdir.to_path_buf());

        log::debug!("opened repository at {}", root.display());

        Ok(Self {
            repo: Mutex::new(repo),
            root,
        })
    }

    fn with_repo<T>(
        &self,
        f: impl FnOnce(&Repository) -> Result<T, git2::Error>,
    ) -> Result<T, HistoryError> {
        let repo = self.repo.lock().map_err(|_| HistoryError::Poisoned)?;
        Ok(f(&repo)?)
    }
}

fn to_utc(time: git2::Time) -> DateTime<Utc> {
    DateTime::from_timestamp(time.seconds(), 0).unwrap_or_default()
}

impl HistorySource for GitHistory {
    fn root(&self) -> &Path {
        &self.root
    }

    fn commits(
        &self,
        limit: Option<usize>,
        deadline: Option<Instant>,
    ) -> Result<CommitLog, HistoryError> {
        let repo = self.repo.lock().map_err(|_| HistoryError::Poisoned)?;
        let mut walk = repo.revwalk()?;
        walk.push_head()?;
        // Newest first, so a limit keeps the most recent commits.
        walk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;

        let mut log = CommitLog::default();
        for oid in walk {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(HistoryError::Timeout);
            }
            if limit.is_some_and(|max| log.commits.len() >= max) {
                log.truncated = true;
                break;
            }
            let oid = oid?;
            let commit = repo.find_commit(oid)?;
            log.commits.push(CommitInfo {
                id: oid.to_string(),
                authored_at: to_utc(commit.author().when()),
            });
        }

        log.commits.reverse();
        Ok(log)
    }

    fn blob_id(&self, commit: &CommitInfo, path: &str) -> Result<Option<BlobId>, HistoryError> {
        self.with_repo(|repo| {
            let tree = repo.find_commit(Oid::from_str(&commit.id)?)?.tree()?;
            match tree.get_path(Path::new(path)) {
                Ok(entry) if entry.kind() == Some(ObjectType::Blob) => {
                    Ok(Some(BlobId(entry.id().to_string())))
                }
                Ok(_) => Ok(None),
                Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
                Err(e) => Err(e),
            }
        })
    }

    fn blob_contents(&self, id: &BlobId) -> Result<Vec<u8>, HistoryError> {
        self.with_repo(|repo| {
            let blob = repo.find_blob(Oid::from_str(&id.0)?)?;
            Ok(blob.content().to_vec())
        })
    }
}
