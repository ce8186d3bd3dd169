use std::path::{Path, PathBuf};

use git2::Repository;
use git2::build::RepoBuilder;
use tempfile::TempDir;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};

/// Where the repository comes from. Classification is a read-only probe;
/// the side effects (open, clone) live in [`OpenedRepo::acquire`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoLocation {
    /// An existing local checkout; opened in place and never mutated.
    Local(PathBuf),
    /// Anything else is treated as a remote URL to clone.
    Remote(String),
}

impl RepoLocation {
    pub fn classify(arg: &str) -> Self {
        let path = Path::new(arg);
        if path.is_dir() && path.join(".git").exists() {
            RepoLocation::Local(path.to_path_buf())
        } else {
            RepoLocation::Remote(arg.to_string())
        }
    }
}

/// An opened repository handle. For remote locations the backing clone
/// lives in a temp directory owned here, so it survives for the whole run.
pub struct OpenedRepo {
    repo: Repository,
    _clone_dir: Option<TempDir>,
}

impl OpenedRepo {
    pub fn acquire(location: RepoLocation, branch: &str) -> AppResult<Self> {
        match location {
            RepoLocation::Local(path) => {
                let repo = Repository::open(&path).map_err(|err| {
                    AppError::VersionControl(format!(
                        "failed to open repository at {}: {err}",
                        path.display()
                    ))
                })?;
                // The walk starts from the resolved ref; the caller's
                // working tree and HEAD are left untouched.
                resolve_branch_tip(&repo, branch)?;
                info!(path = %path.display(), branch, "opened local repository");
                Ok(Self {
                    repo,
                    _clone_dir: None,
                })
            }
            RepoLocation::Remote(url) => {
                let clone_dir = TempDir::with_prefix("relog-repo-")?;
                let target = clone_dir.path().join("repo");
                debug!(url, target = %target.display(), "cloning remote repository");
                let repo = RepoBuilder::new()
                    .branch(branch)
                    .clone(&url, &target)
                    .map_err(|err| {
                        AppError::VersionControl(format!("failed to clone {url}: {err}"))
                    })?;
                info!(url, branch, "cloned remote repository");
                Ok(Self {
                    repo,
                    _clone_dir: Some(clone_dir),
                })
            }
        }
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }
}

/// Resolves a branch name (or any rev git understands) to its tip commit id.
pub fn resolve_branch_tip(repo: &Repository, branch: &str) -> AppResult<git2::Oid> {
    if let Ok(reference) = repo.find_branch(branch, git2::BranchType::Local) {
        if let Some(oid) = reference.get().target() {
            return Ok(oid);
        }
    }
    let object = repo.revparse_single(branch).map_err(|err| {
        AppError::VersionControl(format!("branch or ref '{branch}' not found: {err}"))
    })?;
    let commit = object.peel_to_commit().map_err(|err| {
        AppError::VersionControl(format!("'{branch}' does not point at a commit: {err}"))
    })?;
    Ok(commit.id())
}
