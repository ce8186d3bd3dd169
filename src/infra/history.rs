use chrono::{DateTime, Days, NaiveTime};
use git2::{Commit, DiffFindOptions, DiffFormat, DiffOptions, Repository, Sort};
use tracing::debug;

use crate::domain::commit::CommitRecord;
use crate::error::AppResult;
use crate::infra::repo::resolve_branch_tip;

#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    /// Inclusive of the named UTC day.
    pub since: Option<chrono::NaiveDate>,
    /// Inclusive of the named UTC day.
    pub until: Option<chrono::NaiveDate>,
    /// 0 = unbounded; N>0 keeps the most recent N commits.
    pub max_commits: usize,
}

#[derive(Debug, Clone)]
pub struct DiffSettings {
    pub ignore_whitespace: bool,
    pub detect_renames: bool,
}

/// Walks the branch newest-to-oldest, applies the date bounds during the
/// walk, truncates to the most recent N, then reverses to oldest-first.
pub fn select_commits<'r>(
    repo: &'r Repository,
    branch: &str,
    filter: &HistoryFilter,
) -> AppResult<Vec<Commit<'r>>> {
    let tip = resolve_branch_tip(repo, branch)?;
    let mut revwalk = repo.revwalk()?;
    revwalk.set_sorting(Sort::TIME | Sort::TOPOLOGICAL)?;
    revwalk.push(tip)?;

    let since_start = filter
        .since
        .map(|date| date.and_time(NaiveTime::MIN).and_utc().timestamp());
    // "Until" is inclusive of its day: compare against midnight of the
    // following day.
    let until_end = filter
        .until
        .and_then(|date| date.checked_add_days(Days::new(1)))
        .map(|date| date.and_time(NaiveTime::MIN).and_utc().timestamp());

    let mut commits = Vec::new();
    for oid in revwalk {
        let commit = repo.find_commit(oid?)?;
        let commit_time = commit.time().seconds();

        if let Some(since) = since_start {
            if commit_time < since {
                // Walk is sorted newest-first; nothing older qualifies.
                break;
            }
        }
        if let Some(until) = until_end {
            if commit_time >= until {
                continue;
            }
        }

        commits.push(commit);
    }

    if filter.max_commits > 0 {
        commits.truncate(filter.max_commits);
    }
    commits.reverse();

    debug!(branch, count = commits.len(), "selected commits");
    Ok(commits)
}

pub fn commit_record(repo: &Repository, commit: &Commit<'_>) -> CommitRecord {
    let short_hash = commit.id().to_string().chars().take(7).collect();
    let author = commit.author().name().unwrap_or("Unknown").to_string();
    let date = DateTime::from_timestamp(commit.time().seconds(), 0)
        .map(|timestamp| timestamp.date_naive())
        .unwrap_or_default();

    CommitRecord {
        short_hash,
        author,
        date,
        files: changed_files(repo, commit),
        parent_count: commit.parent_count(),
    }
}

/// Sorted list of paths touched by the commit. Errors degrade to an empty
/// list; the entry still gets summarized from the diff text alone.
fn changed_files(repo: &Repository, commit: &Commit<'_>) -> Vec<String> {
    match try_changed_files(repo, commit) {
        Ok(files) => files,
        Err(err) => {
            debug!(commit = %commit.id(), %err, "failed to list changed files");
            Vec::new()
        }
    }
}

fn try_changed_files(repo: &Repository, commit: &Commit<'_>) -> Result<Vec<String>, git2::Error> {
    let tree = commit.tree()?;
    let parent_tree = match commit.parent_count() {
        0 => None,
        _ => Some(commit.parent(0)?.tree()?),
    };
    let diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;

    let mut files: Vec<String> = diff
        .deltas()
        .filter_map(|delta| delta.new_file().path())
        .map(|path| path.display().to_string())
        .collect();
    files.sort();
    files.dedup();
    Ok(files)
}

/// Unified diff oriented parent→commit. A root commit diffs against the
/// empty tree, so the whole initial tree shows up as additions. Returned
/// untruncated; the character budget is applied by the caller.
pub fn commit_diff_text(
    repo: &Repository,
    commit: &Commit<'_>,
    settings: &DiffSettings,
) -> AppResult<String> {
    let tree = commit.tree()?;
    let parent_tree = match commit.parent_count() {
        0 => None,
        _ => Some(commit.parent(0)?.tree()?),
    };

    let mut options = DiffOptions::new();
    options
        .context_lines(3)
        .ignore_whitespace(settings.ignore_whitespace);

    let mut diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut options))?;
    if settings.detect_renames {
        diff.find_similar(Some(DiffFindOptions::new().renames(true)))?;
    }

    let mut text = String::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        // Binary payloads carry no summarizable text.
        if line.origin() == 'B' {
            return true;
        }
        if let Ok(content) = std::str::from_utf8(line.content()) {
            match line.origin() {
                '+' | '-' | ' ' => {
                    text.push(line.origin());
                    text.push_str(content);
                }
                'F' | 'H' => text.push_str(content),
                _ => {}
            }
        } else {
            debug!(commit = %commit.id(), "skipping diff line with invalid utf-8");
        }
        true
    })?;

    debug!(commit = %commit.id(), diff_len = text.len(), "captured commit diff");
    Ok(text)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::fs;
    use std::path::Path;

    use git2::{Oid, Repository, RepositoryInitOptions, Signature, Time};
    use tempfile::TempDir;

    /// A throwaway repository with deterministic commit times, initialized
    /// on a "main" branch regardless of host git configuration.
    pub struct FixtureRepo {
        dir: TempDir,
        repo: Repository,
    }

    impl FixtureRepo {
        pub fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let mut options = RepositoryInitOptions::new();
            options.initial_head("main");
            let repo = Repository::init_opts(dir.path(), &options).unwrap();
            Self { dir, repo }
        }

        pub fn path(&self) -> &Path {
            self.dir.path()
        }

        pub fn repo(&self) -> &Repository {
            &self.repo
        }

        /// Commits a single file change on HEAD.
        pub fn commit(&mut self, message: &str, file: &str, content: &str, time: Time) -> Oid {
            self.commit_files(message, &[(file, content)], time)
        }

        pub fn commit_files(
            &mut self,
            message: &str,
            files: &[(&str, &str)],
            time: Time,
        ) -> Oid {
            let workdir = self.repo.workdir().unwrap().to_path_buf();
            let mut index = self.repo.index().unwrap();
            for (file, content) in files {
                let full = workdir.join(file);
                if let Some(parent) = full.parent() {
                    fs::create_dir_all(parent).unwrap();
                }
                fs::write(&full, content).unwrap();
                index.add_path(Path::new(file)).unwrap();
            }
            index.write().unwrap();
            let tree = self.repo.find_tree(index.write_tree().unwrap()).unwrap();

            let signature = signature(time);
            let head = self.repo.head().ok().map(|h| h.peel_to_commit().unwrap());
            let parents: Vec<_> = head.iter().collect();
            self.repo
                .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
                .unwrap()
        }

        /// Deletes `from` and commits the same content at `to`.
        pub fn commit_rename(&mut self, from: &str, to: &str, message: &str, time: Time) -> Oid {
            let workdir = self.repo.workdir().unwrap().to_path_buf();
            let content = fs::read(workdir.join(from)).unwrap();
            fs::remove_file(workdir.join(from)).unwrap();
            fs::write(workdir.join(to), &content).unwrap();

            let mut index = self.repo.index().unwrap();
            index.remove_path(Path::new(from)).unwrap();
            index.add_path(Path::new(to)).unwrap();
            index.write().unwrap();
            let tree = self.repo.find_tree(index.write_tree().unwrap()).unwrap();

            let signature = signature(time);
            let head = self.repo.head().unwrap().peel_to_commit().unwrap();
            self.repo
                .commit(Some("HEAD"), &signature, &signature, message, &tree, &[&head])
                .unwrap()
        }

        /// Creates a commit off `parent` without moving any ref, suitable
        /// as the second parent of a merge.
        pub fn side_commit(
            &mut self,
            parent: Oid,
            file: &str,
            content: &str,
            message: &str,
            time: Time,
        ) -> Oid {
            let parent_commit = self.repo.find_commit(parent).unwrap();
            let blob = self.repo.blob(content.as_bytes()).unwrap();
            let mut builder = self
                .repo
                .treebuilder(Some(&parent_commit.tree().unwrap()))
                .unwrap();
            builder.insert(file, blob, 0o100644).unwrap();
            let tree = self.repo.find_tree(builder.write().unwrap()).unwrap();

            let signature = signature(time);
            self.repo
                .commit(None, &signature, &signature, message, &tree, &[&parent_commit])
                .unwrap()
        }

        /// Merges `side` into HEAD, taking the side branch's tree so the
        /// merge has a non-empty diff against its first parent.
        pub fn merge(&mut self, side: Oid, message: &str, time: Time) -> Oid {
            let head = self.repo.head().unwrap().peel_to_commit().unwrap();
            let side_commit = self.repo.find_commit(side).unwrap();
            let tree = side_commit.tree().unwrap();

            let signature = signature(time);
            self.repo
                .commit(
                    Some("HEAD"),
                    &signature,
                    &signature,
                    message,
                    &tree,
                    &[&head, &side_commit],
                )
                .unwrap()
        }
    }

    fn signature(time: Time) -> Signature<'static> {
        Signature::new("Alice", "alice@example.com", &time).unwrap()
    }

    /// Noon UTC on the given day, as a git timestamp.
    pub fn day(year: i32, month: u32, day: u32) -> Time {
        let seconds = chrono::NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp();
        Time::new(seconds, 0)
    }
}
