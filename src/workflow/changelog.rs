use git2::Repository;
use indicatif::{ProgressBar, ProgressStyle};

use crate::context::AppContext;
use crate::domain::changelog::{ChangelogEntry, SummaryOutcome, render_document};
use crate::error::AppResult;
use crate::infra::history::{
    DiffSettings, HistoryFilter, commit_diff_text, commit_record, select_commits,
};
use crate::services::CommitSummaryRequest;

#[derive(Debug, Clone)]
pub struct ChangelogRequest {
    pub branch: String,
    pub filter: HistoryFilter,
    pub diff: DiffSettings,
    /// Max diff characters sent to the model per commit.
    pub diff_budget: usize,
    pub include_merges: bool,
}

/// Runs the pipeline over the selected commits, one at a time: diff,
/// truncate, summarize, collect. A failing commit is carried as a
/// placeholder entry; it never aborts the run. Returns the rendered
/// Markdown document.
pub async fn generate(
    ctx: &AppContext,
    repo: &Repository,
    request: &ChangelogRequest,
) -> AppResult<String> {
    let commits = select_commits(repo, &request.branch, &request.filter)?;

    let bar = ProgressBar::new(commits.len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("##-"),
    );
    bar.set_message("Summarizing commits...");

    let mut entries = Vec::new();
    for commit in &commits {
        bar.inc(1);

        let record = commit_record(repo, commit);
        if record.is_merge() && !request.include_merges {
            continue;
        }

        let outcome = match commit_diff_text(repo, commit, &request.diff) {
            Ok(patch) => {
                let patch = truncate_to_chars(&patch, request.diff_budget);
                if patch.trim().is_empty() && record.files.is_empty() {
                    // Nothing to summarize.
                    continue;
                }
                let summary_request = CommitSummaryRequest {
                    short_hash: &record.short_hash,
                    author: &record.author,
                    date: record.date,
                    files: &record.files,
                    diff: patch,
                };
                match ctx.language_model.summarize_commit(&summary_request).await {
                    Ok(summary) => SummaryOutcome::Generated(summary),
                    Err(err) => SummaryOutcome::Failed {
                        reason: err.to_string(),
                    },
                }
            }
            Err(err) => SummaryOutcome::Failed {
                reason: err.to_string(),
            },
        };

        entries.push(ChangelogEntry {
            date: record.date,
            short_hash: record.short_hash,
            author: record.author,
            outcome,
        });
    }
    bar.finish_with_message(format!("Summarized {} commits.", entries.len()));

    Ok(render_document(&entries))
}

/// Cuts `text` down to at most `budget` characters, on a char boundary.
fn truncate_to_chars(text: &str, budget: usize) -> &str {
    match text.char_indices().nth(budget) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
