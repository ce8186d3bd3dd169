use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::AppResult;

/// Everything the summarizer gets to see about one commit. The diff is
/// already truncated to the caller's character budget.
#[derive(Debug, Clone)]
pub struct CommitSummaryRequest<'a> {
    pub short_hash: &'a str,
    pub author: &'a str,
    pub date: NaiveDate,
    pub files: &'a [String],
    pub diff: &'a str,
}

#[async_trait]
pub trait LanguageModelService: Send + Sync {
    async fn summarize_commit(&self, request: &CommitSummaryRequest<'_>) -> AppResult<String>;
}
