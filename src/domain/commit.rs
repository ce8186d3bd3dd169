use chrono::NaiveDate;

/// One commit's worth of metadata, read per iteration step and discarded
/// once its summary has been produced.
#[derive(Debug, Clone)]
pub struct CommitRecord {
    /// Abbreviated hash (7 hex chars).
    pub short_hash: String,
    pub author: String,
    /// Commit date in UTC, date-only precision.
    pub date: NaiveDate,
    /// Changed file paths, sorted.
    pub files: Vec<String>,
    pub parent_count: usize,
}

impl CommitRecord {
    pub fn is_merge(&self) -> bool {
        self.parent_count > 1
    }
}
