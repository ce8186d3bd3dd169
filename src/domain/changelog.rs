use chrono::NaiveDate;

/// Per-commit result of the summarization step. A failure is carried
/// through and rendered as a visible placeholder instead of aborting
/// the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    Generated(String),
    Failed { reason: String },
}

#[derive(Debug, Clone)]
pub struct ChangelogEntry {
    pub date: NaiveDate,
    pub short_hash: String,
    pub author: String,
    pub outcome: SummaryOutcome,
}

impl ChangelogEntry {
    fn heading(&self) -> String {
        format!(
            "## {} – `{}` by {}",
            self.date.format("%Y-%m-%d"),
            self.short_hash,
            self.author
        )
    }

    fn body(&self) -> String {
        match &self.outcome {
            SummaryOutcome::Generated(text) => text.clone(),
            SummaryOutcome::Failed { reason } => format!(
                "⚠️ Error summarizing commit {}: {reason}",
                self.short_hash
            ),
        }
    }
}

/// Joins the accumulated entries into the final Markdown document.
/// Entry order in is heading order out.
pub fn render_document(entries: &[ChangelogEntry]) -> String {
    let mut lines = vec!["# Changelog".to_string(), String::new()];
    for entry in entries {
        lines.push(entry.heading());
        lines.push(entry.body());
        lines.push(String::new());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(day: u32, hash: &str, outcome: SummaryOutcome) -> ChangelogEntry {
        ChangelogEntry {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            short_hash: hash.to_string(),
            author: "Alice".to_string(),
            outcome,
        }
    }

    #[test]
    fn renders_heading_and_summary() {
        let doc = render_document(&[entry(
            5,
            "abc1234",
            SummaryOutcome::Generated("- Added CI pipeline".to_string()),
        )]);
        assert_eq!(
            doc,
            "# Changelog\n\n## 2024-01-05 – `abc1234` by Alice\n- Added CI pipeline\n"
        );
    }

    #[test]
    fn preserves_entry_order() {
        let doc = render_document(&[
            entry(1, "aaaaaaa", SummaryOutcome::Generated("- first".to_string())),
            entry(5, "bbbbbbb", SummaryOutcome::Generated("- second".to_string())),
            entry(9, "ccccccc", SummaryOutcome::Generated("- third".to_string())),
        ]);
        let first = doc.find("aaaaaaa").unwrap();
        let second = doc.find("bbbbbbb").unwrap();
        let third = doc.find("ccccccc").unwrap();
        assert!(first < second && second < third);
    }

    #[test]
    fn failed_outcome_renders_placeholder_with_hash() {
        let doc = render_document(&[entry(
            5,
            "abc1234",
            SummaryOutcome::Failed {
                reason: "connection refused".to_string(),
            },
        )]);
        assert!(doc.contains("⚠️ Error summarizing commit abc1234: connection refused"));
    }

    #[test]
    fn empty_run_is_just_the_title() {
        assert_eq!(render_document(&[]), "# Changelog\n");
    }
}
