mod config;
mod context;
mod domain;
mod error;
mod infra;
mod services;
mod workflow;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::infra::history::{DiffSettings, HistoryFilter};
use crate::infra::openai::OpenAiClient;
use crate::infra::repo::{OpenedRepo, RepoLocation};
use crate::services::LanguageModelService;
use crate::workflow::changelog::{self, ChangelogRequest};

#[derive(Parser)]
#[command(
    name = "relog",
    version,
    about = "AI-generated changelog from Git commit diffs"
)]
struct Cli {
    /// Git repo URL or local path.
    #[arg(long, default_value = ".")]
    repo: String,
    /// Branch or ref.
    #[arg(long, default_value = "main")]
    branch: String,
    /// Filter commits since this date (e.g. "2024-01-01").
    #[arg(long)]
    since: Option<NaiveDate>,
    /// Filter commits until this date (e.g. "2025-12-31").
    #[arg(long)]
    until: Option<NaiveDate>,
    /// Limit number of commits (0 = all).
    #[arg(long, default_value_t = 0)]
    max_commits: usize,
    /// Output file.
    #[arg(long, default_value = "CHANGELOG.md")]
    output: PathBuf,
    /// OpenAI model.
    #[arg(long, env = "CHANGELOG_MODEL", default_value = "gpt-4o-mini")]
    model: String,
    /// Max diff chars sent per commit.
    #[arg(long, default_value_t = 8000)]
    per_commit_budget: usize,
    /// Include merge commits (default: skip).
    #[arg(long)]
    include_merges: bool,
    /// Do not ask git to ignore whitespace changes.
    #[arg(long)]
    no_trim_whitespace: bool,
    /// Do not simplify renames (more raw diffs).
    #[arg(long)]
    no_renames: bool,
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> AppResult<()> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;

    let language_model: Arc<dyn LanguageModelService> =
        Arc::new(OpenAiClient::new(config.api_key, cli.model));
    let context = AppContext::new(language_model);

    let opened = OpenedRepo::acquire(RepoLocation::classify(&cli.repo), &cli.branch)?;

    let request = ChangelogRequest {
        branch: cli.branch,
        filter: HistoryFilter {
            since: cli.since,
            until: cli.until,
            max_commits: cli.max_commits,
        },
        diff: DiffSettings {
            ignore_whitespace: !cli.no_trim_whitespace,
            detect_renames: !cli.no_renames,
        },
        diff_budget: cli.per_commit_budget,
        include_merges: cli.include_merges,
    };

    let document = changelog::generate(&context, opened.repo(), &request).await?;
    fs::write(&cli.output, document)?;

    println!("✅ Wrote {}", cli.output.display());
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
