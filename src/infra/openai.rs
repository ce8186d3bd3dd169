use async_trait::async_trait;
use reqwest::{
    Client,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::services::{CommitSummaryRequest, LanguageModelService};

const COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Low temperature favors deterministic, factual phrasing.
const TEMPERATURE: f32 = 0.2;
const MAX_COMPLETION_TOKENS: u32 = 350;

/// File names listed in the prompt beyond this count collapse into an
/// ellipsis marker.
const MAX_LISTED_FILES: usize = 30;

const SYSTEM_PROMPT: &str = "\
You summarize Git changes into a concise human-readable CHANGELOG.
- Input is a unified diff oriented from PARENT→COMMIT: lines starting with '+' were ADDED in the commit, '-' were REMOVED.
- Produce 3–6 bullet points max, action-style, grouped by area if clear.
- Mention important files/paths and breaking changes.
- Prefer terse, technical phrasing; no fluff.
";

pub struct OpenAiClient {
    http: Client,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            http: Client::new(),
            api_key,
            model,
        }
    }
}

#[async_trait]
impl LanguageModelService for OpenAiClient {
    async fn summarize_commit(&self, request: &CommitSummaryRequest<'_>) -> AppResult<String> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: render_user_prompt(request),
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_COMPLETION_TOKENS,
        };

        let response = self
            .http
            .post(COMPLETIONS_URL)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|err| AppError::LanguageModel(format!("failed to call OpenAI: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            let detail = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|value| value["error"]["message"].as_str().map(String::from))
                .unwrap_or(body);
            return Err(AppError::LanguageModel(format!(
                "OpenAI responded with {status}: {detail}"
            )));
        }

        let payload: ChatCompletionResponse = response.json().await.map_err(|err| {
            AppError::LanguageModel(format!("failed to parse OpenAI response: {err}"))
        })?;

        let content = payload
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                AppError::LanguageModel("OpenAI response contained no choices".to_string())
            })?;

        Ok(content.trim().to_string())
    }
}

fn render_user_prompt(request: &CommitSummaryRequest<'_>) -> String {
    format!(
        "Commit: {sha}\n\
         Author: {author}\n\
         Date (UTC): {date}\n\
         Changed files ({nfiles}): {files}\n\n\
         Diff (may be truncated):\n\
         ```\n{diff}\n```\n",
        sha = request.short_hash,
        author = request.author,
        date = request.date.format("%Y-%m-%d"),
        nfiles = request.files.len(),
        files = render_file_list(request.files),
        diff = request.diff,
    )
}

fn render_file_list(files: &[String]) -> String {
    if files.is_empty() {
        return "(none)".to_string();
    }
    let mut listed = files
        .iter()
        .take(MAX_LISTED_FILES)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if files.len() > MAX_LISTED_FILES {
        listed.push_str(", …");
    }
    listed
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}
