// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use datadash_app::{AnalysisResult, ChatMessage, ChatRole, Dataset, Row};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::env;
use std::time::Duration;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, warn};
use url::Url;

pub use datadash_app::NO_DATA_MESSAGE;

pub const DEFAULT_SAMPLE_ROWS: usize = 20;

pub const INVALID_JSON_MESSAGE: &str =
    "Failed to parse the analysis from the AI. The response was not valid JSON.";
pub const ANALYSIS_FAILED_MESSAGE: &str =
    "Failed to get analysis from the AI. The model may be overloaded or an API error occurred.";
pub const CHAT_FAILED_MESSAGE: &str =
    "Failed to get a reply from the AI. The model may be overloaded or an API error occurred.";

/// The one error analysis and chat calls surface. The message is meant for
/// the user as is; the underlying cause goes to the log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AnalysisUnavailable {
    pub message: String,
}

impl AnalysisUnavailable {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    fn logged(message: &str, cause: &anyhow::Error) -> Self {
        warn!(error = %format!("{cause:#}"), "{message}");
        Self::new(message)
    }
}

/// Blocking analysis backend. [`Client`] talks to a model server; tests and
/// the offline shell plug in their own.
pub trait Analyst: Send + Sync {
    fn analyze(&self, dataset: &Dataset) -> Result<AnalysisResult, AnalysisUnavailable>;

    fn chat(
        &self,
        dataset: &Dataset,
        analysis: &AnalysisResult,
        transcript: &[ChatMessage],
    ) -> Result<String, AnalysisUnavailable>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

impl From<&ChatMessage> for Message {
    fn from(message: &ChatMessage) -> Self {
        let role = match message.role {
            ChatRole::User => Role::User,
            ChatRole::Model => Role::Assistant,
        };
        Self {
            role,
            content: message.text.clone(),
        }
    }
}

/// Where the bearer token comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Credential {
    /// Local servers that need no key.
    #[default]
    Anonymous,
    Bearer(String),
    /// A key variable was configured but is not set. Every call fails with
    /// the missing-key message until it is.
    Unset { env_var: String },
}

impl Credential {
    pub fn from_env(env_var: Option<&str>) -> Self {
        let Some(name) = env_var.map(str::trim).filter(|name| !name.is_empty()) else {
            return Self::Anonymous;
        };
        match env::var(name) {
            Ok(value) if !value.trim().is_empty() => Self::Bearer(value.trim().to_owned()),
            _ => Self::Unset {
                env_var: name.to_owned(),
            },
        }
    }

    fn missing_message(&self) -> Option<String> {
        match self {
            Self::Unset { env_var } => Some(format!("{env_var} environment variable not set.")),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    model: String,
    timeout: Duration,
    credential: Credential,
    sample_rows: usize,
    extra_context: Option<String>,
    http: HttpClient,
}

impl Client {
    pub fn new(
        base_url: &str,
        model: &str,
        timeout: Duration,
        credential: Credential,
    ) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("llm.base_url must not be empty");
        }
        let parsed = Url::parse(&base_url)
            .with_context(|| format!("llm.base_url {base_url:?} is not a valid URL"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!(
                "llm.base_url {base_url:?} uses scheme {:?}; use http:// or https://",
                parsed.scheme()
            );
        }
        if model.trim().is_empty() {
            bail!("llm.model must not be empty");
        }
        if timeout.is_zero() {
            bail!("llm.timeout must be positive");
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            model: model.trim().to_owned(),
            timeout,
            credential,
            sample_rows: DEFAULT_SAMPLE_ROWS,
            extra_context: None,
            http,
        })
    }

    pub fn with_sample_rows(mut self, sample_rows: usize) -> Self {
        self.sample_rows = sample_rows.max(1);
        self
    }

    pub fn with_extra_context(mut self, extra_context: Option<String>) -> Self {
        self.extra_context = extra_context.filter(|context| !context.trim().is_empty());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn sample_rows(&self) -> usize {
        self.sample_rows
    }

    pub fn list_models(&self) -> Result<Vec<String>> {
        let response = self
            .authorize(self.http.get(format!("{}/models", self.base_url)))?
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let parsed: ModelsResponse = response.json().context("decode model list")?;
        Ok(parsed.data.into_iter().map(|model| model.id).collect())
    }

    pub fn ping(&self) -> Result<()> {
        let models = self.list_models()?;
        let exists = models
            .iter()
            .any(|name| name == &self.model || name.starts_with(&format!("{}:", self.model)));
        if !exists {
            bail!(
                "model {:?} is not served by {} -- set [llm] model to one of: {}",
                self.model,
                self.base_url,
                models.join(", ")
            );
        }
        Ok(())
    }

    pub fn chat_complete(
        &self,
        messages: &[Message],
        response_format: Option<Value>,
    ) -> Result<String> {
        let request = ChatRequest::new(&self.model, messages, response_format);
        debug!(
            model = %self.model,
            messages = messages.len(),
            bytes = messages.iter().map(|m| m.content.len()).sum::<usize>(),
            "chat completion request"
        );
        let response = self
            .authorize(
                self.http
                    .post(format!("{}/chat/completions", self.base_url))
                    .json(&request),
            )?
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let parsed: ChatCompletionResponse = response.json().context("decode chat response")?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("no choices in chat response"))?;
        Ok(content)
    }

    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        match &self.credential {
            Credential::Anonymous => Ok(request),
            Credential::Bearer(token) => Ok(request.bearer_auth(token)),
            Credential::Unset { env_var } => bail!("{env_var} environment variable not set."),
        }
    }

    fn ensure_credential(&self) -> Result<(), AnalysisUnavailable> {
        match self.credential.missing_message() {
            Some(message) => {
                warn!("{message}");
                Err(AnalysisUnavailable::new(message))
            }
            None => Ok(()),
        }
    }
}

impl Analyst for Client {
    fn analyze(&self, dataset: &Dataset) -> Result<AnalysisResult, AnalysisUnavailable> {
        self.ensure_credential()?;
        if dataset.is_empty() {
            return Err(AnalysisUnavailable::new(NO_DATA_MESSAGE));
        }

        let sample = format_sample_csv(&dataset.rows, &dataset.headers, self.sample_rows);
        let prompt = build_analysis_prompt(
            dataset.row_count(),
            &sample,
            OffsetDateTime::now_utc(),
            self.extra_context.as_deref(),
        );
        let messages = [Message::system(ANALYST_ROLE), Message::user(prompt)];

        let raw = self
            .chat_complete(&messages, Some(analysis_response_format()))
            .map_err(|error| AnalysisUnavailable::logged(ANALYSIS_FAILED_MESSAGE, &error))?;
        parse_analysis(&raw)
            .map_err(|error| AnalysisUnavailable::logged(INVALID_JSON_MESSAGE, &error))
    }

    fn chat(
        &self,
        dataset: &Dataset,
        analysis: &AnalysisResult,
        transcript: &[ChatMessage],
    ) -> Result<String, AnalysisUnavailable> {
        self.ensure_credential()?;

        let sample = format_sample_csv(&dataset.rows, &dataset.headers, self.sample_rows);
        let analysis_json = serde_json::to_string_pretty(analysis)
            .map_err(|error| AnalysisUnavailable::logged(CHAT_FAILED_MESSAGE, &error.into()))?;
        let system = build_chat_system_prompt(
            &sample,
            &analysis_json,
            OffsetDateTime::now_utc(),
            self.extra_context.as_deref(),
        );

        let mut messages = Vec::with_capacity(transcript.len() + 1);
        messages.push(Message::system(system));
        messages.extend(transcript.iter().map(Message::from));

        let reply = self
            .chat_complete(&messages, None)
            .map_err(|error| AnalysisUnavailable::logged(CHAT_FAILED_MESSAGE, &error))?;
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(AnalysisUnavailable::logged(
                CHAT_FAILED_MESSAGE,
                &anyhow!("model returned an empty reply"),
            ));
        }
        Ok(reply.to_owned())
    }
}

/// Header line plus the first `limit` rows. Values holding a comma are
/// wrapped in double quotes; missing values are empty.
pub fn format_sample_csv(rows: &[Row], headers: &[String], limit: usize) -> String {
    let mut lines = Vec::with_capacity(limit.min(rows.len()) + 1);
    lines.push(headers.join(","));
    for row in rows.iter().take(limit) {
        let fields: Vec<String> = headers
            .iter()
            .map(|header| {
                let text = row.get(header).display_text();
                if text.contains(',') {
                    format!("\"{}\"", text.replace('"', "\"\""))
                } else {
                    text.into_owned()
                }
            })
            .collect();
        lines.push(fields.join(","));
    }
    lines.join("\n")
}

pub fn build_analysis_prompt(
    total_rows: usize,
    sample_csv: &str,
    now: OffsetDateTime,
    extra_context: Option<&str>,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("Current date: {}\n\n", format_human_date(now)));
    out.push_str(&format!(
        "The full dataset has {total_rows} rows. A sample in CSV format follows.\n\n"
    ));
    out.push_str("## Data sample\n\n```csv\n");
    out.push_str(sample_csv);
    out.push_str("\n```\n\n");
    out.push_str(ANALYSIS_INSTRUCTIONS);
    if let Some(context) = extra_context
        && !context.is_empty()
    {
        out.push_str("\n## Additional context\n\n");
        out.push_str(context);
        out.push('\n');
    }
    out
}

pub fn build_chat_system_prompt(
    sample_csv: &str,
    analysis_json: &str,
    now: OffsetDateTime,
    extra_context: Option<&str>,
) -> String {
    let mut out = String::new();
    out.push_str(ANALYST_ROLE);
    out.push('\n');
    out.push_str(&format!("Current date: {}\n\n", format_human_date(now)));
    out.push_str("## Data sample\n\n```csv\n");
    out.push_str(sample_csv);
    out.push_str("\n```\n\n## Your earlier analysis\n\n```json\n");
    out.push_str(analysis_json);
    out.push_str("\n```\n\n");
    out.push_str(CHAT_GUIDELINES);
    if let Some(context) = extra_context
        && !context.is_empty()
    {
        out.push_str("\n## Additional context\n\n");
        out.push_str(context);
        out.push('\n');
    }
    out
}

/// Models often wrap JSON in a fenced block even when told not to.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

pub fn parse_analysis(raw: &str) -> Result<AnalysisResult> {
    let body = strip_code_fences(raw);
    let value: Value = serde_json::from_str(body).context("analysis reply is not JSON")?;
    if !value.is_object() {
        bail!("analysis reply is JSON but not an object");
    }
    serde_json::from_value(value).context("analysis reply does not match the schema")
}

pub fn analysis_schema() -> Value {
    let string_list = json!({"type": "array", "items": {"type": "string"}});
    json!({
        "type": "object",
        "properties": {
            "dataOverview": {
                "type": "object",
                "properties": {
                    "description": {
                        "type": "string",
                        "description": "The dataset's structure: columns and number of records."
                    },
                    "qualityIssues": string_list.clone()
                },
                "required": ["description", "qualityIssues"]
            },
            "keyInsights": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "insight": {"type": "string"},
                        "supportingData": {"type": "string"}
                    },
                    "required": ["insight", "supportingData"]
                }
            },
            "potentialAnomalies": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "anomaly": {"type": "string"},
                        "details": {"type": "string"}
                    },
                    "required": ["anomaly", "details"]
                }
            },
            "actionableRecommendations": string_list.clone(),
            "suggestedAgentTasks": string_list,
            "suggestedVisualizations": {
                "type": "array",
                "maxItems": 2,
                "items": {
                    "type": "object",
                    "properties": {
                        "title": {"type": "string"},
                        "type": {"type": "string", "enum": ["bar", "pie"]},
                        "data": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "label": {"type": "string"},
                                    "value": {"type": "number"}
                                },
                                "required": ["label", "value"]
                            }
                        }
                    },
                    "required": ["title", "type", "data"]
                }
            }
        },
        "required": [
            "dataOverview",
            "keyInsights",
            "potentialAnomalies",
            "actionableRecommendations",
            "suggestedVisualizations"
        ]
    })
}

fn analysis_response_format() -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "data_analysis",
            "schema": analysis_schema()
        }
    })
}

fn format_human_date(now: OffsetDateTime) -> String {
    now.date()
        .format(&time::macros::format_description!(
            "[weekday repr:long], [month repr:long] [day], [year]"
        ))
        .unwrap_or_else(|_| now.date().to_string())
}

const ANALYST_ROLE: &str =
    "You are an e-commerce data analyst. You turn sales and product data into concrete, useful insight for an online store.";

const ANALYSIS_INSTRUCTIONS: &str = r#"## What to return

Reply with one JSON object that follows the provided schema and nothing else.

1. dataOverview: describe the columns and size of the data and list quality
   problems such as missing values or inconsistent formats.
2. keyInsights: top sellers, category performance and notable trends, each with
   supporting figures.
3. potentialAnomalies: inventory risks such as low stock on popular items, and
   unusual values or sales patterns, each with the reason it stands out.
4. actionableRecommendations: two or three concrete business actions.
5. suggestedAgentTasks: short tasks an automation agent could carry out next.
6. suggestedVisualizations: at most two bar or pie charts with a title, a type
   and aggregated label/value data. Leave the list empty when no chart fits.

Keep it concise and do not invent data that is not in the sample.
"#;

const CHAT_GUIDELINES: &str = r#"## Guidelines

- Answer follow-up questions about this data and your analysis.
- Use only the sample and the analysis above. Say so when they do not hold the answer.
- Keep answers short and plain; use a list when comparing several items.
"#;

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    anyhow!(
        "cannot reach {} -- check [llm] base_url and that the model server is running ({})",
        base_url,
        error
    )
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<OpenAIErrorEnvelope>(body)
        && let Some(error) = parsed.error
        && !error.message.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), error.message);
    }

    if body.len() < 100 && !body.contains('{') && !body.trim().is_empty() {
        return anyhow!("server error ({}): {}", status.as_u16(), body.trim());
    }

    anyhow!("server returned {}", status.as_u16())
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatRequestMessage<'a>>,
    stream: bool,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

impl<'a> ChatRequest<'a> {
    fn new(model: &'a str, messages: &'a [Message], response_format: Option<Value>) -> Self {
        Self {
            model,
            messages: messages
                .iter()
                .map(|message| ChatRequestMessage {
                    role: message.role.as_str(),
                    content: &message.content,
                })
                .collect(),
            stream: false,
            temperature: 0.2,
            response_format,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    data: Vec<ModelRow>,
}

#[derive(Debug, Deserialize)]
struct ModelRow {
    id: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorEnvelope {
    error: Option<OpenAIErrorBody>,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorBody {
    message: String,
}
