use std::time::Duration;

use anyhow::{anyhow, Context as _};
use fete_core::config::AiConfig;
use fete_core::prompt::{system_prompt, USER_PROMPT};
use fete_core::response::parse_plan_text;
use fete_protocol::{EventDetails, PlanResponse};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

/// Client for an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct AiPlanner {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    temperature: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// What a planning call produced: the parsed plan and the raw text it came from.
#[derive(Debug, Clone)]
pub struct PlanReply {
    pub plan: PlanResponse,
    pub raw: String,
}

impl AiPlanner {
    pub fn new(config: &AiConfig, api_key: String) -> anyhow::Result<Self> {
        if api_key.trim().is_empty() {
            return Err(anyhow!("missing ai api key"));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .user_agent(format!("fete/{}", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(Duration::from_secs(config.effective_timeout_secs()))
            .build()
            .context("build reqwest client")?;

        Ok(Self {
            client,
            base_url: config.effective_base_url().to_owned(),
            model: config.effective_model().to_owned(),
            api_key,
            temperature: config.temperature,
        })
    }

    /// Reads the key from the environment variable named in the config.
    pub fn from_env(config: &AiConfig) -> anyhow::Result<Self> {
        let var = config.effective_api_key_env();
        let api_key =
            std::env::var(var).map_err(|_| anyhow!("{var} environment variable not set"))?;
        Self::new(config, api_key)
    }

    pub async fn plan(&self, details: &EventDetails) -> anyhow::Result<PlanReply> {
        let req = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_owned(),
                    content: Some(system_prompt(details)),
                },
                ChatMessage {
                    role: "user".to_owned(),
                    content: Some(USER_PROMPT.to_owned()),
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
            temperature: self.temperature,
        };

        tracing::info!(model = %self.model, title = %details.title, "requesting plan");

        let url = format!("{}/chat/completions", self.base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("send chat completion request")?;

        let status = resp.status();
        let text = resp.text().await.context("read chat completion response")?;
        if !status.is_success() {
            return Err(anyhow!("ai api error ({status}): {text}"));
        }

        let parsed: ChatResponse =
            serde_json::from_str(&text).context("parse chat completion response")?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| anyhow!("ai response has no content"))?;

        let plan = parse_plan_text(&content).context("parse plan")?;
        tracing::info!(
            event_type = plan.plan.event_type(),
            "plan received"
        );

        Ok(PlanReply { plan, raw: content })
    }
}
