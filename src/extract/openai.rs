// src/extract/openai.rs
// OpenAI-backed extractor (Chat Completions API). Requires `OPENAI_API_KEY`
// unless the key is inlined in config.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ExtractorConfig;
use crate::error::ExtractionError;
use crate::extract::{format_action_list, Extractor};
use crate::model::{ActionItem, Insight};

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

const EXTRACT_INSTRUCTIONS: &str = "\
You receive a block of text (a StackOverflow question or GitHub issue).
Extract and return a JSON object with exactly these keys:
  - category (one word)
  - summary (a one-sentence pain-point description)
  - severity (Low, Medium, or High)
Respond *only* with the JSON.";

const ACTION_INSTRUCTIONS: &str = "\
You receive a numbered list of community feedback pain points, each with a \
severity and an age in days. Produce a short, prioritized action plan for the \
maintainers: which issues to tackle first and why. Plain text, no preamble.";

pub struct OpenAiExtractor {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiExtractor {
    pub fn from_config(config: &ExtractorConfig) -> Self {
        // "ENV" in config means: read the real key from the environment.
        let api_key = if config.api_key.trim().eq_ignore_ascii_case("env") {
            std::env::var("OPENAI_API_KEY").unwrap_or_default()
        } else {
            config.api_key.clone()
        };
        let http = reqwest::Client::builder()
            .user_agent("community-insights/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key,
            model: config.model.clone(),
        }
    }

    async fn chat(&self, instructions: &str, input: &str) -> Result<String, ExtractionError> {
        if self.api_key.is_empty() {
            return Err(ExtractionError::MissingApiKey);
        }

        let req = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: instructions,
                },
                ChatMessage {
                    role: "user",
                    content: input,
                },
            ],
            temperature: 0.2,
            max_tokens: 300,
        };

        let resp = self
            .http
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ExtractionError::Status(status));
        }

        let body: ChatResponse = resp.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(ExtractionError::EmptyResponse);
        }
        Ok(content)
    }
}

#[async_trait]
impl Extractor for OpenAiExtractor {
    async fn extract(&self, text: &str) -> Result<Insight, ExtractionError> {
        let raw = self.chat(EXTRACT_INSTRUCTIONS, text).await?;
        // Models occasionally wrap the JSON in a markdown fence despite the
        // "only the JSON" instruction.
        let insight: Insight = serde_json::from_str(strip_code_fences(&raw))?;
        Ok(insight)
    }

    async fn synthesize_actions(&self, items: &[ActionItem]) -> Result<String, ExtractionError> {
        let list = format_action_list(items);
        let raw = self.chat(ACTION_INSTRUCTIONS, &list).await?;
        Ok(raw.trim().to_string())
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
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

fn strip_code_fences(s: &str) -> &str {
    let t = s.trim();
    let Some(rest) = t.strip_prefix("```") else {
        return t;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}
