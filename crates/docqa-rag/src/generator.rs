//! OpenAI-compatible chat completions client behind [`AnswerGenerator`].

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use docqa_core::config::GeneratorSettings;
use docqa_core::traits::AnswerGenerator;
use docqa_core::{Error, Result};

pub struct OpenAiGenerator {
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
    api_key: Option<String>,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiGenerator {
    pub fn new(settings: &GeneratorSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::service(format!("failed to build HTTP client: {e}")))?;
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        info!(model = %settings.model, base_url = %settings.base_url, "answer generator ready");
        Ok(Self {
            client,
            runtime,
            api_key: settings.api_key.clone().filter(|k| !k.is_empty()),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        })
    }

    async fn complete(&self, api_key: &str, system_instruction: &str, user_prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_instruction },
                { "role": "user", "content": user_prompt },
            ],
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        });
        debug!(%url, model = %self.model, "requesting chat completion");
        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::service(format!("request to {url} failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::service(format!("HTTP {status}: {text}")));
        }
        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| Error::service(format!("malformed completion response: {e}")))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| Error::service("completion response has no content"))
    }
}

impl AnswerGenerator for OpenAiGenerator {
    fn generate(&self, system_instruction: &str, user_prompt: &str) -> Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(Error::Credential("OpenAI API key is not set".into()));
        };
        self.runtime.block_on(self.complete(api_key, system_instruction, user_prompt))
    }
}
