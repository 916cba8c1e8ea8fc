//! LLM-backed intent model (OpenAI-compatible chat completions).
//!
//! One HTTP call per classification, bounded by a per-call timeout. Retry is
//! deliberately not done here: the monitoring scheduler re-encounters a trace
//! on its next cycle, and the classify stage already degrades failures to
//! UNKNOWN.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Intent, Trace};
use crate::ports::{ClassifyError, IntentModel};

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

pub struct LlmIntentModel {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl LlmIntentModel {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// The classifier sees step names and outcomes, not raw payloads: enough
    /// to determine intent, small enough to stay inside the context budget.
    fn prompt(trace: &Trace) -> String {
        let mut lines = Vec::with_capacity(trace.steps.len() + 1);
        for step in &trace.steps {
            let code = step
                .response
                .as_ref()
                .map(|r| r.status_code.to_string())
                .unwrap_or_else(|| "-".to_string());
            lines.push(format!("{} [{:?}] status={}", step.name, step.status, code));
        }
        format!(
            "The following tool calls were made during one conversational \
             session:\n{}\n\nAnswer with exactly one label from: {}.",
            lines.join("\n"),
            Intent::vocabulary().join(", ")
        )
    }

    fn system_prompt() -> String {
        "You classify the caller's intent for an ordering assistant. \
         Reply with a single label from the provided vocabulary and nothing else."
            .to_string()
    }
}

#[async_trait]
impl IntentModel for LlmIntentModel {
    async fn classify(&self, trace: &Trace) -> Result<(Intent, u8), ClassifyError> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: Self::system_prompt(),
                },
                ChatMessage {
                    role: "user",
                    content: Self::prompt(trace),
                },
            ],
            temperature: 0.0,
            max_tokens: 16,
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    ClassifyError::Timeout(err.to_string())
                } else {
                    ClassifyError::Unavailable(err.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => {
                    ClassifyError::Unavailable(format!("rate limited: {text}"))
                }
                s if s.is_server_error() => {
                    ClassifyError::Unavailable(format!("server error {s}: {text}"))
                }
                s => ClassifyError::Malformed(format!("unexpected status {s}: {text}")),
            });
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| ClassifyError::Malformed(err.to_string()))?;

        let label = body
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| ClassifyError::Malformed("no choices in response".to_string()))?;

        debug!(trace_id = %trace.trace_id, label = %label, "classifier answered");

        match Intent::parse(&label) {
            // The model committed to a vocabulary label; confidence reflects
            // that the constrained prompt leaves little room for ambiguity.
            Some(Intent::Unknown) => Ok((Intent::Unknown, 50)),
            Some(intent) => Ok((intent, 85)),
            None => Err(ClassifyError::Malformed(format!(
                "label outside vocabulary: {label:?}"
            ))),
        }
    }
}
