//! OpenAI-compatible chat-completions wire client.
//!
//! A thin reqwest layer that maps provider failures onto the pipeline's
//! error taxonomy so the retry state machine can dispatch on them: 429
//! carries the numeric `Retry-After`, and a 400/404 whose body reads like
//! "model not found" becomes [`Error::ProviderModelRejected`].

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use idhound::{Error, Result};

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// One conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `system`, `user` or `assistant`.
    pub role: String,
    /// Turn content.
    pub content: String,
}

impl ChatMessage {
    /// System turn.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    /// User turn.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }

    /// Assistant turn.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// A successful completion: the assistant text plus the full envelope.
#[derive(Debug, Clone)]
pub struct Completion {
    /// `choices[0].message.content`, trimmed.
    pub content: String,
    /// Full provider response, kept for audit.
    pub raw: Value,
}

/// Chat-completions client bound to one provider base URL.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: Client,
    endpoint: String,
    api_key: String,
}

impl ChatClient {
    /// Build a client for `base_url` with the given timeout.
    pub fn new(base_url: &str, api_key: impl Into<String>, timeout_seconds: f64) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs_f64(timeout_seconds))
            .build()
            .map_err(|e| Error::transport(format!("failed to build provider client: {e}")))?;
        Ok(Self {
            http,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), CHAT_COMPLETIONS_PATH),
            api_key: api_key.into(),
        })
    }

    /// Issue one completion request.
    pub async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<Completion> {
        let request = ChatRequest {
            model,
            messages,
            temperature,
            max_tokens,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(Error::from)?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<f64>().ok());
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_http_error(
                status.as_u16(),
                retry_after,
                &body,
                model,
            ));
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|e| Error::parse(format!("provider body is not JSON: {e}")))?;
        let parsed: ChatResponse = serde_json::from_value(raw.clone())
            .map_err(|e| Error::parse(format!("unexpected completion shape: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default()
            .trim()
            .to_string();

        Ok(Completion { content, raw })
    }

    fn map_http_error(status: u16, retry_after: Option<f64>, body: &str, model: &str) -> Error {
        let message = if body.trim().is_empty() {
            format!("HTTP {status}")
        } else {
            format!("HTTP {status}: {}", body.trim())
        };

        match status {
            429 => Error::ProviderRateLimit {
                message,
                retry_after,
            },
            400 | 404 if mentions_unknown_model(body) => Error::ProviderModelRejected {
                model: model.to_string(),
                message,
            },
            _ => Error::ProviderUnknown(message),
        }
    }
}

fn mentions_unknown_model(body: &str) -> bool {
    let lowered = body.to_lowercase();
    lowered.contains("model")
        && [
            "not found",
            "does not exist",
            "unknown",
            "invalid",
            "decommissioned",
            "unsupported",
            "no such",
        ]
        .iter()
        .any(|marker| lowered.contains(marker))
}
