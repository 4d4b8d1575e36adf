use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;

use crate::core::errors::{AppError, AppResult};
use crate::providers::{Completion, CompletionProvider, CompletionRequest};

const TEMPERATURE: f32 = 0.5;
const MAX_TOKENS: u32 = 7000;
const TOP_P: f32 = 1.0;

/// Client for Groq's OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct GroqClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl GroqClient {
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> AppResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AppError::ProviderAuth);
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|err| AppError::Network(err.to_string()))?;
        Ok(Self {
            http,
            api_base: api_base.into(),
            api_key,
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

impl CompletionProvider for GroqClient {
    async fn complete(&self, request: &CompletionRequest) -> AppResult<Completion> {
        let payload = chat_payload(&self.model, request);

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    AppError::ProviderTimeout
                } else {
                    AppError::Network(err.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, &body));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|err| AppError::ProviderInvalidResponse(err.to_string()))?;
        let completion = parse_completion_body(&body, &self.model)?;
        tracing::debug!(
            model = %completion.model,
            usage = %completion.token_usage,
            "completion received"
        );
        Ok(completion)
    }
}

/// Request body for one non-streamed chat completion: the system
/// instruction followed by the user message.
pub fn chat_payload(model: &str, request: &CompletionRequest) -> Value {
    serde_json::json!({
        "model": model,
        "messages": [
            { "role": "system", "content": request.system },
            { "role": "user", "content": request.user },
        ],
        "temperature": TEMPERATURE,
        "max_tokens": MAX_TOKENS,
        "top_p": TOP_P,
        "stream": false,
    })
}

pub fn error_for_status(status: StatusCode, body: &str) -> AppError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::ProviderAuth,
        StatusCode::TOO_MANY_REQUESTS => AppError::ProviderRateLimited,
        StatusCode::BAD_REQUEST => AppError::ProviderInvalidResponse(
            "bad request: the API could not process the document, check the file and try again"
                .to_string(),
        ),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => AppError::ProviderTimeout,
        status => AppError::ProviderInvalidResponse(format!("status {status} body {body}")),
    }
}

/// Pulls `choices[0].message.content` out of a chat completion body.
pub fn parse_completion_body(body: &Value, requested_model: &str) -> AppResult<Completion> {
    let content = body
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .ok_or_else(|| {
            AppError::ProviderInvalidResponse("unexpected API response structure".to_string())
        })?;

    let model = body
        .get("model")
        .and_then(Value::as_str)
        .unwrap_or(requested_model)
        .to_string();
    let token_usage = body
        .get("usage")
        .cloned()
        .unwrap_or_else(|| serde_json::json!({}));

    Ok(Completion {
        content: content.to_string(),
        model,
        token_usage,
    })
}
