use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use coach_domain::{DomainError, GenerationOutput, GenerationRequest, TextGenerationPort};

mod wire;

use wire::{ErrorEnvelope, GenerateContentRequest, GenerateContentResponse};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const SERVICE: &str = "gemini";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// `TextGenerationPort` backed by the Gemini `generateContent` REST call.
///
/// A missing key is not a construction error; it is reported by
/// `ensure_configured` and by every `generate` call.
pub struct GeminiTextGenerator {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    request_timeout: Duration,
}

impl GeminiTextGenerator {
    pub fn new(
        api_key: Option<String>,
        base_url: impl Into<String>,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, DomainError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(|err| {
                DomainError::internal_error(&format!("failed to build gemini http client: {err}"))
            })?;
        let api_key = api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            request_timeout,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    fn transport_error(&self, err: reqwest::Error, context: &str) -> DomainError {
        if err.is_timeout() {
            return DomainError::Timeout {
                service: SERVICE.to_string(),
                after_ms: self.request_timeout.as_millis() as u64,
            };
        }
        DomainError::external_service_error(SERVICE, &format!("{context}: {err}"))
    }

    fn api_key(&self) -> Result<&str, DomainError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| DomainError::configuration_missing("gemini api key"))
    }
}

#[async_trait]
impl TextGenerationPort for GeminiTextGenerator {
    fn ensure_configured(&self) -> Result<(), DomainError> {
        self.api_key().map(|_| ())
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutput, DomainError> {
        let api_key = self.api_key()?;
        let url = self.endpoint(&request.model);
        tracing::debug!(
            model = %request.model,
            prompt_chars = request.prompt.as_str().len(),
            "calling gemini"
        );

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(&GenerateContentRequest::user_prompt(request.prompt.as_str()))
            .send()
            .await
            .map_err(|err| self.transport_error(err, "request failed"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| self.transport_error(err, "failed to read response"))?;
        if !status.is_success() {
            return Err(map_status(status, &body));
        }

        let decoded: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|err| DomainError::malformed(format!("unreadable gemini response: {err}")))?;
        let text = decoded.answer_text();
        if text.trim().is_empty() {
            let reason = decoded.block_reason().unwrap_or("no candidate text");
            return Err(DomainError::malformed(format!("gemini returned no text ({reason})")));
        }

        tracing::debug!(
            model = %request.model,
            reply_chars = text.len(),
            finish_reason = decoded.finish_reason().unwrap_or("unknown"),
            "gemini replied"
        );
        Ok(GenerationOutput { text })
    }
}

fn map_status(status: StatusCode, body: &str) -> DomainError {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| match envelope.error.status {
            Some(code) => format!("{code}: {}", envelope.error.message),
            None => envelope.error.message,
        })
        .unwrap_or_else(|_| body.chars().take(200).collect());
    tracing::warn!(status = status.as_u16(), detail = %detail, "gemini request rejected");
    DomainError::external_service_error(SERVICE, &format!("HTTP {}: {detail}", status.as_u16()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_model_and_method() {
        let generator = GeminiTextGenerator::new(
            Some("key".to_string()),
            "http://localhost:1/v1beta/",
            Duration::from_secs(1),
            Duration::from_secs(5),
        )
        .expect("client");
        assert_eq!(
            generator.endpoint("gemini-1.5-flash-latest"),
            "http://localhost:1/v1beta/models/gemini-1.5-flash-latest:generateContent"
        );
    }

    #[test]
    fn status_errors_prefer_the_api_message() {
        let err = map_status(
            StatusCode::FORBIDDEN,
            r#"{"error":{"code":403,"message":"API key not valid","status":"PERMISSION_DENIED"}}"#,
        );
        assert_eq!(
            err,
            DomainError::external_service_error(
                "gemini",
                "HTTP 403: PERMISSION_DENIED: API key not valid"
            )
        );

        let err = map_status(StatusCode::BAD_GATEWAY, "upstream exploded");
        assert_eq!(
            err,
            DomainError::external_service_error("gemini", "HTTP 502: upstream exploded")
        );
    }

    #[test]
    fn blank_keys_are_not_configured() {
        let generator = GeminiTextGenerator::new(
            Some("  ".to_string()),
            DEFAULT_BASE_URL,
            Duration::from_secs(1),
            Duration::from_secs(5),
        )
        .expect("client");
        assert!(matches!(
            generator.ensure_configured(),
            Err(DomainError::ConfigurationMissing(_))
        ));
    }
}
