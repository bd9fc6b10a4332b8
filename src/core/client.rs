use crate::core::extract::extract_json_block;
use crate::core::formatter::format_message;
use crate::core::prompt;
use crate::domain::model::{CourseEntry, RecommendationResult};
use crate::domain::ports::{ConfigProvider, Recommender};
use crate::utils::error::{AdvisorError, ErrorSeverity, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://router.huggingface.co/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "Qwen/Qwen2.5-72B-Instruct";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const MAX_TOKENS: u32 = 1024;
const TEMPERATURE: f64 = 0.1;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f64,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// One-shot advisory client: prompt, one POST, parse, format.
///
/// Holds no mutable state, so a single instance (or clones of it) can serve
/// concurrent calls.
#[derive(Clone)]
pub struct RecommendationClient {
    client: Client,
    endpoint: String,
    model: String,
    timeout: Duration,
    token: Option<String>,
    catalog: Arc<[CourseEntry]>,
}

impl RecommendationClient {
    pub fn new<C: ConfigProvider>(
        config: &C,
        token: Option<String>,
        catalog: Vec<CourseEntry>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AdvisorError::UnexpectedFailure {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint().to_string(),
            model: config.model().to_string(),
            timeout: config.timeout(),
            token,
            catalog: catalog.into(),
        })
    }

    pub fn catalog(&self) -> &[CourseEntry] {
        &self.catalog
    }

    /// Never fails: any error becomes `(None, message)` with a message fit
    /// for the end user. Diagnostics go to the log.
    pub async fn run(&self, user_chat_history: &str) -> (Option<RecommendationResult>, String) {
        match self.try_run(user_chat_history).await {
            Ok((result, message)) => (Some(result), message),
            Err(e) => {
                if e.severity() >= ErrorSeverity::High {
                    tracing::error!(
                        "Recommendation failed: {} (Category: {:?}, Severity: {:?})",
                        e,
                        e.category(),
                        e.severity()
                    );
                } else {
                    tracing::warn!("Recommendation failed: {} (Category: {:?})", e, e.category());
                }
                (None, e.user_friendly_message())
            }
        }
    }

    /// Same pipeline as [`run`](Self::run) with the error kept typed.
    pub async fn try_run(
        &self,
        user_chat_history: &str,
    ) -> Result<(RecommendationResult, String)> {
        let token = self
            .token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or(AdvisorError::MissingCredentials)?;

        let user_prompt = prompt::user_prompt(user_chat_history, &self.catalog).map_err(|e| {
            AdvisorError::UnexpectedFailure {
                message: format!("could not build prompt: {}", e),
            }
        })?;

        tracing::info!(
            "Requesting recommendations ({} chars of chat, {} courses)",
            user_chat_history.len(),
            self.catalog.len()
        );

        let content = self
            .complete(token, prompt::system_prompt(), &user_prompt)
            .await?;
        let result = parse_reply(&content)?;

        let unknown = result.unknown_ids(&self.catalog);
        if !unknown.is_empty() {
            tracing::warn!("Model recommended ids not in catalog: {:?}", unknown);
        }

        tracing::info!(
            "Received {} recommendation(s)",
            result.recommendations().len()
        );

        let message = format_message(&result);
        Ok((result, message))
    }

    async fn complete(&self, token: &str, system: &str, user: &str) -> Result<String> {
        let request_body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            stream: false,
        };

        tracing::debug!("POST {} (model {})", self.endpoint, self.model);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        tracing::debug!("Completion response status: {}", status);

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Endpoint returned {}: {}", status, body);
            return Err(AdvisorError::AuthFailure {
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Endpoint returned {}: {}", status, body);
            return Err(AdvisorError::RequestFailure {
                status: Some(status.as_u16()),
                message: format!("endpoint returned {}", status),
            });
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        let envelope: ChatResponse =
            serde_json::from_str(&body).map_err(|e| AdvisorError::UnexpectedFailure {
                message: format!("completion response not understood: {}", e),
            })?;

        envelope
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AdvisorError::UnexpectedFailure {
                message: "completion response has no message content".to_string(),
            })
    }

    fn transport_error(&self, e: reqwest::Error) -> AdvisorError {
        if e.is_timeout() {
            AdvisorError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else {
            AdvisorError::RequestFailure {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl Recommender for RecommendationClient {
    async fn recommend(&self, user_chat_history: &str) -> (Option<RecommendationResult>, String) {
        self.run(user_chat_history).await
    }
}

/// Extracts the JSON block from a model reply and decodes it. The top level
/// must be an object; everything below it is decoded leniently.
pub fn parse_reply(content: &str) -> Result<RecommendationResult> {
    let block = extract_json_block(content);

    let value: serde_json::Value =
        serde_json::from_str(block).map_err(|e| AdvisorError::MalformedReply {
            reason: e.to_string(),
        })?;

    if !value.is_object() {
        return Err(AdvisorError::MalformedReply {
            reason: "top-level value is not an object".to_string(),
        });
    }

    serde_json::from_value(value).map_err(|e| AdvisorError::MalformedReply {
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    struct MockConfig {
        endpoint: String,
        timeout: Duration,
    }

    impl MockConfig {
        fn new(endpoint: String) -> Self {
            Self {
                endpoint,
                timeout: Duration::from_secs(5),
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn endpoint(&self) -> &str {
            &self.endpoint
        }

        fn model(&self) -> &str {
            "test-model"
        }

        fn timeout(&self) -> Duration {
            self.timeout
        }
    }

    fn catalog() -> Vec<CourseEntry> {
        serde_json::from_value(json!([
            {"id": "C001", "title": "Emotional First Aid", "description": "Basics"},
            {"id": "C002", "title": "Understanding Your Emotions", "description": "Emotions"}
        ]))
        .unwrap()
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({"choices": [{"message": {"role": "assistant", "content": content}}]})
    }

    #[test]
    fn test_parse_reply_fenced_equals_bare() {
        let inner = r#"{"generated_persona":{"expressed_feelings":["sad"]},"recommendations":[{"id":"C002","title":"Understanding Your Emotions","reason":"grief"}]}"#;
        let fenced = format!("Sure!\n```json\n{}\n```", inner);

        assert_eq!(parse_reply(&fenced).unwrap(), parse_reply(inner).unwrap());
    }

    #[test]
    fn test_parse_reply_generic_fence() {
        let reply = "```\n{\"recommendations\": []}\n```";
        let result = parse_reply(reply).unwrap();
        assert!(result.recommendations().is_empty());
    }

    #[test]
    fn test_parse_reply_rejects_invalid_json() {
        let err = parse_reply("I think you should take C001.").unwrap_err();
        assert!(matches!(err, AdvisorError::MalformedReply { .. }));
    }

    #[test]
    fn test_parse_reply_rejects_non_object() {
        let err = parse_reply("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, AdvisorError::MalformedReply { .. }));
    }

    #[tokio::test]
    async fn test_request_shape() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("Authorization", "Bearer secret-token")
                .json_body_partial(
                    r#"{"model": "test-model", "max_tokens": 1024, "temperature": 0.1, "stream": false}"#,
                )
                .body_contains("\"role\":\"system\"")
                .body_contains("<user_chat>")
                .body_contains("C002");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(completion(r#"{"recommendations": []}"#));
        });

        let config = MockConfig::new(server.url("/v1/chat/completions"));
        let client =
            RecommendationClient::new(&config, Some("secret-token".to_string()), catalog())
                .unwrap();

        let (data, message) = client.run("I can't sleep").await;

        api_mock.assert();
        assert!(data.is_some());
        assert_eq!(message, crate::core::formatter::NO_RECOMMENDATIONS_MESSAGE);
    }

    #[tokio::test]
    async fn test_blank_token_is_missing_credentials() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST);
            then.status(200);
        });

        let config = MockConfig::new(server.url("/"));
        let client = RecommendationClient::new(&config, Some("  ".to_string()), catalog()).unwrap();

        let err = client.try_run("hello").await.unwrap_err();

        assert!(matches!(err, AdvisorError::MissingCredentials));
        api_mock.assert_hits(0);
    }

    #[tokio::test]
    async fn test_missing_content_is_unexpected_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(200).json_body(json!({"choices": []}));
        });

        let config = MockConfig::new(server.url("/"));
        let client =
            RecommendationClient::new(&config, Some("t".to_string()), catalog()).unwrap();

        let err = client.try_run("hello").await.unwrap_err();
        assert!(matches!(err, AdvisorError::UnexpectedFailure { .. }));
    }

    #[tokio::test]
    async fn test_forbidden_is_auth_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(403).body("{\"error\": \"no access to model\"}");
        });

        let config = MockConfig::new(server.url("/"));
        let client =
            RecommendationClient::new(&config, Some("t".to_string()), catalog()).unwrap();

        let err = client.try_run("hello").await.unwrap_err();
        assert!(matches!(err, AdvisorError::AuthFailure { status: 403 }));
    }

    #[tokio::test]
    async fn test_unknown_ids_are_kept() {
        let server = MockServer::start();
        let reply = r#"{"recommendations": [{"id": "C404", "title": "Ghost Course", "reason": "?"}]}"#;
        server.mock(|when, then| {
            when.method(POST);
            then.status(200).json_body(completion(reply));
        });

        let config = MockConfig::new(server.url("/"));
        let client =
            RecommendationClient::new(&config, Some("t".to_string()), catalog()).unwrap();

        let (result, message) = client.try_run("hello").await.unwrap();
        assert_eq!(result.unknown_ids(client.catalog()), vec!["C404"]);
        assert!(message.contains("**1. Ghost Course**"));
    }
}
