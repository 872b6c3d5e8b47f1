use std::time::Duration;

use serde::{Deserialize, Serialize};

use vigil_core::{ModelConfig, VigilError};

/// A message in a chat conversation with the model.
///
/// # Examples
///
/// ```
/// use vigil_review::llm::{ChatMessage, Role};
///
/// let msg = ChatMessage {
///     role: Role::User,
///     content: "Review this code".into(),
/// };
/// assert!(matches!(msg.role, Role::User));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: Role,
    /// Text content of the message.
    pub content: String,
}

/// Role in the chat conversation.
///
/// # Examples
///
/// ```
/// use vigil_review::llm::Role;
///
/// let role = Role::System;
/// assert_eq!(serde_json::to_string(&role).unwrap(), "\"system\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System-level instructions.
    System,
    /// User input.
    User,
    /// Assistant response.
    Assistant,
}

/// OpenAI-compatible chat completions client.
///
/// Works with any provider that exposes the `/v1/chat/completions` endpoint.
///
/// # Examples
///
/// ```
/// use vigil_core::ModelConfig;
/// use vigil_review::llm::LlmClient;
///
/// let config = ModelConfig {
///     api_key: Some("test-key".into()),
///     ..ModelConfig::default()
/// };
/// let client = LlmClient::new(&config).unwrap();
/// ```
pub struct LlmClient {
    client: reqwest::Client,
    config: ModelConfig,
}

impl LlmClient {
    /// Create a new chat client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::Model`] if the HTTP client cannot be built.
    pub fn new(config: &ModelConfig) -> Result<Self, VigilError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| VigilError::Model(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Return the model name from the configuration.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send a chat completion request and return the text response.
    ///
    /// Builds a request to `{base_url}/v1/chat/completions` with the given
    /// messages and a low temperature.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::Model`] on HTTP errors or response parsing
    /// failures.
    pub async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, VigilError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": 0.2,
        });

        let mut request = self.client.post(&url);
        if let Some(api_key) = &self.config.api_key {
            request = request.header("Authorization", format!("Bearer {api_key}"));
        }
        request = request.header("Content-Type", "application/json");

        let response = request
            .json(&body)
            .send()
            .await
            .map_err(|e| VigilError::Model(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(VigilError::Model(format!(
                "chat API error {status}: {body_text}"
            )));
        }

        let response_body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| VigilError::Model(format!("failed to parse response: {e}")))?;

        let content = response_body
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| {
                VigilError::Model(format!("unexpected response structure: {response_body}"))
            })?;

        Ok(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_construction_succeeds() {
        let config = ModelConfig::default();
        let client = LlmClient::new(&config);
        assert!(client.is_ok());
    }

    #[test]
    fn model_returns_config_model() {
        let config = ModelConfig {
            model: "gpt-4o".into(),
            ..ModelConfig::default()
        };
        let client = LlmClient::new(&config).unwrap();
        assert_eq!(client.model(), "gpt-4o");
    }

    #[test]
    fn chat_message_serializes() {
        let msg = ChatMessage {
            role: Role::System,
            content: "hello".into(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "hello");
    }

    #[tokio::test]
    async fn chat_returns_message_content() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "choices": [{"message": {"content": "Looks fine to me."}}],
                })
                .to_string(),
            )
            .create_async()
            .await;

        let config = ModelConfig {
            base_url: server.url(),
            api_key: Some("test-key".into()),
            ..ModelConfig::default()
        };
        let client = LlmClient::new(&config).unwrap();
        let reply = client
            .chat(vec![ChatMessage {
                role: Role::User,
                content: "review".into(),
            }])
            .await
            .unwrap();
        assert_eq!(reply, "Looks fine to me.");
    }

    #[tokio::test]
    async fn chat_surfaces_api_errors() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(500)
            .with_body("upstream exploded")
            .create_async()
            .await;

        let config = ModelConfig {
            base_url: server.url(),
            ..ModelConfig::default()
        };
        let client = LlmClient::new(&config).unwrap();
        let result = client
            .chat(vec![ChatMessage {
                role: Role::User,
                content: "review".into(),
            }])
            .await;
        assert!(matches!(result, Err(VigilError::Model(_))));
    }
}
