use std::time::Duration;

use serde::Deserialize;

use vigil_core::{ModelConfig, VigilError};

/// Client for a HuggingFace-style text classification endpoint.
///
/// Sends `{"inputs": "..."}` to `{base_url}/models/{model}` and picks the
/// top-scoring label from the response.
pub struct ClassifierClient {
    client: reqwest::Client,
    config: ModelConfig,
}

#[derive(Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

impl ClassifierClient {
    /// Create a new classifier client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::Model`] if the HTTP client cannot be built.
    pub fn new(config: &ModelConfig) -> Result<Self, VigilError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| VigilError::Model(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Classify `text` and return the winning class index.
    ///
    /// Only a bounded prefix (`max_input_chars`) of the text is submitted.
    /// Labels like `LABEL_1` map to index 1; labels without a trailing
    /// index map to 0.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::Model`] on HTTP errors, non-success statuses,
    /// or an empty/unparseable response.
    pub async fn classify(&self, text: &str) -> Result<usize, VigilError> {
        let url = format!(
            "{}/models/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );
        let input = bounded_prefix(text, self.config.max_input_chars);

        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json");
        if let Some(api_key) = &self.config.api_key {
            request = request.header("Authorization", format!("Bearer {api_key}"));
        }

        let response = request
            .json(&serde_json::json!({ "inputs": input }))
            .send()
            .await
            .map_err(|e| VigilError::Model(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VigilError::Model(format!(
                "classification API error {status}: {body}"
            )));
        }

        let scores: Vec<Vec<LabelScore>> = response
            .json()
            .await
            .map_err(|e| VigilError::Model(format!("failed to parse response: {e}")))?;

        let best = scores
            .first()
            .and_then(|batch| {
                batch
                    .iter()
                    .max_by(|a, b| a.score.total_cmp(&b.score))
            })
            .ok_or_else(|| VigilError::Model("empty classification response".into()))?;

        Ok(label_index(&best.label))
    }
}

fn label_index(label: &str) -> usize {
    label
        .rsplit(['_', '-'])
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}

fn bounded_prefix(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
