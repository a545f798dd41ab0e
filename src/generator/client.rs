use std::time::Duration;

use serde_json::{Value, json};

use crate::config::Config;
use crate::generator::{GenerationError, TextService};

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    endpoint: String,
    #[cfg(feature = "network")]
    http: reqwest::blocking::Client,
}

impl GeminiClient {
    pub fn new(api_base_url: &str, model: &str, timeout: Duration) -> Result<Self, GenerationError> {
        let endpoint = format!(
            "{}/models/{}:generateContent",
            api_base_url.trim_end_matches('/'),
            model
        );
        #[cfg(feature = "network")]
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Transport(e.to_string()))?;
        #[cfg(not(feature = "network"))]
        let _ = timeout;

        Ok(Self {
            endpoint,
            #[cfg(feature = "network")]
            http,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, GenerationError> {
        Self::new(
            &config.api_base_url,
            &config.model,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

pub fn request_body(prompt: &str, json_response: bool) -> Value {
    let mut body = json!({
        "contents": [{ "parts": [{ "text": prompt }] }]
    });
    if json_response {
        body["generationConfig"] = json!({ "responseMimeType": "application/json" });
    }
    body
}

#[cfg(feature = "network")]
impl TextService for GeminiClient {
    fn complete(
        &self,
        prompt: &str,
        json_response: bool,
        credential: &str,
    ) -> Result<String, GenerationError> {
        let response = self
            .http
            .post(&self.endpoint)
            .query(&[("key", credential)])
            .json(&request_body(prompt, json_response))
            .send()
            .map_err(|e| GenerationError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::Status(status.as_u16()));
        }

        let body: Value = response
            .json()
            .map_err(|e| GenerationError::Format(format!("response body: {e}")))?;
        super::payload::extract_text(&body)
    }
}

#[cfg(not(feature = "network"))]
impl TextService for GeminiClient {
    fn complete(
        &self,
        _prompt: &str,
        _json_response: bool,
        _credential: &str,
    ) -> Result<String, GenerationError> {
        Err(GenerationError::Transport(
            "built without network support".to_string(),
        ))
    }
}
