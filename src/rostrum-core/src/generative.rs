//! Generative-language client.
//!
//! Sparring opponents, the rebuttal trainer and debate analysis all talk to
//! a `generateContent`-style endpoint: a prompt goes up as `contents` with
//! text parts, the reply comes back as candidate parts. Structured results
//! use the endpoint's JSON mode, where a response schema pins the shape the
//! decoder expects.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::config::GenerativeConfig;
use crate::error::{DebateError, Result};

const MAX_RETRIES: u32 = 3;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
    #[serde(rename = "responseSchema")]
    response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<TextPart>,
}

#[derive(Debug, Deserialize)]
struct TextPart {
    #[serde(default)]
    text: String,
}

/// Client for the generative endpoint.
pub struct GenerativeClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl GenerativeClient {
    pub fn new(config: &GenerativeConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            DebateError::Config(
                "generative API key not set; set GENERATIVE_API_KEY or [generative] api_key"
                    .to_string(),
            )
        })?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            api_key,
        })
    }

    /// Free-text generation, cleaned of reasoning tags and markdown noise.
    pub async fn generate_text(&self, prompt: &str) -> Result<String> {
        let raw = self.generate(prompt, None).await?;
        let cleaned = clean_response(&raw);
        if cleaned.is_empty() {
            return Err(DebateError::Generation(
                "model returned an empty response".to_string(),
            ));
        }
        Ok(cleaned)
    }

    /// Schema-constrained generation decoded into `T`.
    pub async fn generate_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        schema: serde_json::Value,
    ) -> Result<T> {
        let config = GenerationConfig {
            response_mime_type: "application/json",
            response_schema: schema,
        };
        let raw = self.generate(prompt, Some(config)).await?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// One prompt round trip with retry and exponential backoff.
    async fn generate(&self, prompt: &str, config: Option<GenerationConfig>) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: config,
        };

        let mut last_error = None;
        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Backoff doubles: 2s before the second attempt, 4s before the third
                tokio::time::sleep(Duration::from_secs(1 << attempt)).await;
            }

            let sent = self
                .http
                .post(&self.api_url)
                .query(&[("key", self.api_key.as_str())])
                .json(&request)
                .send()
                .await;

            match sent {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let parsed: GenerateResponse = response.json().await?;
                        if let Some(text) = first_text(&parsed) {
                            return Ok(text);
                        }
                        last_error = Some(DebateError::Generation(
                            "response contained no candidates".to_string(),
                        ));
                    } else if retryable(status) {
                        warn!(status = status.as_u16(), attempt, "generative endpoint busy, retrying");
                        last_error = Some(DebateError::Api {
                            status: status.as_u16(),
                            message: "generative endpoint unavailable".to_string(),
                        });
                    } else {
                        let message = response.text().await.unwrap_or_default();
                        return Err(DebateError::Api {
                            status: status.as_u16(),
                            message: if message.trim().is_empty() {
                                "generation request rejected".to_string()
                            } else {
                                message
                            },
                        });
                    }
                }
                Err(e) => {
                    warn!(error = %e, attempt, "generative request failed, retrying");
                    last_error = Some(DebateError::Transport(e));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            DebateError::Generation("no response after retries".to_string())
        }))
    }
}

fn retryable(status: reqwest::StatusCode) -> bool {
    status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS
}

fn first_text(response: &GenerateResponse) -> Option<String> {
    let text = &response.candidates.first()?.content.parts.first()?.text;
    if text.trim().is_empty() {
        None
    } else {
        Some(text.clone())
    }
}

/// Strips reasoning tags, leftover markup and markdown emphasis from a
/// generated speech, and collapses runs of whitespace.
fn clean_response(response: &str) -> String {
    let tags = ["thinking", "think", "reasoning", "reflection", "internal", "analysis"];

    let mut result = response.to_string();
    for tag in &tags {
        let pattern = format!(r"(?is)<{tag}[^>]*>.*?</{tag}>");
        if let Ok(re) = regex::Regex::new(&pattern) {
            result = re.replace_all(&result, "").to_string();
        }
    }
    if let Ok(orphan) = regex::Regex::new(r"</?[\w]+[^>]*>") {
        result = orphan.replace_all(&result, "").to_string();
    }
    result = result.replace('*', "");
    if let Ok(ws) = regex::Regex::new(r"\s+") {
        result = ws.replace_all(&result, " ").to_string();
    }
    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_response_strips_thinking_tags() {
        let input = "<thinking>weigh the clashes first</thinking>Members, the motion stands.";
        assert_eq!(clean_response(input), "Members, the motion stands.");
    }

    #[test]
    fn test_clean_response_strips_emphasis_and_orphans() {
        let input = "We **firmly** reject this. <note>aside</note>";
        assert_eq!(clean_response(input), "We firmly reject this. aside");
    }

    #[test]
    fn test_clean_response_collapses_whitespace() {
        let input = "First point.\n\n\nSecond   point.";
        assert_eq!(clean_response(input), "First point. Second point.");
    }

    #[test]
    fn test_request_wire_shape() {
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: "argue the motion" }],
            }],
            generation_config: Some(GenerationConfig {
                response_mime_type: "application/json",
                response_schema: serde_json::json!({ "type": "OBJECT" }),
            }),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "argue the motion");
        assert_eq!(value["generationConfig"]["responseMimeType"], "application/json");

        let bare = GenerateRequest {
            contents: vec![],
            generation_config: None,
        };
        let value = serde_json::to_value(&bare).unwrap();
        assert!(value.get("generationConfig").is_none());
    }

    #[test]
    fn test_response_first_text() {
        let parsed: GenerateResponse = serde_json::from_str(
            r#"{ "candidates": [ { "content": { "parts": [ { "text": "Point of order." } ] } } ] }"#,
        )
        .unwrap();
        assert_eq!(first_text(&parsed).as_deref(), Some("Point of order."));

        let empty: GenerateResponse = serde_json::from_str(r#"{ "candidates": [] }"#).unwrap();
        assert!(first_text(&empty).is_none());
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let result = GenerativeClient::new(&GenerativeConfig::default());
        assert!(matches!(result, Err(DebateError::Config(_))));
    }
}
