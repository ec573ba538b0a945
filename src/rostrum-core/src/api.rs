//! Backend REST client.
//!
//! Everything the engine asks of the debate backend goes through the
//! [`DebateApi`] trait, so session logic can run against an in-memory fake
//! in tests. [`BackendClient`] is the real implementation: JSON over HTTP
//! under an `/api/v1` prefix, every payload wrapped in a `{ "data": ... }`
//! envelope.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::adjudication::{Adjudication, UploadRequest, UploadedAdjudication};
use crate::config::Config;
use crate::error::{DebateError, Result};
use crate::session::{CreateDebateRequest, DebateSession, SessionPatch};

/// The backend surface the engine depends on.
#[async_trait]
pub trait DebateApi: Send + Sync {
    /// `POST /debates`
    async fn create_debate(&self, request: &CreateDebateRequest) -> Result<DebateSession>;

    /// `GET /debates/{id}`
    async fn fetch_debate(&self, id: &str) -> Result<DebateSession>;

    /// `PUT /debates/{id}`, a partial merge into the stored document.
    async fn update_debate(&self, id: &str, patch: &SessionPatch) -> Result<()>;

    /// `POST /debates/generate-speech`: the backend writes the next speech
    /// for an AI speaker.
    async fn generate_speech(&self, session_id: &str, speaker_role: &str) -> Result<String>;

    /// `POST /adjudications`
    async fn create_adjudication(&self, session_id: &str) -> Result<Adjudication>;

    /// `GET /adjudications/{id}`
    async fn fetch_adjudication(&self, id: &str) -> Result<Adjudication>;

    /// `POST /adjudications/upload` (multipart)
    async fn upload_adjudication(&self, request: &UploadRequest) -> Result<UploadedAdjudication>;
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct SpeechText {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// HTTP client for the debate backend.
pub struct BackendClient {
    http: reqwest::Client,
    base: String,
}

impl BackendClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base: config.api_base(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(DebateError::Api {
                status: status.as_u16(),
                message: error_message(&body, &status),
            });
        }
        let envelope: Envelope<T> = serde_json::from_str(&body)?;
        Ok(envelope.data)
    }

    async fn expect_success(response: reqwest::Response) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(DebateError::Api {
            status: status.as_u16(),
            message: error_message(&body, &status),
        })
    }
}

/// Pulls a human-readable message out of an error body, falling back to the
/// status line.
fn error_message(body: &str, status: &reqwest::StatusCode) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed.message {
            return message;
        }
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() <= 200 {
        trimmed.to_string()
    } else {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    }
}

#[async_trait]
impl DebateApi for BackendClient {
    async fn create_debate(&self, request: &CreateDebateRequest) -> Result<DebateSession> {
        debug!(format = %request.debate_type, "creating debate session");
        let response = self
            .http
            .post(self.url("/debates"))
            .json(request)
            .send()
            .await?;
        let session: DebateSession = Self::decode(response).await?;
        session.validate()?;
        Ok(session)
    }

    async fn fetch_debate(&self, id: &str) -> Result<DebateSession> {
        debug!(id, "fetching debate session");
        let response = self
            .http
            .get(self.url(&format!("/debates/{id}")))
            .send()
            .await?;
        let session: DebateSession = Self::decode(response).await?;
        session.validate()?;
        Ok(session)
    }

    async fn update_debate(&self, id: &str, patch: &SessionPatch) -> Result<()> {
        let response = self
            .http
            .put(self.url(&format!("/debates/{id}")))
            .json(patch)
            .send()
            .await?;
        Self::expect_success(response).await
    }

    async fn generate_speech(&self, session_id: &str, speaker_role: &str) -> Result<String> {
        debug!(session_id, speaker_role, "requesting generated speech");
        let response = self
            .http
            .post(self.url("/debates/generate-speech"))
            .json(&serde_json::json!({
                "sessionId": session_id,
                "speakerRole": speaker_role,
            }))
            .send()
            .await?;
        let speech: SpeechText = Self::decode(response).await?;
        Ok(speech.text)
    }

    async fn create_adjudication(&self, session_id: &str) -> Result<Adjudication> {
        debug!(session_id, "requesting adjudication");
        let response = self
            .http
            .post(self.url("/adjudications"))
            .json(&serde_json::json!({ "sessionId": session_id }))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn fetch_adjudication(&self, id: &str) -> Result<Adjudication> {
        let response = self
            .http
            .get(self.url(&format!("/adjudications/{id}")))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn upload_adjudication(&self, request: &UploadRequest) -> Result<UploadedAdjudication> {
        request.validate()?;
        let bytes = tokio::fs::read(&request.file).await?;
        let part = multipart::Part::bytes(bytes)
            .file_name(request.file_name())
            .mime_str(request.mime_type())?;
        let mut form = multipart::Form::new()
            .part("transcript", part)
            .text("formatName", request.format_name.clone());
        if let Some(motion) = &request.motion {
            form = form.text("motion", motion.clone());
        }
        if let Some(teams) = request.teams_json() {
            form = form.text("teams", teams);
        }
        debug!(file = %request.file.display(), "uploading transcript for adjudication");
        let response = self
            .http
            .post(self.url("/adjudications/upload"))
            .multipart(form)
            .send()
            .await?;
        Self::decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_prefix() {
        let client = BackendClient::new(&Config::default()).unwrap();
        assert_eq!(
            client.url("/debates/abc"),
            "http://localhost:3000/api/v1/debates/abc"
        );
    }

    #[test]
    fn test_envelope_unwraps_payload() {
        let body = r#"{ "data": { "text": "Honourable members..." } }"#;
        let envelope: Envelope<SpeechText> = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.data.text, "Honourable members...");
    }

    #[test]
    fn test_error_message_prefers_body_message() {
        let status = reqwest::StatusCode::BAD_REQUEST;
        assert_eq!(
            error_message(r#"{"message":"missing motion"}"#, &status),
            "missing motion"
        );
        assert_eq!(error_message("plain failure text", &status), "plain failure text");
        assert_eq!(error_message("", &status), "Bad Request");
    }
}
