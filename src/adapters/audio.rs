use super::{guard_path, io_error, require_existing, AdapterError};
use crate::config::Settings;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Speech-to-text seam. The HTTP implementation below talks to the
/// configured transcription endpoint; tests substitute their own.
pub trait Transcriber {
    fn transcribe(&self, audio: &[u8]) -> Result<String, AdapterError>;
}

#[derive(Debug, Clone, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

pub struct HttpTranscriber {
    endpoint: String,
    token: String,
    agent: ureq::Agent,
}

impl HttpTranscriber {
    pub fn new(endpoint: &str, token: &str, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            token: token.to_string(),
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            &settings.oracle.transcription_endpoint,
            &settings.oracle_token,
            Duration::from_secs(settings.oracle.timeout_secs),
        )
    }
}

impl Transcriber for HttpTranscriber {
    fn transcribe(&self, audio: &[u8]) -> Result<String, AdapterError> {
        let response = self
            .agent
            .post(&self.endpoint)
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Content-Type", "application/octet-stream")
            .send_bytes(audio)
            .map_err(|err| AdapterError::Audio {
                reason: err.to_string(),
            })?;

        let parsed: TranscriptionResponse =
            response.into_json().map_err(|err| AdapterError::Audio {
                reason: err.to_string(),
            })?;
        Ok(parsed.text.trim().to_string())
    }
}

pub fn transcribe_file(
    settings: &Settings,
    transcriber: &dyn Transcriber,
    audio_path: &str,
) -> Result<String, AdapterError> {
    let authorized = guard_path(settings, Path::new(audio_path))?;
    require_existing(&authorized)?;
    let audio =
        fs::read(authorized.as_path()).map_err(|source| io_error(authorized.as_path(), source))?;
    transcriber.transcribe(&audio)
}
