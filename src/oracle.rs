use crate::config::{OracleSettings, Settings};
use serde::Deserialize;
use serde_json::json;
use std::error::Error as _;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("oracle request failed: {0}")]
    Request(String),
    #[error("oracle request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("invalid oracle response: {0}")]
    MalformedResponse(String),
    #[error("oracle returned an empty command")]
    EmptyCommand,
}

/// Maps a natural-language task description to a candidate shell command.
/// The returned text is untrusted input; the dispatcher normalizes and
/// authorizes it before anything runs.
pub trait CommandOracle {
    fn propose_command(&self, task: &str) -> Result<String, OracleError>;
}

const SYSTEM_PROMPT: &str =
    "You are an automation assistant. Generate only a single valid shell command.";

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

pub struct HttpCommandOracle {
    endpoint: String,
    model: String,
    token: String,
    timeout: Duration,
    agent: ureq::Agent,
}

impl HttpCommandOracle {
    pub fn new(oracle: &OracleSettings, token: &str) -> Self {
        let timeout = Duration::from_secs(oracle.timeout_secs);
        Self {
            endpoint: oracle.endpoint.clone(),
            model: oracle.model.clone(),
            token: token.to_string(),
            timeout,
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.oracle, &settings.oracle_token)
    }

    fn classify(&self, err: ureq::Error) -> OracleError {
        match err {
            ureq::Error::Status(code, _) => {
                OracleError::Request(format!("oracle endpoint returned status {code}"))
            }
            ureq::Error::Transport(transport) => {
                let mut cause: Option<&(dyn std::error::Error + 'static)> = transport.source();
                while let Some(err) = cause {
                    if let Some(io) = err.downcast_ref::<std::io::Error>() {
                        if matches!(
                            io.kind(),
                            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
                        ) {
                            return OracleError::Timeout {
                                timeout_ms: self.timeout.as_millis() as u64,
                            };
                        }
                    }
                    cause = err.source();
                }
                OracleError::Request(transport.to_string())
            }
        }
    }
}

impl CommandOracle for HttpCommandOracle {
    fn propose_command(&self, task: &str) -> Result<String, OracleError> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": task},
            ],
        });

        let response = self
            .agent
            .post(&self.endpoint)
            .set("Authorization", &format!("Bearer {}", self.token))
            .send_json(body)
            .map_err(|err| self.classify(err))?;

        let completion: ChatCompletion = response
            .into_json()
            .map_err(|err| OracleError::MalformedResponse(err.to_string()))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| OracleError::MalformedResponse("response has no choices".to_string()))?;

        let command = choice.message.content.trim().to_string();
        if command.is_empty() {
            return Err(OracleError::EmptyCommand);
        }
        Ok(command)
    }
}

/// Strips a fenced-block wrapper from oracle output. Only a true leading
/// and trailing marker-line pair is removed (the opening fence may carry a
/// language tag); embedded fence-like text and single-line fences pass
/// through untouched.
pub fn strip_fence_wrapper(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") || !trimmed.ends_with("```") {
        return trimmed.to_string();
    }
    let lines: Vec<&str> = trimmed.lines().collect();
    if lines.len() < 2 {
        return trimmed.to_string();
    }
    lines[1..lines.len() - 1].join("\n").trim().to_string()
}
