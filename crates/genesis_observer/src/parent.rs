//! Remote and canned parents behind one async seam.

use async_trait::async_trait;
use genesis_core::advisory::{AdvisoryError, AdvisoryRequest};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

#[async_trait]
pub trait ParentService: Send + Sync {
    async fn ask(&self, request: &AdvisoryRequest) -> Result<String, AdvisoryError>;

    fn name(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct AskBody {
    organism: u64,
    tick: u64,
    kind: &'static str,
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct AnswerBody {
    text: String,
}

/// Accepts `{"text": "..."}` or a bare text body.
fn parse_answer(body: &str) -> Result<String, AdvisoryError> {
    if let Ok(answer) = serde_json::from_str::<AnswerBody>(body) {
        return Ok(answer.text);
    }
    if body.trim().is_empty() {
        return Err(AdvisoryError::EmptyResponse);
    }
    Ok(body.to_string())
}

/// POSTs the request summary as JSON to a parent endpoint.
///
/// Transport failures and 5xx answers are retried with exponential backoff.
/// Timeouts and 4xx answers are not.
pub struct HttpParentService {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
    retries: u32,
    backoff: Duration,
}

impl HttpParentService {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AdvisoryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AdvisoryError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
            timeout,
            retries: 2,
            backoff: Duration::from_millis(100),
        })
    }

    #[must_use]
    pub fn with_retries(mut self, retries: u32, backoff: Duration) -> Self {
        self.retries = retries;
        self.backoff = backoff;
        self
    }

    fn classify(&self, e: &reqwest::Error) -> AdvisoryError {
        if e.is_timeout() {
            AdvisoryError::Timeout(self.timeout.as_millis() as u64)
        } else {
            AdvisoryError::Transport(e.to_string())
        }
    }

    /// Returns the error and whether another attempt may help.
    async fn attempt(&self, body: &AskBody) -> Result<String, (AdvisoryError, bool)> {
        let response = self
            .client
            .post(&self.url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                let err = self.classify(&e);
                let retry = !matches!(err, AdvisoryError::Timeout(_));
                (err, retry)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err((
                AdvisoryError::Transport(format!("parent answered {status}")),
                status.is_server_error(),
            ));
        }
        let text = response
            .text()
            .await
            .map_err(|e| (self.classify(&e), false))?;
        parse_answer(&text).map_err(|e| (e, false))
    }
}

#[async_trait]
impl ParentService for HttpParentService {
    async fn ask(&self, request: &AdvisoryRequest) -> Result<String, AdvisoryError> {
        let body = AskBody {
            organism: request.organism,
            tick: request.tick,
            kind: request.kind.label(),
            prompt: request.summary(),
        };
        let mut delay = self.backoff;
        let mut attempt = 0;
        loop {
            match self.attempt(&body).await {
                Ok(text) => return Ok(text),
                Err((err, retry)) if retry && attempt < self.retries => {
                    debug!(attempt, error = %err, "Parent request failed, retrying");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err((err, _)) => {
                    warn!(url = %self.url, error = %err, "Parent request failed");
                    return Err(err);
                }
            }
        }
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Replays fixed answers in order, cycling.
#[derive(Default)]
pub struct CannedParentService {
    responses: Vec<Result<String, AdvisoryError>>,
    cursor: Mutex<usize>,
}

impl CannedParentService {
    #[must_use]
    pub fn new(responses: Vec<Result<String, AdvisoryError>>) -> Self {
        Self {
            responses,
            cursor: Mutex::new(0),
        }
    }
}

#[async_trait]
impl ParentService for CannedParentService {
    async fn ask(&self, _request: &AdvisoryRequest) -> Result<String, AdvisoryError> {
        if self.responses.is_empty() {
            return Err(AdvisoryError::EmptyResponse);
        }
        let mut cursor = self
            .cursor
            .lock()
            .map_err(|_| AdvisoryError::Unavailable)?;
        let out = self.responses[*cursor % self.responses.len()].clone();
        *cursor += 1;
        out
    }

    fn name(&self) -> &str {
        "canned"
    }
}
