//! Single-Use Request Wrapper
//!
//! A [`RequestTask`] owns one prepared but unsent call to the Billow
//! service. Sending consumes the task, so a completed task can never be
//! reused or accidentally fired twice; every task resolves to exactly one
//! outcome, with no retries. Transport statuses in the 2xx/3xx range take
//! the success path, everything else surfaces the parsed error envelope.

use std::sync::Arc;

use reqwest::{RequestBuilder, StatusCode};
use thiserror::Error;
use uuid::Uuid;

use super::envelope::Envelope;
use super::signing::{RequestSigner, HMAC_HEADER, TIMESTAMP_HEADER, TOKEN_HEADER};

/// A prepared, unsent call to the Billow service.
///
/// Built by the endpoint catalog; consumers only decide when to send.
pub struct RequestTask {
    builder: RequestBuilder,
    signer: Arc<RequestSigner>,
    token: Option<String>,
    /// Bytes covered by the request signature. Matches the transmitted body
    /// for JSON and empty-body calls; empty for multipart uploads, whose
    /// boundary-framed body is not reproducible at signing time.
    signed_body: Vec<u8>,
    request_id: Uuid,
}

impl RequestTask {
    pub(crate) fn new(builder: RequestBuilder, signer: Arc<RequestSigner>) -> Self {
        Self {
            builder,
            signer,
            token: None,
            signed_body: Vec::new(),
            request_id: Uuid::new_v4(),
        }
    }

    /// Attach the session token for an authenticated call.
    pub(crate) fn authenticated(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// Record the body bytes covered by the signature.
    pub(crate) fn signed_body(mut self, body: Vec<u8>) -> Self {
        self.signed_body = body;
        self
    }

    /// Perform the call and parse the response as an [`Envelope`].
    ///
    /// Exactly one attempt is made; retry policy, if any, belongs to the
    /// caller. A success-status body that does not parse as an envelope is
    /// a local error, not an unhandled fault.
    pub async fn send(self) -> Result<Envelope, TaskError> {
        let (status, body) = self.perform().await?;

        if is_status_valid(status) {
            serde_json::from_str(&body)
                .map_err(|e| TaskError::Malformed(format!("invalid response envelope: {}", e)))
        } else {
            let envelope = serde_json::from_str(&body).unwrap_or_else(|_| {
                Envelope::failure(format!("Request failed with status {}", status))
            });
            Err(TaskError::Remote(envelope))
        }
    }

    /// Perform the call and return the raw body, for endpoints that serve
    /// opaque text (template sources) rather than an envelope.
    pub async fn send_text(self) -> Result<String, TaskError> {
        let (status, body) = self.perform().await?;

        if is_status_valid(status) {
            Ok(body)
        } else {
            Err(TaskError::Remote(Envelope::failure(format!(
                "Request failed with status {}",
                status
            ))))
        }
    }

    async fn perform(self) -> Result<(StatusCode, String), TaskError> {
        let signature = self.signer.sign(self.token.as_deref(), &self.signed_body);

        let mut builder = self
            .builder
            .header(HMAC_HEADER, &signature.digest)
            .header(TIMESTAMP_HEADER, &signature.timestamp);
        if let Some(token) = &self.token {
            builder = builder.header(TOKEN_HEADER, token);
        }

        tracing::debug!(request_id = %self.request_id, "Sending request");

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        tracing::debug!(
            request_id = %self.request_id,
            status = %status,
            "Request completed"
        );

        Ok((status, body))
    }
}

fn is_status_valid(status: StatusCode) -> bool {
    let code = status.as_u16();
    (200..400).contains(&code)
}

/// Failure outcome of a [`RequestTask`].
///
/// Together with the success envelope this forms the two-branch result
/// every consumer handles exhaustively; nothing escapes as a panic across
/// the async boundary.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The service answered with an error status; carries the parsed error
    /// envelope (or a synthesized one when the body was not an envelope).
    #[error("{}", .0.message)]
    Remote(Envelope),

    /// The call never completed: connection, timeout, or protocol failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response arrived but its body was not the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl TaskError {
    /// User-visible failure text, mirroring the envelope `message` contract.
    pub fn message(&self) -> String {
        match self {
            TaskError::Remote(envelope) => envelope.message.clone(),
            TaskError::Transport(e) => format!("Network error: {}", e),
            TaskError::Malformed(e) => format!("Unexpected server response: {}", e),
        }
    }
}
