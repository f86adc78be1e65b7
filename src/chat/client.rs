//! One-shot chat-completions client.
//!
//! Sends the full conversation to the configured endpoint and extracts the
//! assistant's reply. Deliberately minimal: one request, one parse, one
//! result or one failure — no retries, no streaming. The request timeout is
//! enforced by the HTTP agent; cancellation is cooperative (the token is
//! checked when the transport returns, and the panel drops stale
//! completions by sequence number).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::ChatMessage;

/// Failures surfaced by [`ChatClient::complete`]. Each variant's `Display`
/// is the human-readable message the panel shows inline.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Send attempted with no credential. Prevented at the UI boundary
    /// (send disabled) and re-checked here before any transport use.
    #[error("no API key configured; enter one in the assistant panel")]
    MissingCredential,

    /// The backend answered with a non-success HTTP status.
    #[error("chat backend returned {status} {status_text}: {body}")]
    Backend {
        status: u16,
        status_text: String,
        body: String,
    },

    /// A success response without usable message content.
    #[error("chat backend response had no message content")]
    MalformedResponse,

    /// Transport-level failure (unreachable host, TLS, ...).
    #[error("chat request failed: {0}")]
    Network(String),

    /// The configured request timeout elapsed.
    #[error("chat request timed out")]
    Timeout,

    /// The request was abandoned by the user before it completed.
    #[error("chat request cancelled")]
    Cancelled,
}

/// Cooperative cancellation flag shared between the panel and the worker
/// running a request.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: Option<CompletionMessage>,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Blocking chat-completions client bound to one endpoint and model.
pub struct ChatClient {
    endpoint: String,
    model: String,
    agent: ureq::Agent,
}

impl ChatClient {
    /// Build a client. A `timeout_secs` of zero disables the deadline.
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, timeout_secs: u64) -> Self {
        let timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            agent: crate::http::agent(timeout),
        }
    }

    /// Send the conversation and return the assistant's reply text.
    ///
    /// The conversation is replayed verbatim, in order, so the backend sees
    /// full history on every call.
    pub fn complete(
        &self,
        credential: &str,
        messages: &[ChatMessage],
        cancel: &CancelToken,
    ) -> Result<String, ChatError> {
        if credential.trim().is_empty() {
            return Err(ChatError::MissingCredential);
        }

        let request = CompletionRequest {
            model: &self.model,
            messages,
            stream: false,
        };
        let payload =
            serde_json::to_vec(&request).map_err(|e| ChatError::Network(e.to_string()))?;

        log::debug!(
            "POST {} ({} message(s), model {})",
            self.endpoint,
            messages.len(),
            self.model
        );

        let result = self
            .agent
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("Authorization", &format!("Bearer {credential}"))
            .send(&payload[..]);

        if cancel.is_cancelled() {
            return Err(ChatError::Cancelled);
        }

        let mut response = match result {
            Ok(response) => response,
            Err(ureq::Error::Timeout(_)) => return Err(ChatError::Timeout),
            Err(e) => return Err(ChatError::Network(e.to_string())),
        };

        let status = response.status();
        let body = match response.body_mut().read_to_string() {
            Ok(body) => body,
            // Reading an error response's body is best-effort; losing it
            // must not mask the status we already have.
            Err(_) if !status.is_success() => String::new(),
            Err(e) => return Err(ChatError::Network(format!("failed to read response: {e}"))),
        };

        parse_reply(
            status.as_u16(),
            status.canonical_reason().unwrap_or(""),
            &body,
        )
    }
}

/// Turn a raw HTTP outcome into the reply text or a typed failure.
///
/// Pure so the taxonomy is testable without a transport.
pub(crate) fn parse_reply(status: u16, status_text: &str, body: &str) -> Result<String, ChatError> {
    if !(200..300).contains(&status) {
        return Err(ChatError::Backend {
            status,
            status_text: status_text.to_string(),
            body: body.to_string(),
        });
    }

    let parsed: CompletionResponse =
        serde_json::from_str(body).map_err(|_| ChatError::MalformedResponse)?;

    match parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
    {
        Some(content) if !content.is_empty() => Ok(content),
        _ => Err(ChatError::MalformedResponse),
    }
}
