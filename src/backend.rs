//! Network side of the widget: the request/response contract with the chat
//! endpoint and the reqwest client that speaks it.

use crate::types::Turn;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SERVER_ERROR_FALLBACK: &str = "Error from server";
pub const MALFORMED_REPLY: &str = "Malformed reply from server";

/// Why a chat request did not produce a reply.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RequestFailure {
    /// The request never completed.
    #[error("{0}")]
    Transport(String),
    /// The endpoint answered with a non-success status.
    #[error("{message}")]
    Status { status: u16, message: String },
    /// Success status, but no usable `reply` in the body.
    #[error("Malformed reply from server")]
    Malformed,
}

impl From<reqwest::Error> for RequestFailure {
    fn from(err: reqwest::Error) -> Self {
        RequestFailure::Transport(err.to_string())
    }
}

pub type ChatResult<T> = Result<T, RequestFailure>;

/// Body posted to the chat endpoint.
///
/// `history` holds the turns recorded before `message`; the new message is
/// carried only in `message`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<Turn>,
}

#[derive(Deserialize)]
struct ChatResponse {
    reply: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: Option<String>,
}

/// Anything that can turn a [`ChatRequest`] into a reply.
///
/// Futures are not required to be `Send`: the widget drives them on the UI
/// thread, and the browser fetch backend is not thread-safe.
#[async_trait(?Send)]
pub trait ChatBackend {
    async fn send(&self, request: &ChatRequest) -> ChatResult<String>;
}

#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    endpoint: String,
}

impl HttpBackend {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait(?Send)]
impl ChatBackend for HttpBackend {
    async fn send(&self, request: &ChatRequest) -> ChatResult<String> {
        let response = self.client.post(&self.endpoint).json(request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        parse_response(status, &body)
    }
}

pub(crate) fn parse_response(status: StatusCode, body: &str) -> ChatResult<String> {
    if status.is_success() {
        return serde_json::from_str::<ChatResponse>(body)
            .map(|parsed| parsed.reply)
            .map_err(|_| RequestFailure::Malformed);
    }

    let message = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|parsed| parsed.error)
        .filter(|error| !error.trim().is_empty())
        .unwrap_or_else(|| SERVER_ERROR_FALLBACK.to_string());
    Err(RequestFailure::Status {
        status: status.as_u16(),
        message,
    })
}
