#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio_util::sync::CancellationToken;

use super::Message;

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    EnumVariantNames,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BackendName {
    OpenAI,
    Anthropic,
}

impl BackendName {
    pub fn parse(text: &str) -> Option<BackendName> {
        return BackendName::iter().find(|e| return e.to_string() == text);
    }

    /// Human readable name used in user facing messages.
    pub fn label(&self) -> &'static str {
        match self {
            BackendName::OpenAI => return "OpenAI",
            BackendName::Anthropic => return "Anthropic",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("{} rejected the API key", .backend.label())]
    Authentication { backend: BackendName },
    #[error("{} responded with status {status}: {body}", .backend.label())]
    Status {
        backend: BackendName,
        status: u16,
        body: String,
    },
    #[error("{} reported an error: {message}", .backend.label())]
    Provider {
        backend: BackendName,
        message: String,
    },
    #[error("Request to the backend failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Failed to read the response stream: {0}")]
    Stream(#[from] std::io::Error),
    #[error("Failed to decode a response event: {0}")]
    Decode(#[from] serde_json::Error),
}

impl BackendError {
    pub fn is_authentication(&self) -> bool {
        return matches!(self, BackendError::Authentication { .. });
    }

    /// Maps an unsuccessful HTTP status to an error, keeping credential
    /// failures distinct from everything else.
    pub fn from_status(backend: BackendName, status: u16, body: String) -> BackendError {
        if status == 401 || status == 403 {
            return BackendError::Authentication { backend };
        }

        return BackendError::Status {
            backend,
            status,
            body,
        };
    }
}

/// Incremental pieces of the assistant's reply in the order the provider
/// emitted them. The stream is finite and can't be restarted.
pub type FragmentStream = BoxStream<'static, Result<String, BackendError>>;

#[derive(Clone, Debug, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub temperature: f64,
    pub messages: Vec<Message>,
}

#[async_trait]
pub trait Backend {
    fn name(&self) -> BackendName;

    /// Starts a completion for the full conversation history.
    ///
    /// Credential problems are reported as `BackendError::Authentication`
    /// before any fragment is produced. Once `cancel` is triggered the
    /// request is dropped and the stream ends without yielding anything else.
    async fn chat(
        &self,
        request: ChatRequest,
        cancel: CancellationToken,
    ) -> Result<FragmentStream, BackendError>;
}

pub type BackendBox = Box<dyn Backend + Send + Sync>;
