#[cfg(test)]
#[path = "openai_test.rs"]
mod tests;

use async_trait::async_trait;
use futures::stream;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use tokio_util::sync::CancellationToken;

use super::event_stream;
use super::event_stream::Decoded;
use crate::domain::models::Backend;
use crate::domain::models::BackendError;
use crate::domain::models::BackendName;
use crate::domain::models::ChatRequest;
use crate::domain::models::FragmentStream;
use crate::domain::models::Message;

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct MessageRequest {
    role: String,
    content: String,
}

impl From<&Message> for MessageRequest {
    fn from(message: &Message) -> MessageRequest {
        return MessageRequest {
            role: message.role.to_string(),
            content: message.content.to_string(),
        };
    }
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CompletionRequest {
    model: String,
    temperature: f64,
    messages: Vec<MessageRequest>,
    stream: bool,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionDeltaResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionChoiceResponse {
    #[serde(default)]
    delta: CompletionDeltaResponse,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ErrorResponse {
    message: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoiceResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<ErrorResponse>,
}

fn decode(data: &str) -> Result<Decoded, BackendError> {
    if data == "[DONE]" {
        return Ok(Decoded::Done);
    }

    let ores: CompletionResponse = serde_json::from_str(data)?;
    tracing::debug!(body = ?ores, "Completion response");

    if let Some(err) = ores.error {
        return Err(BackendError::Provider {
            backend: BackendName::OpenAI,
            message: err.message,
        });
    }

    let text = ores
        .choices
        .into_iter()
        .next()
        .and_then(|choice| return choice.delta.content)
        .unwrap_or_default();

    if text.is_empty() {
        return Ok(Decoded::Skip);
    }

    return Ok(Decoded::Fragment(text));
}

/// OpenAI style chat completions, where the conversation is passed through
/// as a list of role tagged messages.
pub struct OpenAI {
    url: String,
    token: String,
}

impl OpenAI {
    pub fn new(url: &str, token: &str) -> OpenAI {
        return OpenAI {
            url: url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        };
    }
}

#[async_trait]
impl Backend for OpenAI {
    fn name(&self) -> BackendName {
        return BackendName::OpenAI;
    }

    #[allow(clippy::implicit_return)]
    async fn chat(
        &self,
        request: ChatRequest,
        cancel: CancellationToken,
    ) -> Result<FragmentStream, BackendError> {
        if self.token.trim().is_empty() {
            return Err(BackendError::Authentication {
                backend: self.name(),
            });
        }

        let req = CompletionRequest {
            model: request.model,
            temperature: request.temperature,
            messages: request.messages.iter().map(MessageRequest::from).collect(),
            stream: true,
        };

        tracing::debug!(
            model = req.model,
            temperature = req.temperature,
            messages = req.messages.len(),
            "Requesting OpenAI completion"
        );

        let builder = reqwest::Client::new()
            .post(format!("{url}/v1/chat/completions", url = self.url))
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&req);

        let res = match event_stream::send(self.name(), builder, &cancel).await? {
            Some(res) => res,
            None => return Ok(Box::pin(stream::empty())),
        };

        return Ok(event_stream::fragments(res, cancel, decode));
    }
}
