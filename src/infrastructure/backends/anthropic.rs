#[cfg(test)]
#[path = "anthropic_test.rs"]
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
use crate::domain::models::Role;

pub const HUMAN_PROMPT: &str = "\n\nHuman:";
pub const AI_PROMPT: &str = "\n\nAssistant:";
const MAX_TOKENS_TO_SAMPLE: u32 = 300;
const API_VERSION: &str = "2023-06-01";

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CompletionRequest {
    model: String,
    prompt: String,
    temperature: f64,
    max_tokens_to_sample: u32,
    stream: bool,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionResponse {
    #[serde(rename = "type", default)]
    _type: String,
    #[serde(default)]
    completion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stop_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<ErrorDetail>,
}

fn role_marker(role: Role) -> &'static str {
    match role {
        Role::User | Role::System => return HUMAN_PROMPT,
        Role::Assistant => return AI_PROMPT,
    }
}

/// Flattens a conversation into the alternating turn prompt the completions
/// API expects, ending on the assistant marker so the model continues from
/// there.
pub fn messages_to_prompt(messages: &[Message]) -> String {
    let mut prompt = messages
        .iter()
        .map(|message| {
            return format!("{} {}", role_marker(message.role), message.content);
        })
        .collect::<Vec<String>>()
        .join("");

    prompt += AI_PROMPT;
    return prompt;
}

fn decode(data: &str) -> Result<Decoded, BackendError> {
    if data == "[DONE]" {
        return Ok(Decoded::Done);
    }

    let ores: CompletionResponse = serde_json::from_str(data)?;
    tracing::debug!(body = ?ores, "Completion response");

    match ores._type.as_str() {
        "error" => {
            let message = ores
                .error
                .map(|err| return err.message)
                .unwrap_or_else(|| return "Unknown error".to_string());

            return Err(BackendError::Provider {
                backend: BackendName::Anthropic,
                message,
            });
        }
        "completion" => {
            if !ores.completion.is_empty() {
                return Ok(Decoded::Fragment(ores.completion));
            }
            if ores.stop_reason.is_some() {
                return Ok(Decoded::Done);
            }

            return Ok(Decoded::Skip);
        }
        "message_stop" => {
            return Ok(Decoded::Done);
        }
        _ => {
            return Ok(Decoded::Skip);
        }
    }
}

/// Anthropic style text completions, where the conversation is sent as one
/// flattened prompt.
pub struct Anthropic {
    url: String,
    token: String,
}

impl Anthropic {
    pub fn new(url: &str, token: &str) -> Anthropic {
        return Anthropic {
            url: url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        };
    }
}

#[async_trait]
impl Backend for Anthropic {
    fn name(&self) -> BackendName {
        return BackendName::Anthropic;
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
            prompt: messages_to_prompt(&request.messages),
            temperature: request.temperature,
            max_tokens_to_sample: MAX_TOKENS_TO_SAMPLE,
            stream: true,
        };

        tracing::debug!(
            model = req.model,
            temperature = req.temperature,
            prompt_length = req.prompt.len(),
            "Requesting Anthropic completion"
        );

        let builder = reqwest::Client::new()
            .post(format!("{url}/v1/complete", url = self.url))
            .header("x-api-key", &self.token)
            .header("content-type", "application/json")
            .header("anthropic-version", API_VERSION)
            .json(&req);

        let res = match event_stream::send(self.name(), builder, &cancel).await? {
            Some(res) => res,
            None => return Ok(Box::pin(stream::empty())),
        };

        return Ok(event_stream::fragments(res, cancel, decode));
    }
}
