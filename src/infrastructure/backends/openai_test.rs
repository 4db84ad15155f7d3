use anyhow::Result;
use futures::stream::StreamExt;
use futures::stream::TryStreamExt;
use mockito::Matcher;
use serde_json::json;
use test_utils::sse_body;
use tokio_util::sync::CancellationToken;

use super::CompletionChoiceResponse;
use super::CompletionDeltaResponse;
use super::CompletionResponse;
use super::ErrorResponse;
use super::OpenAI;
use crate::domain::models::Backend;
use crate::domain::models::BackendError;
use crate::domain::models::ChatRequest;
use crate::domain::models::Message;
use crate::domain::models::Role;

fn chunk(content: &str) -> Result<String> {
    return Ok(serde_json::to_string(&CompletionResponse {
        choices: vec![CompletionChoiceResponse {
            delta: CompletionDeltaResponse {
                content: Some(content.to_string()),
            },
        }],
        error: None,
    })?);
}

fn request() -> ChatRequest {
    return ChatRequest {
        model: "gpt-4".to_string(),
        temperature: 0.0,
        messages: vec![
            Message::new(Role::System, "Be brief"),
            Message::assistant("How may I help you?"),
            Message::user("Say hi to the world"),
        ],
    };
}

#[tokio::test]
async fn it_gets_completions() -> Result<()> {
    let body = sse_body(&[chunk("Hello ")?, chunk("World")?, "[DONE]".to_string()]);

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("Authorization", "Bearer abc")
        .match_body(Matcher::PartialJson(json!({
            "model": "gpt-4",
            "temperature": 0.0,
            "stream": true,
            "messages": [
                { "role": "system", "content": "Be brief" },
                { "role": "assistant", "content": "How may I help you?" },
                { "role": "user", "content": "Say hi to the world" },
            ],
        })))
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let backend = OpenAI::new(&server.url(), "abc");
    let fragments = backend
        .chat(request(), CancellationToken::new())
        .await?
        .try_collect::<Vec<String>>()
        .await?;

    mock.assert_async().await;
    assert_eq!(fragments, vec!["Hello ".to_string(), "World".to_string()]);

    return Ok(());
}

#[tokio::test]
async fn it_skips_empty_deltas() -> Result<()> {
    let role_only = r#"{"choices":[{"delta":{"role":"assistant"}}]}"#.to_string();
    let finish = r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#.to_string();
    let body = sse_body(&[role_only, chunk("Hi")?, finish, "[DONE]".to_string()]);

    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let backend = OpenAI::new(&server.url(), "abc");
    let fragments = backend
        .chat(request(), CancellationToken::new())
        .await?
        .try_collect::<Vec<String>>()
        .await?;

    assert_eq!(fragments, vec!["Hi".to_string()]);
    return Ok(());
}

#[tokio::test]
async fn it_stops_at_done() -> Result<()> {
    let body = sse_body(&[chunk("Hi")?, "[DONE]".to_string(), chunk("ignored")?]);

    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let backend = OpenAI::new(&server.url(), "abc");
    let fragments = backend
        .chat(request(), CancellationToken::new())
        .await?
        .try_collect::<Vec<String>>()
        .await?;

    assert_eq!(fragments, vec!["Hi".to_string()]);
    return Ok(());
}

#[tokio::test]
async fn it_classifies_unauthorized_responses() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(401)
        .with_body(r#"{"error":{"message":"Incorrect API key provided"}}"#)
        .create_async()
        .await;

    let backend = OpenAI::new(&server.url(), "abc");
    let res = backend.chat(request(), CancellationToken::new()).await;

    assert!(res.err().unwrap().is_authentication());
    return Ok(());
}

#[tokio::test]
async fn it_requires_a_token() {
    let backend = OpenAI::new("http://127.0.0.1:9", "");
    let res = backend.chat(request(), CancellationToken::new()).await;

    assert!(res.err().unwrap().is_authentication());
}

#[tokio::test]
async fn it_fails_on_server_errors() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(500)
        .with_body("oops")
        .create_async()
        .await;

    let backend = OpenAI::new(&server.url(), "abc");
    let err = backend
        .chat(request(), CancellationToken::new())
        .await
        .err()
        .unwrap();

    assert!(!err.is_authentication());
    assert!(matches!(err, BackendError::Status { status: 500, .. }));
    return Ok(());
}

#[tokio::test]
async fn it_surfaces_error_events() -> Result<()> {
    let error = serde_json::to_string(&CompletionResponse {
        choices: vec![],
        error: Some(ErrorResponse {
            message: "The server is overloaded".to_string(),
        }),
    })?;
    let body = sse_body(&[chunk("Partial")?, error]);

    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let backend = OpenAI::new(&server.url(), "abc");
    let results = backend
        .chat(request(), CancellationToken::new())
        .await?
        .collect::<Vec<_>>()
        .await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().unwrap(), "Partial");
    assert!(matches!(results[1], Err(BackendError::Provider { .. })));
    return Ok(());
}

#[tokio::test]
async fn it_does_not_send_when_already_cancelled() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .expect(0)
        .create_async()
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let backend = OpenAI::new(&server.url(), "abc");
    let fragments = backend
        .chat(request(), cancel)
        .await?
        .try_collect::<Vec<String>>()
        .await?;

    assert!(fragments.is_empty());
    mock.assert_async().await;
    return Ok(());
}

#[tokio::test]
async fn it_stops_streaming_once_cancelled() -> Result<()> {
    let body = sse_body(&[chunk("Hello ")?, chunk("World")?, "[DONE]".to_string()]);

    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let cancel = CancellationToken::new();
    let backend = OpenAI::new(&server.url(), "abc");
    let mut stream = backend.chat(request(), cancel.clone()).await?;

    let first = stream.next().await.unwrap()?;
    cancel.cancel();

    assert_eq!(first, "Hello ");
    assert!(stream.next().await.is_none());
    return Ok(());
}
