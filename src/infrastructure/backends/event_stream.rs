#[cfg(test)]
#[path = "event_stream_test.rs"]
mod tests;

use futures::stream;
use futures::stream::TryStreamExt;
use tokio::io::AsyncBufReadExt;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;

use crate::domain::models::BackendError;
use crate::domain::models::BackendName;
use crate::domain::models::FragmentStream;

fn convert_err(err: reqwest::Error) -> std::io::Error {
    let err_msg = err.to_string();
    return std::io::Error::new(std::io::ErrorKind::Interrupted, err_msg);
}

/// What a backend made of a single event payload.
#[derive(Debug, PartialEq, Eq)]
pub enum Decoded {
    Fragment(String),
    Skip,
    Done,
}

/// Extracts the payload of a server-sent event line. Bare JSON lines are
/// passed through as-is, event names, ids and comments are dropped.
pub fn event_data(line: &str) -> Option<&str> {
    let cleaned = line.trim();
    if cleaned.is_empty()
        || cleaned.starts_with(':')
        || cleaned.starts_with("event:")
        || cleaned.starts_with("id:")
        || cleaned.starts_with("retry:")
    {
        return None;
    }

    if let Some(data) = cleaned.strip_prefix("data:") {
        let data = data.trim();
        if data.is_empty() {
            return None;
        }
        return Some(data);
    }

    return Some(cleaned);
}

/// Sends the request unless `cancel` fires first. `Ok(None)` means the call
/// was cancelled before the provider answered.
pub async fn send(
    backend: BackendName,
    request: reqwest::RequestBuilder,
    cancel: &CancellationToken,
) -> Result<Option<reqwest::Response>, BackendError> {
    let res = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Ok(None),
        res = request.send() => res?,
    };

    if !res.status().is_success() {
        let status = res.status().as_u16();
        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(None),
            body = res.text() => body.unwrap_or_default(),
        };
        tracing::error!(
            backend = %backend,
            status = status,
            body = body,
            "Completion request failed"
        );
        return Err(BackendError::from_status(backend, status, body));
    }

    return Ok(Some(res));
}

/// Turns a streamed response body into fragments, line by line, until the
/// body ends, `decode` reports the end of the reply, or `cancel` fires.
/// Dropping the stream drops the response, closing the connection.
pub fn fragments<F>(res: reqwest::Response, cancel: CancellationToken, decode: F) -> FragmentStream
where
    F: FnMut(&str) -> Result<Decoded, BackendError> + Send + 'static,
{
    let lines = StreamReader::new(res.bytes_stream().map_err(convert_err)).lines();

    let stream = stream::unfold(Some((lines, cancel, decode)), |state| async move {
        let (mut lines, cancel, mut decode) = state?;

        loop {
            let line = tokio::select! {
                biased;
                _ = cancel.cancelled() => return None,
                line = lines.next_line() => line,
            };

            let line = match line {
                Ok(Some(line)) => line,
                Ok(None) => return None,
                Err(err) => return Some((Err(BackendError::Stream(err)), None)),
            };

            let data = match event_data(&line) {
                Some(data) => data,
                None => continue,
            };

            match decode(data) {
                Ok(Decoded::Fragment(text)) => {
                    return Some((Ok(text), Some((lines, cancel, decode))));
                }
                Ok(Decoded::Skip) => continue,
                Ok(Decoded::Done) => return None,
                Err(err) => return Some((Err(err), None)),
            }
        }
    });

    return Box::pin(stream);
}
