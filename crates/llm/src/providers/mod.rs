//! Provider implementations.

pub mod ollama;
pub mod openai;

pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

use docchat_core::{AppError, AppResult};
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::time::Duration;

/// Build the shared HTTP client with an optional request timeout.
pub(crate) fn http_client(timeout_secs: Option<u64>) -> AppResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder
        .build()
        .map_err(|e| AppError::Llm(format!("Failed to build HTTP client: {}", e)))
}

/// Turn a non-success HTTP response into an error carrying the body text.
pub(crate) async fn error_for_status(
    provider: &str,
    response: reqwest::Response,
) -> AppResult<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(AppError::Llm(format!(
        "{} API error ({}): {}",
        provider, status, error_text
    )))
}

struct LineState<S> {
    inner: Pin<Box<S>>,
    buffer: Vec<u8>,
    finished: bool,
}

/// Split a byte stream into text lines.
///
/// Bytes are buffered until a full line is available, so lines and multi-byte
/// characters split across network chunks are reassembled before decoding.
/// A trailing line without a newline is emitted when the stream ends.
pub(crate) fn line_stream<S, B, E>(inner: S) -> impl Stream<Item = AppResult<String>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let state = LineState {
        inner: Box::pin(inner),
        buffer: Vec::new(),
        finished: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(pos) = state.buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = state.buffer.drain(..=pos).collect();
                return Some((decode_line(&line[..line.len() - 1]), state));
            }

            if state.finished {
                if state.buffer.is_empty() {
                    return None;
                }
                let rest = std::mem::take(&mut state.buffer);
                return Some((decode_line(&rest), state));
            }

            match state.inner.next().await {
                Some(Ok(bytes)) => state.buffer.extend_from_slice(bytes.as_ref()),
                Some(Err(e)) => {
                    state.finished = true;
                    state.buffer.clear();
                    return Some((Err(AppError::Llm(format!("Stream error: {}", e))), state));
                }
                None => state.finished = true,
            }
        }
    })
}

fn decode_line(bytes: &[u8]) -> AppResult<String> {
    let line = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8(line.to_vec())
        .map_err(|e| AppError::Llm(format!("Invalid UTF-8 in stream: {}", e)))
}
