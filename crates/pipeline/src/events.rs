//! Streaming response events.

use crate::types::PROCESSING_FAILURE_MESSAGE;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// Events buffered between the pipeline task and a slow consumer.
pub(crate) const EVENT_BUFFER: usize = 32;

/// One event of a streamed response.
///
/// Order: `Language` once, then zero or more `Content`, then exactly one
/// `Done` or `Error`. A request rejected before its language is known
/// produces only `Error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum PipelineEvent {
    /// Working language code
    Language(String),
    /// Next answer fragment
    Content(String),
    /// Complete answer text
    Done(String),
    /// Caller-facing failure message
    Error(String),
}

impl PipelineEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done(_) | Self::Error(_))
    }
}

/// Receiving end of a streamed response.
///
/// Dropping it cancels the request: the producing task notices the closed
/// channel and abandons generation.
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::Receiver<PipelineEvent>,
    finished: bool,
}

impl EventStream {
    pub(crate) fn channel() -> (mpsc::Sender<PipelineEvent>, Self) {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        (
            tx,
            Self {
                rx,
                finished: false,
            },
        )
    }
}

impl Stream for EventStream {
    type Item = PipelineEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }

        match self.rx.poll_recv(cx) {
            Poll::Ready(Some(event)) => {
                if event.is_terminal() {
                    self.finished = true;
                }
                Poll::Ready(Some(event))
            }
            // Producer went away without a terminal event (e.g. it panicked)
            Poll::Ready(None) => {
                self.finished = true;
                Poll::Ready(Some(PipelineEvent::Error(
                    PROCESSING_FAILURE_MESSAGE.to_string(),
                )))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
