//! Command handlers for the docchat CLI.

pub mod ask;
pub mod index;
pub mod listen;
pub mod status;

pub use ask::AskCommand;
pub use index::IndexCommand;
pub use listen::ListenCommand;
pub use status::StatusCommand;

use anyhow::{bail, Result};
use docchat_pipeline::{EventStream, PipelineEvent};
use futures::StreamExt;
use std::io::Write;

/// Print a streamed answer as it arrives.
///
/// In JSON mode every event is written as one line; otherwise fragments are
/// written to stdout and the working language goes to the log.
pub(crate) async fn print_event_stream(mut events: EventStream, json: bool) -> Result<()> {
    let mut stdout = std::io::stdout();

    while let Some(event) = events.next().await {
        if json {
            writeln!(stdout, "{}", serde_json::to_string(&event)?)?;
            if let PipelineEvent::Error(message) = event {
                bail!(message);
            }
            continue;
        }

        match event {
            PipelineEvent::Language(code) => tracing::info!("Answering in {}", code),
            PipelineEvent::Content(fragment) => {
                write!(stdout, "{}", fragment)?;
                stdout.flush()?;
            }
            PipelineEvent::Done(_) => writeln!(stdout)?,
            PipelineEvent::Error(message) => bail!(message),
        }
    }

    Ok(())
}
