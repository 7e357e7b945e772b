//! Ask command handler.
//!
//! Answers a typed question from the indexed documents.

use super::print_event_stream;
use anyhow::Result;
use clap::Args;
use docchat_pipeline::PipelineOrchestrator;

/// Ask a question about the documents
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub message: String,

    /// Answer language (en, hi, ta, te); detected from the question otherwise
    #[arg(short, long)]
    pub language: Option<String>,

    /// Print the answer as it is generated
    #[arg(long)]
    pub stream: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, orchestrator: &PipelineOrchestrator) -> Result<()> {
        tracing::debug!("Ask command options: {:?}", self);

        if self.stream {
            let events = orchestrator.process_text_stream(self.message.as_str(), self.language.as_deref());
            return print_event_stream(events, self.json).await;
        }

        let envelope = orchestrator
            .process_text(&self.message, self.language.as_deref())
            .await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        } else {
            println!("{}", envelope.response);
        }

        Ok(())
    }
}
