//! Status command handler.
//!
//! Prints the service banner.

use anyhow::Result;
use clap::Args;
use docchat_knowledge::IndexStatus;
use docchat_pipeline::PipelineOrchestrator;
use serde::Serialize;

const SERVICE_NAME: &str = "docchat";

const ENTRY_FLOWS: [&str; 4] = ["text", "audio", "text-stream", "audio-stream"];

/// Show service status
#[derive(Args, Debug)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Banner {
    name: &'static str,
    version: &'static str,
    index: IndexStatus,
    flows: Vec<&'static str>,
}

impl StatusCommand {
    pub async fn execute(&self, orchestrator: &PipelineOrchestrator) -> Result<()> {
        let banner = Banner {
            name: SERVICE_NAME,
            version: env!("CARGO_PKG_VERSION"),
            index: orchestrator.index_status().await,
            flows: ENTRY_FLOWS.to_vec(),
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&banner)?);
            return Ok(());
        }

        println!("{} {}", banner.name, banner.version);
        match banner.index.stats {
            Some(ref stats) if banner.index.ready => println!(
                "Index: ready ({} documents, {} chunks, built {})",
                stats.documents_indexed,
                stats.chunks,
                stats.built_at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            _ => println!("Index: not built (basic mode)"),
        }
        println!("Flows: {}", banner.flows.join(", "));

        Ok(())
    }
}
