//! Index command handler.

use anyhow::Result;
use clap::Args;
use docchat_knowledge::IndexStats;
use docchat_pipeline::PipelineOrchestrator;

/// Rebuild the document index
#[derive(Args, Debug)]
pub struct IndexCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexCommand {
    pub async fn execute(&self, orchestrator: &PipelineOrchestrator) -> Result<()> {
        tracing::info!("Rebuilding document index");

        let stats = orchestrator.rebuild_index().await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            print_stats(&stats);
        }

        Ok(())
    }
}

fn print_stats(stats: &IndexStats) {
    println!("Index rebuilt");
    println!("  Documents indexed: {}", stats.documents_indexed);
    println!("  Documents skipped: {}", stats.documents_skipped);
    println!("  Chunks:            {}", stats.chunks);
    println!(
        "  Embeddings:        {} ({} dims)",
        stats.embedding_model, stats.dimensions
    );
    println!("  Duration:          {} ms", stats.duration_ms);
}
