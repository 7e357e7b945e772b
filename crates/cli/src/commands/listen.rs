//! Listen command handler.
//!
//! Answers a spoken question read from an audio file.

use super::print_event_stream;
use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::Args;
use docchat_pipeline::PipelineOrchestrator;
use std::path::{Path, PathBuf};

/// Ask a spoken question from an audio file
#[derive(Args, Debug)]
pub struct ListenCommand {
    /// Audio file holding the question
    pub audio_file: PathBuf,

    /// MIME type of the audio (guessed from the extension when omitted)
    #[arg(long)]
    pub mime_type: Option<String>,

    /// Answer language (en, hi, ta, te); detected from the transcription otherwise
    #[arg(short, long)]
    pub language: Option<String>,

    /// Print the answer as it is generated
    #[arg(long)]
    pub stream: bool,

    /// Do not voice the answer
    #[arg(long)]
    pub no_audio: bool,

    /// Write the voiced answer to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ListenCommand {
    pub async fn execute(&self, orchestrator: &PipelineOrchestrator) -> Result<()> {
        tracing::debug!("Listen command options: {:?}", self);

        let audio = tokio::fs::read(&self.audio_file)
            .await
            .with_context(|| format!("Failed to read audio file {}", self.audio_file.display()))?;
        let mime_type = self
            .mime_type
            .clone()
            .or_else(|| guess_mime_type(&self.audio_file).map(str::to_string));

        if self.stream {
            let events = orchestrator.process_audio_stream(
                audio,
                mime_type.as_deref(),
                self.language.as_deref(),
            );
            return print_event_stream(events, self.json).await;
        }

        let envelope = orchestrator
            .process_audio(
                &audio,
                mime_type.as_deref(),
                self.language.as_deref(),
                !self.no_audio,
            )
            .await?;

        if let (Some(path), Some(payload)) = (&self.output, &envelope.audio_payload) {
            let bytes = STANDARD
                .decode(payload)
                .context("Voiced answer is not valid base64")?;
            tokio::fs::write(path, bytes)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Voiced answer written to {}", path.display());
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        } else {
            if let Some(ref transcription) = envelope.transcription {
                println!("> {}", transcription);
            }
            println!("{}", envelope.response);
        }

        Ok(())
    }
}

fn guess_mime_type(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_lowercase();
    let mime = match extension.as_str() {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "m4a" | "mp4" => "audio/mp4",
        "ogg" | "oga" => "audio/ogg",
        "webm" => "audio/webm",
        "flac" => "audio/flac",
        _ => return None,
    };
    Some(mime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_mime_type() {
        assert_eq!(guess_mime_type(Path::new("q.wav")), Some("audio/wav"));
        assert_eq!(guess_mime_type(Path::new("Q.MP3")), Some("audio/mpeg"));
        assert_eq!(guess_mime_type(Path::new("clip.webm")), Some("audio/webm"));
        assert_eq!(guess_mime_type(Path::new("notes.txt")), None);
        assert_eq!(guess_mime_type(Path::new("recording")), None);
    }
}
