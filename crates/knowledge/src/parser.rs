//! Input adapters: text extraction per media kind.
//!
//! PDF text comes from `pdf-extract`; `.pptx` decks are read as zip archives
//! and the `<a:t>` text runs of each slide are collected in slide order;
//! markdown is read as UTF-8.

use crate::types::MediaKind;
use docchat_core::{AppError, AppResult};
use std::io::{Cursor, Read};
use std::path::Path;

/// Upper bound on a single decompressed slide XML entry.
const MAX_SLIDE_XML_BYTES: u64 = 50 * 1024 * 1024;

/// Extract plain text from a file of the given media kind.
pub fn extract_text(path: &Path, kind: MediaKind) -> AppResult<String> {
    match kind {
        MediaKind::Markdown => std::fs::read_to_string(path)
            .map_err(|e| AppError::Knowledge(format!("Failed to read {:?}: {}", path, e))),
        MediaKind::Pdf => {
            let bytes = read_bytes(path)?;
            extract_pdf(&bytes)
        }
        MediaKind::Slides => {
            let bytes = read_bytes(path)?;
            extract_slides(&bytes)
        }
    }
}

fn read_bytes(path: &Path) -> AppResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| AppError::Knowledge(format!("Failed to read {:?}: {}", path, e)))
}

fn extract_pdf(bytes: &[u8]) -> AppResult<String> {
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| AppError::Knowledge(format!("PDF extraction failed: {}", e)))
}

/// Collect slide text, one line per slide, slides in numeric order.
pub(crate) fn extract_slides(bytes: &[u8]) -> AppResult<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| AppError::Knowledge(format!("Invalid slide deck: {}", e)))?;

    let mut slide_names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("ppt/slides/slide") && n.ends_with(".xml"))
        .map(|n| n.to_string())
        .collect();
    slide_names.sort_by_key(|name| slide_number(name));

    let mut lines = Vec::with_capacity(slide_names.len());
    for name in slide_names {
        let xml = read_entry(&mut archive, &name)?;
        let text = collect_text_runs(&xml)?;
        if !text.is_empty() {
            lines.push(text);
        }
    }

    Ok(lines.join("\n"))
}

fn slide_number(name: &str) -> u32 {
    name.trim_start_matches("ppt/slides/slide")
        .trim_end_matches(".xml")
        .parse::<u32>()
        .unwrap_or(u32::MAX)
}

fn read_entry(archive: &mut zip::ZipArchive<Cursor<&[u8]>>, name: &str) -> AppResult<Vec<u8>> {
    let entry = archive
        .by_name(name)
        .map_err(|e| AppError::Knowledge(format!("Missing slide {}: {}", name, e)))?;

    let mut out = Vec::new();
    entry
        .take(MAX_SLIDE_XML_BYTES)
        .read_to_end(&mut out)
        .map_err(|e| AppError::Knowledge(format!("Failed to read slide {}: {}", name, e)))?;

    if out.len() as u64 >= MAX_SLIDE_XML_BYTES {
        return Err(AppError::Knowledge(format!(
            "Slide {} exceeds size limit ({} bytes)",
            name, MAX_SLIDE_XML_BYTES
        )));
    }
    Ok(out)
}

/// Join the `<a:t>` runs of one slide with single spaces.
fn collect_text_runs(xml: &[u8]) -> AppResult<String> {
    use quick_xml::events::Event;

    let mut runs: Vec<String> = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut in_run = false;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_run = true,
            Ok(Event::End(e)) if e.local_name().as_ref() == b"t" => in_run = false,
            Ok(Event::Text(te)) if in_run => {
                let text = te
                    .unescape()
                    .map_err(|e| AppError::Knowledge(format!("Invalid slide text: {}", e)))?;
                if !text.trim().is_empty() {
                    runs.push(text.trim().to_string());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(AppError::Knowledge(format!("Invalid slide XML: {}", e))),
            _ => {}
        }
        buf.clear();
    }

    Ok(runs.join(" "))
}
