//! PDF text extraction.
//!
//! Pages are extracted in document order and joined with a newline. A document
//! that fails to parse gets exactly one more attempt with a synthetic `%%EOF`
//! appended, which recovers files cut off before their end-of-file marker.
//! Image-only PDFs simply produce empty text.

use std::path::Path;

const EOF_MARKER: &[u8] = b"\n%%EOF";

#[derive(Debug, thiserror::Error)]
#[error("Error extracting PDF text: {0}")]
pub struct ExtractionError(pub String);

/// Reads `path` and extracts its text on the blocking pool.
pub async fn extract_text_from_pdf(path: &Path) -> Result<String, ExtractionError> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| ExtractionError(e.to_string()))?;

    tokio::task::spawn_blocking(move || extract_text_from_bytes(&data))
        .await
        .map_err(|e| {
            tracing::error!("PDF extraction task failed: {}", e);
            ExtractionError(format!("PDF parser aborted: {}", e))
        })?
}

pub fn extract_text_from_bytes(data: &[u8]) -> Result<String, ExtractionError> {
    match extract_pages(data) {
        Ok(text) => Ok(text),
        Err(message) => {
            tracing::warn!("PDF parse failed ({}), retrying with EOF marker", message);
            extract_pages(&with_eof_marker(data)).map_err(|_| ExtractionError(message))
        }
    }
}

fn extract_pages(data: &[u8]) -> Result<String, String> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(data).map_err(|e| e.to_string())?;
    Ok(join_pages(pages))
}

fn join_pages(pages: Vec<String>) -> String {
    pages
        .into_iter()
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn with_eof_marker(data: &[u8]) -> Vec<u8> {
    let mut repaired = Vec::with_capacity(data.len() + EOF_MARKER.len());
    repaired.extend_from_slice(data);
    repaired.extend_from_slice(EOF_MARKER);
    repaired
}
