//! Upload reader.
//!
//! Turns an uploaded file into a [`Transcript`]: PDFs are read page by page
//! with `pdf-extract`, CSV and plain-text uploads are taken as one page of
//! UTF-8 text. Anything else is rejected before any bytes are parsed.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::core::errors::{AppError, AppResult};
use crate::extract::types::{Transcript, UploadKind};

pub fn checksum_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Decides the upload kind from the declared MIME type, falling back to the
/// file extension.
pub fn detect_kind(file_path: &Path, mime_type: Option<&str>) -> AppResult<UploadKind> {
    let mime = mime_type
        .map(|value| value.trim().to_ascii_lowercase())
        .unwrap_or_default();
    let ext = file_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    if mime == "application/pdf" || (mime.is_empty() && ext == "pdf") {
        Ok(UploadKind::Pdf)
    } else if mime == "text/csv" || (mime.is_empty() && ext == "csv") {
        Ok(UploadKind::Csv)
    } else if mime == "text/plain" || (mime.is_empty() && ext == "txt") {
        Ok(UploadKind::PlainText)
    } else {
        Err(AppError::InvalidInput(format!(
            "unsupported file type for {}: upload a PDF, CSV or plain-text (.txt) file",
            file_path.display()
        )))
    }
}

pub fn read_transcript(file_path: &Path, mime_type: Option<&str>) -> AppResult<Transcript> {
    let kind = detect_kind(file_path, mime_type)?;
    if !file_path.exists() {
        return Err(AppError::NotFound(format!("file {}", file_path.display())));
    }
    let bytes = std::fs::read(file_path)
        .map_err(|e| AppError::Io(format!("cannot read {}: {e}", file_path.display())))?;
    transcript_from_bytes(display_name(file_path), kind, &bytes)
}

pub fn transcript_from_bytes(
    name: String,
    kind: UploadKind,
    bytes: &[u8],
) -> AppResult<Transcript> {
    let checksum = checksum_bytes(bytes);
    let pages = match kind {
        UploadKind::Pdf => pdf_pages(bytes)?,
        UploadKind::Csv | UploadKind::PlainText => vec![text_page(bytes)?],
    };

    if pages.iter().all(|page| page.trim().is_empty()) {
        let message = match kind {
            UploadKind::Pdf => "PDF contains no extractable text (may be image-based or encrypted)",
            UploadKind::Csv | UploadKind::PlainText => "file contains no text",
        };
        return Err(AppError::InvalidInput(message.to_string()));
    }

    tracing::debug!(name = %name, pages = pages.len(), "transcript extracted");
    Ok(Transcript {
        name,
        kind,
        checksum,
        pages,
    })
}

// pdf-extract panics on some malformed files instead of returning an error.
fn pdf_pages(bytes: &[u8]) -> AppResult<Vec<String>> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }));
    match outcome {
        Ok(Ok(pages)) => Ok(pages.iter().map(|page| clean_page(page)).collect()),
        Ok(Err(err)) => {
            tracing::warn!(error = %err, "pdf-extract failed");
            Err(AppError::Extraction(format!("pdf-extract failed: {err}")))
        }
        Err(_) => Err(AppError::Extraction(
            "pdf-extract panicked (malformed document)".to_string(),
        )),
    }
}

fn text_page(bytes: &[u8]) -> AppResult<String> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| AppError::InvalidInput(format!("file is not valid UTF-8 text: {e}")))?;
    Ok(clean_page(text))
}

/// Trims trailing whitespace per line and collapses runs of blank lines to
/// a single blank line.
pub fn clean_page(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut blank_run = 0_u32;
    for line in raw.lines().map(str::trim_end) {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run == 1 && !out.is_empty() {
                out.push('\n');
            }
        } else {
            blank_run = 0;
            out.push_str(line);
            out.push('\n');
        }
    }
    out.trim_end_matches('\n').to_string()
}

/// File name as shown on the dashboard.
fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("document.pdf")
        .to_string()
}
