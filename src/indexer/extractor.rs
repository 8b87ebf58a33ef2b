use crate::error::{RagError, Result};

/// Turns raw document bytes into plain text.
///
/// Implementations may return an empty string for documents without a text
/// layer (scanned PDFs); callers decide whether that is an error.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String> {
        pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| RagError::TextExtraction(format!("Failed to extract PDF text: {}", e)))
    }
}

/// Treats the bytes as UTF-8 text. Used for already-extracted documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String> {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}
