// src/extractors/library.rs
use crate::extractors::{ensure_pdf_header, lines_from_text, Extracted, TextExtractor};
use crate::utils::error::ExtractionError;
use std::panic;
use std::path::Path;

/// High-fidelity extraction through the `pdf-extract` crate.
#[derive(Debug, Default)]
pub struct LibraryExtractor;

impl LibraryExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl TextExtractor for LibraryExtractor {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    fn extract(&self, path: &Path) -> Result<Extracted, ExtractionError> {
        let bytes = std::fs::read(path)?;
        ensure_pdf_header(&bytes)?;
        tracing::debug!("Running pdf-extract on {} ({} bytes)", path.display(), bytes.len());

        // pdf-extract panics on some malformed fonts instead of returning an error
        let text = panic::catch_unwind(|| pdf_extract::extract_text_from_mem(&bytes))
            .map_err(|_| ExtractionError::Backend("pdf-extract panicked while reading the document".to_string()))?
            .map_err(|e| ExtractionError::Backend(format!("pdf-extract failed: {}", e)))?;

        let lines = lines_from_text(&text)?;
        tracing::info!("pdf-extract produced {} lines from {}", lines.len(), path.display());
        Ok(Extracted { backend: self.name(), lines })
    }
}
