// src/extractors/mod.rs
//! Text extraction backends. Each one turns a PDF into ordered [`Line`]s;
//! the parser never knows which backend produced them.

#[cfg(feature = "pdf-extract")]
pub mod library;
pub mod stream;

use crate::rubric::Line;
use crate::utils::error::{AppError, ExtractionError};
use std::path::Path;

#[cfg(feature = "pdf-extract")]
pub use library::LibraryExtractor;
pub use stream::StreamExtractor;

/// Lines extracted from one PDF, tagged with the backend that produced them.
#[derive(Debug, Clone)]
pub struct Extracted {
    pub backend: &'static str,
    pub lines: Vec<Line>,
}

pub trait TextExtractor {
    fn name(&self) -> &'static str;

    /// Returns the document's lines in reading order.
    fn extract(&self, path: &Path) -> Result<Extracted, ExtractionError>;
}

/// Backend choice from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Backend {
    /// Library backend when compiled in, falling back to the built-in scanner
    Auto,
    /// pdf-extract crate
    Library,
    /// Built-in content stream scanner
    Builtin,
}

/// Picks the extractor once at startup.
pub fn select_extractor(backend: Backend) -> Result<Box<dyn TextExtractor>, AppError> {
    let extractor: Box<dyn TextExtractor> = match backend {
        Backend::Builtin => Box::new(StreamExtractor::new()),
        Backend::Library => library_extractor().ok_or_else(|| {
            AppError::Config("this build does not include the pdf-extract backend; use --backend builtin".to_string())
        })?,
        Backend::Auto => match library_extractor() {
            Some(primary) => Box::new(FallbackExtractor {
                primary,
                fallback: Box::new(StreamExtractor::new()),
            }),
            None => Box::new(StreamExtractor::new()),
        },
    };
    tracing::debug!("Selected extraction backend: {}", extractor.name());
    Ok(extractor)
}

#[cfg(feature = "pdf-extract")]
fn library_extractor() -> Option<Box<dyn TextExtractor>> {
    Some(Box::new(LibraryExtractor::new()))
}

#[cfg(not(feature = "pdf-extract"))]
fn library_extractor() -> Option<Box<dyn TextExtractor>> {
    None
}

/// Tries `primary`, then `fallback` when the primary yields nothing usable.
pub struct FallbackExtractor {
    primary: Box<dyn TextExtractor>,
    fallback: Box<dyn TextExtractor>,
}

impl TextExtractor for FallbackExtractor {
    fn name(&self) -> &'static str {
        "auto"
    }

    fn extract(&self, path: &Path) -> Result<Extracted, ExtractionError> {
        match self.primary.extract(path) {
            Ok(extracted) => Ok(extracted),
            // Neither backend can do better with an unreadable file or a non-PDF
            Err(e @ (ExtractionError::Io(_) | ExtractionError::NotAPdf)) => Err(e),
            Err(e) => {
                tracing::warn!(
                    "{} backend failed ({}); retrying with {}",
                    self.primary.name(),
                    e,
                    self.fallback.name()
                );
                self.fallback.extract(path)
            }
        }
    }
}

// --- Shared helpers ---

/// Rejects files that do not carry a `%PDF-` header near the start.
pub fn ensure_pdf_header(bytes: &[u8]) -> Result<(), ExtractionError> {
    let head = &bytes[..bytes.len().min(1024)];
    if head.windows(5).any(|w| w == b"%PDF-") {
        Ok(())
    } else {
        Err(ExtractionError::NotAPdf)
    }
}

/// Splits extracted text into numbered lines. Fails when nothing but
/// whitespace came out, which means there is no usable text layer.
pub fn lines_from_text(text: &str) -> Result<Vec<Line>, ExtractionError> {
    let lines = Line::from_texts(
        text.split(|c: char| c == '\n' || c == '\r' || c == '\u{c}')
            .map(|l| l.trim_end().to_string()),
    );
    if lines.iter().all(Line::is_blank) {
        return Err(ExtractionError::NoTextLayer);
    }
    Ok(lines)
}
