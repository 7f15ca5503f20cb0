// src/utils/error.rs
use std::path::PathBuf;
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("I/O error while reading PDF: {0}")]
    Io(#[from] std::io::Error),

    #[error("File is not a PDF (missing %PDF- header)")]
    NotAPdf,

    #[error("PDF has no extractable text layer; if it is a scanned document, run it through OCR first")]
    NoTextLayer,

    #[error("Extraction backend failed: {0}")]
    Backend(String),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("No text to parse; the PDF produced no non-blank lines")]
    EmptyInput,

    #[error("No rounds found in {lines} lines of text; is this a supported export?")]
    NoSections { lines: usize },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("PDF not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Parsing failed: {0}")]
    Parse(#[from] ParseError),

    #[error("Cannot write to {}: {source}; try passing a different output path", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: StorageError,
    },
}

impl AppError {
    pub fn output_write(path: impl Into<PathBuf>, source: impl Into<StorageError>) -> Self {
        AppError::OutputWrite {
            path: path.into(),
            source: source.into(),
        }
    }
}
