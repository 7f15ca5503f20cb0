// src/pipeline.rs
use crate::extractors::{select_extractor, Backend};
use crate::rubric::{parse_with_report, ParserConfig};
use crate::storage::{default_output_path, StorageManager};
use crate::utils::error::AppError;
use crate::utils::line_debug;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input: PathBuf,
    /// Defaults to the input path with a `.csv` extension.
    pub output: Option<PathBuf>,
    pub backend: Backend,
    pub parser: ParserConfig,
    pub write_metadata: bool,
    pub write_debug_lines: bool,
}

impl RunOptions {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: None,
            backend: Backend::Auto,
            parser: ParserConfig::default(),
            write_metadata: false,
            write_debug_lines: false,
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| default_output_path(&self.input))
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub csv_path: PathBuf,
    pub metadata_path: Option<PathBuf>,
    pub backend: &'static str,
    pub sections: usize,
    pub entries: usize,
    pub anomalies: usize,
}

/// Missing, non-file and unreadable inputs all count as "not found".
fn check_input(input: &Path) -> Result<(), AppError> {
    if !input.is_file() || std::fs::File::open(input).is_err() {
        return Err(AppError::InputNotFound(input.to_path_buf()));
    }
    Ok(())
}

/// extract -> parse -> write. Nothing is written to the CSV path unless
/// parsing succeeded.
pub fn run(options: &RunOptions) -> Result<RunSummary, AppError> {
    check_input(&options.input)?;

    let output = options.output_path();
    if output == options.input {
        return Err(AppError::Config(format!(
            "output path {} would overwrite the input PDF",
            output.display()
        )));
    }

    // 1. Extract
    let extractor = select_extractor(options.backend)?;
    tracing::info!("Extracting text from {} using {}", options.input.display(), extractor.name());
    let extracted = extractor.extract(&options.input)?;
    tracing::info!("{} backend produced {} lines", extracted.backend, extracted.lines.len());

    if options.write_debug_lines {
        let debug_path = output.with_extension("lines.txt");
        if let Err(e) = line_debug::save_debug_lines(&extracted.lines, &debug_path) {
            tracing::warn!("Failed to save debug line dump: {}", e);
        }
    }

    // 2. Parse
    let parsed = parse_with_report(&extracted.lines, &options.parser)?;

    // 3. Write
    let storage = StorageManager::new(&output).map_err(|e| AppError::output_write(&output, e))?;
    let csv_path = storage
        .save_rubric(&parsed.document)
        .map_err(|e| AppError::output_write(&output, e))?;

    let metadata_path = if options.write_metadata {
        let path = storage
            .save_metadata(&parsed.document, &parsed.report, &options.input, extracted.backend)
            .map_err(|e| AppError::output_write(storage.metadata_path(), e))?;
        Some(path)
    } else {
        None
    };

    Ok(RunSummary {
        csv_path,
        metadata_path,
        backend: extracted.backend,
        sections: parsed.document.sections.len(),
        entries: parsed.document.entry_count(),
        anomalies: parsed.report.anomalies.len(),
    })
}
