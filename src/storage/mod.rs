// src/storage/mod.rs
use crate::rubric::{Document, ParseReport};
use crate::utils::error::StorageError;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// `week12.pdf` -> `week12.csv`, in the same directory.
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("csv")
}

/// Renders the rubric: per section a title row, the column header row and
/// one row per entry, with a blank line between sections.
pub fn render_csv(document: &Document) -> Result<Vec<u8>, StorageError> {
    let mut buf = Vec::new();

    for (i, section) in document.sections.iter().enumerate() {
        if i > 0 {
            // A zero-field record would come out as `""`, so write the separator directly
            buf.push(b'\n');
        }
        let mut writer = csv::WriterBuilder::new()
            .flexible(true) // Title rows have one field, entry rows two
            .from_writer(&mut buf);
        writer.write_record([section.title.as_str()])?;
        writer.write_record(["Question", "Answer"])?;
        for entry in &section.entries {
            writer.write_record([entry.number.to_string().as_str(), entry.answer.as_str()])?;
        }
        writer.flush()?;
    }

    Ok(buf)
}

#[derive(Debug, Serialize)]
struct SectionSummary<'a> {
    title: &'a str,
    tiebreaker: bool,
    entries: usize,
}

#[derive(Debug, Serialize)]
struct RubricMetadata<'a> {
    source_pdf: String,
    rubric_csv: String,
    backend: &'a str,
    sections: Vec<SectionSummary<'a>>,
    total_entries: usize,
    anomalies: usize,
    generated_at: String,
}

pub struct StorageManager {
    csv_path: PathBuf,
}

impl StorageManager {
    /// Prepares to write the rubric at `csv_path`, creating its directory if needed.
    pub fn new<P: AsRef<Path>>(csv_path: P) -> Result<Self, StorageError> {
        let csv_path = csv_path.as_ref().to_path_buf();

        // Create the parent directory if it doesn't exist
        if let Some(parent) = csv_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        Ok(Self { csv_path })
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.csv_path.with_extension("meta.json")
    }

    /// Writes the rubric CSV. The content is rendered before the file is created.
    pub fn save_rubric(&self, document: &Document) -> Result<PathBuf, StorageError> {
        let bytes = render_csv(document)?;
        write_file(&self.csv_path, &bytes)?;

        tracing::info!("Saved rubric to {}", self.csv_path.display());
        Ok(self.csv_path.clone())
    }

    /// Saves a JSON summary of the run next to the CSV.
    pub fn save_metadata(
        &self,
        document: &Document,
        report: &ParseReport,
        source_pdf: &Path,
        backend: &str,
    ) -> Result<PathBuf, StorageError> {
        let metadata = RubricMetadata {
            source_pdf: source_pdf.display().to_string(),
            rubric_csv: self.csv_path.display().to_string(),
            backend,
            sections: document
                .sections
                .iter()
                .map(|s| SectionSummary {
                    title: &s.title,
                    tiebreaker: s.is_tiebreaker(),
                    entries: s.entries.len(),
                })
                .collect(),
            total_entries: document.entry_count(),
            anomalies: report.anomalies.len(),
            generated_at: chrono::Utc::now().to_rfc3339(),
        };

        let metadata_str = serde_json::to_string_pretty(&metadata)?;
        let file_path = self.metadata_path();
        write_file(&file_path, metadata_str.as_bytes())?;

        tracing::info!("Saved metadata to {}", file_path.display());
        Ok(file_path)
    }
}

/// Writes `bytes` to `path`, removing the file again if the write fails part-way.
pub(crate) fn write_file(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let mut file = fs::File::create(path)?;
    if let Err(e) = file.write_all(bytes).and_then(|()| file.flush()) {
        drop(file);
        if let Err(cleanup) = fs::remove_file(path) {
            tracing::warn!("Could not remove partial file {}: {}", path.display(), cleanup);
        }
        return Err(StorageError::Io(e));
    }
    Ok(())
}
