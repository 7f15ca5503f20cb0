// src/utils/line_debug.rs
use crate::rubric::patterns::classify;
use crate::rubric::Line;
use crate::storage::write_file;
use crate::utils::error::StorageError;
use std::path::Path;

/// Renders extracted lines with their classification, one per row:
/// `H` heading, `Q` question, `C` continuation, blank for skipped lines.
pub fn render_debug_lines(lines: &[Line]) -> String {
    let mut out = String::from("# line [class] text\n");
    for line in lines {
        out.push_str(&format!("{:>5} [{}] {}\n", line.index + 1, classify(&line.text).tag(), line.text));
    }
    out
}

/// Saves the annotated line dump used to diagnose unsupported exports.
pub fn save_debug_lines(lines: &[Line], path: &Path) -> Result<(), StorageError> {
    // Runs before the rubric is saved, so the output directory may not exist yet
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    write_file(path, render_debug_lines(lines).as_bytes())?;
    tracing::info!("Saved debug line dump to {}", path.display());
    Ok(())
}
