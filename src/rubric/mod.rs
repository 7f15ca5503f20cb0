// src/rubric/mod.rs
pub mod clean;
pub mod model;
pub mod parser;
pub mod patterns;

// Re-export key rubric types for convenience
pub use model::{Document, Entry, Line, Section, SectionKind};
pub use parser::{parse, parse_with_report, ParseReport, Parsed, ParserConfig};
