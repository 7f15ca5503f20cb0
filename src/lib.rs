// src/lib.rs
pub mod extractors;
pub mod pipeline;
pub mod rubric;
pub mod storage;
pub mod utils;

pub use rubric::{parse, Document, Entry, Line, Section, SectionKind};
pub use utils::AppError;
