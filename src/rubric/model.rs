// src/rubric/model.rs
use crate::rubric::patterns::strip_answer_markers;
use serde::Serialize;

/// One line of extracted text and its position in reading order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub index: usize,
    pub text: String,
}

impl Line {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }

    /// Numbers a sequence of raw strings in the order given.
    pub fn from_texts<I, S>(texts: I) -> Vec<Line>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| Line::new(index, text))
            .collect()
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "number", rename_all = "snake_case")]
pub enum SectionKind {
    Round(u32),
    Tiebreaker,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub number: u32,
    pub answer: String,
}

impl Entry {
    pub fn new(number: u32, answer: impl Into<String>) -> Self {
        Self {
            number,
            answer: answer.into(),
        }
    }

    /// Appends a wrapped continuation, separated by exactly one space. While
    /// the answer is still empty the text may carry the answer-key marker,
    /// which is removed the same way as on a question line.
    pub fn append_continuation(&mut self, text: &str) {
        let text = if self.answer.is_empty() {
            strip_answer_markers(text)
        } else {
            text.trim()
        };
        if text.is_empty() {
            return;
        }
        if !self.answer.is_empty() {
            self.answer.push(' ');
        }
        self.answer.push_str(text);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub title: String,
    pub kind: SectionKind,
    pub entries: Vec<Entry>,
}

impl Section {
    pub fn new(title: impl Into<String>, kind: SectionKind) -> Self {
        Self {
            title: title.into(),
            kind,
            entries: Vec::new(),
        }
    }

    pub fn is_tiebreaker(&self) -> bool {
        self.kind == SectionKind::Tiebreaker
    }
}

/// Parsed rubric: sections in heading order, entries in encounter order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Document {
    pub sections: Vec<Section>,
}

impl Document {
    pub fn entry_count(&self) -> usize {
        self.sections.iter().map(|s| s.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}
