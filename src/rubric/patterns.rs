// src/rubric/patterns.rs

// --- Imports ---
use crate::rubric::model::SectionKind;
use once_cell::sync::Lazy;
use regex::Regex;

// --- Regex Patterns for Line Matching (Lazy Static) ---
// All patterns run against the trimmed line.

// "Round 3", "Round 3: Hubba Hubba!", "ROUND 3 - Music", "Round 3. Title"
static ROUND_HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^round\s+(\d+)(?:\s*[:.\-–—]|\s|$)").expect("Failed to compile ROUND_HEADING_RE")
});

// "Tiebreaker", "Tiebreakers", "Tie-breaker: Closest wins", "TIE BREAKER"
static TIEBREAKER_HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^tie[\s\-]?breakers?\b").expect("Failed to compile TIEBREAKER_HEADING_RE")
});

// Answer-key line: number, separator, then whitespace or end of line.
// "3.14 meters" stays a continuation because no whitespace follows the dot.
static QUESTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)\s*[.):](?:\s+(.*))?$").expect("Failed to compile QUESTION_RE")
});

// Optional answer-key marker in front of the answer text. An answer that
// itself starts with "A:" or "Answer:" is indistinguishable from key markup.
static ANSWER_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:a|ans|answer)\s*:\s*").expect("Failed to compile ANSWER_MARKER_RE")
});

/// Classification of a single extracted line. Each line gets exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    Blank,
    Heading { kind: SectionKind, title: &'a str },
    Question { number: u32, answer: &'a str },
    Continuation(&'a str),
}

impl LineKind<'_> {
    /// Single-character tag used by the debug line dump.
    pub fn tag(&self) -> char {
        match self {
            LineKind::Blank => ' ',
            LineKind::Heading { .. } => 'H',
            LineKind::Question { .. } => 'Q',
            LineKind::Continuation(_) => 'C',
        }
    }
}

/// Classifies a line. Priority is heading, then question, then continuation.
pub fn classify(raw: &str) -> LineKind<'_> {
    let text = raw.trim();
    if text.is_empty() {
        return LineKind::Blank;
    }

    if let Some(kind) = match_heading(text) {
        return LineKind::Heading { kind, title: text };
    }

    if let Some((number, answer)) = match_question(text) {
        return LineKind::Question { number, answer };
    }

    LineKind::Continuation(text)
}

fn match_heading(text: &str) -> Option<SectionKind> {
    if let Some(caps) = ROUND_HEADING_RE.captures(text) {
        // A round number that does not fit is not a heading we understand
        let number = caps.get(1)?.as_str().parse::<u32>().ok()?;
        return Some(SectionKind::Round(number));
    }
    if TIEBREAKER_HEADING_RE.is_match(text) {
        return Some(SectionKind::Tiebreaker);
    }
    None
}

fn match_question(text: &str) -> Option<(u32, &str)> {
    let caps = QUESTION_RE.captures(text)?;
    let number = caps.get(1)?.as_str().parse::<u32>().ok()?;
    let answer = caps.get(2).map_or("", |m| m.as_str());
    Some((number, strip_answer_markers(answer)))
}

/// Trims `text` and removes every leading answer-key marker, so the result
/// never starts with one.
pub fn strip_answer_markers(text: &str) -> &str {
    let mut rest = text.trim();
    while let Some(marker) = ANSWER_MARKER_RE.find(rest) {
        rest = rest[marker.end()..].trim_start();
    }
    rest
}
