// src/rubric/parser.rs
//! Rebuilds rounds, tiebreakers and numbered answers from extracted lines.
//!
//! The scan is a two-state machine (`NoSection` / `InSection`). [`step`] is a
//! pure transition: it consumes the current state and one line and returns
//! the next state, at most one event (a closed section or an anomaly) and
//! the line's classification.
//! [`parse_with_report`] drives it and collects the results.

use crate::rubric::clean;
use crate::rubric::model::{Document, Entry, Line, Section};
use crate::rubric::patterns::{classify, LineKind};
use crate::utils::error::ParseError;
use serde::Serialize;

/// Optional answer post-processing. Everything is off by default, so
/// entries hold exactly the trimmed source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserConfig {
    /// Keep only the text after the last `?`/`!` of each answer.
    pub split_question_text: bool,
    /// Strip grader notes and normalize delimiter spacing.
    pub clean_answers: bool,
    /// Drop sections that closed without any entries.
    pub skip_empty_sections: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserState {
    NoSection,
    InSection(Section),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// Numbered line seen before any heading.
    OrphanQuestion,
    /// Free text with no entry to attach to.
    UnmatchedContinuation,
}

/// A recoverable per-line problem. Logged, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Anomaly {
    pub line: usize,
    pub kind: AnomalyKind,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepEvent {
    Nothing,
    Closed(Section),
    Anomaly(Anomaly),
}

/// Per-class line counts plus every anomaly, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseReport {
    pub headings: usize,
    pub questions: usize,
    pub continuations: usize,
    pub blanks: usize,
    pub anomalies: Vec<Anomaly>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    pub document: Document,
    pub report: ParseReport,
}

/// One state transition. The line is classified exactly once, here.
pub fn step(state: ParserState, line: &Line) -> (ParserState, StepEvent, LineKind<'_>) {
    let kind = classify(&line.text);
    let (next, event) = match (state, kind) {
        (state, LineKind::Blank) => (state, StepEvent::Nothing),

        (ParserState::NoSection, LineKind::Heading { kind, title }) => {
            (ParserState::InSection(Section::new(title, kind)), StepEvent::Nothing)
        }
        (ParserState::InSection(current), LineKind::Heading { kind, title }) => {
            (ParserState::InSection(Section::new(title, kind)), StepEvent::Closed(current))
        }

        (ParserState::InSection(mut current), LineKind::Question { number, answer }) => {
            current.entries.push(Entry::new(number, answer));
            (ParserState::InSection(current), StepEvent::Nothing)
        }
        (ParserState::NoSection, LineKind::Question { .. }) => (
            ParserState::NoSection,
            StepEvent::Anomaly(anomaly(line, AnomalyKind::OrphanQuestion)),
        ),

        (ParserState::InSection(mut current), LineKind::Continuation(text)) => {
            let event = match current.entries.last_mut() {
                Some(entry) => {
                    entry.append_continuation(text);
                    StepEvent::Nothing
                }
                None => StepEvent::Anomaly(anomaly(line, AnomalyKind::UnmatchedContinuation)),
            };
            (ParserState::InSection(current), event)
        }
        (ParserState::NoSection, LineKind::Continuation(_)) => (
            ParserState::NoSection,
            StepEvent::Anomaly(anomaly(line, AnomalyKind::UnmatchedContinuation)),
        ),
    };
    (next, event, kind)
}

fn anomaly(line: &Line, kind: AnomalyKind) -> Anomaly {
    Anomaly {
        line: line.index,
        kind,
        text: line.text.trim().to_string(),
    }
}

/// Applies answer post-processing to a closed section. Returns `None` when
/// the section should be dropped.
fn finish_section(mut section: Section, config: &ParserConfig) -> Option<Section> {
    if config.split_question_text || config.clean_answers {
        for entry in &mut section.entries {
            if config.split_question_text {
                entry.answer = clean::split_question_text(&entry.answer).to_string();
            }
            if config.clean_answers {
                entry.answer = clean::clean_answer(&entry.answer);
            }
        }
    }

    if config.skip_empty_sections && section.entries.is_empty() {
        tracing::info!("Dropping section '{}' with no entries", section.title);
        return None;
    }

    tracing::debug!("Closed section '{}' with {} entries", section.title, section.entries.len());
    Some(section)
}

/// Parses with the default configuration.
///
/// Fails only when the input has no non-blank lines or no recognizable
/// heading.
pub fn parse(lines: &[Line]) -> Result<Document, ParseError> {
    parse_with_report(lines, &ParserConfig::default()).map(|parsed| parsed.document)
}

pub fn parse_with_report(lines: &[Line], config: &ParserConfig) -> Result<Parsed, ParseError> {
    let mut report = ParseReport::default();
    let mut document = Document::default();
    let mut state = ParserState::NoSection;

    for line in lines {
        let (next, event, kind) = step(state, line);
        state = next;

        match kind {
            LineKind::Blank => report.blanks += 1,
            LineKind::Heading { .. } => report.headings += 1,
            LineKind::Question { .. } => report.questions += 1,
            LineKind::Continuation(_) => report.continuations += 1,
        }

        match event {
            StepEvent::Nothing => {}
            StepEvent::Closed(section) => document.sections.extend(finish_section(section, config)),
            StepEvent::Anomaly(anomaly) => {
                tracing::warn!(
                    "Line {}: skipping {:?} '{}'",
                    anomaly.line + 1,
                    anomaly.kind,
                    anomaly.text
                );
                report.anomalies.push(anomaly);
            }
        }
    }

    if let ParserState::InSection(section) = state {
        document.sections.extend(finish_section(section, config));
    }

    if report.blanks == lines.len() {
        return Err(ParseError::EmptyInput);
    }
    if document.is_empty() {
        tracing::error!("No section headings recognized in {} lines", lines.len());
        return Err(ParseError::NoSections { lines: lines.len() });
    }

    tracing::info!(
        "Parsed {} sections, {} entries ({} anomalies)",
        document.sections.len(),
        document.entry_count(),
        report.anomalies.len()
    );
    Ok(Parsed { document, report })
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::rubric::model::SectionKind;

    fn lines(texts: &[&str]) -> Vec<Line> {
        Line::from_texts(texts.iter().copied())
    }

    fn pairs(section: &Section) -> Vec<(u32, &str)> {
        section.entries.iter().map(|e| (e.number, e.answer.as_str())).collect()
    }

    #[test]
    fn single_round_scenario() {
        let doc = parse(&lines(&["Round 1: Hubba Hubba!", "1. ABBA", "2. Caribbean Sea"])).unwrap();
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].title, "Round 1: Hubba Hubba!");
        assert_eq!(doc.sections[0].kind, SectionKind::Round(1));
        assert_eq!(pairs(&doc.sections[0]), vec![(1, "ABBA"), (2, "Caribbean Sea")]);
    }

    #[test]
    fn continuation_and_tiebreaker_scenario() {
        let doc = parse(&lines(&[
            "Round 1: X",
            "1. Long answer part",
            "continued here",
            "Tiebreaker",
            "1. 42",
        ]))
        .unwrap();
        assert_eq!(doc.sections.len(), 2);
        assert_eq!(pairs(&doc.sections[0]), vec![(1, "Long answer part continued here")]);
        assert_eq!(doc.sections[1].title, "Tiebreaker");
        assert!(doc.sections[1].is_tiebreaker());
        assert_eq!(pairs(&doc.sections[1]), vec![(1, "42")]);
    }

    #[test]
    fn continuation_join_matches_single_line_form() {
        let split = parse(&lines(&["Round 1: X", "1. The Strait", "of Gibraltar"])).unwrap();
        let joined = parse(&lines(&["Round 1: X", "1. The Strait of Gibraltar"])).unwrap();
        assert_eq!(split, joined);
    }

    #[test]
    fn marker_on_continuation_line_is_removed() {
        let split = parse(&lines(&["Round 1: X", "1.", "A: Blondie"])).unwrap();
        let joined = parse(&lines(&["Round 1: X", "1. A: Blondie"])).unwrap();
        assert_eq!(pairs(&split.sections[0]), vec![(1, "Blondie")]);
        assert_eq!(split, joined);
    }

    /// Title line, then one `"{n}. {answer}"` line per entry.
    fn regenerate(doc: &Document) -> Vec<Line> {
        let mut texts = Vec::new();
        for section in &doc.sections {
            texts.push(section.title.clone());
            for entry in &section.entries {
                texts.push(format!("{}. {}", entry.number, entry.answer));
            }
        }
        Line::from_texts(texts)
    }

    #[test]
    fn reparsing_regenerated_text_yields_same_document() {
        let first = parse(&lines(&[
            "Round 1: Hubba Hubba!",
            "1. The Strait",
            "of Gibraltar",
            "2.",
            "Caribbean Sea",
            "3. A: Blondie",
            "4.",
            "Answer: A: Yes",
            "5. Answer: A. Lincoln",
            "Round 2: Empty",
            "Tie-breaker: Closest wins",
            "1) “Don’t Stop Believin’” — Journey",
            "2: 3.14 meters",
            "   wrapped  tail ",
        ]))
        .unwrap();
        assert_eq!(
            pairs(&first.sections[0]),
            vec![
                (1, "The Strait of Gibraltar"),
                (2, "Caribbean Sea"),
                (3, "Blondie"),
                (4, "Yes"),
                (5, "A. Lincoln"),
            ]
        );

        let again = parse(&regenerate(&first)).unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn no_headings_is_a_parse_error() {
        let err = parse(&lines(&["1. ABBA", "2. Caribbean Sea", "some text"])).unwrap_err();
        assert_eq!(err, ParseError::NoSections { lines: 3 });
    }

    #[test]
    fn empty_and_blank_input_is_a_parse_error() {
        assert_eq!(parse(&[]).unwrap_err(), ParseError::EmptyInput);
        assert_eq!(parse(&lines(&["", "   ", "\t"])).unwrap_err(), ParseError::EmptyInput);
    }

    #[test]
    fn one_section_per_heading_in_order() {
        let doc = parse(&lines(&[
            "Round 1: First",
            "1. a",
            "Round 2: Second",
            "Round 3: Third",
            "1. c",
            "Tiebreakers",
        ]))
        .unwrap();
        let titles: Vec<&str> = doc.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Round 1: First", "Round 2: Second", "Round 3: Third", "Tiebreakers"]);
        assert!(doc.sections[1].entries.is_empty());
        assert!(doc.sections[3].entries.is_empty());
    }

    #[test]
    fn orphan_questions_are_reported_not_kept() {
        let parsed = parse_with_report(
            &lines(&["1. stray", "Round 1: X", "1. kept"]),
            &ParserConfig::default(),
        )
        .unwrap();
        assert_eq!(pairs(&parsed.document.sections[0]), vec![(1, "kept")]);
        assert_eq!(
            parsed.report.anomalies,
            vec![Anomaly { line: 0, kind: AnomalyKind::OrphanQuestion, text: "1. stray".to_string() }]
        );
    }

    #[test]
    fn text_before_first_entry_is_an_unmatched_continuation() {
        let parsed = parse_with_report(
            &lines(&["Geeks Who Drink", "Round 1: X", "Answers are below", "1. kept"]),
            &ParserConfig::default(),
        )
        .unwrap();
        let kinds: Vec<(usize, AnomalyKind)> =
            parsed.report.anomalies.iter().map(|a| (a.line, a.kind)).collect();
        assert_eq!(
            kinds,
            vec![(0, AnomalyKind::UnmatchedContinuation), (2, AnomalyKind::UnmatchedContinuation)]
        );
        assert_eq!(pairs(&parsed.document.sections[0]), vec![(1, "kept")]);
    }

    #[test]
    fn blank_lines_do_not_break_continuations() {
        let doc = parse(&lines(&["Round 1: X", "1. New", "", "  ", "Zealand", "2. Fiji"])).unwrap();
        assert_eq!(pairs(&doc.sections[0]), vec![(1, "New Zealand"), (2, "Fiji")]);
    }

    #[test]
    fn duplicates_and_gaps_are_preserved() {
        let doc = parse(&lines(&["Round 1: X", "1. a", "1. b", "4. c", "2. d"])).unwrap();
        assert_eq!(pairs(&doc.sections[0]), vec![(1, "a"), (1, "b"), (4, "c"), (2, "d")]);
    }

    #[test]
    fn number_only_line_takes_answer_from_next_line() {
        let doc = parse(&lines(&["Round 1: X", "1.", "ABBA"])).unwrap();
        assert_eq!(pairs(&doc.sections[0]), vec![(1, "ABBA")]);
    }

    #[test]
    fn report_counts_each_line_once() {
        let input = lines(&["Round 1: X", "1. a", "more", "", "Tiebreaker", "1. 42"]);
        let report = parse_with_report(&input, &ParserConfig::default()).unwrap().report;
        assert_eq!((report.headings, report.questions, report.continuations, report.blanks), (2, 2, 1, 1));
        assert_eq!(report.headings + report.questions + report.continuations + report.blanks, input.len());
    }

    #[test]
    fn step_closes_previous_section_on_heading() {
        let line0 = Line::new(0, "Round 1: X");
        let (state, event, kind) = step(ParserState::NoSection, &line0);
        assert_eq!(event, StepEvent::Nothing);
        assert_eq!(kind.tag(), 'H');
        let line1 = Line::new(1, "1. a");
        let (state, _, kind) = step(state, &line1);
        assert_eq!(kind, LineKind::Question { number: 1, answer: "a" });
        let (state, event, _) = step(state, &Line::new(2, "Tiebreaker"));
        match event {
            StepEvent::Closed(section) => assert_eq!(pairs(&section), vec![(1, "a")]),
            other => panic!("expected closed section, got {:?}", other),
        }
        assert_eq!(state, ParserState::InSection(Section::new("Tiebreaker", SectionKind::Tiebreaker)));
    }

    #[test]
    fn config_post_processing() {
        let config = ParserConfig {
            split_question_text: true,
            clean_answers: true,
            skip_empty_sections: true,
        };
        let parsed = parse_with_report(
            &lines(&[
                "Round 1: X",
                "1. Which band sang Waterloo? ABBA | (note: accept Abba)",
                "Round 2: Empty",
                "Round 3: Y",
                "1. Red/Blue",
            ]),
            &config,
        )
        .unwrap();
        let doc = parsed.document;
        assert_eq!(doc.sections.len(), 2);
        assert_eq!(pairs(&doc.sections[0]), vec![(1, "ABBA")]);
        assert_eq!(doc.sections[1].title, "Round 3: Y");
        assert_eq!(pairs(&doc.sections[1]), vec![(1, "Red / Blue")]);
    }

    #[test]
    fn skipping_every_section_is_a_parse_error() {
        let config = ParserConfig { skip_empty_sections: true, ..ParserConfig::default() };
        let err = parse_with_report(&lines(&["Round 1: X", "Round 2: Y"]), &config).unwrap_err();
        assert_eq!(err, ParseError::NoSections { lines: 2 });
    }
}
