// src/extractors/stream.rs
//! Built-in fallback extractor. Finds every `stream … endstream` body,
//! inflates it, and replays the text operators of content streams to rebuild
//! lines. No font decoding: strings are read as single-byte WinAnsi text, so
//! CID-keyed fonts come out as noise and are filtered away.

use crate::extractors::{ensure_pdf_header, Extracted, TextExtractor};
use crate::rubric::Line;
use crate::utils::error::ExtractionError;
use flate2::read::ZlibDecoder;
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use std::io::Read;
use std::path::Path;

// --- Constants ---
// TJ adjustments are in thousandths of a text unit; anything wider than this
// is a word gap rather than kerning.
const TJ_SPACE_THRESHOLD: f64 = -200.0;
// Share of printable bytes a string needs before it is treated as text.
const PRINTABLE_RATIO: f64 = 0.8;

// The end-of-line before `endstream` stays in the capture; zlib stops at the
// end of its own data and plain content streams ignore trailing whitespace.
static STREAM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s-u)stream\r?\n(.*?)endstream").expect("Failed to compile STREAM_RE")
});

#[derive(Debug, Default)]
pub struct StreamExtractor;

impl StreamExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl TextExtractor for StreamExtractor {
    fn name(&self) -> &'static str {
        "builtin"
    }

    fn extract(&self, path: &Path) -> Result<Extracted, ExtractionError> {
        let bytes = std::fs::read(path)?;
        ensure_pdf_header(&bytes)?;

        let texts = extract_lines(&bytes);
        if texts.is_empty() {
            return Err(ExtractionError::NoTextLayer);
        }
        tracing::info!("Built-in scanner produced {} lines from {}", texts.len(), path.display());
        Ok(Extracted {
            backend: self.name(),
            lines: Line::from_texts(texts),
        })
    }
}

/// Runs every content stream in the file, in file order.
pub fn extract_lines(pdf: &[u8]) -> Vec<String> {
    let mut collector = TextCollector::default();
    let mut streams = 0usize;

    for caps in STREAM_RE.captures_iter(pdf) {
        let Some(raw) = caps.get(1) else { continue };
        let raw = raw.as_bytes();
        let content = match inflate(raw) {
            Some(inflated) => inflated,
            // Uncompressed content streams are rare but legal
            None if looks_like_content(raw) => raw.to_vec(),
            None => {
                tracing::trace!("Skipping stream of {} bytes that is neither zlib nor text", raw.len());
                continue;
            }
        };
        if !looks_like_content(&content) {
            continue;
        }
        streams += 1;
        run_content(&content, &mut collector);
        collector.break_line();
    }

    tracing::debug!("Replayed {} content streams", streams);
    collector.lines
}

fn inflate(raw: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(raw).read_to_end(&mut out).ok()?;
    Some(out)
}

fn looks_like_content(bytes: &[u8]) -> bool {
    bytes.windows(2).any(|w| w == b"BT")
}

// --- Tokenizer ---

#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Str(Vec<u8>),
    Num(f64),
    Array(Vec<Operand>),
    Other,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Operand(Operand),
    ArrayStart,
    ArrayEnd,
    Operator(String),
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0c | 0x00)
}

fn is_delimiter(b: u8) -> bool {
    matches!(b, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

struct Tokenizer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn read_regular(&mut self) -> &'a [u8] {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if is_whitespace(b) || is_delimiter(b) {
                break;
            }
            self.pos += 1;
        }
        &self.data[start..self.pos]
    }

    fn read_literal(&mut self) -> Vec<u8> {
        // Opening paren already consumed
        let mut out = Vec::new();
        let mut depth = 1;
        while let Some(b) = self.peek() {
            self.pos += 1;
            match b {
                b'\\' => {
                    let Some(next) = self.peek() else { break };
                    self.pos += 1;
                    match next {
                        b'n' => out.push(b'\n'),
                        b'r' => out.push(b'\r'),
                        b't' => out.push(b'\t'),
                        b'b' => out.push(0x08),
                        b'f' => out.push(0x0c),
                        b'0'..=b'7' => {
                            let mut value = u32::from(next - b'0');
                            for _ in 0..2 {
                                match self.peek() {
                                    Some(d @ b'0'..=b'7') => {
                                        value = value * 8 + u32::from(d - b'0');
                                        self.pos += 1;
                                    }
                                    _ => break,
                                }
                            }
                            out.push((value & 0xff) as u8);
                        }
                        // Backslash-newline continues the string on the next line
                        b'\r' => {
                            if self.peek() == Some(b'\n') {
                                self.pos += 1;
                            }
                        }
                        b'\n' => {}
                        other => out.push(other),
                    }
                }
                b'(' => {
                    depth += 1;
                    out.push(b);
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    out.push(b);
                }
                _ => out.push(b),
            }
        }
        out
    }

    fn read_hex(&mut self) -> Vec<u8> {
        // Opening angle bracket already consumed
        let mut digits = Vec::new();
        while let Some(b) = self.peek() {
            self.pos += 1;
            if b == b'>' {
                break;
            }
            if let Some(d) = (b as char).to_digit(16) {
                digits.push(d as u8);
            }
        }
        if digits.len() % 2 == 1 {
            digits.push(0);
        }
        digits.chunks(2).map(|pair| pair[0] << 4 | pair[1]).collect()
    }

    /// Skips inline image data up to the `EI` operator.
    fn skip_inline_image(&mut self) {
        while self.pos + 2 <= self.data.len() {
            let at_ei = &self.data[self.pos..self.pos + 2] == b"EI";
            let before_ok = self.pos == 0 || is_whitespace(self.data[self.pos - 1]);
            let after_ok = self.data.get(self.pos + 2).map_or(true, |&b| is_whitespace(b));
            if at_ei && before_ok && after_ok {
                self.pos += 2;
                return;
            }
            self.pos += 1;
        }
        self.pos = self.data.len();
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            let b = self.peek()?;
            if is_whitespace(b) {
                self.pos += 1;
                continue;
            }
            if b == b'%' {
                while let Some(c) = self.peek() {
                    if c == b'\n' || c == b'\r' {
                        break;
                    }
                    self.pos += 1;
                }
                continue;
            }

            self.pos += 1;
            let token = match b {
                b'(' => Token::Operand(Operand::Str(self.read_literal())),
                b'<' if self.peek() == Some(b'<') => {
                    self.pos += 1;
                    Token::Operand(Operand::Other)
                }
                b'<' => Token::Operand(Operand::Str(self.read_hex())),
                b'>' => {
                    if self.peek() == Some(b'>') {
                        self.pos += 1;
                    }
                    Token::Operand(Operand::Other)
                }
                b'[' => Token::ArrayStart,
                b']' => Token::ArrayEnd,
                b'/' => {
                    self.read_regular();
                    Token::Operand(Operand::Other)
                }
                b'{' | b'}' | b')' => Token::Operand(Operand::Other),
                _ => {
                    self.pos -= 1;
                    let word = self.read_regular();
                    if word.is_empty() {
                        // Unknown delimiter byte; step over it
                        self.pos += 1;
                        continue;
                    }
                    let first = word[0];
                    if first.is_ascii_digit() || matches!(first, b'+' | b'-' | b'.') {
                        match std::str::from_utf8(word).ok().and_then(|w| w.parse::<f64>().ok()) {
                            Some(n) => Token::Operand(Operand::Num(n)),
                            None => Token::Operand(Operand::Other),
                        }
                    } else {
                        let word = String::from_utf8_lossy(word).into_owned();
                        if matches!(word.as_str(), "true" | "false" | "null") {
                            Token::Operand(Operand::Other)
                        } else {
                            if word == "ID" {
                                self.skip_inline_image();
                            }
                            Token::Operator(word)
                        }
                    }
                }
            };
            return Some(token);
        }
    }
}

// --- Text replay ---

#[derive(Default)]
struct TextCollector {
    lines: Vec<String>,
    current: String,
    last_y: Option<f64>,
}

impl TextCollector {
    fn push_text(&mut self, bytes: &[u8]) {
        if !is_mostly_printable(bytes) {
            return;
        }
        self.current.extend(bytes.iter().filter_map(|&b| decode_byte(b)));
    }

    fn space(&mut self) {
        if !self.current.is_empty() && !self.current.ends_with(' ') {
            self.current.push(' ');
        }
    }

    fn break_line(&mut self) {
        let line = sanitize(&std::mem::take(&mut self.current));
        if !line.is_empty() {
            self.lines.push(line);
        }
    }
}

fn run_content(content: &[u8], collector: &mut TextCollector) {
    let mut operands: Vec<Operand> = Vec::new();
    let mut arrays: Vec<Vec<Operand>> = Vec::new();

    for token in Tokenizer::new(content) {
        match token {
            Token::ArrayStart => arrays.push(Vec::new()),
            Token::ArrayEnd => {
                if let Some(done) = arrays.pop() {
                    let array = Operand::Array(done);
                    match arrays.last_mut() {
                        Some(parent) => parent.push(array),
                        None => operands.push(array),
                    }
                }
            }
            Token::Operand(operand) => match arrays.last_mut() {
                Some(array) => array.push(operand),
                None => operands.push(operand),
            },
            Token::Operator(op) => {
                arrays.clear();
                apply_operator(&op, &operands, collector);
                operands.clear();
            }
        }
    }
}

fn apply_operator(op: &str, operands: &[Operand], collector: &mut TextCollector) {
    match op {
        "Tj" => {
            if let Some(Operand::Str(s)) = operands.last() {
                collector.push_text(s);
            }
        }
        "'" | "\"" => {
            collector.break_line();
            if let Some(Operand::Str(s)) = operands.last() {
                collector.push_text(s);
            }
        }
        "TJ" => {
            if let Some(Operand::Array(items)) = operands.last() {
                for item in items {
                    match item {
                        Operand::Str(s) => collector.push_text(s),
                        Operand::Num(n) if *n < TJ_SPACE_THRESHOLD => collector.space(),
                        _ => {}
                    }
                }
            }
        }
        "Td" | "TD" => {
            if let [.., Operand::Num(tx), Operand::Num(ty)] = operands {
                if *ty != 0.0 {
                    collector.break_line();
                } else if *tx != 0.0 {
                    collector.space();
                }
                if let Some(y) = collector.last_y.as_mut() {
                    *y += *ty;
                }
            }
        }
        "Tm" => {
            if let [.., Operand::Num(y)] = operands {
                match collector.last_y {
                    Some(last) if (last - *y).abs() < f64::EPSILON => collector.space(),
                    _ => collector.break_line(),
                }
                collector.last_y = Some(*y);
            }
        }
        "T*" | "ET" => collector.break_line(),
        "BT" => collector.last_y = None,
        _ => {}
    }
}

// --- Byte decoding ---

/// WinAnsi decoding for the bytes we keep. Control bytes map to `None`.
fn decode_byte(b: u8) -> Option<char> {
    match b {
        b'\t' | b'\n' | b'\r' => Some(' '),
        0x20..=0x7e => Some(b as char),
        0x85 => Some('…'),
        0x91 => Some('‘'),
        0x92 => Some('’'),
        0x93 => Some('“'),
        0x94 => Some('”'),
        0x95 => Some('•'),
        0x96 => Some('–'),
        0x97 => Some('—'),
        0xa0 => Some(' '),
        0xa1..=0xff => Some(b as char),
        _ => None,
    }
}

fn is_mostly_printable(bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return false;
    }
    let printable = bytes.iter().filter(|&&b| decode_byte(b).is_some()).count();
    printable == bytes.len() || printable as f64 >= bytes.len() as f64 * PRINTABLE_RATIO
}

/// Drops language-tag artifacts and collapses whitespace.
fn sanitize(line: &str) -> String {
    line.replace("en-US", " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn replay(content: &[u8]) -> Vec<String> {
        let mut collector = TextCollector::default();
        run_content(content, &mut collector);
        collector.break_line();
        collector.lines
    }

    fn pdf_with_streams(streams: &[&[u8]]) -> Vec<u8> {
        let mut pdf = b"%PDF-1.4\n".to_vec();
        for (i, content) in streams.iter().enumerate() {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(content).unwrap();
            let compressed = encoder.finish().unwrap();
            pdf.extend_from_slice(
                format!("{} 0 obj\n<< /Length {} /Filter /FlateDecode >>\nstream\n", i + 1, compressed.len()).as_bytes(),
            );
            pdf.extend_from_slice(&compressed);
            pdf.extend_from_slice(b"\nendstream\nendobj\n");
        }
        pdf.extend_from_slice(b"%%EOF\n");
        pdf
    }

    #[test]
    fn tj_strings_and_line_moves() {
        let lines = replay(b"BT /F1 12 Tf 72 720 Td (Round 1: Hubba Hubba!) Tj 0 -14 Td (1. ABBA) Tj T* (2. Caribbean Sea) Tj ET");
        assert_eq!(lines, vec!["Round 1: Hubba Hubba!", "1. ABBA", "2. Caribbean Sea"]);
    }

    #[test]
    fn tj_arrays_insert_spaces_for_wide_gaps_only() {
        let lines = replay(b"BT [(1.) -250 (Car) 15 (ib) -30 (bean Sea)] TJ ET");
        assert_eq!(lines, vec!["1. Caribbean Sea"]);
    }

    #[test]
    fn horizontal_moves_separate_words() {
        let lines = replay(b"BT 72 700 Td (1.) Tj 20 0 Td (ABBA) Tj ET");
        assert_eq!(lines, vec!["1. ABBA"]);
    }

    #[test]
    fn text_matrix_breaks_on_new_baseline() {
        let lines = replay(b"BT 1 0 0 1 72 700 Tm (Tiebreaker) Tj 1 0 0 1 72 680 Tm (1.) Tj 1 0 0 1 90 680 Tm (42) Tj ET");
        assert_eq!(lines, vec!["Tiebreaker", "1. 42"]);
    }

    #[test]
    fn literal_string_escapes() {
        let lines = replay(br"BT (Guns \(N\) Roses) Tj T* (Caf\351 \\ Bar) Tj T* (nested (parens\) ok)) Tj ET");
        assert_eq!(lines, vec!["Guns (N) Roses", "Café \\ Bar", "nested (parens) ok)"]);
    }

    #[test]
    fn hex_strings_and_winansi_quotes() {
        // <93 48 69 94> is “Hi” in WinAnsi
        let lines = replay(b"BT <41424241> Tj T* <93486994> Tj ET");
        assert_eq!(lines, vec!["ABBA", "\u{201c}Hi\u{201d}"]);
    }

    #[test]
    fn binary_strings_are_dropped() {
        let lines = replay(b"BT <0001000200030004> Tj T* (kept) Tj ET");
        assert_eq!(lines, vec!["kept"]);
    }

    #[test]
    fn marked_content_operands_are_not_text() {
        let lines = replay(b"/Span <</Lang (en-US) /MCID 0>> BDC BT (1. ABBA) Tj ET EMC");
        assert_eq!(lines, vec!["1. ABBA"]);
    }

    #[test]
    fn extracts_lines_from_compressed_streams_in_order() {
        let pdf = pdf_with_streams(&[
            b"BT (Round 1: X) Tj T* (1. Long answer part) Tj T* (continued here) Tj ET",
            b"\x00\x01\x02 not content",
            b"BT (Tiebreaker) Tj T* (1. 42) Tj ET",
        ]);
        assert_eq!(
            extract_lines(&pdf),
            vec!["Round 1: X", "1. Long answer part", "continued here", "Tiebreaker", "1. 42"]
        );
    }

    #[test]
    fn extractor_reports_missing_text_layer() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&pdf_with_streams(&[b"q 100 0 0 100 0 0 cm /Im0 Do Q"])).unwrap();
        let result = StreamExtractor::default().extract(file.path());
        assert!(matches!(result, Err(ExtractionError::NoTextLayer)));
    }

    #[test]
    fn extractor_returns_numbered_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&pdf_with_streams(&[b"BT (Round 1: X) Tj T* (1. ABBA) Tj ET"])).unwrap();
        let extracted = StreamExtractor::new().extract(file.path()).unwrap();
        assert_eq!(extracted.backend, "builtin");
        assert_eq!(extracted.lines, Line::from_texts(["Round 1: X", "1. ABBA"]));
    }

    #[test]
    fn sanitize_collapses_whitespace() {
        assert_eq!(sanitize("  1.\tABBA   en-US "), "1. ABBA");
    }
}
