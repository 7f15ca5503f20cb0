// src/rubric/clean.rs
//! Optional answer post-processing, applied to each entry once its section closes.

use once_cell::sync::Lazy;
use regex::Regex;

static NOTE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\|\s*\(note:.*$").expect("Failed to compile NOTE_RE")
});
static SLASH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*/\s*").expect("Failed to compile SLASH_RE"));
static COMMA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*,\s*").expect("Failed to compile COMMA_RE"));
// regex has no lookaround, so the digit on each side is captured and put back
static DIGIT_COMMA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d), (\d)").expect("Failed to compile DIGIT_COMMA_RE"));
static MULTI_SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").expect("Failed to compile MULTI_SPACE_RE"));

/// For exports that print "question? answer" on one line: keeps the text after
/// the last `?` (or, failing that, the last `!`). Returns the input unchanged
/// when there is no marker or nothing follows it.
pub fn split_question_text(text: &str) -> &str {
    for marker in ['?', '!'] {
        if let Some(pos) = text.rfind(marker) {
            let trailing = text[pos + marker.len_utf8()..].trim();
            return if trailing.is_empty() { text } else { trailing };
        }
    }
    text
}

/// Strips grader notes and tidies delimiter spacing.
pub fn clean_answer(answer: &str) -> String {
    let answer = NOTE_RE.replace(answer.trim(), "");
    let answer = answer.trim_end().trim_end_matches('|').trim();
    let answer = SLASH_RE.replace_all(answer, " / ");
    let mut answer = COMMA_RE.replace_all(&answer, ", ").into_owned();
    // Adjacent numbers share digits ("1, 2, 3"), so repeat until stable
    while DIGIT_COMMA_RE.is_match(&answer) {
        answer = DIGIT_COMMA_RE.replace_all(&answer, "$1,$2").into_owned();
    }
    MULTI_SPACE_RE.replace_all(&answer, " ").trim().to_string()
}
