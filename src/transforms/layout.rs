//! Whitespace and layout passes
//!
//! These passes move blanks between Text fragments and the sentences around them, and
//! cut fragment lists into display chunks. They assume consecutive Text fragments have
//! been merged by [`coalesce_text`].

use crate::enriched::RichFragment;
use crate::literate;
use crate::location::Addressing;
use once_cell::sync::Lazy;
use regex::Regex;

static BLANKS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\A([ \t]*(?:\n|\z))?(.*?)([ \t]*)\z").unwrap());

static LEADING_BLANK_LINES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A(?:[ \t]*\n)+").unwrap());

static TRAILING_BLANK_LINES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\n[ \t]*)+\z").unwrap());

/// Two or more consecutive blank lines
pub static DEFAULT_CHUNK_DELIMITER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:[ \t]*\n){2,}").unwrap());

/// Split `text` into leading blanks up to and including the first newline, the body,
/// and trailing blanks
pub fn isolate_blanks(text: &str) -> (&str, &str, &str) {
    let Some(caps) = BLANKS_RE.captures(text) else {
        return ("", text, "");
    };
    let before = caps.get(1).map_or("", |m| m.as_str());
    let body = caps.get(2).map_or("", |m| m.as_str());
    let after = caps.get(3).map_or("", |m| m.as_str());
    (before, body, after)
}

/// Attach the blanks around sentences to the sentences themselves.
///
/// Blanks after a sentence up to and including the newline become its suffix, so a
/// block display of its output can hide the line break. Indentation at the start of a
/// line becomes the prefix of the sentence that follows.
pub fn group_whitespace_with_code(fragments: Vec<RichFragment>) -> Vec<RichFragment> {
    let mut grouped: Vec<Option<RichFragment>> = fragments.into_iter().map(Some).collect();

    for idx in 0..grouped.len() {
        let contents = match &grouped[idx] {
            Some(RichFragment::Text(text)) => text.contents.clone(),
            _ => continue,
        };
        let text = contents.to_string();
        let (before, _, after) = isolate_blanks(&text);
        let mut start = 0;
        let mut end = text.len();

        if !before.is_empty() && idx > 0 {
            if let Some(RichFragment::Sentence(previous)) = &mut grouped[idx - 1] {
                previous.suffixes.push(before.to_string());
                start = before.len();
            }
        }
        if !after.is_empty() {
            if let Some(Some(RichFragment::Sentence(next))) = grouped.get_mut(idx + 1) {
                next.prefixes.push(after.to_string());
                end = text.len() - after.len();
            }
        }

        grouped[idx] = contents
            .slice(start..end, Addressing::Bytes)
            .filter(|rest| !rest.is_empty())
            .map(RichFragment::text);
    }

    grouped.into_iter().flatten().collect()
}

/// Merge consecutive Text fragments
pub fn coalesce_text(fragments: Vec<RichFragment>) -> Vec<RichFragment> {
    let mut coalesced: Vec<RichFragment> = Vec::with_capacity(fragments.len());
    for fragment in fragments {
        if let (RichFragment::Text(next), Some(RichFragment::Text(last))) =
            (&fragment, coalesced.last_mut())
        {
            last.contents = last.contents.concat(&next.contents);
            continue;
        }
        coalesced.push(fragment);
    }
    coalesced
}

/// Remove blank lines at the start and end of a fragment list
pub fn strip_text(mut fragments: Vec<RichFragment>) -> Vec<RichFragment> {
    while let Some(RichFragment::Text(text)) = fragments.first_mut() {
        text.contents = text.contents.regex_substitute(&LEADING_BLANK_LINES_RE, &[]);
        if !text.contents.is_empty() {
            break;
        }
        fragments.remove(0);
    }

    while let Some(RichFragment::Text(text)) = fragments.last_mut() {
        text.contents = text.contents.regex_substitute(&TRAILING_BLANK_LINES_RE, &[]);
        if !text.contents.is_empty() {
            break;
        }
        fragments.pop();
    }

    fragments
}

/// Cut a fragment list into chunks at Text fragments that start with `delimiter`.
///
/// The delimiter itself is dropped.
pub fn partition_fragments(
    fragments: Vec<RichFragment>,
    delimiter: &Regex,
) -> Vec<Vec<RichFragment>> {
    let mut partitioned: Vec<Vec<RichFragment>> = vec![Vec::new()];

    for mut fragment in fragments {
        if let RichFragment::Text(text) = &mut fragment {
            if let Some((_, _, rest)) = text.contents.regex_match_groups(delimiter) {
                if partitioned.last().map_or(false, |chunk| !chunk.is_empty()) {
                    partitioned.push(Vec::new());
                }
                if rest.is_empty() {
                    continue;
                }
                text.contents = rest;
            }
        }
        if let Some(chunk) = partitioned.last_mut() {
            chunk.push(fragment);
        }
    }

    partitioned
}

static COQDOC_OPEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\A\(\*\*\s").unwrap());

static COQDOC_SPECIAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A\(\*\* +(remove +)?printing ").unwrap());

/// A run of a literate document: a documentation comment, or the code between two
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoqdocPart {
    /// A `(** ... *)` comment, delimiters included
    Coqdoc(String),
    Code(Vec<RichFragment>),
}

impl CoqdocPart {
    /// `(** printing ... *)` and `(** remove printing ... *)` directives
    pub fn is_special(&self) -> bool {
        match self {
            CoqdocPart::Coqdoc(text) => COQDOC_SPECIAL_RE.is_match(text),
            CoqdocPart::Code(_) => false,
        }
    }
}

/// Split Text fragments at top-level documentation comments.
///
/// Fragments between two documentation comments are grouped into a code run, with blank
/// lines stripped at both ends. Runs left empty are dropped.
pub fn isolate_coqdoc(fragments: Vec<RichFragment>) -> Vec<CoqdocPart> {
    fn push_code(parts: &mut Vec<CoqdocPart>, fragment: RichFragment) {
        if let Some(CoqdocPart::Code(code)) = parts.last_mut() {
            code.push(fragment);
        } else {
            parts.push(CoqdocPart::Code(vec![fragment]));
        }
    }

    let mut parts: Vec<CoqdocPart> = Vec::new();

    for fragment in fragments {
        let contents = match &fragment {
            RichFragment::Text(text) => text.contents.clone(),
            RichFragment::Sentence(_) => {
                push_code(&mut parts, fragment);
                continue;
            }
        };

        let text = contents.to_string();
        let mut start = 0;
        for span in literate::partition(&text) {
            let end = start + span.text().len();
            if span.is_comment() && COQDOC_OPEN_RE.is_match(span.text()) {
                parts.push(CoqdocPart::Coqdoc(span.text().to_string()));
            } else if let Some(piece) = contents.slice(start..end, Addressing::Bytes) {
                push_code(&mut parts, RichFragment::text(piece));
            }
            start = end;
        }
    }

    parts
        .into_iter()
        .filter_map(|part| match part {
            CoqdocPart::Code(code) => {
                let code = strip_text(coalesce_text(code));
                (!code.is_empty()).then_some(CoqdocPart::Code(code))
            }
            coqdoc => Some(coqdoc),
        })
        .collect()
}

/// A line over the length threshold (1-based line number)
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct LongLine {
    pub line: usize,
    pub text: String,
}

/// Report lines longer than `threshold` characters, counting sentence prefixes and suffixes
pub fn find_long_lines(fragments: &[RichFragment], threshold: usize) -> Vec<LongLine> {
    let mut long_lines = Vec::new();
    let mut line = 1;
    let mut pending = String::new();

    let mut check = |line: usize, text: &str| {
        if text.chars().count() > threshold {
            long_lines.push(LongLine {
                line,
                text: text.to_string(),
            });
        }
    };

    for fragment in fragments {
        let mut joined = std::mem::take(&mut pending);
        match fragment {
            RichFragment::Sentence(sentence) => {
                joined.push_str(&sentence.prefixes.concat());
                joined.push_str(&sentence.text());
                joined.push_str(&sentence.suffixes.concat());
            }
            RichFragment::Text(text) => joined.push_str(&text.contents.to_string()),
        }

        let mut lines: Vec<&str> = joined.split('\n').collect();
        let last = lines.pop().unwrap_or("");
        for (offset, text) in lines.iter().enumerate() {
            check(line + offset, text);
        }
        line += lines.len();
        pending = last.to_string();
    }
    check(line, &pending);

    long_lines
}
