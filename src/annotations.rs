//! Visibility annotations
//!
//! Sentences carry inline comments such as `(* .none .in *)` or `(* -.h#IH *)` that decide
//! which parts of their input and output get rendered. This module parses those comments
//! into an [`IoAnnots`] value and strips them from the sentence text.
//!
//! ## Coarse filters
//!
//! Four flags ([`Flag`]) toggle the sentence input, hypotheses, conclusions, and messages.
//! Until a filter directive is seen every flag is shown. The first filter directive picks
//! a baseline before applying itself:
//!
//! - a negated directive (`no-hyps`) starts from everything shown
//! - a positive one (`in`) starts from everything hidden
//!
//! so `(* .in *)` shows only the input, while `(* .no-hyps *)` hides only hypotheses.
//! `out` stands for messages, hyps, and ccls; `goals` for hyps and ccls.
//!
//! ## Fine-grained paths
//!
//! Dotted paths (see [`crate::markers`]) with an optional `+`/`-` polarity are recorded in
//! order and applied at commit time, after the coarse filters.
//!
//! ## Two syntaxes
//!
//! Inside comments every directive is dotted (`.fold`, `.no-hyps`, `-.g#2`). Directive
//! strings given out of band (document defaults, command-line flags) use bare words for
//! flags (`fold no-hyps -.g#2`); see [`process_io_flags`].

use crate::content::FragmentContent;
use crate::markers::{self, Leaf, MarkerError, MarkerPath, Matcher, LEVEL_KEYS};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

const SEGMENT: &str = r"\.[-a-z]+(?:#[^\s.(){}]+|\([^)]*\)|\{[^}]*\})?";

/// A whole annotation comment, with the blanks that precede it on its line
static IO_COMMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"[ \t]*\(\*\s+(?:[-+]?(?:{})+\s+)+\*\)",
        SEGMENT
    ))
    .unwrap()
});

/// One or more path segments and nothing else
static SEGMENTS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"\A(?:{})+\z", SEGMENT)).unwrap());

static BARE_SEGMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\A\.([-a-z]+)\z").unwrap());

static FLAG_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\A[-a-z]+\z").unwrap());

/// Whitespace-separated words; selectors may contain blanks
static WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\([^)]*\)|\{[^}]*\}|[^\s])+").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnotationError {
    #[error("unknown flag {0:?}")]
    UnknownFlag(String),

    #[error(transparent)]
    Path(#[from] MarkerError),

    #[error("`.io` not supported in visibility annotations ({0})")]
    NestedIo(String),

    #[error("`.{leaf}` not supported in visibility annotations ({path})")]
    UnsupportedLeaf { path: String, leaf: &'static str },
}

/// Coarse visibility flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    In,
    Hyps,
    Ccls,
    Messages,
}

impl Flag {
    pub const ALL: [Flag; 4] = [Flag::In, Flag::Hyps, Flag::Ccls, Flag::Messages];

    /// Expand a flag or meta-flag name
    fn expand(name: &str) -> Option<&'static [Flag]> {
        let flags: &'static [Flag] = match name {
            "in" => &[Flag::In],
            "hyps" => &[Flag::Hyps],
            "ccls" => &[Flag::Ccls],
            "messages" => &[Flag::Messages],
            "out" => &[Flag::Messages, Flag::Hyps, Flag::Ccls],
            "goals" => &[Flag::Hyps, Flag::Ccls],
            _ => return None,
        };
        Some(flags)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Filters {
    #[serde(rename = "in")]
    pub input: bool,
    pub hyps: bool,
    pub ccls: bool,
    pub messages: bool,
}

impl Filters {
    pub const ALL: Filters = Filters::uniform(true);
    pub const NONE: Filters = Filters::uniform(false);

    const fn uniform(value: bool) -> Self {
        Filters {
            input: value,
            hyps: value,
            ccls: value,
            messages: value,
        }
    }

    pub fn get(&self, flag: Flag) -> bool {
        match flag {
            Flag::In => self.input,
            Flag::Hyps => self.hyps,
            Flag::Ccls => self.ccls,
            Flag::Messages => self.messages,
        }
    }

    pub fn set(&mut self, flag: Flag, value: bool) {
        match flag {
            Flag::In => self.input = value,
            Flag::Hyps => self.hyps = value,
            Flag::Ccls => self.ccls = value,
            Flag::Messages => self.messages = value,
        }
    }
}

/// Whether a path directive shows or hides what it selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Show,
    Hide,
}

/// Resolved annotation state of one sentence
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct IoAnnots {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Filters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unfold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fails: Option<bool>,
    /// Applied at commit time; renderers only see their effect
    #[serde(skip)]
    pub paths: Vec<(Polarity, MarkerPath)>,
}

impl IoAnnots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one undotted directive (`fold`, `no-hyps`, `out`, ...)
    pub fn update(&mut self, directive: &str) -> Result<(), AnnotationError> {
        match directive {
            "fails" => self.fails = Some(true),
            "succeeds" => self.fails = Some(false),
            "fold" => self.unfold = Some(false),
            "unfold" => self.unfold = Some(true),
            "all" => self.filters = Some(Filters::ALL),
            "none" => self.filters = Some(Filters::NONE),
            _ => {
                let (negated, name) = match directive.strip_prefix("no-") {
                    Some(name) => (true, name),
                    None => (false, directive),
                };
                let flags = Flag::expand(name)
                    .ok_or_else(|| AnnotationError::UnknownFlag(name.to_string()))?;

                let filters = self.filters.get_or_insert(if negated {
                    Filters::ALL
                } else {
                    Filters::NONE
                });
                for &flag in flags {
                    filters.set(flag, !negated);
                }
            }
        }
        Ok(())
    }

    /// Nothing at all is shown
    pub fn hide(&self) -> bool {
        self.filters == Some(Filters::NONE)
    }

    /// Whether `flag` is shown; everything is shown until a filter is set
    pub fn show(&self, flag: Flag) -> bool {
        self.filters.map_or(true, |filters| filters.get(flag))
    }

    /// Fill every unset field from `other`
    pub fn inherit(&mut self, other: &IoAnnots) {
        if self.filters.is_none() {
            self.filters = other.filters;
        }
        if self.unfold.is_none() {
            self.unfold = other.unfold;
        }
        if self.fails.is_none() {
            self.fails = other.fails;
        }
        if self.paths.is_empty() {
            self.paths = other.paths.clone();
        }
    }

    fn apply(&mut self, directive: Directive<'_>) -> Result<(), AnnotationError> {
        match directive {
            Directive::Flag(name) => self.update(name),
            Directive::Path(polarity, path) => {
                self.paths.push((polarity, visibility_path(path)?));
                Ok(())
            }
        }
    }
}

enum Directive<'a> {
    Flag(&'a str),
    Path(Polarity, &'a str),
}

/// Classify a dotted word; bare single segments that do not name a level are flags
fn classify_dotted(word: &str) -> Option<Directive<'_>> {
    let (polarity, rest) = match word.as_bytes().first() {
        Some(b'+') => (Some(Polarity::Show), &word[1..]),
        Some(b'-') => (Some(Polarity::Hide), &word[1..]),
        _ => (None, word),
    };
    if !SEGMENTS_RE.is_match(rest) {
        return None;
    }

    if polarity.is_none() {
        if let Some(caps) = BARE_SEGMENT_RE.captures(rest) {
            let key = caps.get(1).map_or("", |m| m.as_str());
            if !LEVEL_KEYS.contains(&key) {
                return Some(Directive::Flag(key));
            }
        }
    }

    Some(Directive::Path(polarity.unwrap_or(Polarity::Show), rest))
}

fn classify_undotted(word: &str) -> Option<Directive<'_>> {
    let dotted = word.starts_with('.') || word.starts_with("+.") || word.starts_with("-.");
    if dotted {
        classify_dotted(word)
    } else if FLAG_WORD_RE.is_match(word) {
        Some(Directive::Flag(word))
    } else {
        None
    }
}

/// Parse a path and check it only uses features visibility annotations support
fn visibility_path(path: &str) -> Result<MarkerPath, AnnotationError> {
    let mut parsed = markers::parse_path(path)?;

    if parsed.io.is_some() {
        return Err(AnnotationError::NestedIo(path.to_string()));
    }
    if let Some(leaf) = parsed.leaf {
        return Err(unsupported(path, leaf));
    }

    parsed.sentence.get_or_insert(Matcher::Top);
    if parsed.hyp.is_some() {
        parsed.goal.get_or_insert(Matcher::Top);
    }
    Ok(parsed)
}

fn unsupported(path: &str, leaf: Leaf) -> AnnotationError {
    AnnotationError::UnsupportedLeaf {
        path: path.to_string(),
        leaf: leaf.as_str(),
    }
}

/// Whether `text` contains at least one annotation comment
pub fn has_io_comment(text: &str) -> bool {
    IO_COMMENT_RE.is_match(text)
}

/// Apply every annotation comment of `contents` to `annots` and remove the comments
pub fn process_io_comments(
    annots: &mut IoAnnots,
    contents: &FragmentContent,
) -> Result<FragmentContent, AnnotationError> {
    let text = contents.to_string();
    if !has_io_comment(&text) {
        return Ok(contents.clone());
    }

    for comment in IO_COMMENT_RE.find_iter(&text) {
        let inner = comment.as_str().trim_start();
        let inner = inner.strip_prefix("(*").unwrap_or(inner);
        let inner = inner.strip_suffix("*)").unwrap_or(inner);

        for word in WORD_RE.find_iter(inner) {
            if let Some(directive) = classify_dotted(word.as_str()) {
                annots.apply(directive)?;
            }
        }
    }

    Ok(contents.regex_substitute(&IO_COMMENT_RE, &[]))
}

/// Apply an undotted directive string such as `"fold no-hyps -.h#x"`.
///
/// Words that are neither flags nor paths are returned, space-separated, as residue.
pub fn process_io_flags(annots: &mut IoAnnots, flags: &str) -> Result<String, AnnotationError> {
    let mut residue = Vec::new();
    for word in WORD_RE.find_iter(flags) {
        match classify_undotted(word.as_str()) {
            Some(directive) => annots.apply(directive)?,
            None => residue.push(word.as_str()),
        }
    }
    Ok(residue.join(" "))
}
