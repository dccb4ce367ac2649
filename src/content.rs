//! Token-backed fragment content
//!
//! A [`FragmentContent`] is an ordered list of [`FragmentToken`]s that together spell one
//! span of document text. It behaves as an immutable value: every operation returns new
//! containers, and equality compares token sequences.
//!
//! Invariants:
//!
//! - the container's length is the sum of its tokens' lengths
//! - concatenating the tokens' raw text gives the container's string value
//! - splitting at any offset `0 <= k <= len` gives two containers that concatenate back to
//!   the unsplit container; a token straddling the cut is itself cut in two, keeping its metadata
//!
//! Regex operations run against the flattened string and then rebuild the token list by
//! repeated offset splits, so token metadata survives substitution boundaries.

pub mod token;

pub use crate::location::Addressing;
pub use token::{FragmentToken, TypeInfo};

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Range};

/// An ordered sequence of content tokens
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "ContentRepr")]
pub struct FragmentContent {
    tokens: Vec<FragmentToken>,
}

/// Shapes in which drivers hand contents over: a plain string, a bare token list, or a
/// `{"tokens": [...]}` object.
#[derive(Deserialize)]
#[serde(untagged)]
enum ContentRepr {
    Plain(String),
    Tokens(Vec<FragmentToken>),
    Wrapped { tokens: Vec<FragmentToken> },
}

impl From<ContentRepr> for FragmentContent {
    fn from(repr: ContentRepr) -> Self {
        match repr {
            ContentRepr::Plain(text) => Self::from(text),
            ContentRepr::Tokens(tokens) | ContentRepr::Wrapped { tokens } => Self::new(tokens),
        }
    }
}

impl FragmentContent {
    /// Build a container; tokens with empty text carry nothing and are dropped
    pub fn new(tokens: Vec<FragmentToken>) -> Self {
        Self {
            tokens: tokens.into_iter().filter(|t| !t.raw.is_empty()).collect(),
        }
    }

    pub fn tokens(&self) -> &[FragmentToken] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<FragmentToken> {
        self.tokens
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.measure(Addressing::Chars)
    }

    /// Length in UTF-8 bytes
    pub fn byte_len(&self) -> usize {
        self.measure(Addressing::Bytes)
    }

    pub fn measure(&self, addressing: Addressing) -> usize {
        self.tokens
            .iter()
            .map(|t| addressing.measure(&t.raw))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn ends_with(&self, suffix: &str) -> bool {
        self.to_string().ends_with(suffix)
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.to_string().starts_with(prefix)
    }

    /// Append another container's tokens
    pub fn concat(&self, other: &FragmentContent) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.extend(other.tokens.iter().cloned());
        Self { tokens }
    }

    pub fn push(&mut self, token: FragmentToken) {
        if !token.raw.is_empty() {
            self.tokens.push(token);
        }
    }

    /// Split at a character offset. Negative offsets count from the end.
    ///
    /// Offsets at or past the end return `(self, empty)`.
    pub fn split_at_offset(&self, offset: isize) -> (Self, Self) {
        let cutoff = if offset < 0 {
            (self.len() as isize + offset).max(0) as usize
        } else {
            offset as usize
        };
        self.split_or_keep(cutoff, Addressing::Chars)
    }

    /// Split at an offset counted in `addressing` units.
    ///
    /// Returns `None` only for byte addressing when the cut falls inside a character.
    pub fn split_at(&self, cutoff: usize, addressing: Addressing) -> Option<(Self, Self)> {
        if cutoff >= self.measure(addressing) {
            return Some((self.clone(), Self::default()));
        }

        let mut before = Vec::new();
        let mut after = Vec::new();
        let mut position = 0;

        for token in &self.tokens {
            if !after.is_empty() {
                after.push(token.clone());
                continue;
            }

            let len = addressing.measure(&token.raw);
            if position + len <= cutoff {
                before.push(token.clone());
                position += len;
                continue;
            }

            let local = addressing.byte_index(&token.raw, cutoff - position)?;
            let (head, tail) = token.split_at_byte(local);
            before.push(head);
            after.push(tail);
        }

        Some((Self::new(before), Self::new(after)))
    }

    /// Sub-container covering `range` (in `addressing` units)
    pub fn slice(&self, range: Range<usize>, addressing: Addressing) -> Option<Self> {
        let (head, _) = self.split_at(range.end, addressing)?;
        let (_, middle) = head.split_at(range.start, addressing)?;
        Some(middle)
    }

    /// Split at every occurrence of `separator`, consuming the separators.
    ///
    /// `N` occurrences give `N + 1` pieces. A token without a separator goes entirely into
    /// the current piece.
    pub fn split_at_literal(&self, separator: &str) -> Vec<Self> {
        if separator.is_empty() {
            return vec![self.clone()];
        }

        let mut pieces: Vec<Vec<FragmentToken>> = vec![Vec::new()];
        for token in &self.tokens {
            let mut parts = token.raw.split(separator);
            if let Some(first) = parts.next() {
                if !first.is_empty() {
                    if let Some(current) = pieces.last_mut() {
                        current.push(token.with_raw(first));
                    }
                }
            }
            for part in parts {
                if part.is_empty() {
                    pieces.push(Vec::new());
                } else {
                    pieces.push(vec![token.with_raw(part)]);
                }
            }
        }

        pieces.into_iter().map(Self::new).collect()
    }

    /// Replace every non-overlapping match of `pattern` with `replacement`.
    ///
    /// An empty `replacement` deletes the matches. Zero-length matches are ignored, and a
    /// pattern that matches nothing returns a container equal to `self`.
    pub fn regex_substitute(&self, pattern: &Regex, replacement: &[FragmentToken]) -> Self {
        let text = self.to_string();
        let mut tokens = Vec::new();
        let mut rest = self.clone();
        let mut consumed = 0;
        let mut matched = false;

        for m in pattern.find_iter(&text) {
            if m.start() == m.end() {
                continue;
            }
            matched = true;

            let (head, tail) = rest.split_bytes(m.start() - consumed);
            let (_, tail) = tail.split_bytes(m.end() - m.start());
            tokens.extend(head.tokens);
            tokens.extend(replacement.iter().cloned());
            rest = tail;
            consumed = m.end();
        }

        if !matched {
            return self.clone();
        }
        tokens.extend(rest.tokens);
        Self::new(tokens)
    }

    /// Match `pattern` at the start of the content.
    ///
    /// Returns the text before the match (always empty, kept for symmetry with
    /// [`split_at`](Self::split_at)), the matched span, and the text after it.
    pub fn regex_match_groups(&self, pattern: &Regex) -> Option<(Self, Self, Self)> {
        let text = self.to_string();
        let m = pattern.find(&text).filter(|m| m.start() == 0)?;

        let (prefix, rest) = self.split_bytes(m.start());
        let (center, suffix) = rest.split_bytes(m.end() - m.start());
        Some((prefix, center, suffix))
    }

    fn split_bytes(&self, cutoff: usize) -> (Self, Self) {
        self.split_or_keep(cutoff, Addressing::Bytes)
    }

    fn split_or_keep(&self, cutoff: usize, addressing: Addressing) -> (Self, Self) {
        self.split_at(cutoff, addressing)
            .unwrap_or_else(|| (self.clone(), Self::default()))
    }
}

impl fmt::Display for FragmentContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            f.write_str(&token.raw)?;
        }
        Ok(())
    }
}

impl From<&str> for FragmentContent {
    fn from(text: &str) -> Self {
        Self::new(vec![FragmentToken::new(text)])
    }
}

impl From<String> for FragmentContent {
    fn from(text: String) -> Self {
        Self::new(vec![FragmentToken::new(text)])
    }
}

impl From<FragmentToken> for FragmentContent {
    fn from(token: FragmentToken) -> Self {
        Self::new(vec![token])
    }
}

impl From<Vec<FragmentToken>> for FragmentContent {
    fn from(tokens: Vec<FragmentToken>) -> Self {
        Self::new(tokens)
    }
}

impl Add for FragmentContent {
    type Output = FragmentContent;

    fn add(mut self, other: FragmentContent) -> FragmentContent {
        self.tokens.extend(other.tokens);
        self
    }
}

impl Add<FragmentToken> for FragmentContent {
    type Output = FragmentContent;

    fn add(mut self, token: FragmentToken) -> FragmentContent {
        self.push(token);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(raws: &[&str]) -> FragmentContent {
        FragmentContent::new(raws.iter().map(|r| FragmentToken::new(*r)).collect())
    }

    fn re(pattern: &str) -> Regex {
        Regex::new(pattern).unwrap()
    }

    #[test]
    fn test_empty_and_plain() {
        assert!(FragmentContent::from("").is_empty());
        assert_eq!(FragmentContent::default().to_string(), "");
        assert_eq!(FragmentContent::from("test").tokens(), &[FragmentToken::new("test")]);
    }

    #[test]
    fn test_len_and_display() {
        let c = content(&["First", "Tëst"]);
        assert_eq!(c.len(), 9);
        assert_eq!(c.byte_len(), 10);
        assert_eq!(c.to_string(), "FirstTëst");
    }

    #[test]
    fn test_add() {
        let sum = content(&["1"]) + content(&["2"]);
        assert_eq!(sum, content(&["1", "2"]));

        let sum = FragmentContent::from("First") + FragmentToken::new("Test");
        assert_eq!(sum, content(&["First", "Test"]));
        assert_eq!(content(&["a"]) + FragmentToken::new(""), content(&["a"]));
    }

    #[test]
    fn test_ends_with() {
        assert!(!FragmentContent::default().ends_with("Test"));
        assert!(content(&["Endsw", "ith"]).ends_with("with"));
    }

    #[test]
    fn test_split_at_offset() {
        let (before, after) = FragmentContent::from("TestString").split_at_offset(4);
        assert_eq!(before, FragmentContent::from("Test"));
        assert_eq!(after, FragmentContent::from("String"));
    }

    #[test]
    fn test_split_at_negative_offset() {
        let (before, after) = FragmentContent::from("TestString").split_at_offset(-6);
        assert_eq!(before, FragmentContent::from("Test"));
        assert_eq!(after, FragmentContent::from("String"));

        let (before, after) = FragmentContent::from("ab").split_at_offset(-5);
        assert!(before.is_empty());
        assert_eq!(after, FragmentContent::from("ab"));
    }

    #[test]
    fn test_split_past_end() {
        let empty = FragmentContent::default();
        assert_eq!(empty.split_at_offset(10), (empty.clone(), empty.clone()));

        let c = content(&["ab"]);
        assert_eq!(c.split_at_offset(2), (c.clone(), FragmentContent::default()));
    }

    #[test]
    fn test_split_straddling_token() {
        let (before, after) = content(&["ab", "cx", "yz"]).split_at_offset(3);
        assert_eq!(before, content(&["ab", "c"]));
        assert_eq!(after, content(&["x", "yz"]));
    }

    #[test]
    fn test_split_on_token_boundary() {
        let (before, after) = content(&["ab", "cd"]).split_at_offset(2);
        assert_eq!(before, content(&["ab"]));
        assert_eq!(after, content(&["cd"]));
    }

    #[test]
    fn test_split_bytes_inside_char() {
        let c = FragmentContent::from("wö");
        assert_eq!(c.split_at(2, Addressing::Bytes), None);
        let (before, after) = c.split_at(3, Addressing::Bytes).unwrap();
        assert_eq!(before.to_string(), "wö");
        assert!(after.is_empty());
        let (before, after) = c.split_at(1, Addressing::Chars).unwrap();
        assert_eq!((before.to_string(), after.to_string()), ("w".into(), "ö".into()));
    }

    #[test]
    fn test_slice() {
        let c = content(&["ab", "cd", "ef"]);
        assert_eq!(c.slice(1..5, Addressing::Chars), Some(content(&["b", "cd", "e"])));
        assert_eq!(c.slice(2..2, Addressing::Chars), Some(FragmentContent::default()));
    }

    #[test]
    fn test_split_at_literal_empty() {
        let empty = FragmentContent::default();
        assert_eq!(empty.split_at_literal(" "), vec![empty.clone()]);
    }

    #[test]
    fn test_split_at_literal() {
        let pieces = content(&["First|", "Te|st", "Last"]).split_at_literal("|");
        assert_eq!(
            pieces,
            vec![content(&["First"]), content(&["Te"]), content(&["st", "Last"])]
        );
    }

    #[test]
    fn test_regex_substitute_empty() {
        let empty = FragmentContent::default();
        assert_eq!(empty.regex_substitute(&re("<>"), &[]), empty);
    }

    #[test]
    fn test_regex_substitute() {
        let c = content(&["En<>ds", "wi<>th"]);
        assert_eq!(
            c.regex_substitute(&re("<>"), &[]),
            content(&["En", "ds", "wi", "th"])
        );
    }

    #[test]
    fn test_regex_substitute_inter_token() {
        let c = content(&["Ends<", ">with"]);
        assert_eq!(c.regex_substitute(&re("<>"), &[]), content(&["Ends", "with"]));
    }

    #[test]
    fn test_regex_substitute_with_tokens() {
        let c = content(&["En<>ds", "wi<>th"]);
        let sub = [FragmentToken::new("SUB")];
        assert_eq!(
            c.regex_substitute(&re("<>"), &sub),
            content(&["En", "SUB", "ds", "wi", "SUB", "th"])
        );
    }

    #[test]
    fn test_regex_substitute_zero_length_is_noop() {
        let c = content(&["abc"]);
        assert_eq!(c.regex_substitute(&re("x*"), &[FragmentToken::new("!")]), c);
    }

    #[test]
    fn test_regex_substitute_keeps_metadata() {
        let token = FragmentToken::new("foo (* .in *)").with_link("Foo.html");
        let c = FragmentContent::from(token);
        let out = c.regex_substitute(&re(r" \(\*.*\*\)"), &[]);
        assert_eq!(out.to_string(), "foo");
        assert_eq!(out.tokens()[0].link.as_deref(), Some("Foo.html"));
    }

    #[test]
    fn test_regex_match_groups_no_match() {
        assert_eq!(FragmentContent::default().regex_match_groups(&re("<>")), None);
        assert_eq!(
            FragmentContent::from("Some test text").regex_match_groups(&re("<>")),
            None
        );
        assert_eq!(FragmentContent::from("a<>").regex_match_groups(&re("<>")), None);
    }

    #[test]
    fn test_regex_match_groups() {
        let (first, second, third) = FragmentContent::from("<>ds")
            .regex_match_groups(&re("<>"))
            .unwrap();
        assert!(first.is_empty());
        assert_eq!(second, content(&["<>"]));
        assert_eq!(third, content(&["ds"]));
    }

    #[test]
    fn test_regex_match_groups_inter_token() {
        let (first, second, third) = content(&["<", ">d", "s"])
            .regex_match_groups(&re("<>"))
            .unwrap();
        assert!(first.is_empty());
        assert_eq!(second, content(&["<", ">"]));
        assert_eq!(third, content(&["d", "s"]));
    }

    #[test]
    fn test_deserialize_shapes() {
        let plain: FragmentContent = serde_json::from_str(r#""First""#).unwrap();
        assert_eq!(plain, FragmentContent::from("First"));

        let list: FragmentContent =
            serde_json::from_str(r#"[{"raw": "Second"}, {"raw": "Third"}]"#).unwrap();
        assert_eq!(list, content(&["Second", "Third"]));

        let wrapped: FragmentContent =
            serde_json::from_str(r#"{"tokens": [{"raw": "Second"}, {"raw": "Third"}]}"#).unwrap();
        assert_eq!(wrapped, list);

        let empty: FragmentContent = serde_json::from_str(r#"{"tokens": []}"#).unwrap();
        assert!(empty.is_empty());
    }
}
