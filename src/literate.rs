//! Splitting prover source into code and comment spans
//!
//! Comments are `(* ... *)` and nest. String literals (`"..."`, with `""` as an escaped
//! quote) are opaque, so a `*)` inside a string does not close a comment. A comment that
//! is never closed is treated as code.

use logos::Logos;
use std::ops::Range;

#[derive(Logos, Debug, PartialEq, Clone, Copy)]
enum Token {
    #[token("(*")]
    Open,

    #[token("*)")]
    Close,

    #[regex(r#""([^"]|"")*""#)]
    Str,

    // Lone delimiter characters that are not part of a comment marker
    #[regex(r#"[(*"]"#)]
    Punct,

    #[regex(r#"[^(*"]+"#)]
    Other,
}

/// A maximal run of code, or one complete top-level comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span<'a> {
    Code(&'a str),
    Comment(&'a str),
}

impl<'a> Span<'a> {
    pub fn text(&self) -> &'a str {
        match self {
            Span::Code(text) | Span::Comment(text) => text,
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, Span::Comment(_))
    }
}

/// Partition `text` into alternating code and comment spans covering all of it
pub fn partition(text: &str) -> Vec<Span<'_>> {
    let mut comments: Vec<Range<usize>> = Vec::new();
    let mut lexer = Token::lexer(text);
    let mut depth = 0usize;
    let mut opened_at = 0;

    while let Some(token) = lexer.next() {
        match token {
            Ok(Token::Open) => {
                if depth == 0 {
                    opened_at = lexer.span().start;
                }
                depth += 1;
            }
            Ok(Token::Close) if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    comments.push(opened_at..lexer.span().end);
                }
            }
            _ => {}
        }
    }

    let mut spans = Vec::with_capacity(comments.len() * 2 + 1);
    let mut position = 0;
    for comment in comments {
        if position < comment.start {
            spans.push(Span::Code(&text[position..comment.start]));
        }
        spans.push(Span::Comment(&text[comment.clone()]));
        position = comment.end;
    }
    if position < text.len() {
        spans.push(Span::Code(&text[position..]));
    }
    spans
}
