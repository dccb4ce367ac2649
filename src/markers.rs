//! Marker paths: selecting sentences, goals, hypotheses, and messages
//!
//! A path is a run of dotted segments, each naming a level of the output tree and an
//! optional selector for that level:
//!
//! ```text
//! .s(Induction)      sentence whose text contains "Induction"
//! .g#2               goal named "2"
//! .h#IH*             hypotheses with a name matching the glob IH*
//! .h{*nat*}          hypotheses whose text matches the glob *nat*
//! .msg(Warning)      messages containing "Warning"
//! ```
//!
//! A segment without a selector matches everything at its level. Leaf segments (`.in`,
//! `.ccl`, `.type`, `.body`, `.name`) address a part of the selected object rather than
//! a level and may only appear last.

use chumsky::prelude::*;
use regex::Regex;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkerError {
    #[error("malformed marker path {path:?} at column {column}")]
    Syntax { path: String, column: usize },

    #[error("unknown marker key {key:?} in {path:?}")]
    UnknownKey { path: String, key: String },

    #[error("marker key {key:?} appears twice in {path:?}")]
    DuplicateKey { path: String, key: String },

    #[error("leaf {leaf:?} must be the last segment of {path:?} and takes no selector")]
    MisplacedLeaf { path: String, leaf: String },
}

/// A glob (`*`, `?`) compiled to an anchored regex
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(glob: &str) -> Result<Self, regex::Error> {
        let mut translated = String::from(r"(?s)\A");
        for ch in glob.chars() {
            match ch {
                '*' => translated.push_str(".*"),
                '?' => translated.push('.'),
                _ => translated.push_str(&regex::escape(ch.encode_utf8(&mut [0; 4]))),
            }
        }
        translated.push_str(r"\z");

        Ok(Self {
            source: glob.to_string(),
            regex: Regex::new(&translated)?,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Pattern {}

/// Selector of one path segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// No selector: everything matches
    Top,
    /// `#glob`, matched against names
    Name(Pattern),
    /// `(text)`, matched as a substring of the object's text
    Substring(String),
    /// `{glob}`, matched against the object's whole text
    Glob(Pattern),
}

impl Matcher {
    pub fn matches(&self, names: &[&str], text: &str) -> bool {
        match self {
            Matcher::Top => true,
            Matcher::Name(pattern) => names.iter().any(|name| pattern.is_match(name)),
            Matcher::Substring(needle) => text.contains(needle.as_str()),
            Matcher::Glob(pattern) => pattern.is_match(text),
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Top => Ok(()),
            Matcher::Name(pattern) => write!(f, "#{}", pattern.source()),
            Matcher::Substring(text) => write!(f, "({})", text),
            Matcher::Glob(pattern) => write!(f, "{{{}}}", pattern.source()),
        }
    }
}

/// Part of a selected object addressed by a trailing segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leaf {
    In,
    Ccl,
    Type,
    Body,
    Name,
}

impl Leaf {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "in" => Some(Leaf::In),
            "ccl" => Some(Leaf::Ccl),
            "type" => Some(Leaf::Type),
            "body" => Some(Leaf::Body),
            "name" => Some(Leaf::Name),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Leaf::In => "in",
            Leaf::Ccl => "ccl",
            Leaf::Type => "type",
            Leaf::Body => "body",
            Leaf::Name => "name",
        }
    }
}

/// Keys that select a level of the output tree
pub const LEVEL_KEYS: &[&str] = &["s", "g", "h", "msg", "io"];

/// A parsed marker path; absent levels were not mentioned
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarkerPath {
    pub sentence: Option<Matcher>,
    pub goal: Option<Matcher>,
    pub hyp: Option<Matcher>,
    pub msg: Option<Matcher>,
    pub io: Option<Matcher>,
    pub leaf: Option<Leaf>,
}

impl fmt::Display for MarkerPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let levels = [
            ("s", &self.sentence),
            ("g", &self.goal),
            ("h", &self.hyp),
            ("msg", &self.msg),
            ("io", &self.io),
        ];
        for (key, matcher) in levels {
            if let Some(matcher) = matcher {
                write!(f, ".{}{}", key, matcher)?;
            }
        }
        if let Some(leaf) = self.leaf {
            write!(f, ".{}", leaf.as_str())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Selector {
    Name(String),
    Substring(String),
    Glob(String),
}

fn segments() -> impl Parser<char, Vec<(String, Option<Selector>)>, Error = Simple<char>> {
    let key = filter(|c: &char| c.is_ascii_lowercase() || *c == '-')
        .repeated()
        .at_least(1)
        .collect::<String>();

    let name = just('#')
        .ignore_then(
            filter(|c: &char| !c.is_whitespace() && !".(){}".contains(*c))
                .repeated()
                .at_least(1)
                .collect::<String>(),
        )
        .map(Selector::Name);

    let substring = none_of(")")
        .repeated()
        .collect::<String>()
        .delimited_by(just('('), just(')'))
        .map(Selector::Substring);

    let glob = none_of("}")
        .repeated()
        .collect::<String>()
        .delimited_by(just('{'), just('}'))
        .map(Selector::Glob);

    just('.')
        .ignore_then(key)
        .then(choice((name, substring, glob)).or_not())
        .repeated()
        .at_least(1)
        .then_ignore(end())
}

/// Parse a dotted marker path such as `.g#1.h#x`
pub fn parse_path(path: &str) -> Result<MarkerPath, MarkerError> {
    let syntax = |column: usize| MarkerError::Syntax {
        path: path.to_string(),
        column,
    };

    let parsed = segments().parse(path).map_err(|errors| {
        let column = errors.first().map(|e| e.span().start).unwrap_or(0);
        syntax(column)
    })?;

    let mut result = MarkerPath::default();
    let count = parsed.len();
    for (index, (key, selector)) in parsed.into_iter().enumerate() {
        if let Some(leaf) = Leaf::from_key(&key) {
            if index + 1 != count || selector.is_some() {
                return Err(MarkerError::MisplacedLeaf {
                    path: path.to_string(),
                    leaf: key,
                });
            }
            result.leaf = Some(leaf);
            continue;
        }

        let matcher = match selector {
            None => Matcher::Top,
            Some(Selector::Substring(text)) => Matcher::Substring(text),
            Some(Selector::Name(glob)) => Matcher::Name(Pattern::new(&glob).map_err(|_| syntax(0))?),
            Some(Selector::Glob(glob)) => Matcher::Glob(Pattern::new(&glob).map_err(|_| syntax(0))?),
        };

        let slot = match key.as_str() {
            "s" => &mut result.sentence,
            "g" => &mut result.goal,
            "h" => &mut result.hyp,
            "msg" => &mut result.msg,
            "io" => &mut result.io,
            _ => {
                return Err(MarkerError::UnknownKey {
                    path: path.to_string(),
                    key,
                })
            }
        };
        if slot.is_some() {
            return Err(MarkerError::DuplicateKey {
                path: path.to_string(),
                key,
            });
        }
        *slot = Some(matcher);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn glob(source: &str) -> Pattern {
        Pattern::new(source).unwrap()
    }

    #[test]
    fn test_parse_goal_and_hypothesis() {
        let path = parse_path(".g#1.h#x").unwrap();
        assert_eq!(path.goal, Some(Matcher::Name(glob("1"))));
        assert_eq!(path.hyp, Some(Matcher::Name(glob("x"))));
        assert_eq!(path.sentence, None);
        assert_eq!(path.leaf, None);
    }

    #[test]
    fn test_parse_selectors() {
        let path = parse_path(".s(Induction on n).msg{*nat*}").unwrap();
        assert_eq!(path.sentence, Some(Matcher::Substring("Induction on n".into())));
        assert_eq!(path.msg, Some(Matcher::Glob(glob("*nat*"))));
    }

    #[test]
    fn test_parse_bare_segments_and_leaf() {
        let path = parse_path(".s.g.ccl").unwrap();
        assert_eq!(path.sentence, Some(Matcher::Top));
        assert_eq!(path.goal, Some(Matcher::Top));
        assert_eq!(path.leaf, Some(Leaf::Ccl));
    }

    #[rstest]
    #[case("")]
    #[case("g#1")]
    #[case(".s(unterminated")]
    #[case(".g#")]
    #[case(".H")]
    fn test_syntax_errors(#[case] input: &str) {
        assert!(matches!(parse_path(input), Err(MarkerError::Syntax { .. })));
    }

    #[test]
    fn test_semantic_errors() {
        assert!(matches!(
            parse_path(".q#x"),
            Err(MarkerError::UnknownKey { key, .. }) if key == "q"
        ));
        assert!(matches!(
            parse_path(".h#x.h#y"),
            Err(MarkerError::DuplicateKey { .. })
        ));
        assert!(matches!(
            parse_path(".in.h#x"),
            Err(MarkerError::MisplacedLeaf { leaf, .. }) if leaf == "in"
        ));
    }

    #[test]
    fn test_matching() {
        assert!(Matcher::Top.matches(&[], ""));
        assert!(Matcher::Name(glob("IH*")).matches(&["n", "IHn"], "n, IHn : nat"));
        assert!(!Matcher::Name(glob("IH*")).matches(&["n"], "IH"));
        assert!(Matcher::Substring("nat".into()).matches(&[], "n : nat"));
        assert!(Matcher::Glob(glob("*: nat")).matches(&[], "n : nat"));
        assert!(!Matcher::Glob(glob("n")).matches(&[], "n : nat"));
        assert!(Matcher::Glob(glob("a.c")).matches(&[], "a.c"));
        assert!(!Matcher::Glob(glob("a.c")).matches(&[], "abc"));
    }

    #[test]
    fn test_display_round_trips_syntax() {
        let source = ".s(foo).g#2.h{*}.type";
        assert_eq!(parse_path(source).unwrap().to_string(), source);
    }
}
