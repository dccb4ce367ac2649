//! Attaching trailing comments to the sentence they follow
//!
//! Supports the idiom of a bullet followed by a comment describing its case:
//!
//! ```text
//! induction n.
//! - (* n = 0 *)
//!   ...
//! - (* n = S _ *) (* the hard case *) cbn.
//! ```
//!
//! The comments on a bullet's line become part of the bullet, up to the end of the last
//! comment (the blank before `cbn.` stays outside).

use crate::enriched::RichFragment;
use crate::literate::{self, Span};
use crate::location::Addressing;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static BULLET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\A\s*[-+*]+\s*\z").unwrap());

/// Which sentences absorb the comments that follow them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachMode {
    #[default]
    Always,
    /// Only bullets (`-`, `+`, `*`, `--`, ...)
    Bullets,
    Never,
}

pub fn is_bullet(text: &str) -> bool {
    BULLET_RE.is_match(text)
}

/// Byte length of the prefix of `text` that ends with its last same-line comment
fn comment_prefix_len(text: &str) -> usize {
    let mut prefix = 0;
    let mut best = 0;

    for span in literate::partition(text) {
        let part = span.text();
        if part.contains('\n') {
            break;
        }
        if let Span::Code(code) = span {
            if !code.trim().is_empty() {
                break;
            }
        }
        prefix += part.len();
        if span.is_comment() {
            best = prefix;
        }
    }

    best
}

pub fn attach_comments_to_code(fragments: Vec<RichFragment>, mode: AttachMode) -> Vec<RichFragment> {
    if mode == AttachMode::Never {
        return fragments;
    }

    let mut grouped: Vec<RichFragment> = Vec::with_capacity(fragments.len());
    // A sentence that swallowed a whole Text takes no further comments
    let mut absorbed = false;
    for fragment in fragments {
        let text = match (&fragment, grouped.last_mut()) {
            (RichFragment::Text(text), Some(RichFragment::Sentence(sentence))) if !absorbed => {
                let accepts = match mode {
                    AttachMode::Always => true,
                    AttachMode::Bullets => is_bullet(&sentence.text()),
                    AttachMode::Never => false,
                };
                if accepts {
                    Some((text.contents.clone(), sentence))
                } else {
                    None
                }
            }
            _ => None,
        };

        if let Some((contents, sentence)) = text {
            let cutoff = comment_prefix_len(&contents.to_string());
            if cutoff > 0 {
                if let Some((comments, rest)) = contents.split_at(cutoff, Addressing::Bytes) {
                    if let Some(own) = sentence.contents.take() {
                        sentence.contents = Some(own.concat(&comments));
                    }
                    absorbed = rest.is_empty();
                    if !absorbed {
                        grouped.push(RichFragment::text(rest));
                    }
                    continue;
                }
            }
        }

        absorbed = false;
        grouped.push(fragment);
    }
    grouped
}
