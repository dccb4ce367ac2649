use crate::enriched::RichFragment;
use once_cell::sync::Lazy;
use regex::Regex;

static FAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\AFail\s+").unwrap());

static FAIL_MSG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\AThe command has indeed failed with message:\s+").unwrap());

/// Unwrap `Fail` commands of sentences annotated `.fails`.
///
/// The `Fail` keyword is removed from the input, and the prover's "failed as expected"
/// preamble from the first message, so the output reads like the error itself.
pub fn strip_failures(mut fragments: Vec<RichFragment>) -> Vec<RichFragment> {
    for sentence in fragments.iter_mut().filter_map(RichFragment::as_sentence_mut) {
        if sentence.annots.fails != Some(true) {
            continue;
        }
        let Some(contents) = &sentence.contents else {
            continue;
        };
        let Some((_, _, unwrapped)) = contents.regex_match_groups(&FAIL_RE) else {
            continue;
        };

        sentence.contents = Some(unwrapped);
        if let Some(message) = sentence.messages_mut().next() {
            message.contents = FAIL_MSG_RE.replace(&message.contents, "").into_owned();
        }
    }
    fragments
}
