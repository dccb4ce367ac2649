//! Reading annotation comments into sentences, and pruning output accordingly

use super::TransformError;
use crate::annotations::{process_io_comments, Flag, IoAnnots, Polarity};
use crate::enriched::{Output, RichFragment, RichSentence};
use crate::markers::MarkerPath;
use tracing::{debug, warn};

/// Strip annotation comments and record them in each sentence's `annots`.
///
/// Comments in a Text fragment count for the sentence right before it (the usual place
/// for `intros. (* .unfold *)` once comments are split off by the driver). Sentences
/// then inherit every field they left unset from `defaults`.
pub fn process_io_annotations(
    fragments: Vec<RichFragment>,
    defaults: Option<&IoAnnots>,
) -> Result<Vec<RichFragment>, TransformError> {
    let mut annotated: Vec<RichFragment> = Vec::with_capacity(fragments.len());
    let mut line = 1;
    let mut sentence_line = 1;

    for mut fragment in fragments {
        let fragment_line = line;
        line += newlines(&fragment);

        match &mut fragment {
            RichFragment::Sentence(sentence) => {
                if let Some(contents) = sentence.contents.take() {
                    let stripped = process_io_comments(&mut sentence.annots, &contents)
                        .map_err(|source| TransformError::Annotation {
                            sentence: contents.to_string(),
                            line: fragment_line,
                            source,
                        })?;
                    sentence.contents = Some(stripped);
                }
            }
            RichFragment::Text(text) => match annotated.last_mut() {
                Some(RichFragment::Sentence(previous)) => {
                    text.contents = process_io_comments(&mut previous.annots, &text.contents)
                        .map_err(|source| TransformError::Annotation {
                            sentence: previous.text(),
                            line: sentence_line,
                            source,
                        })?;
                }
                _ => {
                    if crate::annotations::has_io_comment(&text.contents.to_string()) {
                        warn!(
                            line = fragment_line,
                            "annotation comment has no preceding sentence; left in place"
                        );
                    }
                }
            },
        }

        if !fragment.is_text() {
            sentence_line = fragment_line;
        }
        let emptied = fragment.is_text() && fragment.contents_text().is_empty();
        if !emptied {
            annotated.push(fragment);
        }
    }

    if let Some(defaults) = defaults {
        for sentence in annotated.iter_mut().filter_map(RichFragment::as_sentence_mut) {
            sentence.annots.inherit(defaults);
        }
    }

    debug!(fragments = annotated.len(), "processed annotations");
    Ok(annotated)
}

fn newlines(fragment: &RichFragment) -> usize {
    let own = newlines_in(&fragment.contents_text());
    match fragment {
        RichFragment::Sentence(sentence) => {
            own + sentence
                .prefixes
                .iter()
                .chain(&sentence.suffixes)
                .map(|s| newlines_in(s))
                .sum::<usize>()
        }
        RichFragment::Text(_) => own,
    }
}

fn newlines_in(text: &str) -> usize {
    text.matches('\n').count()
}

/// Set `enabled` on the objects of `sentence` that `path` selects
fn mark(sentence: &mut RichSentence, polarity: Polarity, path: &MarkerPath) {
    let enabled = polarity == Polarity::Show;
    let text = sentence.text();

    if let Some(matcher) = &path.sentence {
        let markers: Vec<&str> = sentence.props.markers.iter().map(String::as_str).collect();
        if !matcher.matches(&markers, &text) {
            return;
        }
    }

    if let Some(matcher) = &path.msg {
        for message in sentence.messages_mut() {
            if matcher.matches(&[], &message.contents) {
                message.props.enabled = Some(enabled);
            }
        }
    } else if let Some(goal_matcher) = &path.goal {
        for goal in sentence.goals_mut() {
            let names: Vec<&str> = goal.name.as_deref().into_iter().collect();
            if !goal_matcher.matches(&names, &goal.conclusion.contents.to_string()) {
                continue;
            }
            match &path.hyp {
                Some(hyp_matcher) => {
                    for hyp in &mut goal.hypotheses {
                        let names: Vec<&str> = hyp.names.iter().map(String::as_str).collect();
                        if hyp_matcher.matches(&names, &hyp.text()) {
                            hyp.props.enabled = Some(enabled);
                        }
                    }
                }
                None => goal.props.enabled = Some(enabled),
            }
        }
    } else {
        sentence.props.enabled = Some(enabled);
    }
}

fn should_keep_output(output: &Output, annots: &IoAnnots) -> bool {
    if output.is_empty() {
        return false;
    }
    match output {
        Output::Messages(_) => annots.show(Flag::Messages),
        Output::Goals(_) => annots.show(Flag::Hyps) || annots.show(Flag::Ccls),
    }
}

/// Apply each sentence's annotations: drop what is hidden.
///
/// Fully hidden sentences disappear. A sentence whose input is hidden keeps
/// `contents: None`. With `discard_folded`, outputs not explicitly unfolded are dropped.
pub fn commit_io_annotations(
    fragments: Vec<RichFragment>,
    discard_folded: bool,
) -> Result<Vec<RichFragment>, TransformError> {
    let mut committed = Vec::with_capacity(fragments.len());
    let mut line = 1;

    for mut fragment in fragments {
        let fragment_line = line;
        line += newlines(&fragment);

        if let RichFragment::Sentence(sentence) = &mut fragment {
            if sentence.annots.hide() {
                continue;
            }

            let paths = sentence.annots.paths.clone();
            for (polarity, path) in &paths {
                mark(sentence, *polarity, path);
            }
            if !sentence.props.is_enabled() {
                continue;
            }

            for output in &mut sentence.outputs {
                match output {
                    Output::Goals(goals) => goals.retain(|g| g.props.is_enabled()),
                    Output::Messages(messages) => messages.retain(|m| m.props.is_enabled()),
                }
            }

            let annots = &sentence.annots;
            let unfolded = annots.unfold == Some(true);
            if discard_folded && !unfolded {
                sentence.outputs.clear();
            } else {
                sentence.outputs.retain(|o| should_keep_output(o, annots));
            }

            let show_hyps = annots.show(Flag::Hyps);
            for goal in sentence.goals_mut() {
                if !show_hyps {
                    goal.hypotheses.clear();
                }
                goal.hypotheses.retain(|h| h.props.is_enabled());
            }

            if !sentence.annots.show(Flag::In) {
                if !sentence.outputs.is_empty() && !unfolded {
                    return Err(TransformError::Contradictory {
                        sentence: sentence.text(),
                        line: fragment_line,
                    });
                }
                sentence.contents = None;
            }
        }
        committed.push(fragment);
    }

    Ok(committed)
}
