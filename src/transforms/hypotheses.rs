use crate::enriched::{RichFragment, RichHypothesis};

/// Merge consecutive body-less hypotheses of the same type, as provers print them:
/// `x : nat` and `y : nat` become `x, y : nat`.
pub fn group_hypotheses(mut fragments: Vec<RichFragment>) -> Vec<RichFragment> {
    for sentence in fragments.iter_mut().filter_map(RichFragment::as_sentence_mut) {
        for goal in sentence.goals_mut() {
            let mut grouped: Vec<RichHypothesis> = Vec::with_capacity(goal.hypotheses.len());
            for hyp in goal.hypotheses.drain(..) {
                if let Some(last) = grouped.last_mut() {
                    let mergeable = hyp.body.is_none()
                        && last.body.is_none()
                        && last.type_.contents == hyp.type_.contents;
                    if mergeable {
                        last.names.extend(hyp.names);
                        continue;
                    }
                }
                grouped.push(hyp);
            }
            goal.hypotheses = grouped;
        }
    }
    fragments
}
