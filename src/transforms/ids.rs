use crate::enriched::{Gensym, NodeKind, RichFragment};

/// Clear the identifiers and enabled flags of every node, e.g. before caching
pub fn strip_ids_and_flags(mut fragments: Vec<RichFragment>) -> Vec<RichFragment> {
    for sentence in fragments.iter_mut().filter_map(RichFragment::as_sentence_mut) {
        sentence.visit_props_mut(&mut |_, props| props.clear());
    }
    fragments
}

/// Give an identifier to every sentence, goal, hypothesis and message that has none.
///
/// Identifiers are unique within the run driven by `gensym`. Code blocks get none.
pub fn assign_ids(mut fragments: Vec<RichFragment>, gensym: &mut Gensym) -> Vec<RichFragment> {
    for sentence in fragments.iter_mut().filter_map(RichFragment::as_sentence_mut) {
        sentence.visit_props_mut(&mut |kind, props| {
            let prefix = match kind {
                NodeKind::Sentence => "s",
                NodeKind::Goal => "g",
                NodeKind::Hypothesis => "h",
                NodeKind::Message => "m",
                NodeKind::Code => return,
            };
            if props.ids.is_empty() {
                props.ids.push(gensym.fresh(prefix));
            }
        });
    }
    fragments
}
