//! Enriched fragments: sentences with mutable display state
//!
//! Enrichment wraps every [`Sentence`] into a [`RichSentence`] whose output tree can be
//! pruned node by node. Each node (sentence, goal, hypothesis, message, code block)
//! owns a [`Props`] record holding its identifiers, its markers, and the `enabled` flag
//! that path annotations toggle.

use crate::annotations::IoAnnots;
use crate::content::FragmentContent;
use crate::fragment::{Fragment, Goal, Hypothesis, Sentence, Text};
use serde::Serialize;
use std::collections::HashMap;

/// Per-node display state
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Props {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub markers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl Props {
    /// Nodes are enabled unless a path annotation disabled them
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.enabled = None;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RichCode {
    pub contents: FragmentContent,
    #[serde(skip_serializing_if = "is_default")]
    pub props: Props,
}

impl RichCode {
    pub fn new(contents: FragmentContent) -> Self {
        Self {
            contents,
            props: Props::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RichHypothesis {
    pub names: Vec<String>,
    pub body: Option<RichCode>,
    #[serde(rename = "type")]
    pub type_: RichCode,
    #[serde(skip_serializing_if = "is_default")]
    pub props: Props,
}

impl RichHypothesis {
    /// Rendered as the prover prints it, e.g. `x, y : nat` or `n := 0 : nat`
    pub fn text(&self) -> String {
        let mut text = self.names.join(", ");
        if let Some(body) = &self.body {
            text.push_str(" := ");
            text.push_str(&body.contents.to_string());
        }
        text.push_str(" : ");
        text.push_str(&self.type_.contents.to_string());
        text
    }
}

impl From<Hypothesis> for RichHypothesis {
    fn from(hyp: Hypothesis) -> Self {
        Self {
            names: hyp.names,
            body: hyp.body.map(RichCode::new),
            type_: RichCode::new(hyp.type_),
            props: Props::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RichGoal {
    pub name: Option<String>,
    pub conclusion: RichCode,
    pub hypotheses: Vec<RichHypothesis>,
    #[serde(skip_serializing_if = "is_default")]
    pub props: Props,
}

impl From<Goal> for RichGoal {
    fn from(goal: Goal) -> Self {
        Self {
            name: goal.name,
            conclusion: RichCode::new(goal.conclusion),
            hypotheses: goal.hypotheses.into_iter().map(Into::into).collect(),
            props: Props::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RichMessage {
    pub contents: String,
    #[serde(skip_serializing_if = "is_default")]
    pub props: Props,
}

impl RichMessage {
    pub fn new(contents: impl Into<String>) -> Self {
        Self {
            contents: contents.into(),
            props: Props::default(),
        }
    }
}

/// One independently toggled group of sentence output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "items", rename_all = "snake_case")]
pub enum Output {
    Messages(Vec<RichMessage>),
    Goals(Vec<RichGoal>),
}

impl Output {
    pub fn is_empty(&self) -> bool {
        match self {
            Output::Messages(messages) => messages.is_empty(),
            Output::Goals(goals) => goals.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RichSentence {
    /// `None` once committed with its input hidden
    pub contents: Option<FragmentContent>,
    pub outputs: Vec<Output>,
    #[serde(skip_serializing_if = "is_unset")]
    pub annots: IoAnnots,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub prefixes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suffixes: Vec<String>,
    #[serde(skip_serializing_if = "is_default")]
    pub props: Props,
}

impl RichSentence {
    /// Sentence text, or the empty string when the input is hidden
    pub fn text(&self) -> String {
        self.contents
            .as_ref()
            .map(|c| c.to_string())
            .unwrap_or_default()
    }

    pub fn goals(&self) -> impl Iterator<Item = &RichGoal> {
        self.outputs
            .iter()
            .filter_map(|output| match output {
                Output::Goals(goals) => Some(goals),
                Output::Messages(_) => None,
            })
            .flatten()
    }

    pub fn goals_mut(&mut self) -> impl Iterator<Item = &mut RichGoal> {
        self.outputs
            .iter_mut()
            .filter_map(|output| match output {
                Output::Goals(goals) => Some(goals),
                Output::Messages(_) => None,
            })
            .flatten()
    }

    pub fn messages(&self) -> impl Iterator<Item = &RichMessage> {
        self.outputs
            .iter()
            .filter_map(|output| match output {
                Output::Messages(messages) => Some(messages),
                Output::Goals(_) => None,
            })
            .flatten()
    }

    pub fn messages_mut(&mut self) -> impl Iterator<Item = &mut RichMessage> {
        self.outputs
            .iter_mut()
            .filter_map(|output| match output {
                Output::Messages(messages) => Some(messages),
                Output::Goals(_) => None,
            })
            .flatten()
    }

    /// Visit the props of this sentence and of every node below it
    pub fn visit_props_mut(&mut self, visit: &mut dyn FnMut(NodeKind, &mut Props)) {
        visit(NodeKind::Sentence, &mut self.props);
        for output in &mut self.outputs {
            match output {
                Output::Messages(messages) => {
                    for message in messages {
                        visit(NodeKind::Message, &mut message.props);
                    }
                }
                Output::Goals(goals) => {
                    for goal in goals {
                        visit(NodeKind::Goal, &mut goal.props);
                        visit(NodeKind::Code, &mut goal.conclusion.props);
                        for hyp in &mut goal.hypotheses {
                            visit(NodeKind::Hypothesis, &mut hyp.props);
                            if let Some(body) = &mut hyp.body {
                                visit(NodeKind::Code, &mut body.props);
                            }
                            visit(NodeKind::Code, &mut hyp.type_.props);
                        }
                    }
                }
            }
        }
    }
}

impl From<Sentence> for RichSentence {
    fn from(sentence: Sentence) -> Self {
        // Both groups are always present; empty ones are dropped at commit time
        let outputs = vec![
            Output::Messages(
                sentence
                    .messages
                    .into_iter()
                    .map(|m| RichMessage::new(m.contents))
                    .collect(),
            ),
            Output::Goals(sentence.goals.into_iter().map(Into::into).collect()),
        ];

        Self {
            contents: Some(sentence.contents),
            outputs,
            annots: IoAnnots::default(),
            prefixes: Vec::new(),
            suffixes: Vec::new(),
            props: Props::default(),
        }
    }
}

/// Kind of node reached by [`RichSentence::visit_props_mut`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Sentence,
    Goal,
    Hypothesis,
    Message,
    Code,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RichFragment {
    Text(Text),
    Sentence(RichSentence),
}

impl RichFragment {
    pub fn text(contents: impl Into<FragmentContent>) -> Self {
        RichFragment::Text(Text::new(contents))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, RichFragment::Text(_))
    }

    pub fn as_sentence_mut(&mut self) -> Option<&mut RichSentence> {
        match self {
            RichFragment::Sentence(sentence) => Some(sentence),
            RichFragment::Text(_) => None,
        }
    }

    /// Text of the fragment (empty for a sentence with hidden input)
    pub fn contents_text(&self) -> String {
        match self {
            RichFragment::Text(text) => text.contents.to_string(),
            RichFragment::Sentence(sentence) => sentence.text(),
        }
    }
}

impl From<Fragment> for RichFragment {
    fn from(fragment: Fragment) -> Self {
        match fragment {
            Fragment::Text(text) => RichFragment::Text(text),
            Fragment::Sentence(sentence) => RichFragment::Sentence(sentence.into()),
        }
    }
}

/// Turn every plain sentence into a [`RichSentence`]
pub fn enrich(fragments: Vec<Fragment>) -> Vec<RichFragment> {
    fragments.into_iter().map(RichFragment::from).collect()
}

/// Generator of identifiers unique within one processing run
#[derive(Debug, Clone, Default)]
pub struct Gensym {
    stem: String,
    counters: HashMap<String, usize>,
}

impl Gensym {
    pub fn new(stem: impl Into<String>) -> Self {
        Self {
            stem: stem.into(),
            counters: HashMap::new(),
        }
    }

    /// Next identifier for `prefix`: stem, prefix, then a hex counter
    pub fn fresh(&mut self, prefix: &str) -> String {
        let counter = self.counters.entry(prefix.to_string()).or_insert(0);
        let id = format!("{}{}{:x}", self.stem, prefix, *counter);
        *counter += 1;
        id
    }
}

fn is_default(props: &Props) -> bool {
    *props == Props::default()
}

fn is_unset(annots: &IoAnnots) -> bool {
    annots.filters.is_none() && annots.unfold.is_none() && annots.fails.is_none()
}
