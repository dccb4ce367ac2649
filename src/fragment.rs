//! Fragments as produced by prover drivers
//!
//! A driver run yields a flat list of [`Fragment`]s: inert [`Text`] runs (whitespace,
//! comments) interleaved with executable [`Sentence`]s that carry the goals and messages
//! the prover computed for them.

use crate::content::FragmentContent;
use crate::location::Addressing;
use serde::{Deserialize, Serialize};

/// A diagnostic message produced by a sentence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub contents: String,
}

impl Message {
    pub fn new(contents: impl Into<String>) -> Self {
        Self {
            contents: contents.into(),
        }
    }
}

/// One or more names bound to a shared type, with an optional definition body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hypothesis {
    pub names: Vec<String>,
    #[serde(default)]
    pub body: Option<FragmentContent>,
    #[serde(rename = "type")]
    pub type_: FragmentContent,
}

impl Hypothesis {
    pub fn new(names: &[&str], type_: impl Into<FragmentContent>) -> Self {
        Self {
            names: names.iter().map(|n| n.to_string()).collect(),
            body: None,
            type_: type_.into(),
        }
    }

    pub fn with_body(mut self, body: impl Into<FragmentContent>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// A proof obligation: a conclusion under a list of hypotheses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    #[serde(default)]
    pub name: Option<String>,
    pub conclusion: FragmentContent,
    #[serde(default)]
    pub hypotheses: Vec<Hypothesis>,
}

impl Goal {
    pub fn new(conclusion: impl Into<FragmentContent>) -> Self {
        Self {
            name: None,
            conclusion: conclusion.into(),
            hypotheses: Vec::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_hypothesis(mut self, hypothesis: Hypothesis) -> Self {
        self.hypotheses.push(hypothesis);
        self
    }
}

/// Inert document text
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Text {
    pub contents: FragmentContent,
}

impl Text {
    pub fn new(contents: impl Into<FragmentContent>) -> Self {
        Self {
            contents: contents.into(),
        }
    }
}

/// One unit of analyzed input with its computed output
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Sentence {
    pub contents: FragmentContent,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub goals: Vec<Goal>,
}

impl Sentence {
    pub fn new(contents: impl Into<FragmentContent>) -> Self {
        Self {
            contents: contents.into(),
            ..Self::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.messages.push(Message::new(message));
        self
    }

    pub fn with_goal(mut self, goal: Goal) -> Self {
        self.goals.push(goal);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Fragment {
    Text(Text),
    Sentence(Sentence),
}

impl Fragment {
    pub fn text(contents: impl Into<FragmentContent>) -> Self {
        Fragment::Text(Text::new(contents))
    }

    pub fn sentence(contents: impl Into<FragmentContent>) -> Self {
        Fragment::Sentence(Sentence::new(contents))
    }

    pub fn contents(&self) -> &FragmentContent {
        match self {
            Fragment::Text(text) => &text.contents,
            Fragment::Sentence(sentence) => &sentence.contents,
        }
    }

    pub fn contents_mut(&mut self) -> &mut FragmentContent {
        match self {
            Fragment::Text(text) => &mut text.contents,
            Fragment::Sentence(sentence) => &mut sentence.contents,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Fragment::Text(_))
    }

    /// Split at `cutoff` (in `addressing` units).
    ///
    /// The prefix of a sentence carries no output; messages and goals stay with the
    /// suffix, which is where the prover reported them.
    pub fn split_at(&self, cutoff: usize, addressing: Addressing) -> Option<(Fragment, Fragment)> {
        let (before, after) = self.contents().split_at(cutoff, addressing)?;
        let split = match self {
            Fragment::Text(_) => (Fragment::text(before), Fragment::text(after)),
            Fragment::Sentence(sentence) => (
                Fragment::Sentence(Sentence::new(before)),
                Fragment::Sentence(Sentence {
                    contents: after,
                    ..sentence.clone()
                }),
            ),
        };
        Some(split)
    }
}

impl From<Text> for Fragment {
    fn from(text: Text) -> Self {
        Fragment::Text(text)
    }
}

impl From<Sentence> for Fragment {
    fn from(sentence: Sentence) -> Self {
        Fragment::Sentence(sentence)
    }
}
