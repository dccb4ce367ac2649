//! Content tokens: a raw slice of source text plus the metadata a prover attached to it

use serde::{Deserialize, Serialize};

/// Type information for an identifier, as reported by the prover
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TypeInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: String,
}

/// The atomic unit of fragment text.
///
/// Splitting a token keeps its metadata on both halves, so type information and links
/// survive every cut the document reconciliation or a regex substitution makes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FragmentToken {
    pub raw: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typeinfo: Option<TypeInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_type: Option<String>,
}

impl FragmentToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            ..Self::default()
        }
    }

    pub fn with_typeinfo(mut self, name: impl Into<String>, type_: impl Into<String>) -> Self {
        self.typeinfo = Some(TypeInfo {
            name: name.into(),
            type_: type_.into(),
        });
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    /// Same metadata, different text
    pub fn with_raw(&self, raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            typeinfo: self.typeinfo.clone(),
            docstring: self.docstring.clone(),
            link: self.link.clone(),
            semantic_type: self.semantic_type.clone(),
        }
    }

    /// Split at a byte index that must lie on a character boundary
    pub(crate) fn split_at_byte(&self, index: usize) -> (Self, Self) {
        let (head, tail) = self.raw.split_at(index);
        (self.with_raw(head), self.with_raw(tail))
    }
}

impl From<&str> for FragmentToken {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}
