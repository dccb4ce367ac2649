//! Transform passes over enriched fragments
//!
//! Each pass takes the fragment list of one chunk and returns the transformed list.
//! Passes are plain functions; [`FragmentTransform`] wraps each of them so the pipeline
//! executor can run a configured sequence of them by name.
//!
//! Default order, after enrichment:
//!
//! 1. [`attach_comments_to_code`]: trailing same-line comments join their sentence
//! 2. [`group_hypotheses`]: co-typed hypotheses without bodies merge
//! 3. [`process_io_annotations`]: annotation comments are parsed and stripped
//! 4. [`strip_failures`]: `Fail` wrappers of expected failures are removed
//! 5. [`dedent`]: common indentation of messages is removed
//!
//! [`commit_io_annotations`] then prunes the output according to the annotations.
//! The layout passes ([`group_whitespace_with_code`], [`coalesce_text`],
//! [`strip_text`], [`partition_fragments`], [`isolate_coqdoc`]) and the id passes are
//! used by literate front ends and renderers.

pub mod comments;
pub mod dedent;
pub mod failures;
pub mod hypotheses;
pub mod ids;
pub mod io_annotations;
pub mod layout;

pub use comments::{attach_comments_to_code, is_bullet, AttachMode};
pub use dedent::{dedent, dedent_text};
pub use failures::strip_failures;
pub use hypotheses::group_hypotheses;
pub use ids::{assign_ids, strip_ids_and_flags};
pub use io_annotations::{commit_io_annotations, process_io_annotations};
pub use layout::{
    coalesce_text, find_long_lines, group_whitespace_with_code, isolate_coqdoc,
    partition_fragments, strip_text, CoqdocPart, LongLine, DEFAULT_CHUNK_DELIMITER,
};

use crate::annotations::{AnnotationError, IoAnnots};
use crate::enriched::{Gensym, RichFragment};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("invalid annotation on line {line} ({sentence:?}): {source}")]
    Annotation {
        sentence: String,
        line: usize,
        source: AnnotationError,
    },

    #[error("cannot show output of {sentence:?} on line {line} without .in or .unfold")]
    Contradictory { sentence: String, line: usize },
}

/// A pass the pipeline executor can run
pub trait FragmentTransform {
    fn name(&self) -> &'static str;

    fn apply(&mut self, fragments: Vec<RichFragment>) -> Result<Vec<RichFragment>, TransformError>;
}

pub struct AttachComments {
    pub mode: AttachMode,
}

impl FragmentTransform for AttachComments {
    fn name(&self) -> &'static str {
        "attach_comments"
    }

    fn apply(&mut self, fragments: Vec<RichFragment>) -> Result<Vec<RichFragment>, TransformError> {
        Ok(attach_comments_to_code(fragments, self.mode))
    }
}

pub struct GroupHypotheses;

impl FragmentTransform for GroupHypotheses {
    fn name(&self) -> &'static str {
        "group_hypotheses"
    }

    fn apply(&mut self, fragments: Vec<RichFragment>) -> Result<Vec<RichFragment>, TransformError> {
        Ok(group_hypotheses(fragments))
    }
}

pub struct ProcessIoAnnotations {
    pub defaults: Option<IoAnnots>,
}

impl FragmentTransform for ProcessIoAnnotations {
    fn name(&self) -> &'static str {
        "process_io_annotations"
    }

    fn apply(&mut self, fragments: Vec<RichFragment>) -> Result<Vec<RichFragment>, TransformError> {
        process_io_annotations(fragments, self.defaults.as_ref())
    }
}

pub struct StripFailures;

impl FragmentTransform for StripFailures {
    fn name(&self) -> &'static str {
        "strip_failures"
    }

    fn apply(&mut self, fragments: Vec<RichFragment>) -> Result<Vec<RichFragment>, TransformError> {
        Ok(strip_failures(fragments))
    }
}

pub struct Dedent;

impl FragmentTransform for Dedent {
    fn name(&self) -> &'static str {
        "dedent"
    }

    fn apply(&mut self, fragments: Vec<RichFragment>) -> Result<Vec<RichFragment>, TransformError> {
        Ok(dedent(fragments))
    }
}

pub struct CommitIoAnnotations {
    pub discard_folded: bool,
}

impl FragmentTransform for CommitIoAnnotations {
    fn name(&self) -> &'static str {
        "commit_io_annotations"
    }

    fn apply(&mut self, fragments: Vec<RichFragment>) -> Result<Vec<RichFragment>, TransformError> {
        commit_io_annotations(fragments, self.discard_folded)
    }
}

pub struct GroupWhitespace;

impl FragmentTransform for GroupWhitespace {
    fn name(&self) -> &'static str {
        "group_whitespace"
    }

    fn apply(&mut self, fragments: Vec<RichFragment>) -> Result<Vec<RichFragment>, TransformError> {
        Ok(group_whitespace_with_code(fragments))
    }
}

pub struct CoalesceText;

impl FragmentTransform for CoalesceText {
    fn name(&self) -> &'static str {
        "coalesce_text"
    }

    fn apply(&mut self, fragments: Vec<RichFragment>) -> Result<Vec<RichFragment>, TransformError> {
        Ok(coalesce_text(fragments))
    }
}

pub struct StripText;

impl FragmentTransform for StripText {
    fn name(&self) -> &'static str {
        "strip_text"
    }

    fn apply(&mut self, fragments: Vec<RichFragment>) -> Result<Vec<RichFragment>, TransformError> {
        Ok(strip_text(fragments))
    }
}

pub struct StripIdsAndFlags;

impl FragmentTransform for StripIdsAndFlags {
    fn name(&self) -> &'static str {
        "strip_ids_and_flags"
    }

    fn apply(&mut self, fragments: Vec<RichFragment>) -> Result<Vec<RichFragment>, TransformError> {
        Ok(strip_ids_and_flags(fragments))
    }
}

/// Borrows the run's [`Gensym`] so ids stay unique across chunks
pub struct AssignIds<'a> {
    pub gensym: &'a mut Gensym,
}

impl FragmentTransform for AssignIds<'_> {
    fn name(&self) -> &'static str {
        "assign_ids"
    }

    fn apply(&mut self, fragments: Vec<RichFragment>) -> Result<Vec<RichFragment>, TransformError> {
        Ok(assign_ids(fragments, self.gensym))
    }
}
