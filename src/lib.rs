//! # proofweave
//!
//! Reconciles the positioned output of an external prover with the chunks of
//! the document that was sent to it, then applies inline visibility
//! annotations to decide which parts of the computed output get rendered.
//!
//! The flow is:
//!
//! ```text
//! driver output (flat fragments) ──► Document::recover_chunks ──► per-chunk fragments
//!                                                                   │
//!                    PipelineExecutor (enrich, attach comments, ... dedent)
//!                                                                   │
//!                                             commit_io_annotations ▼ renderer
//! ```
//!
//! Leaves first: [`location`] → [`content`] → [`fragment`] / [`document`] →
//! [`annotations`] / [`enriched`] → [`transforms`] → [`pipeline`].

pub mod annotations;
pub mod content;
pub mod document;
pub mod enriched;
pub mod fragment;
pub mod literate;
pub mod location;
pub mod markers;
pub mod pipeline;
pub mod transforms;

pub use content::{FragmentContent, FragmentToken, TypeInfo};
pub use document::{Document, DocumentError};
pub use enriched::{Gensym, RichFragment, RichSentence};
pub use fragment::{Fragment, Goal, Hypothesis, Message, Sentence, Text};
pub use location::{Addressing, LineIndex, Position, Range};
pub use pipeline::{
    ConfigRegistry, ExecutionError, PassSpec, PipelineConfig, PipelineExecutor, PipelineOutput,
};
