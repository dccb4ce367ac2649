//! Pipeline executor that runs processing configurations

use crate::annotations::IoAnnots;
use crate::document::{Document, DocumentError};
use crate::enriched::{enrich, Gensym, RichFragment};
use crate::fragment::Fragment;
use crate::pipeline::config::{ConfigError, ConfigRegistry, PassSpec, PipelineConfig};
use crate::transforms::{
    find_long_lines, AssignIds, AttachComments, CoalesceText, CommitIoAnnotations, Dedent,
    FragmentTransform, GroupHypotheses, GroupWhitespace, LongLine, ProcessIoAnnotations,
    StripFailures, StripIdsAndFlags, StripText, TransformError,
};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Errors during pipeline execution
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("config '{0}' not found")]
    ConfigNotFound(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("chunk {chunk}: {source}")]
    Transform {
        chunk: usize,
        source: TransformError,
    },
}

/// Processed fragments of one chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineOutput {
    pub fragments: Vec<RichFragment>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub long_lines: Vec<LongLine>,
}

/// Executes processing configurations
pub struct PipelineExecutor {
    registry: ConfigRegistry,
}

impl PipelineExecutor {
    /// Create executor with the built-in presets
    pub fn new() -> Self {
        Self {
            registry: ConfigRegistry::with_defaults(),
        }
    }

    /// Create executor with custom registry
    pub fn with_registry(registry: ConfigRegistry) -> Self {
        Self { registry }
    }

    /// Reconcile `fragments` with `document` and run the named configuration on each chunk
    pub fn execute(
        &self,
        config_name: &str,
        document: &Document,
        fragments: Vec<Fragment>,
    ) -> Result<Vec<PipelineOutput>, ExecutionError> {
        let config = self
            .registry
            .get(config_name)
            .ok_or_else(|| ExecutionError::ConfigNotFound(config_name.to_string()))?;
        self.execute_config(config, document, fragments)
    }

    /// Like [`PipelineExecutor::execute`], with a configuration outside the registry
    pub fn execute_config(
        &self,
        config: &PipelineConfig,
        document: &Document,
        fragments: Vec<Fragment>,
    ) -> Result<Vec<PipelineOutput>, ExecutionError> {
        let defaults = config.default_annots()?;
        let chunks = document.recover_chunks(fragments)?;
        let mut gensym = Gensym::default();

        chunks
            .into_iter()
            .enumerate()
            .map(|(chunk, fragments)| {
                run_passes(config, defaults.as_ref(), fragments, &mut gensym)
                    .map_err(|source| ExecutionError::Transform { chunk, source })
            })
            .collect()
    }

    /// List all available configurations
    pub fn list_configs(&self) -> Vec<&PipelineConfig> {
        self.registry.list_all()
    }

    /// Get the registry
    pub fn registry(&self) -> &ConfigRegistry {
        &self.registry
    }
}

impl Default for PipelineExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Enrich one chunk's fragments and run every configured pass over them
pub fn run_passes(
    config: &PipelineConfig,
    defaults: Option<&IoAnnots>,
    fragments: Vec<Fragment>,
    gensym: &mut Gensym,
) -> Result<PipelineOutput, TransformError> {
    let mut fragments = enrich(fragments);

    for &spec in &config.passes {
        let mut pass = build_pass(spec, config, defaults, gensym);
        debug!(
            pass = pass.name(),
            fragments = fragments.len(),
            "running pass"
        );
        fragments = pass.apply(fragments)?;
    }

    let long_lines = config
        .long_line_threshold
        .map(|threshold| find_long_lines(&fragments, threshold))
        .unwrap_or_default();

    Ok(PipelineOutput {
        fragments,
        long_lines,
    })
}

fn build_pass<'a>(
    spec: PassSpec,
    config: &PipelineConfig,
    defaults: Option<&IoAnnots>,
    gensym: &'a mut Gensym,
) -> Box<dyn FragmentTransform + 'a> {
    match spec {
        PassSpec::AttachComments => Box::new(AttachComments {
            mode: config.attach_comments,
        }),
        PassSpec::GroupHypotheses => Box::new(GroupHypotheses),
        PassSpec::ProcessIoAnnotations => Box::new(ProcessIoAnnotations {
            defaults: defaults.cloned(),
        }),
        PassSpec::StripFailures => Box::new(StripFailures),
        PassSpec::Dedent => Box::new(Dedent),
        PassSpec::CommitIoAnnotations => Box::new(CommitIoAnnotations {
            discard_folded: config.discard_folded,
        }),
        PassSpec::GroupWhitespace => Box::new(GroupWhitespace),
        PassSpec::CoalesceText => Box::new(CoalesceText),
        PassSpec::StripText => Box::new(StripText),
        PassSpec::StripIdsAndFlags => Box::new(StripIdsAndFlags),
        PassSpec::AssignIds => Box::new(AssignIds { gensym }),
    }
}
