//! Processing configurations
//!
//! A configuration names an ordered list of passes plus the few knobs those passes take.
//! Configurations come from the built-in registry or from YAML files:
//!
//! ```yaml
//! name: handout
//! passes: [attach_comments, process_io_annotations, dedent, commit_io_annotations]
//! defaults: "no-hyps"
//! discard_folded: true
//! ```

use crate::annotations::{process_io_flags, AnnotationError, IoAnnots};
use crate::transforms::AttachMode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unknown config preset '{0}'")]
    UnknownPreset(String),

    #[error("invalid default annotations {directives:?}: {source}")]
    Defaults {
        directives: String,
        source: AnnotationError,
    },

    #[error("unrecognized default annotations {0:?}")]
    UnrecognizedDefaults(String),
}

/// A pass the executor knows how to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassSpec {
    AttachComments,
    GroupHypotheses,
    ProcessIoAnnotations,
    StripFailures,
    Dedent,
    CommitIoAnnotations,
    GroupWhitespace,
    CoalesceText,
    StripText,
    StripIdsAndFlags,
    AssignIds,
}

/// Passes run by default, in order, after enrichment
pub const DEFAULT_PASSES: &[PassSpec] = &[
    PassSpec::AttachComments,
    PassSpec::GroupHypotheses,
    PassSpec::ProcessIoAnnotations,
    PassSpec::StripFailures,
    PassSpec::Dedent,
];

/// A named pass sequence and its settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub name: String,
    pub description: String,
    pub passes: Vec<PassSpec>,
    pub attach_comments: AttachMode,
    pub discard_folded: bool,
    /// Directives every sentence inherits, in the undotted syntax (`"no-hyps fails"`)
    pub defaults: Option<String>,
    pub long_line_threshold: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: "default".into(),
            description: String::new(),
            passes: DEFAULT_PASSES.to_vec(),
            attach_comments: AttachMode::default(),
            discard_folded: false,
            defaults: None,
            long_line_threshold: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Parse `defaults` into the annotations sentences inherit from
    pub fn default_annots(&self) -> Result<Option<IoAnnots>, ConfigError> {
        let Some(directives) = &self.defaults else {
            return Ok(None);
        };
        let mut annots = IoAnnots::new();
        let residue =
            process_io_flags(&mut annots, directives).map_err(|source| ConfigError::Defaults {
                directives: directives.clone(),
                source,
            })?;
        if !residue.is_empty() {
            return Err(ConfigError::UnrecognizedDefaults(residue));
        }
        Ok(Some(annots))
    }
}

/// Registry of processing configurations
pub struct ConfigRegistry {
    configs: HashMap<String, PipelineConfig>,
}

impl ConfigRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        ConfigRegistry {
            configs: HashMap::new(),
        }
    }

    pub fn register(&mut self, config: PipelineConfig) {
        self.configs.insert(config.name.clone(), config);
    }

    pub fn get(&self, name: &str) -> Option<&PipelineConfig> {
        self.configs.get(name)
    }

    /// Like [`ConfigRegistry::get`], failing on unknown names
    pub fn preset(&self, name: &str) -> Result<&PipelineConfig, ConfigError> {
        self.get(name)
            .ok_or_else(|| ConfigError::UnknownPreset(name.to_string()))
    }

    pub fn has(&self, name: &str) -> bool {
        self.configs.contains_key(name)
    }

    /// List all configurations (sorted by name)
    pub fn list_all(&self) -> Vec<&PipelineConfig> {
        let mut configs: Vec<_> = self.configs.values().collect();
        configs.sort_by(|a, b| a.name.cmp(&b.name));
        configs
    }

    /// Create registry with the built-in presets
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register(PipelineConfig {
            name: "default".into(),
            description: "Attach comments, group hypotheses, read annotations, unwrap failures, dedent"
                .into(),
            ..PipelineConfig::default()
        });

        registry.register(PipelineConfig {
            name: "bullets".into(),
            description: "Like default, but only bullets absorb the comments that follow them"
                .into(),
            attach_comments: AttachMode::Bullets,
            ..PipelineConfig::default()
        });

        // Ready for a renderer: hidden parts are gone
        let mut render_passes = DEFAULT_PASSES.to_vec();
        render_passes.push(PassSpec::CommitIoAnnotations);
        registry.register(PipelineConfig {
            name: "render".into(),
            description: "Default passes, then apply annotations".into(),
            passes: render_passes,
            ..PipelineConfig::default()
        });

        registry.register(PipelineConfig {
            name: "literate".into(),
            description: "Merge text, move blanks into sentences, trim chunk edges".into(),
            passes: vec![
                PassSpec::CoalesceText,
                PassSpec::GroupHypotheses,
                PassSpec::ProcessIoAnnotations,
                PassSpec::StripFailures,
                PassSpec::Dedent,
                PassSpec::GroupWhitespace,
                PassSpec::StripText,
            ],
            attach_comments: AttachMode::Never,
            ..PipelineConfig::default()
        });

        registry
    }
}

impl Default for ConfigRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::Flag;

    #[test]
    fn test_registry_creation() {
        let registry = ConfigRegistry::new();
        assert_eq!(registry.configs.len(), 0);
    }

    #[test]
    fn test_registry_register() {
        let mut registry = ConfigRegistry::new();
        registry.register(PipelineConfig {
            name: "test".into(),
            ..PipelineConfig::default()
        });
        assert_eq!(registry.configs.len(), 1);
        assert!(registry.has("test"));
        assert!(!registry.has("default"));
    }

    #[test]
    fn test_registry_with_defaults() {
        let registry = ConfigRegistry::with_defaults();
        for name in ["default", "bullets", "render", "literate"] {
            assert!(registry.has(name), "missing preset {}", name);
        }
        assert_eq!(registry.get("default").unwrap().passes, DEFAULT_PASSES);
        assert_eq!(
            registry.get("bullets").unwrap().attach_comments,
            AttachMode::Bullets
        );
        assert_eq!(
            registry.get("render").unwrap().passes.last(),
            Some(&PassSpec::CommitIoAnnotations)
        );
    }

    #[test]
    fn test_registry_list_all_sorted() {
        let registry = ConfigRegistry::with_defaults();
        let names: Vec<_> = registry.list_all().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["bullets", "default", "literate", "render"]);
    }

    #[test]
    fn test_unknown_preset() {
        let registry = ConfigRegistry::default();
        assert!(matches!(
            registry.preset("nope"),
            Err(ConfigError::UnknownPreset(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_from_yaml() {
        let config = PipelineConfig::from_yaml_str(
            "name: handout\n\
             passes: [attach_comments, process_io_annotations, commit_io_annotations]\n\
             attach_comments: bullets\n\
             discard_folded: true\n\
             defaults: \"no-hyps\"\n",
        )
        .unwrap();
        assert_eq!(config.name, "handout");
        assert_eq!(config.passes.len(), 3);
        assert_eq!(config.attach_comments, AttachMode::Bullets);
        assert!(config.discard_folded);
        assert_eq!(config.long_line_threshold, None);
    }

    #[test]
    fn test_from_yaml_defaults_missing_fields() {
        let config = PipelineConfig::from_yaml_str("name: minimal\n").unwrap();
        assert_eq!(config.passes, DEFAULT_PASSES);
        assert_eq!(config.attach_comments, AttachMode::Always);
    }

    #[test]
    fn test_from_yaml_rejects_unknown_pass() {
        let result = PipelineConfig::from_yaml_str("passes: [frobnicate]\n");
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_from_yaml_file_missing() {
        let result = PipelineConfig::from_yaml_file("/nonexistent/proofweave.yaml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_default_annots() {
        let config = PipelineConfig {
            defaults: Some("no-hyps fails".into()),
            ..PipelineConfig::default()
        };
        let annots = config.default_annots().unwrap().unwrap();
        assert!(!annots.show(Flag::Hyps));
        assert!(annots.show(Flag::Ccls));
        assert_eq!(annots.fails, Some(true));

        assert_eq!(PipelineConfig::default().default_annots().unwrap(), None);
    }

    #[test]
    fn test_default_annots_residue() {
        let config = PipelineConfig {
            defaults: Some("no-hyps key=value".into()),
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.default_annots(),
            Err(ConfigError::UnrecognizedDefaults(residue)) if residue == "key=value"
        ));
    }

    #[test]
    fn test_default_annots_unknown_flag() {
        let config = PipelineConfig {
            defaults: Some("no-frobs".into()),
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.default_annots(),
            Err(ConfigError::Defaults { .. })
        ));
    }
}
