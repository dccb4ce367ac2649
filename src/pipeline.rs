//! Config-based processing of prover output
//!
//! This module provides:
//! - Named pass sequences (`PipelineConfig`) and their registry (`ConfigRegistry`)
//! - The executor that reconciles a document and runs a configuration over each chunk

pub mod config;
pub mod executor;

pub use config::{ConfigError, ConfigRegistry, PassSpec, PipelineConfig, DEFAULT_PASSES};
pub use executor::{ExecutionError, PipelineExecutor, PipelineOutput};
