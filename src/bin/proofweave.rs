//! Command-line interface for proofweave
//! Reconciles a driver's fragment stream with the document it ran on and applies the
//! annotation pipeline to each chunk.
//!
//! Usage:
//!   proofweave process `<input.json>` [--config `<name>`] [--config-file `<file>`]  - Run a pipeline
//!   proofweave list-configs                                                     - List presets
//!
//! Input is a JSON object `{ "chunks": [...], "separator": "\n", "addressing": "chars",
//! "fragments": [...] }`; `separator` and `addressing` are optional.

use clap::{Arg, Command};
use proofweave::pipeline::{ExecutionError, PipelineConfig, PipelineExecutor};
use proofweave::{Addressing, Document, Fragment};
use serde::Deserialize;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct Input {
    chunks: Vec<String>,
    #[serde(default = "default_separator")]
    separator: String,
    #[serde(default)]
    addressing: Addressing,
    fragments: Vec<Fragment>,
}

fn default_separator() -> String {
    "\n".to_string()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = Command::new("proofweave")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Reconcile prover output with source chunks and apply visibility annotations")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("process")
                .about("Run a pipeline configuration over a driver's output")
                .arg(
                    Arg::new("input")
                        .help("Path to the JSON input")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .short('c')
                        .help("Name of a built-in configuration")
                        .default_value("default")
                        .conflicts_with("config-file"),
                )
                .arg(
                    Arg::new("config-file")
                        .long("config-file")
                        .help("Path to a YAML configuration"),
                ),
        )
        .subcommand(Command::new("list-configs").about("List built-in configurations"))
        .get_matches();

    match matches.subcommand() {
        Some(("process", process_matches)) => {
            let input = process_matches
                .get_one::<String>("input")
                .map(String::as_str)
                .unwrap_or_default();
            let config = process_matches
                .get_one::<String>("config")
                .map(String::as_str)
                .unwrap_or("default");
            let config_file = process_matches.get_one::<String>("config-file");
            handle_process_command(input, config, config_file.map(String::as_str));
        }
        Some(("list-configs", _)) => {
            handle_list_configs_command();
        }
        _ => unreachable!(),
    }
}

/// Handle the process command
fn handle_process_command(path: &str, config_name: &str, config_file: Option<&str>) {
    let source = std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file: {}", e);
        process::exit(1);
    });
    let input: Input = serde_json::from_str(&source).unwrap_or_else(|e| {
        eprintln!("Invalid input: {}", e);
        process::exit(1);
    });

    let document = Document::with_addressing(input.chunks, &input.separator, input.addressing);
    let executor = PipelineExecutor::new();
    let result = match config_file {
        Some(file) => PipelineConfig::from_yaml_file(file)
            .map_err(ExecutionError::from)
            .and_then(|config| executor.execute_config(&config, &document, input.fragments)),
        None => executor.execute(config_name, &document, input.fragments),
    };

    let outputs = result.unwrap_or_else(|e| {
        eprintln!("Execution error: {}", e);
        process::exit(1);
    });

    match serde_json::to_string_pretty(&outputs) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Cannot serialize output: {}", e);
            process::exit(1);
        }
    }
}

/// Handle the list-configs command
fn handle_list_configs_command() {
    let executor = PipelineExecutor::new();
    println!("Available processing configurations:\n");
    for config in executor.list_configs() {
        println!("  {}", config.name);
        println!("    {}", config.description);
    }
}
