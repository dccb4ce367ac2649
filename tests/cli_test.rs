use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const INPUT: &str = r#"{
  "chunks": ["intros. (* .unfold *)", "Fail exact I. (* .fails .no-hyps *)"],
  "fragments": [
    {"kind": "sentence", "contents": "intros.",
     "messages": [], "goals": [{"name": null, "conclusion": "True", "hypotheses": []}]},
    {"kind": "text", "contents": " (* .unfold *)\n"},
    {"kind": "sentence", "contents": "Fail exact I.",
     "messages": [{"contents": "The command has indeed failed with message:\n  Nope."}],
     "goals": []},
    {"kind": "text", "contents": " (* .fails .no-hyps *)\n"}
  ]
}"#;

fn write_input(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn process_with_default_config() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "input.json", INPUT);

    let mut cmd = cargo_bin_cmd!("proofweave");
    cmd.arg("process").arg(&input);

    let output_pred = predicate::str::contains(r#""unfold": true"#)
        .and(predicate::str::contains(r#""fails": true"#))
        .and(predicate::str::contains(r#""exact I.""#))
        .and(predicate::str::contains("(* .unfold *)").not());

    cmd.assert().success().stdout(output_pred);
}

#[test]
fn process_with_config_file() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "input.json", INPUT);
    let config = write_input(
        &dir,
        "config.yaml",
        "name: handout\npasses: [attach_comments, process_io_annotations, assign_ids]\n",
    );

    let mut cmd = cargo_bin_cmd!("proofweave");
    cmd.arg("process")
        .arg(&input)
        .arg("--config-file")
        .arg(&config);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(r#""s0""#).and(predicate::str::contains(r#""s1""#)));
}

#[test]
fn process_unknown_config_fails() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "input.json", INPUT);

    let mut cmd = cargo_bin_cmd!("proofweave");
    cmd.arg("process").arg(&input).arg("--config").arg("nope");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("config 'nope' not found"));
}

#[test]
fn process_mismatched_chunks_fails() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        "input.json",
        r#"{"chunks": ["a."], "fragments": [{"kind": "text", "contents": "b.\n"}]}"#,
    );

    let mut cmd = cargo_bin_cmd!("proofweave");
    cmd.arg("process").arg(&input);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Execution error"));
}

#[test]
fn process_missing_file_fails() {
    let mut cmd = cargo_bin_cmd!("proofweave");
    cmd.arg("process").arg("/nonexistent/input.json");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Error reading file"));
}

#[test]
fn list_configs_shows_presets() {
    let mut cmd = cargo_bin_cmd!("proofweave");
    cmd.arg("list-configs");

    cmd.assert().success().stdout(
        predicate::str::contains("default")
            .and(predicate::str::contains("bullets"))
            .and(predicate::str::contains("render"))
            .and(predicate::str::contains("literate")),
    );
}
