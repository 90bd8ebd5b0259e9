#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use coachgraph::cli::import_export::load_graph;
use serde_json::Value;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// A command isolated from the user's config and log settings.
fn coachgraph(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("coachgraph");
    cmd.env("COACHGRAPH_CONFIG", dir.path().join("cli.toml"))
        .env_remove("RUST_LOG");
    cmd
}

fn json_stdout(cmd: &mut Command, code: i32) -> Value {
    let output = cmd.assert().code(code).get_output().stdout.clone();
    serde_json::from_slice(&output).expect("valid json")
}

#[test]
fn total_writes_updated_graph() {
    let dir = TempDir::new().expect("tempdir");
    let out = dir.path().join("out.json");
    let json = json_stdout(
        coachgraph(&dir)
            .args(["--format", "json", "total"])
            .arg(fixture("graph1.json"))
            .args(["--feature", "dark-mode", "--user", "C", "--out"])
            .arg(&out),
        0,
    );
    assert_eq!(json["outcome"]["status"], "infected");
    assert_eq!(json["infected"], 4);
    assert_eq!(json["policy"]["anchor"], "C");

    let graph = load_graph(&out).expect("load written graph");
    assert!(graph
        .nodes()
        .all(|node| node.features().contains("dark-mode")));
}

#[test]
fn exact_infeasible_exits_with_two() {
    let dir = TempDir::new().expect("tempdir");
    let out = dir.path().join("out.json");
    let json = json_stdout(
        coachgraph(&dir)
            .args(["--format", "json", "exact"])
            .arg(fixture("graph1.json"))
            .args(["--feature", "x", "--count", "3", "--out"])
            .arg(&out),
        2,
    );
    assert_eq!(json["outcome"]["status"], "infeasible");
    assert_eq!(json["outcome"]["reason"]["code"], "no_exact_subset");
    assert!(!out.exists(), "infeasible runs must not write the graph");
}

#[test]
fn exact_picks_matching_component() {
    let dir = TempDir::new().expect("tempdir");
    let json = json_stdout(
        coachgraph(&dir)
            .args(["--format", "json", "exact"])
            .arg(fixture("graph3.json"))
            .args(["--feature", "x", "--count", "4"]),
        0,
    );
    assert_eq!(json["users"], serde_json::json!(["J", "K", "L", "M"]));
    assert_eq!(json["components_selected"], 1);
}

#[test]
fn limited_uses_classes_inside_one_component() {
    let dir = TempDir::new().expect("tempdir");
    let json = json_stdout(
        coachgraph(&dir)
            .args(["--format", "json", "limited"])
            .arg(fixture("graph2.json"))
            .args(["--feature", "x", "--min", "4", "--max", "8"]),
        0,
    );
    let infected = json["infected"].as_u64().expect("infected count");
    assert!((4..=8).contains(&infected));
    assert!(json["classes_selected"].as_u64().unwrap_or(0) > 0);
}

#[test]
fn limited_text_output_lists_users() {
    let dir = TempDir::new().expect("tempdir");
    let output = coachgraph(&dir)
        .arg("--quiet")
        .arg("limited")
        .arg(fixture("graph3.json"))
        .args(["--feature", "x", "--min", "3", "--max", "5"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8_lossy(&output);
    assert!(text.contains("Infected 4 users"), "{text}");
    for id in ["J", "K", "L", "M"] {
        assert!(text.contains(&format!("- {id}")), "{text}");
    }
}

#[test]
fn removing_a_preloaded_feature() {
    let dir = TempDir::new().expect("tempdir");
    let out = dir.path().join("out.json");
    coachgraph(&dir)
        .arg("total")
        .arg(fixture("graph3.json"))
        .args(["--feature", "!beta", "--user", "M", "--out"])
        .arg(&out)
        .assert()
        .success();
    let graph = load_graph(&out).expect("load written graph");
    assert!(graph.nodes().all(|node| !node.features().contains("beta")));
}

#[test]
fn components_summarizes_graph() {
    let dir = TempDir::new().expect("tempdir");
    let json = json_stdout(
        coachgraph(&dir)
            .args(["--format", "json", "components"])
            .arg(fixture("graph3.json")),
        0,
    );
    assert_eq!(json["users"], 13);
    assert_eq!(json["edges"], 11);
    assert_eq!(json["sizes"], serde_json::json!([9, 4]));
    assert_eq!(json["parents"], 5);
    assert_eq!(json["singletons"], 0);
}

#[test]
fn unknown_user_is_an_error() {
    let dir = TempDir::new().expect("tempdir");
    let output = coachgraph(&dir)
        .arg("total")
        .arg(fixture("graph1.json"))
        .args(["--feature", "x", "--user", "Z"])
        .assert()
        .code(1)
        .get_output()
        .stderr
        .clone();
    assert!(String::from_utf8_lossy(&output).contains("user 'Z' not found"));
}

#[test]
fn malformed_document_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let bad = dir.path().join("bad.json");
    fs::write(&bad, r#"{"users": ["A"], "coaches": {"A": ["B"]}}"#).expect("write");
    let output = coachgraph(&dir)
        .arg("components")
        .arg(&bad)
        .assert()
        .code(1)
        .get_output()
        .stderr
        .clone();
    assert!(String::from_utf8_lossy(&output).contains("'B'"));
}

#[test]
fn generate_is_deterministic_per_seed() {
    let dir = TempDir::new().expect("tempdir");
    let first = dir.path().join("first.json");
    let second = dir.path().join("second.json");
    for path in [&first, &second] {
        let json = json_stdout(
            coachgraph(&dir)
                .args(["--format", "json", "generate"])
                .arg(path)
                .args(["--classes", "30", "--min-size", "2", "--max-size", "6"])
                .args(["--existing-rate", "0.5", "--seed", "42"]),
            0,
        );
        assert_eq!(json["seed"], 42);
    }
    assert_eq!(
        fs::read_to_string(&first).expect("read"),
        fs::read_to_string(&second).expect("read")
    );
    assert!(load_graph(&first).expect("load").len() >= 60);
}

#[test]
fn generate_rejects_inverted_sizes() {
    let dir = TempDir::new().expect("tempdir");
    coachgraph(&dir)
        .arg("generate")
        .arg(dir.path().join("g.json"))
        .args(["--classes", "3", "--min-size", "5", "--max-size", "2"])
        .assert()
        .code(1);
}

#[test]
fn profile_budget_applies_until_overridden() {
    let dir = TempDir::new().expect("tempdir");
    coachgraph(&dir)
        .args(["--max-search-steps", "0", "profile", "set", "tight"])
        .args(["--log-level", "debug"])
        .assert()
        .success();
    coachgraph(&dir)
        .args(["profile", "default", "tight"])
        .assert()
        .success();

    let listed = json_stdout(
        coachgraph(&dir).args(["--format", "json", "profile", "list"]),
        0,
    );
    assert_eq!(listed[0]["name"], "tight");
    assert_eq!(listed[0]["default"], true);
    assert_eq!(listed[0]["max_search_steps"], 0);

    let capped = json_stdout(
        coachgraph(&dir)
            .args(["--format", "json", "exact"])
            .arg(fixture("graph3.json"))
            .args(["--feature", "x", "--count", "4"]),
        2,
    );
    assert_eq!(
        capped["outcome"]["reason"]["code"],
        "search_budget_exhausted"
    );

    json_stdout(
        coachgraph(&dir)
            .args(["--format", "json", "--max-search-steps", "100", "exact"])
            .arg(fixture("graph3.json"))
            .args(["--feature", "x", "--count", "4"]),
        0,
    );
}

#[test]
fn profile_delete_clears_default() {
    let dir = TempDir::new().expect("tempdir");
    coachgraph(&dir)
        .args(["--theme", "plain", "profile", "set", "ci"])
        .assert()
        .success();
    coachgraph(&dir)
        .args(["profile", "default", "ci"])
        .assert()
        .success();
    coachgraph(&dir)
        .args(["profile", "delete", "ci"])
        .assert()
        .success();

    let config = fs::read_to_string(dir.path().join("cli.toml")).expect("config written");
    assert!(!config.contains("ci"));
    coachgraph(&dir)
        .args(["profile", "show", "ci"])
        .assert()
        .code(1);
    coachgraph(&dir)
        .args(["--profile", "ci", "components"])
        .arg(fixture("graph1.json"))
        .assert()
        .code(1);
}

#[test]
fn help_lists_every_subcommand() {
    let dir = TempDir::new().expect("tempdir");
    let output = coachgraph(&dir)
        .arg("--help")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8_lossy(&output);
    for command in ["total", "exact", "limited", "components", "generate", "profile"] {
        assert!(text.contains(command), "{command} missing from:\n{text}");
    }
}
