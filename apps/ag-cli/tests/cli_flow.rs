// End-to-end runs of the `ag` binary. Each test works in its own temporary
// directory so no ambient agentgate.yaml is picked up.

use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;

fn ag(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ag"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn validate_passes_clean_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("agent.py"), "import os\nname = os.getenv('N')\n").unwrap();

    let output = ag(dir.path(), &["validate", "agent.py"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("PASSED"));
}

#[test]
fn validate_fails_on_forbidden_call() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("agent.py"), "import os\neval(x)\n").unwrap();

    let output = ag(dir.path(), &["validate", "agent.py"]);
    assert!(!output.status.success());
    assert!(stdout(&output).contains("Line 2: Forbidden function call: eval"));
    assert!(stderr(&output).contains("1 of 1 file(s) failed validation"));
}

#[test]
fn validate_json_reports_syntax_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("broken.py"), "import os\ndef f(:\n").unwrap();

    let output = ag(dir.path(), &["validate", "--json", "broken.py"]);
    assert!(!output.status.success());
    let report: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["file"], "broken.py");
    assert_eq!(report["valid"], false);
    assert_eq!(report["errors"][0]["line"], 2);
}

#[test]
fn evaluate_denial_exits_with_reason() {
    let dir = tempfile::tempdir().unwrap();
    let output = ag(
        dir.path(),
        &["evaluate", "execute_command", "--params", r#"{"command":"rm -rf /"}"#],
    );
    assert!(!output.status.success());
    let decision: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(decision["allowed"], false);
    assert!(stderr(&output).contains("execute_command denied"));
}

#[test]
fn evaluate_allowed_prints_decision() {
    let dir = tempfile::tempdir().unwrap();
    let output = ag(
        dir.path(),
        &["evaluate", "read_file", "--params", r#"{"path":"./notes.txt"}"#, "--trace"],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    let trace: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(trace["decision"]["allowed"], true);
    assert_eq!(trace["steps"][0]["check"], "policy_lookup");
}

#[test]
fn level_flag_overrides_config_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("gate.yaml"), "security_level: maximum\n").unwrap();
    let outside = r#"{"path":"/srv/data/report.md"}"#;

    let from_config = ag(
        dir.path(),
        &["--config", "gate.yaml", "evaluate", "read_file", "--params", outside],
    );
    assert!(!from_config.status.success());
    assert!(stdout(&from_config).contains("outside the allowed roots"));

    let overridden = ag(
        dir.path(),
        &["--config", "gate.yaml", "--level", "low", "evaluate", "read_file", "--params", outside],
    );
    assert!(overridden.status.success(), "{}", stderr(&overridden));
}

#[test]
fn default_config_file_is_read_from_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("agentgate.yaml"),
        "validator:\n  allowed_imports: [os]\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("agent.py"), "import json\n").unwrap();

    let output = ag(dir.path(), &["validate", "agent.py"]);
    assert!(!output.status.success());
    assert!(stdout(&output).contains("Unauthorized import: json"));
}

#[test]
fn policy_prints_resolved_rules() {
    let dir = tempfile::tempdir().unwrap();
    let output = ag(dir.path(), &["policy", "read_file"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("path_rules"));
    assert!(text.contains("uses_fallback: false"));

    let fallback = ag(dir.path(), &["policy", "summon_dragon"]);
    assert!(stdout(&fallback).contains("uses_fallback: true"));
}

#[test]
fn summary_is_json_for_the_capability_set() {
    let dir = tempfile::tempdir().unwrap();
    let output = ag(
        dir.path(),
        &["--level", "high", "summary", "execute_command", "browser_navigate"],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    let summary: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(summary["capability_count"], 2);
    assert_eq!(summary["security_level"], "high");
    assert!(!summary["compatibility_issues"].as_array().unwrap().is_empty());
}
