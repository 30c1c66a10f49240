// End-to-end gate scenarios: registry + engine + classifier together.

use std::sync::Arc;

use ag_policy::{
    Parameters, PolicyEngine, PolicyRegistry, RiskClassifier, RiskTier, SecurityLevel,
    SecuritySummary,
};
use serde_json::{json, Value};

fn params(value: Value) -> Parameters {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {:?}", other),
    }
}

fn builtin_engine(level: SecurityLevel) -> PolicyEngine {
    PolicyEngine::new(Arc::new(PolicyRegistry::builtin()), level)
}

#[test]
fn recursive_force_remove_is_denied_with_pattern() {
    let decision = builtin_engine(SecurityLevel::Medium)
        .evaluate("execute_command", &params(json!({"command": "rm -rf /"})));
    assert!(!decision.allowed);
    assert!(decision.reason.contains("rm\\s+"), "{}", decision.reason);
}

#[test]
fn reading_inside_current_directory_is_allowed_cleanly() {
    let decision = builtin_engine(SecurityLevel::Medium)
        .evaluate("read_file", &params(json!({"path": "./notes.txt"})));
    assert!(decision.allowed);
    assert!(decision.warnings.is_empty());
}

#[test]
fn parent_traversal_is_denied_regardless_of_other_parameters() {
    let engine = builtin_engine(SecurityLevel::Low);
    let requests = [
        ("read_file", json!({"path": "../notes.txt"})),
        ("write_to_file", json!({"path": "./out/../../x.py", "content": "ok"})),
        ("list_files", json!({"path": "src/..", "recursive": true})),
        ("search_files", json!({"path": "..", "regex": "fn main"})),
    ];
    for (capability, request) in requests {
        let decision = engine.evaluate(capability, &params(request));
        assert!(!decision.allowed, "{} should be denied", capability);
        assert!(decision.reason.contains("traversal"));
    }
}

#[test]
fn command_and_browser_at_high_level_are_flagged() {
    let assessment = RiskClassifier::default()
        .classify(&["execute_command", "browser_navigate"], SecurityLevel::High);
    assert_eq!(assessment.tier_of("execute_command"), Some(RiskTier::High));
    assert_eq!(assessment.tier_of("browser_navigate"), Some(RiskTier::High));
    assert!(!assessment.compatibility_issues.is_empty());
    assert!(assessment.compatibility_issues[0].contains("command execution"));
    assert!(assessment.compatibility_issues[0].contains("browser automation"));
}

#[test]
fn unknown_capability_receives_a_decision() {
    let engine = builtin_engine(SecurityLevel::Maximum);
    let decision = engine.evaluate("translate_text", &params(json!({"text": "hola"})));
    assert!(decision.allowed);
    assert_eq!(
        engine.registry().policy_for("translate_text"),
        engine.registry().fallback()
    );
}

#[test]
fn engines_share_one_registry_across_threads() {
    let registry = Arc::new(PolicyRegistry::builtin());
    let requests = vec![
        ("read_file", json!({"path": "./a.md"})),
        ("execute_command", json!({"command": "mkfs.ext4 /dev/sda1"})),
        ("browser_navigate", json!({"url": "https://example.com"})),
        ("browser_navigate", json!({"url": "http://127.0.0.1/"})),
        ("execute_command", json!({"command": "ls -la"})),
    ];
    let serial: Vec<bool> = {
        let engine = PolicyEngine::new(Arc::clone(&registry), SecurityLevel::High);
        requests
            .iter()
            .map(|(c, p)| engine.evaluate(c, &params(p.clone())).allowed)
            .collect()
    };

    let parallel: Vec<bool> = std::thread::scope(|scope| {
        let handles: Vec<_> = requests
            .iter()
            .map(|(capability, request)| {
                let engine = PolicyEngine::new(Arc::clone(&registry), SecurityLevel::High);
                scope.spawn(move || engine.evaluate(capability, &params(request.clone())).allowed)
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(parallel, serial);
    assert_eq!(parallel, vec![true, false, true, false, true]);
}

#[test]
fn policy_file_drives_evaluation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agentgate-policies.yaml");
    std::fs::write(
        &path,
        r#"
policies:
  deploy_service:
    command_rules:
      allowed_commands: [kubectl, helm]
      blocked_patterns: ['delete\s+namespace']
capabilities:
  - name: deploy_service
    declared_parameters:
      - { name: command, kind: string }
"#,
    )
    .unwrap();

    let engine = PolicyEngine::new(
        Arc::new(PolicyRegistry::load(&path).unwrap()),
        SecurityLevel::Medium,
    );
    assert!(
        engine
            .evaluate("deploy_service", &params(json!({"command": "helm upgrade web ./chart"})))
            .allowed
    );
    let denied = engine.evaluate(
        "deploy_service",
        &params(json!({"command": "kubectl delete namespace prod"})),
    );
    assert!(!denied.allowed);
    assert!(denied.reason.contains("delete\\s+namespace"));

    // Built-in entries survive unless the document opts out.
    assert!(engine.registry().has_policy("execute_command"));
}

#[test]
fn summary_reports_fallback_capabilities() {
    let registry = PolicyRegistry::builtin();
    let summary = SecuritySummary::build(
        SecurityLevel::High,
        &["execute_command", "browser_navigate", "translate_text"],
        &registry,
        &RiskClassifier::default(),
    );
    assert_eq!(summary.capability_count, 3);
    assert!(summary.capabilities[2].uses_fallback);
    assert_eq!(summary.compatibility_issues.len(), 1);
    assert!(summary.recommendations.len() >= 4);
}

#[test]
fn both_path_keys_are_checked_at_maximum() {
    let engine = builtin_engine(SecurityLevel::Maximum);
    let decision = engine.evaluate(
        "read_file",
        &params(json!({"path": "./notes.txt", "file_path": "../../etc/shadow"})),
    );
    assert!(!decision.allowed);
    assert!(decision.reason.starts_with("path_rules:"), "{}", decision.reason);

    let decision = engine.evaluate(
        "write_to_file",
        &params(json!({"path": "./out.txt", "file_path": "/etc/passwd", "content": "x"})),
    );
    assert!(!decision.allowed);
    assert!(decision.reason.contains("/etc/"), "{}", decision.reason);
}

#[test]
fn second_command_on_a_new_line_is_denied() {
    let decision = builtin_engine(SecurityLevel::High)
        .evaluate("execute_command", &params(json!({"command": "ls\nrm -r -f /"})));
    assert!(!decision.allowed);
    assert!(decision.reason.starts_with("command_rules:"), "{}", decision.reason);

    let decision = builtin_engine(SecurityLevel::High)
        .evaluate("execute_command", &params(json!({"command": "ls; rm --recursive --force /"})));
    assert!(!decision.allowed);
    assert!(decision.reason.contains("Command blocked by security policy"));
}
