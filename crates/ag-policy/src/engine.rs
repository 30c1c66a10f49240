// engine.rs - Capability Policy Engine: per-invocation evaluation.
//
// The engine resolves the capability's policy from the shared registry and
// runs the checks for each rule kind present, in a fixed order. The first
// check to fail produces the denial; later checks are not run. Evaluation
// is a pure function of (registry, level, capability, parameters).

use std::path::{Component, Path};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::level::SecurityLevel;
use crate::policy::{
    AccessMode, Capability, CommandRules, PathRules, SecurityPolicy, SizeRules, UrlRules,
};
use crate::registry::PolicyRegistry;

/// Invocation parameters as the dispatcher proposes them.
pub type Parameters = serde_json::Map<String, Value>;

/// Longest string a declared parameter may carry, in characters.
pub const MAX_STRING_PARAM: usize = 10_000;

const PATH_PARAMS: &[&str] = &["path", "file_path"];

const PRIVILEGE_PREFIXES: &[&str] = &["sudo", "su", "doas", "pkexec"];

const SHELL_METACHARACTERS: &[&str] = &[";", "&", "|", "`", "$(", ">", "<"];

/// The result of evaluating one invocation. A denial always has a reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationDecision {
    pub allowed: bool,
    /// Empty when allowed.
    pub reason: String,
    pub warnings: Vec<String>,
}

impl InvocationDecision {
    pub fn allow(warnings: Vec<String>) -> Self {
        Self {
            allowed: true,
            reason: String::new(),
            warnings,
        }
    }

    pub fn deny(reason: impl Into<String>, warnings: Vec<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
            warnings,
        }
    }
}

/// One check the engine performed while reaching a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationStep {
    /// Which check ran (e.g. "policy_lookup", "path_rules").
    pub check: String,
    /// "passed", "skipped: ...", or "failed: <reason>".
    pub outcome: String,
    /// Whether this step decided the outcome.
    pub terminal: bool,
}

/// A decision together with the ordered checks that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationTrace {
    pub capability: String,
    pub decision: InvocationDecision,
    pub steps: Vec<EvaluationStep>,
}

#[derive(Default)]
struct Evaluation {
    steps: Vec<EvaluationStep>,
    warnings: Vec<String>,
}

impl Evaluation {
    /// Record a check's outcome. A failed check becomes the denial reason,
    /// prefixed with the check name.
    fn step(&mut self, check: &str, outcome: Result<String, String>) -> Result<(), String> {
        match outcome {
            Ok(outcome) => {
                self.steps.push(EvaluationStep {
                    check: check.to_string(),
                    outcome,
                    terminal: false,
                });
                Ok(())
            }
            Err(reason) => {
                self.steps.push(EvaluationStep {
                    check: check.to_string(),
                    outcome: format!("failed: {}", reason),
                    terminal: true,
                });
                Err(format!("{}: {}", check, reason))
            }
        }
    }
}

/// Evaluates capability invocations against a shared, read-only registry.
///
/// Cloning an engine is cheap; every clone shares the same registry.
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    registry: Arc<PolicyRegistry>,
    level: SecurityLevel,
}

impl PolicyEngine {
    pub fn new(registry: Arc<PolicyRegistry>, level: SecurityLevel) -> Self {
        Self { registry, level }
    }

    pub fn registry(&self) -> &PolicyRegistry {
        &self.registry
    }

    pub fn level(&self) -> SecurityLevel {
        self.level
    }

    /// Decide whether `capability` may run with `params`.
    pub fn evaluate(&self, capability: &str, params: &Parameters) -> InvocationDecision {
        self.evaluate_with_trace(capability, params).decision
    }

    /// Like `evaluate`, but also returns every check performed.
    pub fn evaluate_with_trace(&self, capability: &str, params: &Parameters) -> EvaluationTrace {
        let policy = self.registry.policy_for(capability);
        let mut evaluation = Evaluation::default();
        evaluation.steps.push(EvaluationStep {
            check: "policy_lookup".to_string(),
            outcome: if self.registry.has_policy(capability) {
                format!("found: {}", policy.rule_kinds().join(", "))
            } else {
                "fallback policy".to_string()
            },
            terminal: false,
        });

        let result = self.run_checks(capability, policy, params, &mut evaluation);
        let Evaluation {
            mut steps,
            warnings,
        } = evaluation;

        let decision = match result {
            Ok(()) => {
                steps.push(EvaluationStep {
                    check: "generic".to_string(),
                    outcome: format!(
                        "allowed: timeout {}s, {} attempts",
                        policy.generic.timeout_seconds, policy.generic.max_attempts
                    ),
                    terminal: true,
                });
                tracing::debug!("Allowed {} ({} warnings)", capability, warnings.len());
                InvocationDecision::allow(warnings)
            }
            Err(reason) => {
                tracing::warn!("Denied {}: {}", capability, reason);
                InvocationDecision::deny(reason, warnings)
            }
        };

        EvaluationTrace {
            capability: capability.to_string(),
            decision,
            steps,
        }
    }

    fn run_checks(
        &self,
        capability: &str,
        policy: &SecurityPolicy,
        params: &Parameters,
        evaluation: &mut Evaluation,
    ) -> Result<(), String> {
        if let Some(rules) = &policy.path_rules {
            let outcome = self.check_path(rules, params, &mut evaluation.warnings);
            evaluation.step("path_rules", outcome)?;
        }
        if let Some(rules) = &policy.command_rules {
            let outcome = check_command(rules, params, &mut evaluation.warnings);
            evaluation.step("command_rules", outcome)?;
        }
        if let Some(rules) = &policy.url_rules {
            evaluation.step("url_rules", check_url(rules, params))?;
        }
        if let Some(rules) = &policy.size_rules {
            evaluation.step("size_rules", check_size(rules, params))?;
        }
        if let Some(declared) = self.registry.capability(capability) {
            let payload = policy
                .path_rules
                .as_ref()
                .and_then(|r| r.payload_param.as_deref());
            let outcome = check_schema(declared, payload, params, &mut evaluation.warnings);
            evaluation.step("parameter_schema", outcome)?;
        }
        Ok(())
    }

    /// Every path parameter present gets every check.
    fn check_path(
        &self,
        rules: &PathRules,
        params: &Parameters,
        warnings: &mut Vec<String>,
    ) -> Result<String, String> {
        let mut paths = Vec::new();
        for key in PATH_PARAMS {
            if let Some(value) = params.get(*key) {
                let path = value
                    .as_str()
                    .ok_or_else(|| format!("parameter '{}' must be a string", key))?;
                paths.push(path);
            }
        }
        if paths.is_empty() {
            return Ok("skipped: no path parameter".to_string());
        }

        for path in &paths {
            if contains_path_traversal(path) {
                return Err(format!("path traversal detected in '{}'", path));
            }
            if let Some(pattern) = rules.blocked_patterns.iter().find(|p| p.is_match(path)) {
                return Err(format!(
                    "Access to path blocked by policy: {} (pattern '{}')",
                    path, pattern
                ));
            }
        }
        if rules.mode == AccessMode::Write {
            if let Some(payload) = rules.payload_param.as_deref().and_then(|n| params.get(n)) {
                let size = payload_size(payload);
                if size > rules.max_bytes {
                    return Err(format!(
                        "Content too large: {} bytes (max: {})",
                        size, rules.max_bytes
                    ));
                }
            }
        }

        for path in &paths {
            self.check_placement(rules, path, warnings)?;
        }
        Ok("passed".to_string())
    }

    /// Extension and root containment. Both only warn unless containment is
    /// required.
    fn check_placement(
        &self,
        rules: &PathRules,
        path: &str,
        warnings: &mut Vec<String>,
    ) -> Result<(), String> {
        if !rules.allowed_extensions.is_empty() {
            if let Some(ext) = Path::new(path).extension() {
                let ext = format!(".{}", ext.to_string_lossy());
                if !rules
                    .allowed_extensions
                    .iter()
                    .any(|a| a.eq_ignore_ascii_case(&ext))
                {
                    warnings.push(format!("File extension {} may not be supported", ext));
                }
            }
        }

        if !rules.allowed_roots.is_empty()
            && !rules.allowed_roots.iter().any(|root| is_within(path, root))
        {
            let message = format!(
                "path '{}' is outside the allowed roots ({})",
                path,
                rules.allowed_roots.join(", ")
            );
            if rules.require_containment || self.level == SecurityLevel::Maximum {
                return Err(message);
            }
            warnings.push(message);
        }
        Ok(())
    }
}

fn check_command(
    rules: &CommandRules,
    params: &Parameters,
    warnings: &mut Vec<String>,
) -> Result<String, String> {
    let command = match params.get("command") {
        Some(Value::String(command)) => command.trim(),
        Some(_) => return Err("parameter 'command' must be a string".to_string()),
        None => "",
    };
    if command.is_empty() {
        return Err("empty command".to_string());
    }
    // A line break starts a second command the leading-token check never sees.
    if command.contains(['\n', '\r']) {
        return Err("multi-line commands are not allowed".to_string());
    }
    if command.chars().count() > rules.max_length {
        return Err(format!(
            "command too long: {} characters (max: {})",
            command.chars().count(),
            rules.max_length
        ));
    }
    if let Some(pattern) = rules.blocked_patterns.iter().find(|p| p.is_match(command)) {
        return Err(format!("Command blocked by security policy: {}", pattern));
    }

    let mut tokens = command.split_whitespace();
    let mut leading = tokens.next().unwrap_or_default();
    if PRIVILEGE_PREFIXES.contains(&leading.to_ascii_lowercase().as_str()) {
        if !rules.allow_privilege_escalation {
            return Err(format!("privilege escalation via '{}' is not allowed", leading));
        }
        leading = tokens
            .next()
            .ok_or_else(|| format!("'{}' without a command", leading))?;
    }
    if !rules
        .allowed_commands
        .iter()
        .any(|c| c.eq_ignore_ascii_case(leading))
    {
        return Err(format!(
            "command '{}' is not in the allowed list ({})",
            leading,
            rules.allowed_commands.join(", ")
        ));
    }

    if SHELL_METACHARACTERS.iter().any(|m| command.contains(m)) {
        warnings.push(format!("command contains shell metacharacters: {}", command));
    }
    Ok("passed".to_string())
}

fn check_url(rules: &UrlRules, params: &Parameters) -> Result<String, String> {
    let raw = match params.get("url") {
        Some(Value::String(raw)) => raw.trim(),
        Some(_) => return Err("parameter 'url' must be a string".to_string()),
        None => return Ok("skipped: no url parameter".to_string()),
    };
    let url = Url::parse(raw).map_err(|e| format!("invalid URL '{}': {}", raw, e))?;
    if !rules
        .allowed_schemes
        .iter()
        .any(|s| s.eq_ignore_ascii_case(url.scheme()))
    {
        return Err(format!("URL scheme not allowed: {}", url.scheme()));
    }

    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    let lowered = raw.to_ascii_lowercase();
    for domain in &rules.blocked_domains {
        let needle = domain.to_ascii_lowercase();
        let blocked = if needle.contains("://") {
            lowered.starts_with(&needle)
        } else {
            !host.is_empty() && host.contains(&needle)
        };
        if blocked {
            return Err(format!(
                "Access to domain blocked: {} (matches '{}')",
                host, domain
            ));
        }
    }
    Ok("passed".to_string())
}

fn check_size(rules: &SizeRules, params: &Parameters) -> Result<String, String> {
    let size = serde_json::to_vec(params)
        .map_err(|e| format!("parameters could not be serialized: {}", e))?
        .len();
    if size > rules.max_input_bytes {
        return Err(format!(
            "Content too large: {} bytes (max: {})",
            size, rules.max_input_bytes
        ));
    }
    Ok(format!("passed: {} bytes", size))
}

fn check_schema(
    capability: &Capability,
    payload_param: Option<&str>,
    params: &Parameters,
    warnings: &mut Vec<String>,
) -> Result<String, String> {
    if let Some(missing) = capability
        .declared_parameters
        .iter()
        .find(|spec| spec.required && !params.contains_key(&spec.name))
    {
        return Err(format!("missing required parameter '{}'", missing.name));
    }

    for (name, value) in params {
        match capability.parameter(name) {
            None => warnings.push(format!(
                "undeclared parameter '{}' for {}",
                name, capability.name
            )),
            Some(spec) if !spec.kind.accepts(value) => {
                warnings.push(format!("parameter '{}' should be {}", name, spec.kind))
            }
            Some(_) => {}
        }
        if let Value::String(text) = value {
            let length = text.chars().count();
            if length > MAX_STRING_PARAM && payload_param != Some(name.as_str()) {
                return Err(format!(
                    "parameter '{}' is too long: {} characters (max: {})",
                    name, length, MAX_STRING_PARAM
                ));
            }
        }
    }
    Ok(format!(
        "passed: {} declared parameters",
        capability.declared_parameters.len()
    ))
}

/// Raw-string traversal check, so encoded forms are caught too.
fn contains_path_traversal(path: &str) -> bool {
    let lowered = path.to_ascii_lowercase();
    path.contains("..")
        || lowered.contains("%2e%2e")
        || lowered.contains(".%2e")
        || lowered.contains("%2e.")
}

fn payload_size(value: &Value) -> u64 {
    match value {
        Value::String(text) => text.len() as u64,
        other => other.to_string().len() as u64,
    }
}

/// Lexical containment. Paths are not resolved against the filesystem.
fn is_within(path: &str, root: &str) -> bool {
    if path.starts_with('~') != root.starts_with('~') {
        return false;
    }
    let path = Path::new(path);
    let root = Path::new(root);
    if path.has_root() != root.has_root() {
        return false;
    }
    let path: Vec<Component> = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    let root: Vec<Component> = root
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    path.starts_with(&root)
}
