// registry.rs - The Policy Registry.
//
// Built once (from the built-in table, a YAML document, or a builder) and
// read-only afterwards. Lookups never fail: a capability the registry has
// not been told about receives the fallback policy.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;
use crate::policy::{
    AccessMode, BlockedPattern, Capability, CommandRules, ParamKind, ParamSpec, PathRules,
    SecurityPolicy, SizeRules, UrlRules,
};

const MIB: u64 = 1024 * 1024;

const BLOCKED_PATHS: &[&str] = &["/etc/", "/proc/", "/sys/", "/root/", "~/.ssh", "~/.gnupg"];

const BLOCKED_COMMANDS: &[&str] = &[
    r"rm\s+-[a-z]*r[a-z]*f",
    r"rm\s+-[a-z]*f[a-z]*r",
    r"rm\s+(.*\s)?(-[a-z]*r[a-z]*|--recursive)\s+(.*\s)?(-[a-z]*f[a-z]*|--force)",
    r"rm\s+(.*\s)?(-[a-z]*f[a-z]*|--force)\s+(.*\s)?(-[a-z]*r[a-z]*|--recursive)",
    r"dd\s+if=",
    r":\(\)\s*\{",
    r"mkfs",
    r"chmod\s+\d+\s+/",
    r">\s*/dev/sd",
    r"wget.*\|",
    r"curl.*\|",
];

const READ_EXTENSIONS: &[&str] = &[
    ".py", ".md", ".txt", ".json", ".yaml", ".yml", ".js", ".ts", ".java", ".cpp", ".c", ".h",
];

const WRITE_ROOTS: &[&str] = &[".", "./workspace", "./project", "./output", "./temp"];

/// A YAML policy document.
///
/// ```yaml
/// builtin: true          # start from the built-in table (default)
/// policies:
///   deploy_service:
///     command_rules:
///       allowed_commands: [kubectl]
///       blocked_patterns: ['delete\s+namespace']
/// capabilities:
///   - name: deploy_service
///     declared_parameters:
///       - { name: command, kind: string }
/// fallback:
///   generic: { timeout_seconds: 20, max_attempts: 2 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(default = "default_builtin")]
    pub builtin: bool,
    #[serde(default)]
    pub policies: BTreeMap<String, SecurityPolicy>,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<SecurityPolicy>,
}

fn default_builtin() -> bool {
    true
}

impl Default for PolicyDocument {
    fn default() -> Self {
        Self {
            builtin: true,
            policies: BTreeMap::new(),
            capabilities: Vec::new(),
            fallback: None,
        }
    }
}

/// Immutable capability-name → policy mapping plus a fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRegistry {
    policies: BTreeMap<String, SecurityPolicy>,
    capabilities: BTreeMap<String, Capability>,
    fallback: SecurityPolicy,
}

impl PolicyRegistry {
    /// The built-in table of known capability kinds.
    pub fn builtin() -> Self {
        RegistryBuilder::with_builtin().build()
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Build a registry from a YAML policy document.
    pub fn from_yaml(text: &str) -> Result<Self, PolicyError> {
        let document: PolicyDocument = serde_yaml::from_str(text)?;
        Ok(Self::from_document(document))
    }

    pub fn from_document(document: PolicyDocument) -> Self {
        let mut builder = if document.builtin {
            RegistryBuilder::with_builtin()
        } else {
            RegistryBuilder::new()
        };
        for (name, policy) in document.policies {
            builder = builder.policy(&name, policy);
        }
        for capability in document.capabilities {
            builder = builder.capability(capability);
        }
        if let Some(fallback) = document.fallback {
            builder = builder.fallback(fallback);
        }
        builder.build()
    }

    /// Read and parse a YAML policy file.
    pub fn load(path: &Path) -> Result<Self, PolicyError> {
        let text = std::fs::read_to_string(path).map_err(|source| PolicyError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let registry = Self::from_yaml(&text)?;
        tracing::debug!(
            "Loaded {} policies from {}",
            registry.policies.len(),
            path.display()
        );
        Ok(registry)
    }

    /// The policy for a capability, or the fallback for unknown names.
    pub fn policy_for(&self, capability: &str) -> &SecurityPolicy {
        self.policies.get(capability).unwrap_or(&self.fallback)
    }

    /// Whether the capability has its own entry (rather than the fallback).
    pub fn has_policy(&self, capability: &str) -> bool {
        self.policies.contains_key(capability)
    }

    pub fn capability(&self, name: &str) -> Option<&Capability> {
        self.capabilities.get(name)
    }

    pub fn fallback(&self) -> &SecurityPolicy {
        &self.fallback
    }

    pub fn policy_names(&self) -> impl Iterator<Item = &str> {
        self.policies.keys().map(String::as_str)
    }
}

impl Default for PolicyRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Accumulates entries before the registry is frozen.
#[derive(Debug, Clone, Default)]
pub struct RegistryBuilder {
    policies: BTreeMap<String, SecurityPolicy>,
    capabilities: BTreeMap<String, Capability>,
    fallback: SecurityPolicy,
}

impl RegistryBuilder {
    /// An empty builder whose fallback carries the default generic limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder pre-populated with the built-in table.
    pub fn with_builtin() -> Self {
        let mut builder = Self::new();
        for (name, policy) in builtin_policies() {
            builder.policies.insert(name.to_string(), policy);
        }
        for capability in builtin_capabilities() {
            builder
                .capabilities
                .insert(capability.name.clone(), capability);
        }
        builder
    }

    /// Add or replace the policy for a capability.
    pub fn policy(mut self, name: &str, policy: SecurityPolicy) -> Self {
        self.policies.insert(name.to_string(), policy);
        self
    }

    /// Add or replace a capability's declared parameters.
    pub fn capability(mut self, capability: Capability) -> Self {
        self.capabilities.insert(capability.name.clone(), capability);
        self
    }

    pub fn fallback(mut self, policy: SecurityPolicy) -> Self {
        self.fallback = policy;
        self
    }

    pub fn build(self) -> PolicyRegistry {
        PolicyRegistry {
            policies: self.policies,
            capabilities: self.capabilities,
            fallback: self.fallback,
        }
    }
}

/// Compile a pattern from the built-in tables, which are fixed and covered
/// by tests.
fn fixed(sources: &[&str]) -> Vec<BlockedPattern> {
    sources
        .iter()
        .map(|s| BlockedPattern::new(*s).expect("built-in pattern compiles"))
        .collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn path_policy(
    roots: &[&str],
    max_bytes: u64,
    mode: AccessMode,
    payload_param: Option<&str>,
    timeout_seconds: u64,
) -> SecurityPolicy {
    SecurityPolicy {
        path_rules: Some(PathRules {
            allowed_roots: strings(roots),
            blocked_patterns: fixed(BLOCKED_PATHS),
            max_bytes,
            mode,
            payload_param: payload_param.map(str::to_string),
            allowed_extensions: Vec::new(),
            require_containment: false,
        }),
        ..SecurityPolicy::generic(timeout_seconds, 3)
    }
}

fn size_policy(max_input_bytes: usize, timeout_seconds: u64) -> SecurityPolicy {
    SecurityPolicy {
        size_rules: Some(SizeRules { max_input_bytes }),
        ..SecurityPolicy::generic(timeout_seconds, 3)
    }
}

fn builtin_policies() -> Vec<(&'static str, SecurityPolicy)> {
    let mut read_file = path_policy(&["."], 5 * MIB, AccessMode::Read, None, 10);
    if let Some(rules) = read_file.path_rules.as_mut() {
        rules.allowed_extensions = strings(READ_EXTENSIONS);
    }

    vec![
        (
            "search_files",
            path_policy(
                &[".", "./workspace", "./project", "./src"],
                10 * MIB,
                AccessMode::Read,
                None,
                30,
            ),
        ),
        ("read_file", read_file),
        (
            "write_to_file",
            path_policy(WRITE_ROOTS, 10 * MIB, AccessMode::Write, Some("content"), 30),
        ),
        (
            "apply_diff",
            path_policy(WRITE_ROOTS, 10 * MIB, AccessMode::Write, Some("diff"), 20),
        ),
        (
            "list_files",
            path_policy(&["."], 10 * MIB, AccessMode::Read, None, 15),
        ),
        (
            "execute_command",
            SecurityPolicy {
                command_rules: Some(CommandRules {
                    allowed_commands: strings(&[
                        "ls", "echo", "cat", "grep", "find", "pwd", "which", "head", "tail",
                    ]),
                    blocked_patterns: fixed(BLOCKED_COMMANDS),
                    allow_privilege_escalation: false,
                    max_length: 1000,
                }),
                ..SecurityPolicy::generic(60, 3)
            },
        ),
        (
            "browser_navigate",
            SecurityPolicy {
                url_rules: Some(UrlRules {
                    allowed_schemes: strings(&["http", "https"]),
                    blocked_domains: strings(&[
                        "localhost",
                        "127.0.0.1",
                        "0.0.0.0",
                        "file://",
                        "internal",
                    ]),
                }),
                ..SecurityPolicy::generic(45, 3)
            },
        ),
        ("browser_type", size_policy(10_000, 15)),
        ("browser_evaluate", size_policy(10_000, 20)),
        ("use_mcp_tool", size_policy(10_000, 30)),
        ("browser_snapshot", SecurityPolicy::generic(15, 3)),
        ("browser_click", SecurityPolicy::generic(15, 3)),
        ("list_code_definition_names", SecurityPolicy::generic(30, 3)),
        ("codebase_search", SecurityPolicy::generic(45, 3)),
    ]
}

fn builtin_capabilities() -> Vec<Capability> {
    use ParamKind::{Boolean, Integer, Object, String};

    vec![
        Capability::new(
            "search_files",
            vec![
                ParamSpec::required("path", String),
                ParamSpec::required("regex", String),
                ParamSpec::optional("file_pattern", String),
            ],
        ),
        Capability::new("read_file", vec![ParamSpec::required("path", String)]),
        Capability::new("browser_navigate", vec![ParamSpec::required("url", String)]),
        Capability::new("browser_snapshot", Vec::new()),
        Capability::new(
            "browser_evaluate",
            vec![ParamSpec::required("function", String)],
        ),
        Capability::new(
            "browser_click",
            vec![
                ParamSpec::required("element", String),
                ParamSpec::required("ref", String),
            ],
        ),
        Capability::new(
            "browser_type",
            vec![
                ParamSpec::required("element", String),
                ParamSpec::required("ref", String),
                ParamSpec::required("text", String),
                ParamSpec::optional("submit", Boolean),
            ],
        ),
        Capability::new(
            "execute_command",
            vec![ParamSpec::required("command", String)],
        ),
        Capability::new(
            "write_to_file",
            vec![
                ParamSpec::required("path", String),
                ParamSpec::required("content", String),
            ],
        ),
        Capability::new(
            "apply_diff",
            vec![
                ParamSpec::required("path", String),
                ParamSpec::required("diff", String),
                ParamSpec::required("start_line", Integer),
            ],
        ),
        Capability::new(
            "list_files",
            vec![
                ParamSpec::required("path", String),
                ParamSpec::optional("recursive", Boolean),
            ],
        ),
        Capability::new(
            "list_code_definition_names",
            vec![ParamSpec::required("path", String)],
        ),
        Capability::new(
            "codebase_search",
            vec![
                ParamSpec::required("query", String),
                ParamSpec::optional("path", String),
            ],
        ),
        Capability::new(
            "use_mcp_tool",
            vec![
                ParamSpec::required("server_name", String),
                ParamSpec::required("tool_name", String),
                ParamSpec::required("arguments", Object),
            ],
        ),
    ]
}
