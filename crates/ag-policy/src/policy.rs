// policy.rs - Declarative per-capability security policy.
//
// A SecurityPolicy is one record with an optional sub-record per rule
// kind. The engine matches on which rule kinds are present; there is no
// policy class hierarchy. Generic limits (timeout / attempts) are always
// present and carry metadata only.

use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PolicyError;

/// A compiled, case-insensitive regular expression that (de)serializes as
/// its source text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlockedPattern {
    source: String,
    regex: Regex,
}

impl BlockedPattern {
    pub fn new(source: impl Into<String>) -> Result<Self, PolicyError> {
        let source = source.into();
        let regex = RegexBuilder::new(&source)
            .case_insensitive(true)
            .build()
            .map_err(|e| PolicyError::InvalidPattern {
                pattern: source.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self { source, regex })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for BlockedPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for BlockedPattern {}

impl fmt::Display for BlockedPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl TryFrom<String> for BlockedPattern {
    type Error = PolicyError;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        Self::new(source)
    }
}

impl From<BlockedPattern> for String {
    fn from(pattern: BlockedPattern) -> Self {
        pattern.source
    }
}

/// Whether a path capability only reads or also writes a payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    #[default]
    Read,
    Write,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRules {
    /// Roots a path should stay under. Advisory unless `require_containment`
    /// is set or the engine runs at the maximum level.
    pub allowed_roots: Vec<String>,
    pub blocked_patterns: Vec<BlockedPattern>,
    /// Largest payload a write may carry, in bytes.
    pub max_bytes: u64,
    #[serde(default)]
    pub mode: AccessMode,
    /// Parameter holding the written payload (write mode only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_param: Option<String>,
    /// Extensions (with leading dot) the capability expects. Empty = any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_extensions: Vec<String>,
    #[serde(default)]
    pub require_containment: bool,
}

fn default_max_command_length() -> usize {
    1000
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRules {
    pub allowed_commands: Vec<String>,
    pub blocked_patterns: Vec<BlockedPattern>,
    #[serde(default)]
    pub allow_privilege_escalation: bool,
    #[serde(default = "default_max_command_length")]
    pub max_length: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRules {
    pub allowed_schemes: Vec<String>,
    /// Matched as substrings of the host, so subdomains are covered too.
    /// Entries containing `://` are matched against the URL prefix instead.
    pub blocked_domains: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeRules {
    /// Limit on the compact JSON encoding of the whole parameter map.
    pub max_input_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericRules {
    pub timeout_seconds: u64,
    pub max_attempts: u32,
}

impl Default for GenericRules {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            max_attempts: 3,
        }
    }
}

/// Security policy for one capability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_rules: Option<PathRules>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_rules: Option<CommandRules>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_rules: Option<UrlRules>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_rules: Option<SizeRules>,
    #[serde(default)]
    pub generic: GenericRules,
}

impl SecurityPolicy {
    /// A policy with only generic limits.
    pub fn generic(timeout_seconds: u64, max_attempts: u32) -> Self {
        Self {
            generic: GenericRules {
                timeout_seconds,
                max_attempts,
            },
            ..Self::default()
        }
    }

    /// Names of the rule kinds this policy declares, in evaluation order.
    pub fn rule_kinds(&self) -> Vec<&'static str> {
        let mut kinds = Vec::new();
        if self.path_rules.is_some() {
            kinds.push("path_rules");
        }
        if self.command_rules.is_some() {
            kinds.push("command_rules");
        }
        if self.url_rules.is_some() {
            kinds.push("url_rules");
        }
        if self.size_rules.is_some() {
            kinds.push("size_rules");
        }
        kinds.push("generic");
        kinds
    }
}

/// Expected JSON type of a declared parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    String,
    Integer,
    Boolean,
    Object,
    #[default]
    Any,
}

impl ParamKind {
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Integer => value.is_i64() || value.is_u64(),
            ParamKind::Boolean => value.is_boolean(),
            ParamKind::Object => value.is_object(),
            ParamKind::Any => true,
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Boolean => "boolean",
            ParamKind::Object => "object",
            ParamKind::Any => "any",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(default)]
    pub kind: ParamKind,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl ParamSpec {
    pub fn required(name: &str, kind: ParamKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: true,
        }
    }

    pub fn optional(name: &str, kind: ParamKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: false,
        }
    }
}

/// A named, parameterized operation an agent may invoke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    pub name: String,
    #[serde(default)]
    pub declared_parameters: Vec<ParamSpec>,
}

impl Capability {
    pub fn new(name: &str, declared_parameters: Vec<ParamSpec>) -> Self {
        Self {
            name: name.to_string(),
            declared_parameters,
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&ParamSpec> {
        self.declared_parameters.iter().find(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blocked_pattern_is_case_insensitive() {
        let pattern = BlockedPattern::new(r"rm\s+-rf").unwrap();
        assert!(pattern.is_match("RM -RF /"));
        assert_eq!(pattern.to_string(), r"rm\s+-rf");
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        match BlockedPattern::new("(unclosed") {
            Err(PolicyError::InvalidPattern { pattern, .. }) => assert_eq!(pattern, "(unclosed"),
            other => panic!("expected InvalidPattern, got {:?}", other),
        }
    }

    #[test]
    fn pattern_serializes_as_source_text() {
        let rules = SizeRules {
            max_input_bytes: 10,
        };
        let policy = SecurityPolicy {
            command_rules: Some(CommandRules {
                allowed_commands: vec!["ls".into()],
                blocked_patterns: vec![BlockedPattern::new("mkfs").unwrap()],
                allow_privilege_escalation: false,
                max_length: 80,
            }),
            size_rules: Some(rules),
            ..SecurityPolicy::default()
        };
        let yaml = serde_yaml::to_string(&policy).unwrap();
        assert!(yaml.contains("- mkfs"));
        assert!(!yaml.contains("path_rules"));
        let restored: SecurityPolicy = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(restored, policy);
    }

    #[test]
    fn invalid_pattern_fails_deserialization() {
        let yaml = "command_rules:\n  allowed_commands: [ls]\n  blocked_patterns: ['(']\n";
        assert!(serde_yaml::from_str::<SecurityPolicy>(yaml).is_err());
    }

    #[test]
    fn omitted_fields_take_defaults() {
        let policy: SecurityPolicy = serde_yaml::from_str(
            "path_rules:\n  allowed_roots: ['.']\n  blocked_patterns: []\n  max_bytes: 100\n",
        )
        .unwrap();
        let rules = policy.path_rules.as_ref().unwrap();
        assert_eq!(rules.mode, AccessMode::Read);
        assert!(!rules.require_containment);
        assert_eq!(policy.generic, GenericRules::default());
        assert_eq!(policy.rule_kinds(), vec!["path_rules", "generic"]);
    }

    #[test]
    fn param_kind_accepts_matching_values() {
        assert!(ParamKind::String.accepts(&json!("x")));
        assert!(!ParamKind::String.accepts(&json!(1)));
        assert!(ParamKind::Integer.accepts(&json!(3)));
        assert!(!ParamKind::Integer.accepts(&json!(3.5)));
        assert!(ParamKind::Any.accepts(&json!(null)));
    }
}
