// summary.rs - Generation-time security summary for a capability set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::level::SecurityLevel;
use crate::policy::SecurityPolicy;
use crate::registry::PolicyRegistry;
use crate::risk::{RiskClassifier, RiskTier};

/// Longest user-provided input the generated agent should accept.
pub const MAX_INPUT_LENGTH: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySecurity {
    pub name: String,
    pub policy: SecurityPolicy,
    pub tier: RiskTier,
    /// True when the capability has no entry of its own.
    pub uses_fallback: bool,
}

/// Runtime defaults written into the generated agent's configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionDefaults {
    pub max_input_length: usize,
    pub timeout_default: u64,
    pub max_retry_attempts: u32,
    pub enable_sandboxing: bool,
    pub log_sensitive_operations: bool,
}

impl ExecutionDefaults {
    pub fn for_level(level: SecurityLevel, fallback: &SecurityPolicy) -> Self {
        Self {
            max_input_length: MAX_INPUT_LENGTH,
            timeout_default: fallback.generic.timeout_seconds,
            max_retry_attempts: fallback.generic.max_attempts,
            enable_sandboxing: level == SecurityLevel::Maximum,
            log_sensitive_operations: level.is_elevated(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecuritySummary {
    pub security_level: SecurityLevel,
    pub capability_count: usize,
    pub capabilities: Vec<CapabilitySecurity>,
    pub compatibility_issues: Vec<String>,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
    pub defaults: ExecutionDefaults,
    pub generated_at: DateTime<Utc>,
}

impl SecuritySummary {
    pub fn build<S: AsRef<str>>(
        level: SecurityLevel,
        capabilities: &[S],
        registry: &PolicyRegistry,
        classifier: &RiskClassifier,
    ) -> Self {
        let assessment = classifier.classify(capabilities, level);
        let entries: Vec<CapabilitySecurity> = assessment
            .tiers
            .iter()
            .map(|risk| CapabilitySecurity {
                name: risk.name.clone(),
                policy: registry.policy_for(&risk.name).clone(),
                tier: risk.tier,
                uses_fallback: !registry.has_policy(&risk.name),
            })
            .collect();

        Self {
            security_level: level,
            capability_count: entries.len(),
            capabilities: entries,
            compatibility_issues: assessment.compatibility_issues,
            warnings: assessment.warnings,
            recommendations: assessment.recommendations,
            defaults: ExecutionDefaults::for_level(level, registry.fallback()),
            generated_at: Utc::now(),
        }
    }
}
