// risk.rs - Risk Classifier for a whole capability set.
//
// Runs once per generation session. Classification annotates the report;
// it never blocks generation.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::level::SecurityLevel;

/// Coarse danger of running a capability unattended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RiskTier::Low => "low",
            RiskTier::Medium => "medium",
            RiskTier::High => "high",
        };
        f.write_str(name)
    }
}

/// Two capabilities that should not be combined, with a description of
/// each used in the issue text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncompatiblePair {
    pub first: String,
    pub first_role: String,
    pub second: String,
    pub second_role: String,
}

/// The fixed name → tier tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskTable {
    /// High at every level.
    pub high: BTreeSet<String>,
    pub medium: BTreeSet<String>,
    /// Medium normally, promoted to High at an elevated level.
    pub dangerous: BTreeSet<String>,
    pub incompatible: Vec<IncompatiblePair>,
    /// A set with more distinct capabilities than this is flagged.
    pub complexity_threshold: usize,
}

fn names(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for RiskTable {
    fn default() -> Self {
        Self {
            high: names(&["browser_evaluate"]),
            medium: names(&["read_file", "search_files", "apply_diff"]),
            dangerous: names(&["execute_command", "write_to_file", "browser_navigate"]),
            incompatible: vec![IncompatiblePair {
                first: "execute_command".to_string(),
                first_role: "command execution".to_string(),
                second: "browser_navigate".to_string(),
                second_role: "browser automation".to_string(),
            }],
            complexity_threshold: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityRisk {
    pub name: String,
    pub tier: RiskTier,
}

/// Classification of a capability set at one security level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub security_level: SecurityLevel,
    /// One entry per distinct capability, in order of first appearance.
    pub tiers: Vec<CapabilityRisk>,
    pub compatibility_issues: Vec<String>,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

impl RiskAssessment {
    pub fn tier_of(&self, name: &str) -> Option<RiskTier> {
        self.tiers.iter().find(|r| r.name == name).map(|r| r.tier)
    }

    /// The highest tier in the set, or Low for an empty set.
    pub fn highest(&self) -> RiskTier {
        self.tiers
            .iter()
            .map(|r| r.tier)
            .max()
            .unwrap_or(RiskTier::Low)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RiskClassifier {
    table: RiskTable,
}

impl RiskClassifier {
    pub fn new(table: RiskTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RiskTable {
        &self.table
    }

    /// Tier of a single capability at `level`.
    pub fn tier(&self, name: &str, level: SecurityLevel) -> RiskTier {
        if self.table.high.contains(name) {
            RiskTier::High
        } else if self.table.dangerous.contains(name) {
            if level.is_elevated() {
                RiskTier::High
            } else {
                RiskTier::Medium
            }
        } else if self.table.medium.contains(name) {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }

    pub fn classify<S: AsRef<str>>(&self, capabilities: &[S], level: SecurityLevel) -> RiskAssessment {
        let mut seen = BTreeSet::new();
        let distinct: Vec<&str> = capabilities
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| seen.insert(*name))
            .collect();

        let tiers = distinct
            .iter()
            .map(|name| CapabilityRisk {
                name: name.to_string(),
                tier: self.tier(name, level),
            })
            .collect();

        let warnings = if level.is_elevated() {
            distinct
                .iter()
                .filter(|name| self.table.dangerous.contains(**name))
                .map(|name| format!("Tool '{}' may pose security risks at {} security level", name, level))
                .collect()
        } else {
            Vec::new()
        };

        let compatibility_issues = self.compatibility_issues(&seen);
        for issue in &compatibility_issues {
            tracing::warn!("Capability set issue: {}", issue);
        }

        RiskAssessment {
            security_level: level,
            tiers,
            compatibility_issues,
            warnings,
            recommendations: recommendations(&seen, level),
        }
    }

    fn compatibility_issues(&self, present: &BTreeSet<&str>) -> Vec<String> {
        let mut issues: Vec<String> = self
            .table
            .incompatible
            .iter()
            .filter(|pair| present.contains(pair.first.as_str()) && present.contains(pair.second.as_str()))
            .map(|pair| {
                format!(
                    "Combining {} ({}) with {} ({}) may have security implications",
                    pair.first_role, pair.first, pair.second_role, pair.second
                )
            })
            .collect();
        if present.len() > self.table.complexity_threshold {
            issues.push(format!(
                "Large number of tools ({}) may impact performance and increase complexity",
                present.len()
            ));
        }
        issues
    }
}

fn recommendations(present: &BTreeSet<&str>, level: SecurityLevel) -> Vec<String> {
    let mut out = Vec::new();
    if level.is_elevated() {
        out.push("Consider using sandboxed environments for tool execution".to_string());
        out.push("Implement additional input validation for user-provided parameters".to_string());
    }
    let targeted = [
        ("execute_command", "Review command execution policies and restrict allowed commands"),
        ("browser_navigate", "Implement URL validation and restrict navigation to trusted domains"),
        ("write_to_file", "Use file path validation and restrict write access to safe directories"),
    ];
    for (name, text) in targeted {
        if present.contains(name) {
            out.push(text.to_string());
        }
    }
    out
}
