// config.rs - Gate configuration file.
//
// One YAML file configures both halves of the gate:
//
// ```yaml
// security_level: high
// validator:
//   allowed_imports: [os, json, logging, langgraph]
// builtin: true
// policies:
//   deploy_service:
//     command_rules:
//       allowed_commands: [kubectl]
//       blocked_patterns: ['delete\s+namespace']
// ```
//
// Top-level policy keys are the policy document itself, so a plain policy
// file is also a valid gate configuration.

use std::path::{Path, PathBuf};

use ag_policy::{PolicyDocument, PolicyRegistry, SecurityLevel};
use ag_validator::ValidatorConfig;
use anyhow::Context;
use serde::Deserialize;

/// Read from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "agentgate.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub security_level: Option<SecurityLevel>,
    pub validator: ValidatorConfig,
    #[serde(flatten)]
    pub policies: PolicyDocument,
}

impl GateConfig {
    /// Load `path`, or the default file if it exists, or the defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = Self::parse(&text)
            .with_context(|| format!("invalid config {}", path.display()))?;
        tracing::info!("Loaded config: {}", path.display());
        Ok(config)
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn registry(&self) -> PolicyRegistry {
        PolicyRegistry::from_document(self.policies.clone())
    }
}
