// summary.rs - Build the security summary for a capability set.

use ag_policy::{RiskClassifier, SecurityLevel, SecuritySummary};

use crate::config::GateConfig;

pub fn execute(
    capabilities: &[String],
    config: &GateConfig,
    level: SecurityLevel,
) -> anyhow::Result<()> {
    let registry = config.registry();
    let summary =
        SecuritySummary::build(level, capabilities, &registry, &RiskClassifier::default());
    if !summary.compatibility_issues.is_empty() {
        tracing::info!(
            "{} compatibility issue(s) for {} capabilities",
            summary.compatibility_issues.len(),
            summary.capability_count
        );
    }
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
