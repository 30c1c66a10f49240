// classify.rs - Classify the risk of a capability set.

use ag_policy::{RiskClassifier, SecurityLevel};

pub fn execute(capabilities: &[String], level: SecurityLevel) -> anyhow::Result<()> {
    let assessment = RiskClassifier::default().classify(capabilities, level);
    println!("{}", serde_json::to_string_pretty(&assessment)?);
    Ok(())
}
