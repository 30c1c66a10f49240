// evaluate.rs - Evaluate one capability invocation.

use std::sync::Arc;

use ag_policy::{Parameters, PolicyEngine, SecurityLevel};
use anyhow::Context;

use crate::config::GateConfig;

pub fn execute(
    capability: &str,
    params: Option<&str>,
    trace: bool,
    config: &GateConfig,
    level: SecurityLevel,
) -> anyhow::Result<()> {
    let params: Parameters = match params {
        Some(text) => serde_json::from_str(text).context("--params must be a JSON object")?,
        None => Parameters::new(),
    };

    let engine = PolicyEngine::new(Arc::new(config.registry()), level);
    let result = engine.evaluate_with_trace(capability, &params);

    if trace {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&result.decision)?);
    }

    if !result.decision.allowed {
        anyhow::bail!("{} denied: {}", capability, result.decision.reason);
    }
    Ok(())
}
