// policy.rs - Show the policy a capability resolves to.

use ag_policy::{ParamSpec, SecurityPolicy};
use serde::Serialize;

use crate::config::GateConfig;

#[derive(Serialize)]
struct PolicyView<'a> {
    capability: &'a str,
    uses_fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    declared_parameters: Option<&'a [ParamSpec]>,
    policy: &'a SecurityPolicy,
}

pub fn execute(capability: &str, config: &GateConfig) -> anyhow::Result<()> {
    let registry = config.registry();
    let view = PolicyView {
        capability,
        uses_fallback: !registry.has_policy(capability),
        declared_parameters: registry
            .capability(capability)
            .map(|c| c.declared_parameters.as_slice()),
        policy: registry.policy_for(capability),
    };
    print!("{}", serde_yaml::to_string(&view)?);
    Ok(())
}
