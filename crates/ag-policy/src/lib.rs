//! # ag-policy
//!
//! Runtime half of the AgentGate security gate.
//!
//! A [`PolicyRegistry`] maps capability names to declarative
//! [`SecurityPolicy`] records. The [`PolicyEngine`] evaluates each proposed
//! invocation against the resolved policy and returns an
//! [`InvocationDecision`]. The [`RiskClassifier`] tiers a whole capability
//! set once per generation session.
//!
//! ## Key invariants
//!
//! - **Unknown capabilities fall back**: a name with no entry receives the
//!   fallback policy (generic limits only), never an error.
//! - **First denial wins**: checks run path, command, url, size, parameter
//!   schema, then generic; the first failing check decides, and its reason
//!   names the rule kind.
//! - **Path traversal blocked**: a path containing ".." (or its encoded
//!   form) is always denied.
//! - **Read-only after construction**: the registry is shared through an
//!   `Arc` and evaluation never mutates it.

pub mod engine;
pub mod error;
pub mod level;
pub mod policy;
pub mod registry;
pub mod risk;
pub mod summary;

pub use engine::{EvaluationStep, EvaluationTrace, InvocationDecision, Parameters, PolicyEngine};
pub use error::PolicyError;
pub use level::SecurityLevel;
pub use policy::{
    AccessMode, BlockedPattern, Capability, CommandRules, GenericRules, ParamKind, ParamSpec,
    PathRules, SecurityPolicy, SizeRules, UrlRules,
};
pub use registry::{PolicyDocument, PolicyRegistry, RegistryBuilder};
pub use risk::{CapabilityRisk, IncompatiblePair, RiskAssessment, RiskClassifier, RiskTable, RiskTier};
pub use summary::{CapabilitySecurity, ExecutionDefaults, SecuritySummary};
