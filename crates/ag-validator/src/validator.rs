// validator.rs - The validation entry point and its result types.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SyntaxError;
use crate::heuristics;
use crate::scan::SecurityScan;
use crate::syntax::{parse_module, Module};

pub const NO_IMPORTS_WARNING: &str = "no imports detected; code may be incomplete";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// A single reported issue tied to a source line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// 1-based line.
    pub line: usize,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn error(line: usize, message: impl Into<String>) -> Self {
        Self {
            line: line.max(1),
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn warning(line: usize, message: impl Into<String>) -> Self {
        Self {
            line: line.max(1),
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}: {}", self.line, self.message)
    }
}

/// Outcome of validating one source unit.
///
/// `valid` is exactly `errors.is_empty()`; warnings never affect it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    /// Root segments of every imported module.
    pub imports_found: BTreeSet<String>,
}

impl ValidationResult {
    fn parse_failure(error: &SyntaxError) -> Self {
        Self {
            valid: false,
            errors: vec![Diagnostic::error(error.line, error.to_string())],
            warnings: Vec::new(),
            imports_found: BTreeSet::new(),
        }
    }
}

/// Tables driving the scan. Defaults are the generator's built-in lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Bare call names that are always an error.
    pub forbidden_calls: BTreeSet<String>,
    /// Allowed import roots.
    pub allowed_imports: BTreeSet<String>,
    /// Substrings of a variable name that mark it as a credential.
    pub secret_markers: Vec<String>,
    /// Substrings showing a line reads its value from the environment.
    pub env_lookup_markers: Vec<String>,
    /// Substrings exempting a `print(` line from the logging warning.
    pub logging_markers: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            forbidden_calls: strings(&[
                "eval",
                "exec",
                "compile",
                "__import__",
                "open",
                "file",
                "input",
                "raw_input",
                "system",
                "popen",
                "subprocess",
            ])
            .into_iter()
            .collect(),
            allowed_imports: strings(&[
                "langgraph",
                "langchain",
                "langchain_core",
                "langchain_community",
                "pydantic",
                "deepagents",
                "json",
                "os",
                "sys",
                "asyncio",
                "logging",
                "typing",
                "datetime",
                "dataclasses",
                "functools",
                "itertools",
                "pathlib",
                "tempfile",
                "shutil",
                "requests",
                "aiohttp",
                "redis",
                "tenacity",
                "dotenv",
            ])
            .into_iter()
            .collect(),
            secret_markers: strings(&["api_key", "token", "password"]),
            env_lookup_markers: strings(&["os.getenv", "getenv(", "environ.get", "environ["]),
            logging_markers: strings(&["logging", "__name__", "argparse"]),
        }
    }
}

/// Source text together with its parsed tree (or the parse failure).
#[derive(Debug, Clone)]
pub struct SourceUnit<'a> {
    pub text: &'a str,
    pub tree: Result<Module, SyntaxError>,
}

impl<'a> SourceUnit<'a> {
    pub fn parse(text: &'a str) -> Self {
        Self {
            text,
            tree: parse_module(text),
        }
    }
}

/// Static validator for generated source. Holds only immutable
/// configuration, so one instance may be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct SourceValidator {
    config: ValidatorConfig,
}

impl SourceValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validate one source unit. Never fails: a parse failure becomes the
    /// single error of an invalid result and no further scan runs.
    pub fn validate(&self, source: &str) -> ValidationResult {
        let unit = SourceUnit::parse(source);
        let module = match &unit.tree {
            Ok(module) => module,
            Err(e) => {
                tracing::debug!("Validation failed to parse: {}", e);
                return ValidationResult::parse_failure(e);
            }
        };

        let scan = SecurityScan::new(&self.config, unit.text).run(module);
        let mut warnings = heuristics::scan_lines(unit.text, &self.config);
        if scan.imports.is_empty() {
            warnings.push(Diagnostic::warning(1, NO_IMPORTS_WARNING));
        }

        let result = ValidationResult {
            valid: scan.errors.is_empty(),
            errors: scan.errors,
            warnings,
            imports_found: scan.imports,
        };
        tracing::debug!(
            "Validated source: valid={} errors={} warnings={} imports={}",
            result.valid,
            result.errors.len(),
            result.warnings.len(),
            result.imports_found.len()
        );
        result
    }
}

/// Validate with the default configuration.
pub fn validate(source: &str) -> ValidationResult {
    SourceValidator::default().validate(source)
}
