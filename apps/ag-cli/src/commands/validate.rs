// validate.rs - Validate generated source files.

use std::path::PathBuf;

use ag_validator::{format_report, SourceValidator, ValidationResult};
use anyhow::Context;
use serde::Serialize;

use crate::config::GateConfig;

#[derive(Serialize)]
struct FileResult<'a> {
    file: String,
    #[serde(flatten)]
    result: &'a ValidationResult,
}

pub fn execute(files: &[PathBuf], json: bool, config: &GateConfig) -> anyhow::Result<()> {
    let validator = SourceValidator::new(config.validator.clone());
    let mut failed = 0;

    for path in files {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let result = validator.validate(&source);
        if !result.valid {
            failed += 1;
        }

        if json {
            let output = FileResult {
                file: path.display().to_string(),
                result: &result,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", path.display());
            println!("{}", format_report(&result));
            println!();
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} file(s) failed validation", failed, files.len());
    }
    Ok(())
}
