// report.rs - Human-readable rendering of a ValidationResult.

use crate::validator::ValidationResult;

/// Render a pass/fail report with bulleted errors and warnings.
pub fn format_report(result: &ValidationResult) -> String {
    let mut lines = Vec::new();

    if result.valid {
        lines.push("✓ Code validation PASSED".to_string());
    } else {
        lines.push("✗ Code validation FAILED".to_string());
    }

    if !result.errors.is_empty() {
        lines.push("\nERRORS:".to_string());
        for error in &result.errors {
            lines.push(format!("  • {}", error));
        }
    }

    if !result.warnings.is_empty() {
        lines.push("\nWARNINGS:".to_string());
        for warning in &result.warnings {
            lines.push(format!("  ⚠ {}", warning));
        }
    }

    if !result.imports_found.is_empty() {
        let imports: Vec<&str> = result.imports_found.iter().map(String::as_str).collect();
        lines.push(format!("\nImports found: {}", imports.join(", ")));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::validate;

    #[test]
    fn passing_report() {
        let report = format_report(&validate("import os\nimport json\n"));
        assert_eq!(report, "✓ Code validation PASSED\n\nImports found: json, os");
    }

    #[test]
    fn failing_report_lists_errors_and_warnings() {
        let report = format_report(&validate("import socket\nprint(eval('1'))\n"));
        let expected = "✗ Code validation FAILED\n\
                        \n\
                        ERRORS:\n  \
                        • Line 1: Unauthorized import: socket\n  \
                        • Line 2: Forbidden function call: eval\n\
                        \n\
                        WARNINGS:\n  \
                        ⚠ Line 2: use structured logging instead of direct console output (print)\n\
                        \n\
                        Imports found: socket";
        assert_eq!(report, expected);
    }
}
