// heuristics.rs - Line-level text heuristics.
//
// These checks look at raw physical lines, not the syntax tree, and are
// approximate: a credential-shaped name inside a comment or an unrelated
// string still warns. Findings are therefore only ever warnings.

use std::sync::LazyLock;

use regex::Regex;

use crate::validator::{Diagnostic, ValidatorConfig};

/// `name = "..."` or `name: type = "..."`, with an optional string prefix
/// before the quote.
static LITERAL_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_][A-Za-z0-9_]*)\s*(?::[^=]+?)?=\s*[rRbBuUfF]{0,2}["']"#).unwrap()
});

pub const SECRET_WARNING: &str =
    "possible hardcoded secret; load credentials with os.getenv() instead";
pub const PRINT_WARNING: &str =
    "use structured logging instead of direct console output (print)";

/// Run both line heuristics, in line order.
pub fn scan_lines(source: &str, config: &ValidatorConfig) -> Vec<Diagnostic> {
    let mut warnings = Vec::new();
    for (index, line) in source.split('\n').enumerate() {
        let number = index + 1;
        if looks_like_hardcoded_secret(line, config) {
            warnings.push(Diagnostic::warning(number, SECRET_WARNING));
        }
        if is_bare_print(line, config) {
            warnings.push(Diagnostic::warning(number, PRINT_WARNING));
        }
    }
    warnings
}

fn looks_like_hardcoded_secret(line: &str, config: &ValidatorConfig) -> bool {
    let assigns_secret = LITERAL_ASSIGNMENT.captures_iter(line).any(|caps| {
        let name = caps[1].to_ascii_lowercase();
        config
            .secret_markers
            .iter()
            .any(|marker| name.contains(&marker.to_ascii_lowercase()))
    });
    assigns_secret
        && !config
            .env_lookup_markers
            .iter()
            .any(|marker| line.contains(marker.as_str()))
}

fn is_bare_print(line: &str, config: &ValidatorConfig) -> bool {
    line.trim_start().starts_with("print(")
        && !config
            .logging_markers
            .iter()
            .any(|marker| line.contains(marker.as_str()))
}
