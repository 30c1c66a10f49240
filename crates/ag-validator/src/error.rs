// error.rs - Error types for source parsing.
//
// A SyntaxError never escapes the validator's public `validate()` call:
// it is folded into the single Error diagnostic of a failed result.
// It is public so callers working with `SourceUnit` can inspect it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The source text could not be tokenized or parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Syntax error at line {line}: {message}")]
pub struct SyntaxError {
    /// 1-based line where the failure was detected.
    pub line: usize,
    /// What the parser expected or rejected.
    pub message: String,
}

impl SyntaxError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line: line.max(1),
            message: message.into(),
        }
    }
}
