//! # ag-validator
//!
//! Static validation of generated agent source before it is trusted.
//!
//! [`validate`] parses Python source with `rustpython-parser`, walks the tree
//! for forbidden bare calls and unauthorized imports, and scans raw lines
//! for heuristic problems. The result is always a [`ValidationResult`]; the
//! validator never fails across its public boundary.
//!
//! ## Key invariants
//!
//! - **Fail fast on parse failure**: unparsable source yields exactly one
//!   error diagnostic and no further scans.
//! - **Bare calls only**: `eval(x)` is an error, `obj.eval(x)` is not.
//! - **Allow-listed imports**: an import is authorized by its root segment,
//!   so `os.path` is allowed whenever `os` is.
//! - **Heuristics warn, never fail**: `valid == errors.is_empty()`.

pub mod error;
pub mod heuristics;
pub mod report;
pub mod scan;
pub mod syntax;
pub mod validator;
pub mod walk;

pub use error::SyntaxError;
pub use syntax::{parse_module, CallTarget, LineIndex, Module};
pub use report::format_report;
pub use validator::{
    validate, Diagnostic, Severity, SourceUnit, SourceValidator, ValidationResult,
    ValidatorConfig,
};
