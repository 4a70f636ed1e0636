//! JSON Schema validation for dataset documents.
//! Collects every violation (allErrors mode); failing validation is a reportable
//! outcome, never a panic or early return.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use jsonschema::Validator;
use serde_json::Value;

/// One schema violation, located by JSON Pointer into the offending document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// Instance path, or `(root)` when the document itself is malformed.
    pub location: String,
    pub message: String,
}

#[derive(Debug)]
pub enum SchemaError {
    Read { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: serde_json::Error },
    Compile(String),
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "unable to read schema '{}': {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "Invalid JSON in {}: {source}", path.display())
            }
            Self::Compile(message) => write!(f, "unable to compile schema: {message}"),
        }
    }
}

impl std::error::Error for SchemaError {}

/// Load and compile the schema document. Format assertions (uri, date, ...) are
/// enforced, matching the reference validator configuration.
pub fn load_schema(path: &Path) -> Result<Validator, SchemaError> {
    let raw = fs::read_to_string(path).map_err(|source| SchemaError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let document: Value = serde_json::from_str(&raw).map_err(|source| SchemaError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    jsonschema::options()
        .should_validate_formats(true)
        .build(&document)
        .map_err(|err| SchemaError::Compile(err.to_string()))
}

/// Validate one document, returning every violation in schema evaluation order.
/// An empty result means the document is valid.
pub fn validate_document(validator: &Validator, document: &Value) -> Vec<SchemaViolation> {
    match validator.validate(document) {
        Ok(()) => Vec::new(),
        Err(errors) => errors
            .map(|err| {
                let pointer = err.instance_path.to_string();
                SchemaViolation {
                    location: if pointer.is_empty() {
                        "(root)".to_string()
                    } else {
                        pointer
                    },
                    message: err.to_string(),
                }
            })
            .collect(),
    }
}

/// Render violations as the `- <location>: <message>` block used in failure reports.
pub fn format_violations(violations: &[SchemaViolation]) -> String {
    if violations.is_empty() {
        return "Unknown validation error.".to_string();
    }
    violations
        .iter()
        .map(|violation| format!("- {}: {}", violation.location, violation.message))
        .collect::<Vec<_>>()
        .join("\n")
}
