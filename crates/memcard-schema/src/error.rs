use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A schema that cannot be read, parsed, or is inconsistent with itself.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("cannot read schema {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid schema YAML: {0}")]
    Syntax(#[from] serde_yaml::Error),
    #[error("schema declares no fields")]
    NoFields,
    #[error("field at {location} has no name")]
    MissingName { location: String },
    #[error("field \"{path}\" has no type")]
    MissingType { path: String },
    #[error("field \"{path}\" has unknown type \"{type_tag}\" (expected string, list, enum, dict)")]
    UnknownType { path: String, type_tag: String },
    #[error("duplicate field name \"{path}\"")]
    DuplicateField { path: String },
    #[error("rule \"{rule}\" does not apply to {type_tag} field \"{path}\"")]
    InapplicableRule {
        path: String,
        rule: &'static str,
        type_tag: &'static str,
    },
    #[error("field \"{path}\": {min_rule}={min} exceeds {max_rule}={max}")]
    InvalidRange {
        path: String,
        min_rule: &'static str,
        min: usize,
        max_rule: &'static str,
        max: usize,
    },
    #[error("field \"{path}\" has invalid pattern: {source}")]
    InvalidPattern {
        path: String,
        #[source]
        source: regex::Error,
    },
    #[error("enum field \"{path}\" declares no values")]
    EmptyEnum { path: String },
    #[error("dict field \"{path}\" declares both fields and dict_keys")]
    ConflictingKeys { path: String },
    #[error("derived entry names unknown field \"{field}\"")]
    UnknownDerivedField { field: String },
    #[error("derived field \"{field}\" must be a string field, got {type_tag}")]
    DerivedNotString {
        field: String,
        type_tag: &'static str,
    },
    #[error("derived field \"{field}\" uses unknown function \"{func}\"")]
    UnknownDerivedFn { field: String, func: String },
}
