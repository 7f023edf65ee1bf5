mod render;
mod report;
mod validator;

pub use render::{render_json, render_text};
pub use report::{Finding, FindingKind, RecordResult, ReportError, ValidationReport};
pub use validator::{ValidateOptions, Validator, VerifyError};
