use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingKind {
    MissingRequiredField,
    UnknownField,
    WrongType,
    ConstraintViolation,
    /// Optional field left at its placeholder; only reported when asked for.
    UnfilledOptional,
}

impl FindingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingKind::MissingRequiredField => "missing-required-field",
            FindingKind::UnknownField => "unknown-field",
            FindingKind::WrongType => "wrong-type",
            FindingKind::ConstraintViolation => "constraint-violation",
            FindingKind::UnfilledOptional => "unfilled-optional",
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One defect in one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// Owning record, e.g. `ch_0003`.
    pub record: String,
    pub kind: FindingKind,
    /// Dotted field path; list items as `tags[2]`; `(root)` for the document itself.
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordResult {
    pub index: u32,
    pub record: String,
    pub file: PathBuf,
    pub findings: Vec<Finding>,
}

impl RecordResult {
    pub fn is_valid(&self) -> bool {
        self.findings.is_empty()
    }
}

/// A record that could not be validated at all (unreadable or unparsable).
#[derive(Debug, Clone, Serialize)]
pub struct ReportError {
    pub index: u32,
    pub record: String,
    pub file: PathBuf,
    pub message: String,
}

/// Per-record results in ascending index order, plus coverage against chunk files.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub results: Vec<RecordResult>,
    pub errors: Vec<ReportError>,
    /// Chunks that have no record yet.
    pub missing_records: Vec<String>,
    /// Records whose chunk file does not exist.
    pub orphan_records: Vec<String>,
}

impl ValidationReport {
    pub fn finding_count(&self) -> usize {
        self.results.iter().map(|r| r.findings.len()).sum()
    }

    pub fn valid_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_valid()).count()
    }

    pub fn invalid(&self) -> impl Iterator<Item = &RecordResult> {
        self.results.iter().filter(|r| !r.is_valid())
    }

    /// Invalid records, unreadable records, and chunks without records.
    pub fn problem_count(&self) -> usize {
        self.invalid().count() + self.errors.len() + self.missing_records.len()
    }

    pub fn is_clean(&self) -> bool {
        self.problem_count() == 0
    }
}
