use crate::report::{Finding, FindingKind, RecordResult, ReportError, ValidationReport};
use memcard_schema::{FieldKind, FieldSpec, ListRules, MapRules, Schema, TextRules};
use memcard_store::{list_indexed, read_record, record_id, RECORD_EXT};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

const ROOT_PATH: &str = "(root)";

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("cannot list records in {}: {source}", .path.display())]
    ListRecords {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateOptions {
    /// Report optional fields still at their placeholder as `unfilled-optional`.
    pub report_unfilled_optional: bool,
}

/// Read-only structural check of records against the schema.
pub struct Validator<'a> {
    schema: &'a Schema,
    options: ValidateOptions,
}

impl<'a> Validator<'a> {
    pub fn new(schema: &'a Schema, options: ValidateOptions) -> Self {
        Self { schema, options }
    }

    /// Validate every `ch_NNNN.yaml` in `records_dir`.
    ///
    /// Unreadable records become report errors and do not stop the pass. When
    /// `chunk_indices` is given, records and chunks are cross-checked.
    pub fn validate_dir(
        &self,
        records_dir: &Path,
        chunk_indices: Option<&[u32]>,
    ) -> Result<ValidationReport, VerifyError> {
        let listed =
            list_indexed(records_dir, RECORD_EXT).map_err(|source| VerifyError::ListRecords {
                path: records_dir.to_path_buf(),
                source,
            })?;

        let mut report = ValidationReport::default();
        for (index, path) in &listed {
            let record = record_id(*index);
            match read_record(path) {
                Ok(value) => {
                    let findings = self.validate_record(&record, &value);
                    tracing::debug!(record = %record, findings = findings.len(), "record checked");
                    report.results.push(RecordResult {
                        index: *index,
                        record,
                        file: path.clone(),
                        findings,
                    });
                }
                Err(e) => {
                    tracing::warn!(record = %record, error = %e, "record skipped");
                    report.errors.push(ReportError {
                        index: *index,
                        record,
                        file: path.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        if let Some(chunks) = chunk_indices {
            let chunks: BTreeSet<u32> = chunks.iter().copied().collect();
            let records: BTreeSet<u32> = listed.iter().map(|(i, _)| *i).collect();
            report.missing_records = chunks.difference(&records).map(|i| record_id(*i)).collect();
            report.orphan_records = records.difference(&chunks).map(|i| record_id(*i)).collect();
        }

        tracing::info!(
            records = listed.len(),
            valid = report.valid_count(),
            findings = report.finding_count(),
            unreadable = report.errors.len(),
            "validation complete"
        );
        Ok(report)
    }

    /// Findings for one parsed record, schema fields first in declaration order,
    /// then fields the schema does not know.
    pub fn validate_record(&self, record: &str, value: &Value) -> Vec<Finding> {
        let mut check = Check {
            record,
            options: self.options,
            findings: Vec::new(),
        };
        match value {
            Value::Mapping(map) => check.fields(self.schema.fields(), map, ""),
            other => check.push(
                FindingKind::WrongType,
                ROOT_PATH.to_string(),
                format!("record must be a mapping, got {}", type_of(other)),
            ),
        }
        check.findings
    }
}

struct Check<'r> {
    record: &'r str,
    options: ValidateOptions,
    findings: Vec<Finding>,
}

impl Check<'_> {
    fn push(&mut self, kind: FindingKind, path: String, message: String) {
        self.findings.push(Finding {
            record: self.record.to_string(),
            kind,
            path,
            message,
        });
    }

    fn fields(&mut self, fields: &[FieldSpec], map: &Mapping, parent: &str) {
        for field in fields {
            let path = join_path(parent, &field.name);
            match map.get(field.name.as_str()) {
                None => self.unfilled(field, path, "is absent"),
                Some(v) if field.is_placeholder(v) => {
                    // A placeholder dict can still carry keys the schema does not know.
                    if let (FieldKind::Map(rules), Value::Mapping(inner)) = (&field.kind, v) {
                        if !rules.fields.is_empty() {
                            self.unknown(&rules.fields, inner, &path);
                        }
                    }
                    self.unfilled(field, path, "is empty");
                }
                Some(v) => self.value(field, v, path),
            }
        }
        self.unknown(fields, map, parent);
    }

    fn unfilled(&mut self, field: &FieldSpec, path: String, how: &str) {
        if field.required {
            self.push(
                FindingKind::MissingRequiredField,
                path,
                format!("required field {how}"),
            );
        } else if self.options.report_unfilled_optional {
            self.push(
                FindingKind::UnfilledOptional,
                path,
                format!("optional field {how}"),
            );
        }
    }

    fn unknown(&mut self, fields: &[FieldSpec], map: &Mapping, parent: &str) {
        for key in map.keys() {
            let name = key_name(key);
            if !fields.iter().any(|f| key.as_str() == Some(f.name.as_str())) {
                self.push(
                    FindingKind::UnknownField,
                    join_path(parent, &name),
                    "field is not declared in the schema".to_string(),
                );
            }
        }
    }

    fn value(&mut self, field: &FieldSpec, value: &Value, path: String) {
        match &field.kind {
            FieldKind::Text(rules) => match value {
                Value::String(s) => self.text(rules, s, path),
                other => self.wrong_type("string", other, path),
            },
            FieldKind::List(rules) => match value {
                Value::Sequence(items) => self.list(rules, items, path),
                other => self.wrong_type("list", other, path),
            },
            FieldKind::Enum { values } => match value {
                Value::String(s) if values.iter().any(|v| v == s) => {}
                Value::String(s) => self.push(
                    FindingKind::ConstraintViolation,
                    path,
                    format!("\"{s}\" is not one of: {}", values.join(", ")),
                ),
                other => self.wrong_type("enum value (string)", other, path),
            },
            FieldKind::Map(rules) => match value {
                Value::Mapping(map) => self.map(rules, map, path),
                other => self.wrong_type("dict", other, path),
            },
        }
    }

    fn wrong_type(&mut self, expected: &str, got: &Value, path: String) {
        self.push(
            FindingKind::WrongType,
            path,
            format!("expected {expected}, got {}", type_of(got)),
        );
    }

    fn text(&mut self, rules: &TextRules, s: &str, path: String) {
        let v = s.trim();
        let len = v.chars().count();
        if rules.non_empty && v.is_empty() {
            self.push(
                FindingKind::ConstraintViolation,
                path.clone(),
                "non_empty: value is empty".to_string(),
            );
        }
        if let Some(min) = rules.min_chars {
            if len < min {
                self.push(
                    FindingKind::ConstraintViolation,
                    path.clone(),
                    format!("min_chars={min}: value has {len} chars"),
                );
            }
        }
        if let Some(max) = rules.max_chars {
            if len > max {
                self.push(
                    FindingKind::ConstraintViolation,
                    path.clone(),
                    format!("max_chars={max}: value has {len} chars"),
                );
            }
        }
        if let Some(pattern) = &rules.pattern {
            if !pattern.is_match(v) {
                self.push(
                    FindingKind::ConstraintViolation,
                    path,
                    format!("pattern: value does not match {}", pattern.as_str()),
                );
            }
        }
    }

    fn list(&mut self, rules: &ListRules, items: &[Value], path: String) {
        for (i, item) in items.iter().enumerate() {
            if !matches!(item, Value::String(_)) {
                self.wrong_type("string item", item, format!("{path}[{i}]"));
            }
        }
        let count = items.len();
        if let Some(min) = rules.min_items {
            if count < min {
                self.push(
                    FindingKind::ConstraintViolation,
                    path.clone(),
                    format!("min_items={min}: list has {count} items"),
                );
            }
        }
        if let Some(max) = rules.max_items {
            if count > max {
                self.push(
                    FindingKind::ConstraintViolation,
                    path.clone(),
                    format!("max_items={max}: list has {count} items"),
                );
            }
        }
        if let Some(min) = rules.min_non_empty_items {
            let non_empty = items
                .iter()
                .filter(|v| v.as_str().is_some_and(|s| !s.trim().is_empty()))
                .count();
            if non_empty < min {
                self.push(
                    FindingKind::ConstraintViolation,
                    path,
                    format!("min_non_empty_items={min}: list has {non_empty} non-empty items"),
                );
            }
        }
    }

    fn map(&mut self, rules: &MapRules, map: &Mapping, path: String) {
        // A dict declaring no sub-fields is free-form: any keys, text values count.
        let free_form = rules.fields.is_empty();
        if !free_form {
            self.fields(&rules.fields, map, &path);
        }
        if rules.non_empty_any {
            let any_filled = if free_form {
                map.values()
                    .any(|v| v.as_str().is_some_and(|s| !s.trim().is_empty()))
            } else {
                rules.fields.iter().any(|f| {
                    map.get(f.name.as_str())
                        .is_some_and(|v| !f.is_placeholder(v))
                })
            };
            if !any_filled {
                self.push(
                    FindingKind::ConstraintViolation,
                    path,
                    "non_empty_any: no sub-field has a value".to_string(),
                );
            }
        }
    }
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

fn key_name(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| type_of(other).to_string()),
    }
}

fn type_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "list",
        Value::Mapping(_) => "dict",
        Value::Tagged(_) => "tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memcard_schema::parse_schema;

    const SCHEMA: &str = r#"
fields:
  - name: summary
    type: string
    required: true
    non_empty: true
    max_chars: 40
  - name: tags
    type: list
    max_items: 5
  - name: tone
    type: enum
    values: [calm, tense]
  - name: date
    type: string
    pattern: '\d{4}/\d{2}/\d{2}'
  - name: scene
    type: dict
    fields:
      - name: place
        type: string
        required: true
      - name: props
        type: list
"#;

    fn check(yaml: &str) -> Vec<Finding> {
        check_with(yaml, ValidateOptions::default())
    }

    fn check_with(yaml: &str, options: ValidateOptions) -> Vec<Finding> {
        let schema = parse_schema(SCHEMA).unwrap();
        let value: Value = serde_yaml::from_str(yaml).unwrap();
        Validator::new(&schema, options).validate_record("ch_0001", &value)
    }

    fn kinds(findings: &[Finding]) -> Vec<(FindingKind, &str)> {
        findings.iter().map(|f| (f.kind, f.path.as_str())).collect()
    }

    #[test]
    fn filled_record_is_valid() {
        let findings = check(
            r#"
summary: They met at the station.
tags: [meeting, rain]
tone: calm
date: 2024/05/01
scene:
  place: platform 9
  props: [umbrella]
"#,
        );
        assert!(findings.is_empty(), "{findings:?}");
    }

    #[test]
    fn skeleton_only_misses_required_fields() {
        let findings = check(
            "summary: ''\ntags: []\ntone: null\ndate: ''\nscene:\n  place: ''\n  props: []\n",
        );
        assert_eq!(
            kinds(&findings),
            vec![(FindingKind::MissingRequiredField, "summary")]
        );
    }

    #[test]
    fn empty_summary_and_too_many_tags() {
        let findings = check("summary: ''\ntags: [a, b, c, d, e, f]\n");
        assert_eq!(
            kinds(&findings),
            vec![
                (FindingKind::MissingRequiredField, "summary"),
                (FindingKind::ConstraintViolation, "tags"),
            ]
        );
        assert!(findings[1].message.contains("max_items=5"));
        assert!(findings.iter().all(|f| f.record == "ch_0001"));
    }

    #[test]
    fn extra_field_is_reported_once_regardless_of_others() {
        let findings = check("summary: fine\nmood: gloomy\n");
        assert_eq!(kinds(&findings), vec![(FindingKind::UnknownField, "mood")]);

        let findings = check("summary: ''\nmood: gloomy\n");
        assert_eq!(
            findings
                .iter()
                .filter(|f| f.kind == FindingKind::UnknownField)
                .count(),
            1
        );
    }

    #[test]
    fn wrong_types_are_named() {
        let findings = check("summary: 42\ntags: nope\ntone: [calm]\nscene: here\n");
        assert_eq!(
            kinds(&findings),
            vec![
                (FindingKind::WrongType, "summary"),
                (FindingKind::WrongType, "tags"),
                (FindingKind::WrongType, "tone"),
                (FindingKind::WrongType, "scene"),
            ]
        );
        assert!(findings[0].message.contains("expected string, got number"));
    }

    #[test]
    fn list_items_must_be_text() {
        let findings = check("summary: ok\ntags: [a, 3]\n");
        assert_eq!(kinds(&findings), vec![(FindingKind::WrongType, "tags[1]")]);
    }

    #[test]
    fn optional_field_rules_still_apply_when_filled() {
        let findings = check("summary: ok\ntone: furious\ndate: May 1st\n");
        assert_eq!(
            kinds(&findings),
            vec![
                (FindingKind::ConstraintViolation, "tone"),
                (FindingKind::ConstraintViolation, "date"),
            ]
        );
        assert!(findings[0].message.contains("calm, tense"));
        assert!(findings[1].message.contains("pattern"));
    }

    #[test]
    fn max_chars_counts_trimmed_chars() {
        let long = "x".repeat(41);
        let findings = check(&format!("summary: {long}\n"));
        assert_eq!(
            kinds(&findings),
            vec![(FindingKind::ConstraintViolation, "summary")]
        );
        assert!(check(&format!("summary: '  {}  '\n", "x".repeat(40))).is_empty());
    }

    #[test]
    fn nested_dict_is_checked_recursively() {
        let findings = check("summary: ok\nscene:\n  props: [a]\n  weather: rain\n");
        assert_eq!(
            kinds(&findings),
            vec![
                (FindingKind::MissingRequiredField, "scene.place"),
                (FindingKind::UnknownField, "scene.weather"),
            ]
        );
    }

    #[test]
    fn unknown_keys_inside_placeholder_dict() {
        let findings = check("summary: ok\nscene:\n  place: ''\n  weather: rain\n");
        assert_eq!(
            kinds(&findings),
            vec![(FindingKind::UnknownField, "scene.weather")]
        );
    }

    #[test]
    fn unfilled_optional_is_opt_in() {
        let yaml = "summary: ok\ntags: []\n";
        assert!(check(yaml).is_empty());
        let findings = check_with(
            yaml,
            ValidateOptions {
                report_unfilled_optional: true,
            },
        );
        assert!(findings
            .iter()
            .all(|f| f.kind == FindingKind::UnfilledOptional));
        let paths: Vec<&str> = findings.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["tags", "tone", "date", "scene"]);
    }

    #[test]
    fn enum_value_must_match_exactly() {
        let findings = check("summary: ok\ntone: 'calm '\n");
        assert_eq!(
            kinds(&findings),
            vec![(FindingKind::ConstraintViolation, "tone")]
        );
        assert!(check("summary: ok\ntone: calm\n").is_empty());
    }

    #[test]
    fn dict_without_sub_fields_accepts_any_keys() {
        let schema = parse_schema(
            "fields:\n  - name: extra\n    type: dict\n  - name: notes\n    type: dict\n    non_empty_any: true\n",
        )
        .unwrap();
        let validator = Validator::new(&schema, ValidateOptions::default());

        let value: Value =
            serde_yaml::from_str("extra: {weather: rain, mood: 3}\nnotes: {a: hint}\n").unwrap();
        assert!(validator.validate_record("ch_0001", &value).is_empty());

        let value: Value = serde_yaml::from_str("notes: {a: '  ', b: 7}\n").unwrap();
        let findings = validator.validate_record("ch_0001", &value);
        assert_eq!(
            kinds(&findings),
            vec![(FindingKind::ConstraintViolation, "notes")]
        );
        assert!(findings[0].message.contains("non_empty_any"));
    }

    #[test]
    fn non_mapping_root_is_wrong_type() {
        let findings = check("- just\n- a list\n");
        assert_eq!(kinds(&findings), vec![(FindingKind::WrongType, ROOT_PATH)]);
    }

    #[test]
    fn non_empty_any_dict() {
        let schema = parse_schema(
            "fields:\n  - name: cast\n    type: dict\n    dict_keys: [lead, support]\n    non_empty_any: true\n",
        )
        .unwrap();
        let validator = Validator::new(&schema, ValidateOptions::default());
        let value: Value = serde_yaml::from_str("cast:\n  lead: 7\n").unwrap();
        let findings = validator.validate_record("ch_0001", &value);
        assert_eq!(
            kinds(&findings),
            vec![
                (FindingKind::WrongType, "cast.lead"),
            ]
        );
        let value: Value = serde_yaml::from_str("cast:\n  lead: Alice\n").unwrap();
        assert!(validator.validate_record("ch_0001", &value).is_empty());
    }

    #[test]
    fn validate_dir_orders_reports_and_skips_unreadable() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        std::fs::write(dir.join("ch_0010.yaml"), "summary: ten\n").unwrap();
        std::fs::write(dir.join("ch_0002.yaml"), "summary: ''\n").unwrap();
        std::fs::write(dir.join("ch_0003.yaml"), "summary: [broken\n").unwrap();
        std::fs::write(dir.join("notes.yaml"), "ignored: true\n").unwrap();

        let schema = parse_schema(SCHEMA).unwrap();
        let report = Validator::new(&schema, ValidateOptions::default())
            .validate_dir(dir, Some(&[1, 2, 3]))
            .unwrap();

        let order: Vec<u32> = report.results.iter().map(|r| r.index).collect();
        assert_eq!(order, vec![2, 10]);
        assert!(!report.results[0].is_valid());
        assert!(report.results[1].is_valid());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].record, "ch_0003");
        assert_eq!(report.missing_records, vec!["ch_0001"]);
        assert_eq!(report.orphan_records, vec!["ch_0010"]);
        assert_eq!(report.problem_count(), 3);
    }

    #[test]
    fn validate_dir_does_not_modify_records() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("ch_0001.yaml");
        std::fs::write(&path, "summary: ''\nmood: odd\n").unwrap();
        let before = std::fs::read(&path).unwrap();

        let schema = parse_schema(SCHEMA).unwrap();
        Validator::new(&schema, ValidateOptions::default())
            .validate_dir(tmp.path(), None)
            .unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }
}
