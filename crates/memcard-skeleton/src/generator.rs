use crate::derive::derive_value;
use memcard_chunk::{parse_turn_headers, Chunk, TurnHeader, TurnPattern};
use memcard_schema::{FieldKind, FieldSpec, Schema};
use memcard_store::{read_record, record_file_name, write_record, RecordError};
use serde_yaml::{Mapping, Value};
use std::path::Path;

/// What one generation pass did to the records directory.
#[derive(Debug, Default)]
pub struct GenerateReport {
    /// Indices that received a fresh skeleton.
    pub created: Vec<u32>,
    /// Indices whose existing record gained fields, with the dotted paths added.
    pub updated: Vec<(u32, Vec<String>)>,
    /// Existing records already covering every schema field.
    pub unchanged: usize,
    /// Records that could not be read or written. Other records were still processed.
    pub errors: Vec<(u32, RecordError)>,
}

/// Emits and reconciles records so their field set covers the schema.
///
/// Never removes or rewrites a value that is already present.
pub struct SkeletonGenerator<'a> {
    schema: &'a Schema,
    turn_pattern: &'a TurnPattern,
}

impl<'a> SkeletonGenerator<'a> {
    pub fn new(schema: &'a Schema, turn_pattern: &'a TurnPattern) -> Self {
        Self {
            schema,
            turn_pattern,
        }
    }

    /// A new record mirroring the schema: every field at its placeholder,
    /// derived fields filled from the chunk's turns.
    pub fn skeleton(&self, chunk: &Chunk) -> Mapping {
        let mut record = Mapping::new();
        self.reconcile(&mut record, chunk);
        record
    }

    /// Add every schema field missing from `record`, recursing into dict fields.
    /// Returns the dotted paths that were added. Fields unknown to the schema
    /// keep their values and relative order after the schema fields.
    pub fn reconcile(&self, record: &mut Mapping, chunk: &Chunk) -> Vec<String> {
        let turns = parse_turn_headers(&chunk.text, self.turn_pattern);
        let mut added = Vec::new();
        self.reconcile_level(self.schema.fields(), record, "", &turns, &mut added);
        added
    }

    fn reconcile_level(
        &self,
        fields: &[FieldSpec],
        map: &mut Mapping,
        parent: &str,
        turns: &[TurnHeader],
        added: &mut Vec<String>,
    ) {
        let top_level = parent.is_empty();

        if fields.iter().any(|f| !map.contains_key(f.name.as_str())) {
            let old = std::mem::take(map);
            for field in fields {
                let value = match old.get(field.name.as_str()) {
                    Some(v) => v.clone(),
                    None => {
                        added.push(join_path(parent, &field.name));
                        self.initial_value(field, top_level, turns)
                    }
                };
                map.insert(Value::String(field.name.clone()), value);
            }
            for (key, value) in old {
                if !map.contains_key(&key) {
                    map.insert(key, value);
                }
            }
        }

        for field in fields {
            if let FieldKind::Map(rules) = &field.kind {
                if let Some(Value::Mapping(inner)) = map.get_mut(field.name.as_str()) {
                    let path = join_path(parent, &field.name);
                    self.reconcile_level(&rules.fields, inner, &path, turns, added);
                }
            }
        }
    }

    fn initial_value(&self, field: &FieldSpec, top_level: bool, turns: &[TurnHeader]) -> Value {
        if top_level {
            if let Some(func) = self.schema.derived_fn(&field.name) {
                if let Some(v) = derive_value(func, turns) {
                    return Value::String(v);
                }
            }
        }
        field.placeholder()
    }

    /// Write a skeleton for each chunk without a record; reconcile the rest.
    /// Record files are only rewritten when fields were added.
    pub fn generate(&self, records_dir: &Path, chunks: &[Chunk]) -> GenerateReport {
        let mut report = GenerateReport::default();

        for chunk in chunks {
            let path = records_dir.join(record_file_name(chunk.index));

            if !path.exists() {
                let record = self.skeleton(chunk);
                match write_record(&path, &record) {
                    Ok(()) => {
                        tracing::debug!(record = %chunk.id(), "skeleton written");
                        report.created.push(chunk.index);
                    }
                    Err(e) => report.errors.push((chunk.index, e)),
                }
                continue;
            }

            let mut record = match read_record(&path) {
                Ok(Value::Mapping(m)) => m,
                Ok(_) => {
                    report
                        .errors
                        .push((chunk.index, RecordError::NotMapping { path }));
                    continue;
                }
                Err(e) => {
                    report.errors.push((chunk.index, e));
                    continue;
                }
            };

            let added = self.reconcile(&mut record, chunk);
            if added.is_empty() {
                report.unchanged += 1;
                continue;
            }
            match write_record(&path, &record) {
                Ok(()) => {
                    tracing::info!(record = %chunk.id(), added = ?added, "record reconciled with schema");
                    report.updated.push((chunk.index, added));
                }
                Err(e) => report.errors.push((chunk.index, e)),
            }
        }

        for (index, err) in &report.errors {
            tracing::warn!(record = %memcard_store::record_id(*index), error = %err, "record skipped");
        }
        tracing::info!(
            created = report.created.len(),
            updated = report.updated.len(),
            unchanged = report.unchanged,
            failed = report.errors.len(),
            "skeleton generation complete"
        );
        report
    }
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}
