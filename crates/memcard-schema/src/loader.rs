use crate::error::SchemaError;
use crate::model::{
    DerivedField, DerivedFn, FieldKind, FieldSpec, ListRules, MapRules, Pattern, Schema,
    TextRules,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSchema {
    #[serde(default)]
    version: Option<u32>,
    #[serde(default)]
    fields: Vec<RawField>,
    #[serde(default)]
    derived: Option<serde_yaml::Mapping>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawField {
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type", default)]
    type_tag: Option<String>,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    description: Option<String>,
    // string
    #[serde(default)]
    non_empty: Option<bool>,
    #[serde(default)]
    min_chars: Option<usize>,
    #[serde(default)]
    max_chars: Option<usize>,
    #[serde(default)]
    pattern: Option<String>,
    // list
    #[serde(default)]
    min_items: Option<usize>,
    #[serde(default)]
    max_items: Option<usize>,
    #[serde(default)]
    min_non_empty_items: Option<usize>,
    // enum
    #[serde(default)]
    values: Option<Vec<String>>,
    // dict
    #[serde(default)]
    fields: Option<Vec<RawField>>,
    #[serde(default)]
    dict_keys: Option<Vec<String>>,
    #[serde(default)]
    non_empty_any: Option<bool>,
}

/// Load and validate a schema from a YAML file.
pub fn load_schema(path: &Path) -> Result<Schema, SchemaError> {
    let content = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let schema = parse_schema(&content)?;
    tracing::debug!(
        path = %path.display(),
        fields = schema.fields().len(),
        "schema loaded"
    );
    Ok(schema)
}

/// Parse and validate a schema from a YAML string.
pub fn parse_schema(yaml: &str) -> Result<Schema, SchemaError> {
    let raw: RawSchema = serde_yaml::from_str(yaml)?;
    if raw.fields.is_empty() {
        return Err(SchemaError::NoFields);
    }

    let fields = build_fields(raw.fields, "")?;
    let derived = match raw.derived {
        Some(map) => build_derived(&map, &fields)?,
        None => Vec::new(),
    };

    Ok(Schema {
        version: raw.version,
        fields,
        derived,
    })
}

fn build_fields(raw: Vec<RawField>, parent: &str) -> Result<Vec<FieldSpec>, SchemaError> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(raw.len());

    for (i, field) in raw.into_iter().enumerate() {
        let name = match field.name.as_deref().map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => {
                let location = if parent.is_empty() {
                    format!("fields[{i}]")
                } else {
                    format!("{parent}.fields[{i}]")
                };
                return Err(SchemaError::MissingName { location });
            }
        };
        let path = join_path(parent, &name);
        if !seen.insert(name.clone()) {
            return Err(SchemaError::DuplicateField { path });
        }
        out.push(build_field(field, name, &path)?);
    }
    Ok(out)
}

fn build_field(raw: RawField, name: String, path: &str) -> Result<FieldSpec, SchemaError> {
    let type_tag = raw
        .type_tag
        .as_deref()
        .ok_or_else(|| SchemaError::MissingType {
            path: path.to_string(),
        })?;

    let kind = match type_tag {
        "string" => {
            reject_rules(&raw, path, "string", &STRING_RULES)?;
            check_range(path, ("min_chars", raw.min_chars), ("max_chars", raw.max_chars))?;
            let pattern = match raw.pattern.as_deref() {
                Some(p) => Some(Pattern::new(p).map_err(|source| SchemaError::InvalidPattern {
                    path: path.to_string(),
                    source,
                })?),
                None => None,
            };
            FieldKind::Text(TextRules {
                non_empty: raw.non_empty.unwrap_or(false),
                min_chars: raw.min_chars,
                max_chars: raw.max_chars,
                pattern,
            })
        }
        "list" => {
            reject_rules(&raw, path, "list", &LIST_RULES)?;
            check_range(path, ("min_items", raw.min_items), ("max_items", raw.max_items))?;
            check_range(
                path,
                ("min_non_empty_items", raw.min_non_empty_items),
                ("max_items", raw.max_items),
            )?;
            FieldKind::List(ListRules {
                min_items: raw.min_items,
                max_items: raw.max_items,
                min_non_empty_items: raw.min_non_empty_items,
            })
        }
        "enum" => {
            reject_rules(&raw, path, "enum", &ENUM_RULES)?;
            let values = raw.values.unwrap_or_default();
            if values.is_empty() {
                return Err(SchemaError::EmptyEnum {
                    path: path.to_string(),
                });
            }
            FieldKind::Enum { values }
        }
        "dict" => {
            reject_rules(&raw, path, "dict", &DICT_RULES)?;
            let fields = match (raw.fields, raw.dict_keys) {
                (Some(_), Some(_)) => {
                    return Err(SchemaError::ConflictingKeys {
                        path: path.to_string(),
                    })
                }
                (Some(nested), None) => build_fields(nested, path)?,
                (None, Some(keys)) => keys_as_fields(keys, path)?,
                (None, None) => Vec::new(),
            };
            FieldKind::Map(MapRules {
                fields,
                non_empty_any: raw.non_empty_any.unwrap_or(false),
            })
        }
        other => {
            return Err(SchemaError::UnknownType {
                path: path.to_string(),
                type_tag: other.to_string(),
            })
        }
    };

    Ok(FieldSpec {
        name,
        required: raw.required,
        description: raw.description,
        kind,
    })
}

/// `dict_keys: [a, b]` is shorthand for optional string sub-fields.
fn keys_as_fields(keys: Vec<String>, parent: &str) -> Result<Vec<FieldSpec>, SchemaError> {
    let raw = keys
        .into_iter()
        .map(|k| RawField {
            name: Some(k),
            type_tag: Some("string".into()),
            ..RawField::empty()
        })
        .collect();
    build_fields(raw, parent)
}

// Rules each type accepts; everything else set on the field is an error.
const STRING_RULES: [&str; 4] = ["non_empty", "min_chars", "max_chars", "pattern"];
const LIST_RULES: [&str; 3] = ["min_items", "max_items", "min_non_empty_items"];
const ENUM_RULES: [&str; 1] = ["values"];
const DICT_RULES: [&str; 3] = ["fields", "dict_keys", "non_empty_any"];

fn reject_rules(
    raw: &RawField,
    path: &str,
    type_tag: &'static str,
    allowed: &[&str],
) -> Result<(), SchemaError> {
    for rule in raw.rules_present() {
        if !allowed.contains(&rule) {
            return Err(SchemaError::InapplicableRule {
                path: path.to_string(),
                rule,
                type_tag,
            });
        }
    }
    Ok(())
}

fn check_range(
    path: &str,
    (min_rule, min): (&'static str, Option<usize>),
    (max_rule, max): (&'static str, Option<usize>),
) -> Result<(), SchemaError> {
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(SchemaError::InvalidRange {
                path: path.to_string(),
                min_rule,
                min,
                max_rule,
                max,
            });
        }
    }
    Ok(())
}

impl RawField {
    fn empty() -> Self {
        Self {
            name: None,
            type_tag: None,
            required: false,
            description: None,
            non_empty: None,
            min_chars: None,
            max_chars: None,
            pattern: None,
            min_items: None,
            max_items: None,
            min_non_empty_items: None,
            values: None,
            fields: None,
            dict_keys: None,
            non_empty_any: None,
        }
    }

    fn rules_present(&self) -> Vec<&'static str> {
        let flags = [
            ("non_empty", self.non_empty.is_some()),
            ("min_chars", self.min_chars.is_some()),
            ("max_chars", self.max_chars.is_some()),
            ("pattern", self.pattern.is_some()),
            ("min_items", self.min_items.is_some()),
            ("max_items", self.max_items.is_some()),
            ("min_non_empty_items", self.min_non_empty_items.is_some()),
            ("values", self.values.is_some()),
            ("fields", self.fields.is_some()),
            ("dict_keys", self.dict_keys.is_some()),
            ("non_empty_any", self.non_empty_any.is_some()),
        ];
        flags
            .into_iter()
            .filter_map(|(rule, set)| set.then_some(rule))
            .collect()
    }
}

fn build_derived(
    map: &serde_yaml::Mapping,
    fields: &[FieldSpec],
) -> Result<Vec<DerivedField>, SchemaError> {
    let mut out = Vec::with_capacity(map.len());
    for (key, value) in map {
        let field = key.as_str().unwrap_or_default().to_string();
        let func_name = value.as_str().unwrap_or_default();

        let spec = fields
            .iter()
            .find(|f| f.name == field)
            .ok_or_else(|| SchemaError::UnknownDerivedField {
                field: field.clone(),
            })?;
        if !matches!(spec.kind, FieldKind::Text(_)) {
            return Err(SchemaError::DerivedNotString {
                field,
                type_tag: spec.kind.type_name(),
            });
        }
        let func = DerivedFn::parse(func_name).ok_or_else(|| SchemaError::UnknownDerivedFn {
            field: field.clone(),
            func: func_name.to_string(),
        })?;
        out.push(DerivedField { field, func });
    }
    Ok(out)
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}
