use regex::Regex;
use serde_yaml::{Mapping, Value};

/// The loaded schema. Field order is declaration order.
#[derive(Debug, Clone)]
pub struct Schema {
    pub version: Option<u32>,
    pub(crate) fields: Vec<FieldSpec>,
    pub(crate) derived: Vec<DerivedField>,
}

impl Schema {
    /// Top-level fields in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn derived(&self) -> &[DerivedField] {
        &self.derived
    }

    /// Derivation function for a top-level field, if it has one.
    pub fn derived_fn(&self, field: &str) -> Option<DerivedFn> {
        self.derived
            .iter()
            .find(|d| d.field == field)
            .map(|d| d.func)
    }
}

/// One declared field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub required: bool,
    /// Free-text guidance for whoever fills the record.
    pub description: Option<String>,
    pub kind: FieldKind,
}

#[derive(Debug, Clone)]
pub enum FieldKind {
    Text(TextRules),
    List(ListRules),
    Enum { values: Vec<String> },
    Map(MapRules),
}

impl FieldKind {
    /// Type tag as written in the schema source.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Text(_) => "string",
            FieldKind::List(_) => "list",
            FieldKind::Enum { .. } => "enum",
            FieldKind::Map(_) => "dict",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextRules {
    pub non_empty: bool,
    pub min_chars: Option<usize>,
    pub max_chars: Option<usize>,
    pub pattern: Option<Pattern>,
}

/// A `pattern` rule. Matching is anchored at the start of the value.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{source})"))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListRules {
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
    pub min_non_empty_items: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct MapRules {
    pub fields: Vec<FieldSpec>,
    pub non_empty_any: bool,
}

impl MapRules {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl FieldSpec {
    /// The explicit "empty" value a skeleton carries for this field.
    pub fn placeholder(&self) -> Value {
        match &self.kind {
            FieldKind::Text(_) => Value::String(String::new()),
            FieldKind::List(_) => Value::Sequence(Vec::new()),
            FieldKind::Enum { .. } => Value::Null,
            FieldKind::Map(rules) => {
                let mut map = Mapping::new();
                for field in &rules.fields {
                    map.insert(Value::String(field.name.clone()), field.placeholder());
                }
                Value::Mapping(map)
            }
        }
    }

    /// Whether `value` is still unfilled. `null` counts as unfilled for every type,
    /// and so does whitespace-only text.
    pub fn is_placeholder(&self, value: &Value) -> bool {
        match (&self.kind, value) {
            (_, Value::Null) => true,
            (FieldKind::Text(_), Value::String(s)) => s.trim().is_empty(),
            (FieldKind::Enum { .. }, Value::String(s)) => s.trim().is_empty(),
            (FieldKind::List(_), Value::Sequence(items)) => items.is_empty(),
            (FieldKind::Map(rules), Value::Mapping(map)) => {
                if rules.fields.is_empty() {
                    return map.is_empty();
                }
                rules.fields.iter().all(|f| {
                    map.get(f.name.as_str())
                        .map_or(true, |v| f.is_placeholder(v))
                })
            }
            _ => false,
        }
    }
}

/// A string field whose skeleton value is computed from the chunk's turns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedField {
    pub field: String,
    pub func: DerivedFn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedFn {
    /// `2024-05-01 21:03:00` -> `2024/05/01`
    FirstTurnDateYmdSlash,
    /// `21:03:00-21:40:12`, or a single time when both ends agree.
    FirstLastTurnTimeRange,
}

impl DerivedFn {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "from_first_turn_date_ymd_slash" => Some(Self::FirstTurnDateYmdSlash),
            "from_first_last_turn_time_range" => Some(Self::FirstLastTurnTimeRange),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstTurnDateYmdSlash => "from_first_turn_date_ymd_slash",
            Self::FirstLastTurnTimeRange => "from_first_last_turn_time_range",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(name: &str) -> FieldSpec {
        FieldSpec {
            name: name.into(),
            required: false,
            description: None,
            kind: FieldKind::Text(TextRules::default()),
        }
    }

    #[test]
    fn placeholders_by_type() {
        assert_eq!(text("a").placeholder(), Value::String(String::new()));
        let list = FieldSpec {
            kind: FieldKind::List(ListRules::default()),
            ..text("b")
        };
        assert_eq!(list.placeholder(), Value::Sequence(vec![]));
        let en = FieldSpec {
            kind: FieldKind::Enum {
                values: vec!["x".into()],
            },
            ..text("c")
        };
        assert_eq!(en.placeholder(), Value::Null);
    }

    #[test]
    fn map_placeholder_nests_fields_in_order() {
        let map = FieldSpec {
            kind: FieldKind::Map(MapRules {
                fields: vec![text("lead"), text("support")],
                non_empty_any: false,
            }),
            ..text("cast")
        };
        let Value::Mapping(m) = map.placeholder() else {
            panic!("expected mapping");
        };
        let keys: Vec<&str> = m.keys().filter_map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["lead", "support"]);
        assert!(map.is_placeholder(&Value::Mapping(m)));
    }

    #[test]
    fn whitespace_text_is_placeholder() {
        let f = text("summary");
        assert!(f.is_placeholder(&Value::String("  \n".into())));
        assert!(f.is_placeholder(&Value::Null));
        assert!(!f.is_placeholder(&Value::String("done".into())));
        // A wrong-typed value is filled, just badly.
        assert!(!f.is_placeholder(&Value::Bool(false)));
    }

    #[test]
    fn pattern_is_anchored_at_start() {
        let p = Pattern::new(r"\d{4}/").unwrap();
        assert!(p.is_match("2024/05/01"));
        assert!(!p.is_match("on 2024/05/01"));
        assert_eq!(p.as_str(), r"\d{4}/");
    }

    #[test]
    fn derived_fn_names_round_trip() {
        for f in [DerivedFn::FirstTurnDateYmdSlash, DerivedFn::FirstLastTurnTimeRange] {
            assert_eq!(DerivedFn::parse(f.as_str()), Some(f));
        }
        assert_eq!(DerivedFn::parse("from_moon_phase"), None);
    }
}
