use crate::config::{Config, Overrides};
use memcard_chunk::{Chunk, TurnPattern};
use memcard_schema::{load_schema, FieldKind, FieldSpec, Schema};
use memcard_skeleton::SkeletonGenerator;
use memcard_store::ProjectPaths;

/// `memcard schema`: load the schema and print its field tree, or an empty skeleton.
pub fn execute(paths: &ProjectPaths, overrides: &Overrides, skeleton: bool) -> anyhow::Result<()> {
    let mut config = Config::load(paths)?;
    overrides.apply(&mut config);
    let resolved = config.resolved(paths);
    let schema = load_schema(&resolved.schema)?;

    if skeleton {
        let pattern = TurnPattern::new(&config.turn_pattern)?;
        let generator = SkeletonGenerator::new(&schema, &pattern);
        let empty = Chunk {
            index: 1,
            text: String::new(),
        };
        print!("{}", serde_yaml::to_string(&generator.skeleton(&empty))?);
        return Ok(());
    }

    print!("{}", render_tree(&schema, &resolved.schema.display().to_string()));
    Ok(())
}

fn render_tree(schema: &Schema, source: &str) -> String {
    let mut out = match schema.version {
        Some(v) => format!("{source} (version {v})\n"),
        None => format!("{source}\n"),
    };
    push_fields(&mut out, schema, schema.fields(), 1);
    out
}

fn push_fields(out: &mut String, schema: &Schema, fields: &[FieldSpec], depth: usize) {
    let indent = "  ".repeat(depth);
    for field in fields {
        let mut notes = rules(field);
        if depth == 1 {
            if let Some(func) = schema.derived_fn(&field.name) {
                notes.push(format!("derived: {}", func.as_str()));
            }
        }
        let required = if field.required { "required" } else { "optional" };
        out.push_str(&format!(
            "{indent}{:<20} {:<7} {required}",
            field.name,
            field.kind.type_name()
        ));
        if !notes.is_empty() {
            out.push_str(&format!("  [{}]", notes.join(", ")));
        }
        out.push('\n');
        if let FieldKind::Map(map) = &field.kind {
            push_fields(out, schema, &map.fields, depth + 1);
        }
    }
}

fn rules(field: &FieldSpec) -> Vec<String> {
    let mut notes = Vec::new();
    match &field.kind {
        FieldKind::Text(r) => {
            if r.non_empty {
                notes.push("non_empty".into());
            }
            if let Some(n) = r.min_chars {
                notes.push(format!("min_chars={n}"));
            }
            if let Some(n) = r.max_chars {
                notes.push(format!("max_chars={n}"));
            }
            if let Some(p) = &r.pattern {
                notes.push(format!("pattern={}", p.as_str()));
            }
        }
        FieldKind::List(r) => {
            if let Some(n) = r.min_items {
                notes.push(format!("min_items={n}"));
            }
            if let Some(n) = r.max_items {
                notes.push(format!("max_items={n}"));
            }
            if let Some(n) = r.min_non_empty_items {
                notes.push(format!("min_non_empty_items={n}"));
            }
        }
        FieldKind::Enum { values } => notes.push(format!("values={}", values.join("|"))),
        FieldKind::Map(r) => {
            if r.non_empty_any {
                notes.push("non_empty_any".into());
            }
        }
    }
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use memcard_schema::parse_schema;

    #[test]
    fn tree_shows_nesting_rules_and_derivations() {
        let schema = parse_schema(
            r#"
version: 2
fields:
  - name: date
    type: string
    required: true
  - name: tone
    type: enum
    values: [calm, tense]
  - name: cast
    type: dict
    dict_keys: [lead]
derived:
  date: from_first_turn_date_ymd_slash
"#,
        )
        .unwrap();
        let tree = render_tree(&schema, "schema.yaml");
        let lines: Vec<&str> = tree.lines().collect();
        assert_eq!(lines[0], "schema.yaml (version 2)");
        assert!(lines[1].starts_with("  date"));
        assert!(lines[1].contains("required"));
        assert!(lines[1].contains("derived: from_first_turn_date_ymd_slash"));
        assert!(lines[2].contains("values=calm|tense"));
        assert!(lines[4].starts_with("    lead"));
    }
}
