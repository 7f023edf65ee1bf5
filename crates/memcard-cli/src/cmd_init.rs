use crate::config::Config;
use memcard_store::ProjectPaths;

const STARTER_SCHEMA: &str = "\
version: 1
fields:
  - name: date
    type: string
    required: true
    pattern: '\\d{4}/\\d{2}/\\d{2}'
  - name: time_range
    type: string
  - name: chapter_title
    type: string
    required: true
    non_empty: true
    max_chars: 40
  - name: summary
    type: string
    required: true
    non_empty: true
    max_chars: 600
  - name: key_events
    type: list
    required: true
    min_items: 1
    max_items: 8
    min_non_empty_items: 1
  - name: tags
    type: list
    max_items: 5
  - name: tone
    type: enum
    values: [light, warm, tense, somber]
  - name: relationships
    type: dict
    dict_keys: [user, character]
derived:
  date: from_first_turn_date_ymd_slash
  time_range: from_first_last_turn_time_range
";

/// `memcard init`: write a default `memcard.json` and a starter schema.
/// Existing files are left alone.
pub fn execute(paths: &ProjectPaths) -> anyhow::Result<()> {
    if paths.config_json.exists() {
        println!("Already initialized at {}", paths.config_json.display());
    } else {
        let json = serde_json::to_string_pretty(&Config::default())?;
        memcard_store::write_atomic(&paths.config_json, json.as_bytes())?;
        println!("Wrote {}", paths.config_json.display());
    }

    let config = Config::load(paths)?;
    let resolved = config.resolved(paths);
    if resolved.schema.exists() {
        println!("Keeping existing {}", resolved.schema.display());
    } else {
        memcard_store::write_atomic(&resolved.schema, STARTER_SCHEMA.as_bytes())?;
        println!("Wrote {}", resolved.schema.display());
    }

    if let Some(parent) = resolved.input.parent() {
        std::fs::create_dir_all(parent)?;
    }
    println!(
        "Next: put the transcript at {}, then run: memcard split",
        resolved.input.display()
    );
    Ok(())
}
