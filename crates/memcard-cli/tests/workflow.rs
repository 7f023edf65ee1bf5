use std::path::Path;
use std::process::{Command, Output};

const SCHEMA: &str = "\
fields:
  - name: summary
    type: string
    required: true
    non_empty: true
  - name: tags
    type: list
    max_items: 5
";

fn memcard(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_memcard"))
        .arg("--root")
        .arg(root)
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .unwrap()
}

fn setup(root: &Path, lines: usize) {
    std::fs::create_dir_all(root.join("input")).unwrap();
    let text: String = (1..=lines).map(|i| format!("line {i}\n")).collect();
    std::fs::write(root.join("input/raw_chat.txt"), text).unwrap();
    std::fs::write(root.join("schema.yaml"), SCHEMA).unwrap();
    std::fs::write(
        root.join("memcard.json"),
        r#"{"unit": "line", "size_unit": "lines", "max_size": 10}"#,
    )
    .unwrap();
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

#[test]
fn split_fill_verify_round() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    setup(root, 25);

    let out = memcard(root, &["split"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    for i in 1..=3 {
        assert!(root.join(format!("chunks/ch_{i:04}.txt")).is_file());
        let record = std::fs::read_to_string(root.join(format!("output/chapters/ch_{i:04}.yaml")))
            .unwrap();
        assert_eq!(record, "summary: ''\ntags: []\n");
    }
    let third = std::fs::read_to_string(root.join("chunks/ch_0003.txt")).unwrap();
    assert_eq!(third.lines().count(), 5);

    // Skeletons are not valid yet: every record misses its summary.
    let out = memcard(root, &["verify"]);
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(stdout(&out).matches("[missing-required-field] summary").count(), 3);

    for i in 1..=3 {
        std::fs::write(
            root.join(format!("output/chapters/ch_{i:04}.yaml")),
            format!("summary: Part {i} of the story.\ntags: [chapter]\n"),
        )
        .unwrap();
    }
    let out = memcard(root, &["verify"]);
    assert!(out.status.success(), "{}", stdout(&out));
    assert!(stdout(&out).contains("All records passed validation checks."));

    // Re-running split on unchanged input writes nothing new.
    let out = memcard(root, &["split"]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("3 total, 0 new"));
    assert!(!root.join("chunks/ch_0004.txt").exists());
}

#[test]
fn schema_evolution_and_drift() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    setup(root, 8);
    assert!(memcard(root, &["split"]).status.success());

    std::fs::write(
        root.join("output/chapters/ch_0001.yaml"),
        "summary: Filled.\ntags: []\nmood: gloomy\n",
    )
    .unwrap();

    // New optional field: reconciliation adds it, keeps content and the stray field.
    std::fs::write(
        root.join("schema.yaml"),
        format!("{SCHEMA}  - name: place\n    type: string\n"),
    )
    .unwrap();
    let out = memcard(root, &["split"]);
    assert!(out.status.success());
    let record = std::fs::read_to_string(root.join("output/chapters/ch_0001.yaml")).unwrap();
    assert_eq!(record, "summary: Filled.\ntags: []\nplace: ''\nmood: gloomy\n");

    let out = memcard(root, &["verify", "--json"]);
    assert_eq!(out.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let findings = report["results"][0]["findings"].as_array().unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0]["kind"], "unknown-field");
    assert_eq!(findings[0]["path"], "mood");
}

#[test]
fn missing_transcript_aborts_without_output() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    setup(root, 3);
    std::fs::remove_file(root.join("input/raw_chat.txt")).unwrap();

    let out = memcard(root, &["split"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("not found"));
    assert!(!root.join("chunks").exists());
    assert!(!root.join("output").exists());
}

#[test]
fn bad_schema_aborts_before_chunking() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    setup(root, 3);
    std::fs::write(
        root.join("schema.yaml"),
        "fields:\n  - {name: a, type: string}\n  - {name: a, type: string}\n",
    )
    .unwrap();

    let out = memcard(root, &["split"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("duplicate field name"));
    assert!(!root.join("chunks").exists());
}
