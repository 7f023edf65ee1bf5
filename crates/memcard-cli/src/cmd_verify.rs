use crate::config::{Config, Overrides};
use memcard_schema::load_schema;
use memcard_store::{list_indexed, ProjectPaths, CHUNK_EXT};
use memcard_verify::{render_json, render_text, ValidateOptions, Validator};

/// `memcard verify`: validate every record against the schema.
/// Returns true when the report has no problems.
pub fn execute(
    paths: &ProjectPaths,
    overrides: &Overrides,
    json: bool,
    report_unfilled_optional: bool,
) -> anyhow::Result<bool> {
    let mut config = Config::load(paths)?;
    overrides.apply(&mut config);
    let resolved = config.resolved(paths);

    let schema = load_schema(&resolved.schema)?;

    if !resolved.records_dir.is_dir() {
        anyhow::bail!(
            "records directory {} not found. Run `memcard split` first.",
            resolved.records_dir.display()
        );
    }

    // Coverage is only checked when chunk files exist to compare against.
    let chunk_indices: Option<Vec<u32>> = if resolved.chunks_dir.is_dir() {
        Some(
            list_indexed(&resolved.chunks_dir, CHUNK_EXT)?
                .into_iter()
                .map(|(i, _)| i)
                .collect(),
        )
    } else {
        tracing::warn!(dir = %resolved.chunks_dir.display(), "chunks directory missing; skipping coverage check");
        None
    };

    let options = ValidateOptions {
        report_unfilled_optional: report_unfilled_optional || config.report_unfilled_optional,
    };
    let report = Validator::new(&schema, options)
        .validate_dir(&resolved.records_dir, chunk_indices.as_deref())?;

    if json {
        println!("{}", render_json(&report)?);
    } else {
        print!(
            "{}",
            render_text(&report, chunk_indices.as_ref().map(Vec::len))
        );
    }
    Ok(report.is_clean())
}
