use crate::config::{ChunkOverrides, Config, Overrides};
use anyhow::Context;
use memcard_chunk::{run_chunker, Chunker};
use memcard_schema::load_schema;
use memcard_skeleton::{GenerateReport, SkeletonGenerator};
use memcard_store::{record_id, ProjectPaths};

/// `memcard split`: chunk new transcript content, then bring every record up to
/// the current schema. Returns false when some record could not be processed.
pub fn execute(
    paths: &ProjectPaths,
    overrides: &Overrides,
    chunk_overrides: &ChunkOverrides,
) -> anyhow::Result<bool> {
    let mut config = Config::load(paths)?;
    overrides.apply(&mut config);
    chunk_overrides.apply(&mut config);
    let resolved = config.resolved(paths);

    // Both prerequisites are checked before anything is written.
    let schema = load_schema(&resolved.schema)?;
    let chunker = Chunker::new(config.chunk_config()?);

    let run = run_chunker(&resolved.input, &resolved.chunks_dir, &chunker)
        .with_context(|| format!("chunking {}", resolved.input.display()))?;

    let generator = SkeletonGenerator::new(&schema, &chunker.config().turn_pattern);
    let report = generator.generate(&resolved.records_dir, &run.chunks);

    println!(
        "Chunks: {} total, {} new -> {}",
        run.chunks.len(),
        run.created,
        resolved.chunks_dir.display()
    );
    for w in &run.warnings {
        println!(
            "  ! {} holds a single {} of {} {} (max_size={})",
            record_id(w.index),
            config.unit,
            w.size,
            config.size_unit,
            w.max_size
        );
    }
    if let Some(split) = &run.forced_split {
        println!(
            "  ! {} ends inside a {} that the transcript now continues; the rest starts {}",
            record_id(split.index),
            config.unit,
            record_id(split.index + 1)
        );
    }
    print_generate_report(&report, &resolved.records_dir);

    if report.errors.is_empty() {
        println!("Next: fill the records, then run: memcard verify");
    }
    Ok(report.errors.is_empty())
}

fn print_generate_report(report: &GenerateReport, records_dir: &std::path::Path) {
    println!(
        "Records: {} created, {} reconciled, {} unchanged -> {}",
        report.created.len(),
        report.updated.len(),
        report.unchanged,
        records_dir.display()
    );
    for (index, added) in &report.updated {
        println!("  + {}: added {}", record_id(*index), added.join(", "));
    }
    if !report.errors.is_empty() {
        println!("\nSkipped records:");
        for (index, err) in &report.errors {
            println!("  - {}: {err}", record_id(*index));
        }
    }
}
