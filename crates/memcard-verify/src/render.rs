use crate::report::ValidationReport;
use memcard_store::RECORD_EXT;
use std::fmt::Write;

/// Human-readable report, one block per invalid record.
pub fn render_text(report: &ValidationReport, chunk_count: Option<usize>) -> String {
    let mut out = String::new();
    let record_count = report.results.len() + report.errors.len();
    if let Some(n) = chunk_count {
        let _ = writeln!(out, "Chunks : {n}");
    }
    let _ = writeln!(out, "Records: {record_count}");

    if !report.missing_records.is_empty() {
        out.push_str("\nMissing records for chunks:\n");
        for id in &report.missing_records {
            let _ = writeln!(out, "  - {id}.{RECORD_EXT}");
        }
    }

    if !report.orphan_records.is_empty() {
        out.push_str("\nRecords without a chunk:\n");
        for id in &report.orphan_records {
            let _ = writeln!(out, "  - {id}.{RECORD_EXT}");
        }
    }

    if !report.errors.is_empty() {
        out.push_str("\nUnreadable records:\n");
        for err in &report.errors {
            let _ = writeln!(out, "  - {}: {}", err.record, err.message);
        }
    }

    let invalid: Vec<_> = report.invalid().collect();
    if report.is_clean() {
        out.push_str("\nAll records passed validation checks.\n");
    } else if !invalid.is_empty() {
        out.push_str("\nInvalid / incomplete records:\n");
        for result in invalid {
            let _ = writeln!(out, "\n- {}", result.file.display());
            for f in &result.findings {
                let _ = writeln!(out, "    * [{}] {}: {}", f.kind, f.path, f.message);
            }
        }
    }

    let _ = writeln!(
        out,
        "\nSummary: problems={} (missing_records={}, invalid_records={}, unreadable_records={}, findings={})",
        report.problem_count(),
        report.missing_records.len(),
        report.invalid().count(),
        report.errors.len(),
        report.finding_count(),
    );
    out
}

/// Pretty-printed JSON of the whole report.
pub fn render_json(report: &ValidationReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}
