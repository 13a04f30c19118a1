//! Output rendering for scan results and the metadata audit trail.
//!
//! Supports `human` (default) and `json` outputs. The JSON form includes
//! per-finding fields, run metrics and per-file errors.

use crate::models::{Finding, MetadataRecord, ParseOutcome, Severity};
use crate::scan::RunSummary;
use crate::store::ReportView;
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;
use std::path::Path;

fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

/// `error:` prefix for stderr messages.
pub fn error_prefix() -> String {
    if use_colors("human") {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

/// `note:` prefix for stderr messages.
pub fn note_prefix() -> String {
    if use_colors("human") {
        "note:".cyan().bold().to_string()
    } else {
        "note:".to_string()
    }
}

/// Path of `file` relative to `cwd` when that is shorter to read.
pub fn display_path(file: &str, cwd: &Path) -> String {
    let path = Path::new(file);
    if path.is_absolute() {
        if let Some(rel) = pathdiff::diff_paths(path, cwd) {
            if !rel.starts_with("..") {
                return rel.to_string_lossy().to_string();
            }
        }
    }
    file.to_string()
}

fn severity_tag(sev: Severity, color: bool) -> String {
    let (icon, tag) = match sev {
        Severity::High => ("✖", "⟦high⟧"),
        Severity::Medium => ("▲", "⟦medium⟧"),
        Severity::Low => ("◆", "⟦low⟧"),
    };
    if !color {
        return format!("{} {}", icon, tag);
    }
    match sev {
        Severity::High => format!("{} {}", icon.red(), tag.red().bold()),
        Severity::Medium => format!("{} {}", icon.yellow(), tag.yellow().bold()),
        Severity::Low => format!("{} {}", icon.blue(), tag.blue().bold()),
    }
}

/// Print filtered findings with up to `lines` lines of code each.
pub fn print_report(view: &ReportView, summary: &RunSummary, output: &str, lines: usize, cwd: &Path) {
    match output {
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&compose_report_json(view, summary, cwd))
                .unwrap_or_else(|_| "{}".to_string())
        ),
        _ => {
            let color = use_colors(output);
            for f in &view.findings {
                let file = format!("{}:{}", display_path(f.file(), cwd), f.line());
                let file = if color { file.bold().to_string() } else { file };
                println!(
                    "{} {} ❲{}❳ — {} (confidence: {})",
                    severity_tag(f.severity(), color),
                    file,
                    f.check_id(),
                    f.message(),
                    f.confidence()
                );
                for (i, code) in f.code().lines().take(lines).enumerate() {
                    let numbered = format!("{:>5} │ {}", f.line() + i, code);
                    if color {
                        println!("{}", numbered.bright_black());
                    } else {
                        println!("{}", numbered);
                    }
                }
            }
            for failure in &summary.failures {
                let line = format!("skipped {}: {}", display_path(&failure.file, cwd), failure.message);
                if color {
                    println!("{}", line.yellow());
                } else {
                    println!("{}", line);
                }
            }
            let count = |s: Severity| view.by_severity.get(&s).copied().unwrap_or(0);
            let line = format!(
                "— Summary — high={} medium={} low={} files={} syntax_errors={} unreadable={}",
                count(Severity::High),
                count(Severity::Medium),
                count(Severity::Low),
                summary.files_attempted,
                summary.parse_failures,
                summary.io_failures
            );
            if color {
                println!("{}", line.bold());
            } else {
                println!("{}", line);
            }
        }
    }
}

fn finding_json(f: &Finding, cwd: &Path) -> JsonVal {
    json!({
        "file": display_path(f.file(), cwd),
        "line": f.line(),
        "column": f.column(),
        "check_id": f.check_id(),
        "severity": f.severity(),
        "confidence": f.confidence(),
        "message": f.message(),
        "code": f.code(),
    })
}

/// Compose report JSON object (pure) for testing/snapshot purposes.
pub fn compose_report_json(view: &ReportView, summary: &RunSummary, cwd: &Path) -> JsonVal {
    let results: Vec<_> = view.findings.iter().map(|f| finding_json(f, cwd)).collect();
    let errors: Vec<_> = summary
        .failures
        .iter()
        .map(|e| json!({"file": display_path(&e.file, cwd), "kind": e.kind, "message": e.message}))
        .collect();
    let faults: Vec<_> = summary
        .check_faults
        .iter()
        .map(|f| json!({"file": display_path(&f.file, cwd), "check_id": f.check_id, "message": f.message}))
        .collect();
    json!({
        "results": results,
        "errors": errors,
        "check_faults": faults,
        "metrics": {
            "files": summary.files_attempted,
            "syntax_errors": summary.parse_failures,
            "unreadable": summary.io_failures,
            "by_severity": view.by_severity,
            "by_confidence": view.by_confidence,
            "files_with_findings": view.files_with_findings,
        },
    })
}

fn outcome_label(outcome: ParseOutcome) -> &'static str {
    match outcome {
        ParseOutcome::Success => "parsed",
        ParseOutcome::SyntaxError => "syntax-error",
        ParseOutcome::Unreadable => "unreadable",
    }
}

/// Print the per-file audit trail.
pub fn print_metadata(records: &[MetadataRecord], output: &str, cwd: &Path) {
    match output {
        "json" => {
            let items: Vec<_> = records
                .iter()
                .map(|r| {
                    json!({
                        "file": display_path(&r.file, cwd),
                        "outcome": r.outcome,
                        "nodes": r.nodes,
                        "lines": r.lines,
                    })
                })
                .collect();
            let out = json!({ "metadata": items });
            println!(
                "{}",
                serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        _ => {
            let color = use_colors(output);
            for r in records {
                let label = outcome_label(r.outcome);
                let label = match (color, r.outcome) {
                    (false, _) => label.to_string(),
                    (true, ParseOutcome::Success) => label.green().to_string(),
                    (true, _) => label.red().to_string(),
                };
                println!(
                    "{:<14} {} nodes={} lines={}",
                    label,
                    display_path(&r.file, cwd),
                    r.nodes,
                    r.lines
                );
            }
        }
    }
}
