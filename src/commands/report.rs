//! Human-readable run logs for corpus passes (`--log <file>`).

use std::path::Path;

use chrono::Local;
use wildkit::{ItemStatus, PassReport};

const RULE: &str = "============================================================";

pub fn render_log(title: &str, root: &Path, report: &PassReport, unit: &str) -> String {
    let mut lines = vec![
        RULE.to_string(),
        title.to_string(),
        RULE.to_string(),
        format!("Directory: {}", root.display()),
        format!("Time: {}", Local::now().format("%Y-%m-%d %H:%M:%S")),
        format!(
            "Mode: {}",
            if report.written { "write" } else { "dry run" }
        ),
        RULE.to_string(),
    ];

    for item in &report.items {
        lines.push(String::new());
        lines.push(format!("Processing: {}", item.document));
        match item.status {
            ItemStatus::Failed => lines.push(format!(
                "  ERROR: {}",
                item.error.as_deref().unwrap_or("unknown error")
            )),
            ItemStatus::Unchanged => lines.push("  No changes needed".to_string()),
            ItemStatus::Updated if item.messages.is_empty() => {
                lines.push(format!("  {} {}", item.changes, unit))
            }
            ItemStatus::Updated => {
                lines.extend(item.messages.iter().map(|m| format!("  {}", m)))
            }
        }
    }

    lines.push(String::new());
    lines.push(RULE.to_string());
    lines.push("SUMMARY".to_string());
    lines.push(format!("Documents processed: {}", report.documents_processed));
    lines.push(format!("Total {}: {}", unit, report.total_changes));
    lines.push(format!("Errors: {}", report.errors));
    lines.push(RULE.to_string());

    lines.join("\n") + "\n"
}

pub fn write_log(
    path: &Path,
    title: &str,
    root: &Path,
    report: &PassReport,
    unit: &str,
) -> wildkit::Result<()> {
    let content = render_log(title, root, report, unit);
    wildkit::io::write_file_atomic(path, &content, &format!("write log {}", path.display()))
}
