use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use wildkit::{lint, PassReport};

use super::{open_corpus, report, CmdResult, CorpusArgs, Tool};

#[derive(Args)]
pub struct LintArgs {
    #[command(flatten)]
    corpus: CorpusArgs,

    /// Apply corrections to disk (default is dry-run)
    #[arg(long)]
    write: bool,

    /// Also write a human-readable run log to this file
    #[arg(long, value_name = "FILE")]
    log: Option<PathBuf>,
}

#[derive(Serialize)]
pub struct LintOutput {
    command: &'static str,
    root: String,
    dry_run: bool,
    #[serde(flatten)]
    report: PassReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    hints: Option<Vec<String>>,
}

pub fn run(args: LintArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<LintOutput> {
    let (mut corpus, _config) = open_corpus(&args.corpus, Tool::Lint)?;
    let root = corpus.root().to_path_buf();

    let report = lint::lint_corpus(&mut corpus, args.write)?;

    if let Some(log) = &args.log {
        report::write_log(log, "WILDCARD LINTER LOG", &root, &report, "corrections")?;
    }

    let hints = if !args.write && report.updated > 0 {
        Some(vec![format!(
            "Run 'wildkit lint --write' to apply {} correction(s) in {} document(s)",
            report.total_changes, report.updated
        )])
    } else {
        None
    };

    let exit_code = if report.has_errors() { 1 } else { 0 };

    Ok((
        LintOutput {
            command: "lint",
            root: root.display().to_string(),
            dry_run: !args.write,
            report,
            hints,
        },
        exit_code,
    ))
}
