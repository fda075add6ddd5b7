use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use wildkit::{underscore, PassReport};

use super::{open_corpus, report, CmdResult, CorpusArgs, Tool};

#[derive(Args)]
pub struct ReplaceArgs {
    #[command(flatten)]
    corpus: CorpusArgs,

    /// Apply changes to disk (default is dry-run)
    #[arg(long)]
    write: bool,

    /// Also write a human-readable run log to this file
    #[arg(long, value_name = "FILE")]
    log: Option<PathBuf>,
}

#[derive(Serialize)]
pub struct ReplaceOutput {
    command: &'static str,
    root: String,
    dry_run: bool,
    #[serde(flatten)]
    report: PassReport,
}

pub fn run(args: ReplaceArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<ReplaceOutput> {
    let (mut corpus, _config) = open_corpus(&args.corpus, Tool::Replace)?;
    let root = corpus.root().to_path_buf();

    wildkit::log_status!("replace", "Processing directory: {}", root.display());
    let report = underscore::replace_corpus(&mut corpus, args.write)?;

    if let Some(log) = &args.log {
        report::write_log(
            log,
            "WILDCARD UNDERSCORE REPLACEMENT",
            &root,
            &report,
            "replacements",
        )?;
    }

    let exit_code = if report.has_errors() { 1 } else { 0 };

    Ok((
        ReplaceOutput {
            command: "replace",
            root: root.display().to_string(),
            dry_run: !args.write,
            report,
        },
        exit_code,
    ))
}
