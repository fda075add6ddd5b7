use clap::{Args, Subcommand};
use serde::Serialize;

use wildkit::refactor::{
    ApplyReport, DocumentReferences, OwningDocument, Preview, Proposal, ReferenceIndex,
    RenameSession, WildcardEntry,
};

use super::{open_corpus, CmdResult, CorpusArgs, Tool};
use crate::tty;

#[derive(Args)]
pub struct RefactorArgs {
    #[command(subcommand)]
    command: RefactorCommand,
}

#[derive(Subcommand)]
enum RefactorCommand {
    /// Find every reference to a wildcard
    Find {
        /// Wildcard name, without the surrounding underscores
        name: String,
        #[command(flatten)]
        corpus: CorpusArgs,
    },
    /// List every wildcard used in the corpus
    List {
        #[command(flatten)]
        corpus: CorpusArgs,
    },
    /// Rename a wildcard and its owning document
    Rename {
        /// Wildcard to rename from
        #[arg(long)]
        from: String,
        /// Wildcard to rename to
        #[arg(long)]
        to: String,
        #[command(flatten)]
        corpus: CorpusArgs,
        /// Apply changes to disk (default is dry-run)
        #[arg(long)]
        write: bool,
    },
    /// Rename wildcards one at a time from a prompt
    Interactive {
        #[command(flatten)]
        corpus: CorpusArgs,
    },
}

pub fn is_interactive(args: &RefactorArgs) -> bool {
    matches!(args.command, RefactorCommand::Interactive { .. })
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum RefactorOutput {
    #[serde(rename = "refactor.find")]
    Find {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        owner: Option<OwningDocument>,
        total_references: usize,
        documents: Vec<DocumentReferences>,
    },
    #[serde(rename = "refactor.list")]
    List {
        total_wildcards: usize,
        dangling: usize,
        wildcards: Vec<WildcardEntry>,
    },
    #[serde(rename = "refactor.rename")]
    Rename {
        from: String,
        to: String,
        dry_run: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        preview: Option<Preview>,
        #[serde(skip_serializing_if = "Option::is_none")]
        applied: Option<ApplyReport>,
    },
}

pub fn run(args: RefactorArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<RefactorOutput> {
    match args.command {
        RefactorCommand::Find { name, corpus } => run_find(&name, &corpus),
        RefactorCommand::List { corpus } => run_list(&corpus),
        RefactorCommand::Rename {
            from,
            to,
            corpus,
            write,
        } => run_rename(&from, &to, &corpus, write),
        RefactorCommand::Interactive { .. } => Err(wildkit::Error::validation_invalid_argument(
            "command",
            "Interactive refactoring cannot produce JSON output",
            None,
            Some(vec!["wildkit refactor rename --from <old> --to <new>".to_string()]),
        )),
    }
}

fn run_find(name: &str, corpus_args: &CorpusArgs) -> CmdResult<RefactorOutput> {
    let (corpus, _config) = open_corpus(corpus_args, Tool::Refactor)?;
    let index = ReferenceIndex::build(&corpus)?;

    let documents = index.find_references(name)?;
    let total_references = documents.iter().map(|d| d.occurrences.len()).sum();

    Ok((
        RefactorOutput::Find {
            name: name.to_string(),
            owner: index.owning_document(name),
            total_references,
            documents,
        },
        0,
    ))
}

fn run_list(corpus_args: &CorpusArgs) -> CmdResult<RefactorOutput> {
    let (corpus, _config) = open_corpus(corpus_args, Tool::Refactor)?;
    let index = ReferenceIndex::build(&corpus)?;
    let wildcards = index.inventory();

    Ok((
        RefactorOutput::List {
            total_wildcards: wildcards.len(),
            dangling: wildcards.iter().filter(|w| w.dangling).count(),
            wildcards,
        },
        0,
    ))
}

fn run_rename(
    from: &str,
    to: &str,
    corpus_args: &CorpusArgs,
    write: bool,
) -> CmdResult<RefactorOutput> {
    let (mut corpus, config) = open_corpus(corpus_args, Tool::Refactor)?;
    let mut session = RenameSession::new(&mut corpus, config.preview_limit)?;

    if let Proposal::NothingToDo { old_name } = session.propose(from)? {
        wildkit::log_status!("refactor", "No references or file found for '__{}__'", old_name);
        return Ok((
            RefactorOutput::Rename {
                from: from.to_string(),
                to: to.to_string(),
                dry_run: !write,
                preview: None,
                applied: None,
            },
            0,
        ));
    }

    let preview = session.preview(to)?;
    if !write {
        return Ok((
            RefactorOutput::Rename {
                from: from.to_string(),
                to: to.to_string(),
                dry_run: true,
                preview: Some(preview),
                applied: None,
            },
            0,
        ));
    }

    let report = session.apply()?;
    let exit_code = if report.has_failures() { 1 } else { 0 };

    Ok((
        RefactorOutput::Rename {
            from: from.to_string(),
            to: to.to_string(),
            dry_run: false,
            preview: Some(preview),
            applied: Some(report),
        },
        exit_code,
    ))
}

// ============================================================================
// Interactive mode
// ============================================================================

/// Prompt loop: pick a wildcard, pick a new name, review, confirm. Entering
/// `q` at the first prompt ends the loop.
pub fn run_interactive(args: RefactorArgs) -> wildkit::Result<i32> {
    let RefactorCommand::Interactive { corpus: corpus_args } = args.command else {
        return Err(wildkit::Error::internal_unexpected(
            "run_interactive called for a non-interactive refactor command",
        ));
    };

    let (mut corpus, config) = open_corpus(&corpus_args, Tool::Refactor)?;
    eprintln!("Corpus: {}", corpus.root().display());

    let mut session = RenameSession::new(&mut corpus, config.preview_limit)?;
    let mut failures = false;

    loop {
        eprintln!();
        let old_name = tty::prompt("Wildcard to rename (without underscores, 'q' to quit): ")?;
        if old_name.eq_ignore_ascii_case("q") {
            break;
        }
        if old_name.is_empty() {
            continue;
        }

        match session.propose(&old_name)? {
            Proposal::NothingToDo { old_name } => {
                eprintln!("No references or file found for __{}__", old_name);
                continue;
            }
            Proposal::Proposed {
                target,
                total_references,
                documents,
                ..
            } => {
                match &target {
                    Some(target) => eprintln!("Wildcard file: {}", target),
                    None => eprintln!("No wildcard file named '{}'", old_name),
                }
                eprintln!(
                    "Found {} reference(s) in {} document(s)",
                    total_references, documents
                );
            }
        }

        let new_name = tty::prompt("New name (blank to cancel): ")?;
        if new_name.is_empty() {
            session.cancel();
            eprintln!("Cancelled.");
            continue;
        }

        let preview = match session.preview(&new_name) {
            Ok(preview) => preview,
            Err(err) => {
                session.cancel();
                eprintln!("Error: {}", err.summary());
                continue;
            }
        };
        eprint!("{}", render_preview(&preview));

        if preview.conflict.is_some() {
            session.cancel();
            eprintln!("Choose a different name.");
            continue;
        }

        if !tty::confirm("Apply these changes? (y/n): ")? {
            session.cancel();
            eprintln!("Cancelled.");
            continue;
        }

        match session.apply() {
            Ok(report) => {
                failures |= report.has_failures();
                eprint!("{}", render_apply(&report));
            }
            Err(err) => {
                session.cancel();
                failures = true;
                eprintln!("Error: {}", err.summary());
            }
        }
    }

    Ok(if failures { 1 } else { 0 })
}

pub fn render_preview(preview: &Preview) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "\nRename __{}__ -> __{}__\n",
        preview.old_name, preview.new_name
    ));
    if let Some(rename) = &preview.file_rename {
        out.push_str(&format!("  File: {} -> {}\n", rename.from, rename.to));
    }
    if let Some(conflict) = &preview.conflict {
        out.push_str(&format!("  CONFLICT: {} already exists\n", conflict));
    }
    for warning in &preview.warnings {
        out.push_str(&format!("  Warning: {}\n", warning.message));
    }

    out.push_str(&format!(
        "  {} reference(s) in {} document(s)\n",
        preview.total_references,
        preview.documents.len()
    ));
    for doc in &preview.documents {
        out.push_str(&format!("\n  {} ({})\n", doc.document, doc.count));
        for occ in &doc.shown {
            out.push_str(&format!("    Line {}: {}\n", occ.line, occ.text));
        }
        if doc.remaining > 0 {
            out.push_str(&format!("    ... and {} more\n", doc.remaining));
        }
    }

    out
}

pub fn render_apply(report: &ApplyReport) -> String {
    let mut out = String::new();

    for doc in &report.documents {
        if let Some(error) = &doc.error {
            out.push_str(&format!("  Error updating {}: {}\n", doc.document, error));
        }
    }
    out.push_str(&format!(
        "Updated {} document(s), {} replacement(s)\n",
        report.updated, report.total_replacements
    ));

    if let Some(rename) = &report.file_rename {
        match &rename.error {
            None => out.push_str(&format!("Renamed {} -> {}\n", rename.from, rename.to)),
            Some(error) => out.push_str(&format!(
                "Could not rename {} -> {}: {}\n",
                rename.from, rename.to, error
            )),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use wildkit::corpus::MemoryCorpus;

    fn previewed(store: &mut MemoryCorpus, from: &str, to: &str, limit: usize) -> Preview {
        let mut session = RenameSession::new(store, limit).unwrap();
        session.propose(from).unwrap();
        session.preview(to).unwrap()
    }

    #[test]
    fn preview_shows_limited_lines_and_remainder() {
        let mut store = MemoryCorpus::new()
            .with("color.txt", "red,\n")
            .with("scene.txt", "__color__\n__color__\n__color__\n__Color__\n");

        let text = render_preview(&previewed(&mut store, "color", "hue", 3));

        assert!(text.contains("Rename __color__ -> __hue__"));
        assert!(text.contains("File: color.txt -> hue.txt"));
        assert!(text.contains("scene.txt (4)"));
        assert!(text.contains("Line 3: __color__"));
        assert!(!text.contains("Line 4"));
        assert!(text.contains("... and 1 more"));
    }

    #[test]
    fn preview_flags_conflicts() {
        let mut store = MemoryCorpus::new()
            .with("color.txt", "red,\n")
            .with("hue.txt", "blue,\n");

        let text = render_preview(&previewed(&mut store, "color", "hue", 3));
        assert!(text.contains("CONFLICT: hue.txt already exists"));
    }

    #[test]
    fn apply_summary_reports_rename() {
        let mut store = MemoryCorpus::new()
            .with("color.txt", "red,\n")
            .with("scene.txt", "__color__ sky\n");

        let mut session = RenameSession::new(&mut store, 3).unwrap();
        session.propose("color").unwrap();
        session.preview("hue").unwrap();
        let report = session.apply().unwrap();

        let text = render_apply(&report);
        assert!(text.contains("Updated 1 document(s), 1 replacement(s)"));
        assert!(text.contains("Renamed color.txt -> hue.txt"));
    }
}
