//! Per-line punctuation linter.
//!
//! Every non-empty line of a wildcard document is one entry. Entries end with
//! a comma unless they end with a wildcard token, in which case the comma is
//! dropped. Trailing whitespace, blank lines and repeated spaces are cleaned up
//! on the way.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

use crate::corpus::DocumentStore;
use crate::output::PassReport;

static ENDS_WITH_WILDCARD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__.*?__$").expect("valid wildcard-suffix regex"));

static SPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" {2,}").expect("valid space-run regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionKind {
    TrailingWhitespace,
    CollapsedSpaces,
    RemovedComma,
    AddedComma,
}

/// One fix applied to one line (1-based).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Correction {
    pub line: usize,
    pub kind: CorrectionKind,
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            CorrectionKind::TrailingWhitespace => "Removed trailing spaces",
            CorrectionKind::CollapsedSpaces => "Collapsed multiple spaces",
            CorrectionKind::RemovedComma => "Removed comma after wildcard",
            CorrectionKind::AddedComma => "Added missing comma",
        };
        write!(f, "Line {}: {}", self.line, what)
    }
}

/// Whether the line ends with a complete `__...__` token.
pub fn ends_with_wildcard(line: &str) -> bool {
    ENDS_WITH_WILDCARD.is_match(line)
}

/// Normalize a single line. Returns `None` when the line is dropped.
pub fn normalize_line(line: &str, line_num: usize) -> (Option<String>, Vec<Correction>) {
    let mut corrections = Vec::new();
    let mut note = |kind| corrections.push(Correction { line: line_num, kind });

    let trimmed = line.trim_end();
    if trimmed.len() != line.len() {
        note(CorrectionKind::TrailingWhitespace);
    }

    if trimmed.is_empty() {
        return (None, corrections);
    }

    let mut line = trimmed.to_string();
    if SPACE_RUN.is_match(&line) {
        note(CorrectionKind::CollapsedSpaces);
        line = SPACE_RUN.replace_all(&line, " ").into_owned();
    }

    let without_comma = line.strip_suffix(',');
    let body = without_comma.unwrap_or(&line);

    if ends_with_wildcard(body) {
        if without_comma.is_some() {
            note(CorrectionKind::RemovedComma);
            line.pop();
        }
    } else if without_comma.is_none() {
        note(CorrectionKind::AddedComma);
        line.push(',');
    }

    (Some(line), corrections)
}

/// A normalized document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub text: String,
    pub corrections: Vec<Correction>,
    pub lines_dropped: usize,
}

/// Normalize every line of a document, in order.
///
/// Output lines are joined by `\n` with a trailing newline, unless every line
/// was dropped, in which case the text is empty.
pub fn normalize_document(content: &str) -> Normalized {
    let mut kept = Vec::new();
    let mut corrections = Vec::new();
    let mut lines_dropped = 0;

    for (idx, raw) in content.lines().enumerate() {
        let (line, mut fixes) = normalize_line(raw, idx + 1);
        corrections.append(&mut fixes);
        match line {
            Some(line) => kept.push(line),
            None => lines_dropped += 1,
        }
    }

    let mut text = kept.join("\n");
    if !kept.is_empty() {
        text.push('\n');
    }

    Normalized {
        text,
        corrections,
        lines_dropped,
    }
}

/// Lint every document in the store. A document is rewritten only when
/// `write` is set and its normalized text differs from what is stored.
pub fn lint_corpus(store: &mut dyn DocumentStore, write: bool) -> crate::Result<PassReport> {
    let mut report = PassReport::new(write);

    for path in store.list()? {
        let content = match store.read(&path) {
            Ok(content) => content,
            Err(err) => {
                crate::log_status!("lint", "ERROR: Could not process {}: {}", path, err.summary());
                report.record_error(path, err.summary());
                continue;
            }
        };

        let normalized = normalize_document(&content);
        if normalized.text == content {
            crate::log_status!("lint", "{}: no errors found", path);
            report.record_unchanged(path);
            continue;
        }

        if write {
            if let Err(err) = store.write(&path, &normalized.text) {
                crate::log_status!("lint", "ERROR: Could not process {}: {}", path, err.summary());
                report.record_error(path, err.summary());
                continue;
            }
        }

        let messages: Vec<String> = normalized.corrections.iter().map(|c| c.to_string()).collect();
        crate::log_status!("lint", "{}: {} corrections", path, messages.len());
        report.record_updated(path, normalized.corrections.len() as u32, messages);
    }

    Ok(report)
}
