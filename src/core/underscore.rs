//! Underscore cleanup: turn stray `_` into spaces without touching
//! wildcard tokens or parenthesized spans.

use crate::corpus::DocumentStore;
use crate::output::PassReport;
use crate::scanner::{CharKind, ScanFault, TokenScanner};

/// Result of rewriting one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub text: String,
    pub replacements: usize,
}

/// Replace every unprotected underscore with a space.
///
/// Delimiter pairs and parenthesis characters pass through unchanged. On a
/// scanner fault nothing is produced, so the caller leaves the document alone.
pub fn rewrite(text: &str) -> Result<Rewrite, ScanFault> {
    let mut out = String::with_capacity(text.len());
    let mut replacements = 0;

    for scanned in TokenScanner::new(text) {
        let scanned = scanned?;
        if scanned.kind == CharKind::Text && scanned.ch == '_' && !scanned.protected {
            out.push(' ');
            replacements += 1;
        } else {
            out.push(scanned.ch);
        }
    }

    Ok(Rewrite {
        text: out,
        replacements,
    })
}

/// Run the rewrite over every document in the store.
///
/// Each document is independent: a fault or I/O failure is recorded and the
/// pass moves on. Documents are written only when `write` is set and at least
/// one replacement was made.
pub fn replace_corpus(store: &mut dyn DocumentStore, write: bool) -> crate::Result<PassReport> {
    let mut report = PassReport::new(write);

    for path in store.list()? {
        let content = match store.read(&path) {
            Ok(content) => content,
            Err(err) => {
                crate::log_status!("replace", "ERROR processing {}: {}", path, err.summary());
                report.record_error(path, err.summary());
                continue;
            }
        };

        let rewritten = match rewrite(&content) {
            Ok(rewritten) => rewritten,
            Err(fault) => {
                let err = fault.into_error(&path);
                crate::log_status!("replace", "ERROR in {}: {}", path, err.summary());
                report.record_error(path, err.summary());
                continue;
            }
        };

        if rewritten.replacements == 0 {
            crate::log_status!("replace", "Processed: {} - no changes needed", path);
            report.record_unchanged(path);
            continue;
        }

        if write {
            if let Err(err) = store.write(&path, &rewritten.text) {
                crate::log_status!("replace", "ERROR processing {}: {}", path, err.summary());
                report.record_error(path, err.summary());
                continue;
            }
        }

        crate::log_status!(
            "replace",
            "Processed: {} - {} replacements",
            path,
            rewritten.replacements
        );
        report.record_updated(
            path,
            rewritten.replacements as u32,
            vec![format!("{} replacements", rewritten.replacements)],
        );
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::MemoryCorpus;
    use crate::output::ItemStatus;
    use crate::scanner::FaultKind;

    #[test]
    fn replaces_plain_underscores() {
        let result = rewrite("red_silk_dress,").unwrap();
        assert_eq!(result.text, "red silk dress,");
        assert_eq!(result.replacements, 2);
    }

    #[test]
    fn leaves_wildcards_and_parens_alone() {
        let result = rewrite("a_b __hair_color__ (soft_light) c_d").unwrap();
        assert_eq!(result.text, "a b __hair_color__ (soft_light) c d");
        assert_eq!(result.replacements, 2);
    }

    #[test]
    fn nested_wildcard_in_parens_untouched() {
        let input = "(__x_y__:1.2)_tail";
        let result = rewrite(input).unwrap();
        assert_eq!(result.text, "(__x_y__:1.2) tail");
    }

    #[test]
    fn residual_underscore_of_odd_run_is_text() {
        // `___` pairs the first two, the third is ordinary text outside a token.
        let result = rewrite("a___b__").unwrap();
        assert_eq!(result.text, "a___b__");
        let result = rewrite("__a__ _").unwrap();
        assert_eq!(result.text, "__a__  ");
    }

    #[test]
    fn rewrite_is_idempotent() {
        let once = rewrite("one_two __three_four__ (five_six) seven_").unwrap();
        let twice = rewrite(&once.text).unwrap();
        assert_eq!(twice.replacements, 0);
        assert_eq!(twice.text, once.text);
    }

    #[test]
    fn malformed_wildcard_produces_no_output() {
        let fault = rewrite("a_b __open_end").unwrap_err();
        assert_eq!(fault.kind, FaultKind::MalformedWildcard);
    }

    #[test]
    fn paren_underflow_aborts() {
        let fault = rewrite("a_b) c_d").unwrap_err();
        assert_eq!(fault.kind, FaultKind::ParenUnderflow);
    }

    #[test]
    fn corpus_pass_isolates_faulty_documents() {
        let mut store = MemoryCorpus::new()
            .with("bad.txt", "x_y __broken")
            .with("clean.txt", "nothing here")
            .with("good.txt", "x_y __z__");

        let report = replace_corpus(&mut store, true).unwrap();

        assert_eq!(report.errors, 1);
        assert_eq!(report.documents_processed, 2);
        assert_eq!(report.total_changes, 1);
        assert_eq!(report.items[0].status, ItemStatus::Failed);
        assert_eq!(store.get("bad.txt"), Some("x_y __broken"));
        assert_eq!(store.get("good.txt"), Some("x y __z__"));
        assert_eq!(store.get("clean.txt"), Some("nothing here"));
    }

    #[test]
    fn dry_run_does_not_write() {
        let mut store = MemoryCorpus::new().with("a.txt", "x_y");
        let report = replace_corpus(&mut store, false).unwrap();

        assert_eq!(report.updated, 1);
        assert!(!report.written);
        assert_eq!(store.get("a.txt"), Some("x_y"));
    }
}
