use std::fs;
use std::path::Path;

use tempfile::TempDir;
use wildkit::corpus::{exclusion_from_config, DocumentStore, FsCorpus};
use wildkit::defaults::WildkitConfig;
use wildkit::refactor::{Proposal, RenameSession};
use wildkit::{lint, underscore};

fn corpus_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (path, content) in files {
        let full = dir.path().join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }
    dir
}

fn read(dir: &Path, path: &str) -> String {
    fs::read_to_string(dir.join(path)).unwrap()
}

#[test]
fn rename_updates_references_and_owner_file() {
    let dir = corpus_dir(&[
        ("color.txt", "red,\nblue,\n"),
        ("scene.txt", "__Color__ sky, __COLOR__ grass\n"),
        ("other.txt", "__colors__ stay\n"),
    ]);
    let mut corpus = FsCorpus::open(dir.path(), "txt").unwrap();

    let mut session = RenameSession::new(&mut corpus, 3).unwrap();
    let proposal = session.propose("color").unwrap();
    assert!(matches!(
        proposal,
        Proposal::Proposed {
            total_references: 2,
            documents: 1,
            ..
        }
    ));

    let preview = session.preview("hue").unwrap();
    assert!(preview.conflict.is_none());

    let report = session.apply().unwrap();
    assert!(!report.has_failures());
    assert_eq!(report.total_replacements, 2);

    assert_eq!(read(dir.path(), "scene.txt"), "__hue__ sky, __hue__ grass\n");
    assert_eq!(read(dir.path(), "hue.txt"), "red,\nblue,\n");
    assert_eq!(read(dir.path(), "other.txt"), "__colors__ stay\n");
    assert!(!dir.path().join("color.txt").exists());
}

#[test]
fn rename_refuses_to_overwrite_existing_document() {
    let dir = corpus_dir(&[
        ("color.txt", "red,\n"),
        ("hue.txt", "teal,\n"),
        ("scene.txt", "__color__\n"),
    ]);
    let mut corpus = FsCorpus::open(dir.path(), "txt").unwrap();

    let mut session = RenameSession::new(&mut corpus, 3).unwrap();
    session.propose("color").unwrap();
    let preview = session.preview("hue").unwrap();
    assert_eq!(preview.conflict.as_deref(), Some("hue.txt"));

    let err = session.apply().unwrap_err();
    assert_eq!(err.code.as_str(), "rename.conflict");
    assert_eq!(read(dir.path(), "scene.txt"), "__color__\n");
    assert_eq!(read(dir.path(), "hue.txt"), "teal,\n");
}

#[test]
fn replace_pass_leaves_malformed_documents_untouched() {
    let dir = corpus_dir(&[
        ("broken.txt", "soft_light __unclosed\n"),
        ("good.txt", "soft_light, __hair_style__ (a_b)\n"),
    ]);
    let mut corpus = FsCorpus::open(dir.path(), "txt").unwrap();

    let report = underscore::replace_corpus(&mut corpus, true).unwrap();

    assert_eq!(report.errors, 1);
    assert_eq!(report.updated, 1);
    assert_eq!(read(dir.path(), "broken.txt"), "soft_light __unclosed\n");
    assert_eq!(
        read(dir.path(), "good.txt"),
        "soft light, __hair_style__ (a_b)\n"
    );
}

#[test]
fn lint_pass_skips_excluded_documents() {
    let dir = corpus_dir(&[
        ("logic/rules.txt", "keep  as is"),
        ("!draft.txt", "also untouched"),
        ("outfit.txt", "red  dress  \n\n__style__,\n"),
    ]);
    let config = WildkitConfig::default();
    let mut corpus = FsCorpus::open(dir.path(), &config.extension)
        .unwrap()
        .with_exclusion(exclusion_from_config(&config.tools.lint));

    assert_eq!(corpus.list().unwrap(), vec!["outfit.txt"]);

    let report = lint::lint_corpus(&mut corpus, true).unwrap();
    assert_eq!(report.updated, 1);

    assert_eq!(read(dir.path(), "outfit.txt"), "red dress,\n__style__\n");
    assert_eq!(read(dir.path(), "logic/rules.txt"), "keep  as is");
    assert_eq!(read(dir.path(), "!draft.txt"), "also untouched");
}

#[test]
fn dry_runs_leave_the_corpus_alone() {
    let dir = corpus_dir(&[("a.txt", "x_y  ")]);
    let mut corpus = FsCorpus::open(dir.path(), "txt").unwrap();

    let replaced = underscore::replace_corpus(&mut corpus, false).unwrap();
    let linted = lint::lint_corpus(&mut corpus, false).unwrap();

    assert_eq!(replaced.updated, 1);
    assert_eq!(linted.updated, 1);
    assert_eq!(read(dir.path(), "a.txt"), "x_y  ");
}
