//! Document storage for a wildcard corpus.
//!
//! Every transform reads and writes documents through `DocumentStore`, so the
//! same passes run against a directory tree (`FsCorpus`) or an in-memory map
//! (`MemoryCorpus`). Paths are root-relative and `/`-separated.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::defaults::ExclusionConfig;
use crate::error::{Error, Result};
use crate::utils::io;

/// A document snapshot: path plus full text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: String,
    pub content: String,
}

impl Document {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// File name without directory or extension.
    pub fn stem(&self) -> &str {
        document_stem(&self.path)
    }
}

pub fn document_stem(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(dot) => &name[..dot],
    }
}

/// Path of a sibling document named `stem`, keeping the extension of `path`.
pub fn sibling_path(path: &str, stem: &str) -> String {
    let (dir, name) = match path.rfind('/') {
        Some(slash) => (&path[..=slash], &path[slash + 1..]),
        None => ("", path),
    };
    let ext = match name.rfind('.') {
        Some(dot) if dot > 0 => &name[dot..],
        _ => "",
    };
    format!("{}{}{}", dir, stem, ext)
}

pub trait DocumentStore {
    /// Every document path, in a stable lexicographic order.
    fn list(&self) -> Result<Vec<String>>;
    fn read(&self, path: &str) -> Result<String>;
    /// Replace the whole content of a document.
    fn write(&mut self, path: &str, content: &str) -> Result<()>;
    /// Move a document. Never overwrites an existing target.
    fn rename(&mut self, from: &str, to: &str) -> Result<()>;
    fn exists(&self, path: &str) -> bool;
    /// Whether both paths name the same stored document.
    fn same_document(&self, a: &str, b: &str) -> bool {
        a == b
    }
}

/// Predicate deciding whether a root-relative path is left out of the corpus.
pub type Exclusion = Box<dyn Fn(&Path) -> bool>;

/// Directory-backed corpus: every file with the configured extension found by
/// recursive traversal under `root`.
pub struct FsCorpus {
    root: PathBuf,
    extension: String,
    exclude: Exclusion,
}

impl FsCorpus {
    pub fn open(root: impl Into<PathBuf>, extension: &str) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::corpus_not_found(root.display().to_string()));
        }
        Ok(Self {
            root,
            extension: extension.trim_start_matches('.').to_string(),
            exclude: Box::new(|_| false),
        })
    }

    pub fn with_exclusion(mut self, exclude: impl Fn(&Path) -> bool + 'static) -> Self {
        self.exclude = Box::new(exclude);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn absolute(&self, path: &str) -> PathBuf {
        path.split('/').fold(self.root.clone(), |acc, part| acc.join(part))
    }

    fn walk(&self, dir: &Path, files: &mut Vec<String>) -> Result<()> {
        let entries = fs::read_dir(dir).map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("read dir {}", dir.display())))
        })?;

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                self.walk(&path, files)?;
                continue;
            }
            let Ok(relative) = path.strip_prefix(&self.root) else {
                continue;
            };
            if path.extension().and_then(|e| e.to_str()) == Some(self.extension.as_str())
                && !(self.exclude)(relative)
            {
                let parts: Vec<String> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().to_string())
                    .collect();
                files.push(parts.join("/"));
            }
        }

        Ok(())
    }
}

impl DocumentStore for FsCorpus {
    fn list(&self) -> Result<Vec<String>> {
        let mut files = Vec::new();
        self.walk(&self.root, &mut files)?;
        files.sort();
        Ok(files)
    }

    fn read(&self, path: &str) -> Result<String> {
        io::read_file(&self.absolute(path), &format!("read {}", path))
            .map_err(|e| Error::document_read(path, e.summary()))
    }

    fn write(&mut self, path: &str, content: &str) -> Result<()> {
        io::write_file_atomic(&self.absolute(path), content, &format!("write {}", path))
            .map_err(|e| Error::document_write(path, e.summary()))
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        let source = self.absolute(from);
        let target = self.absolute(to);

        if !source.exists() {
            return Err(Error::document_not_found(from));
        }
        if target.exists() && !self.same_document(from, to) {
            return Err(Error::rename_conflict(from, to));
        }

        fs::rename(&source, &target).map_err(|e| {
            Error::document_write(from, format!("rename to {}: {}", to, e))
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.absolute(path).is_file()
    }

    fn same_document(&self, a: &str, b: &str) -> bool {
        a == b || same_file(&self.absolute(a), &self.absolute(b))
    }
}

/// Case-only renames on case-insensitive filesystems resolve to the same file.
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Exclusion predicate built from a tool's `ExclusionConfig`.
pub fn exclusion_from_config(config: &ExclusionConfig) -> impl Fn(&Path) -> bool + 'static {
    let config = config.clone();
    move |relative: &Path| config.excludes(relative)
}

/// In-memory corpus keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemoryCorpus {
    documents: BTreeMap<String, String>,
}

impl MemoryCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, content: &str) -> Self {
        self.documents.insert(path.to_string(), content.to_string());
        self
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.documents.get(path).map(String::as_str)
    }
}

impl DocumentStore for MemoryCorpus {
    fn list(&self) -> Result<Vec<String>> {
        Ok(self.documents.keys().cloned().collect())
    }

    fn read(&self, path: &str) -> Result<String> {
        self.documents
            .get(path)
            .cloned()
            .ok_or_else(|| Error::document_read(path, "no such document"))
    }

    fn write(&mut self, path: &str, content: &str) -> Result<()> {
        self.documents.insert(path.to_string(), content.to_string());
        Ok(())
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        if from != to && self.documents.contains_key(to) {
            return Err(Error::rename_conflict(from, to));
        }
        let content = self
            .documents
            .remove(from)
            .ok_or_else(|| Error::document_not_found(from))?;
        self.documents.insert(to.to_string(), content);
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        self.documents.contains_key(path)
    }
}

/// Read every document in traversal order. Unreadable documents are returned
/// separately so callers can report them and carry on.
pub fn snapshot(store: &dyn DocumentStore) -> Result<(Vec<Document>, Vec<Error>)> {
    let mut documents = Vec::new();
    let mut failures = Vec::new();

    for path in store.list()? {
        match store.read(&path) {
            Ok(content) => documents.push(Document::new(path, content)),
            Err(err) => failures.push(err),
        }
    }

    Ok((documents, failures))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn corpus_dir(files: &[(&str, &str)]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (path, content) in files {
            let full = dir.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, content).unwrap();
        }
        dir
    }

    #[test]
    fn stem_and_sibling_paths() {
        assert_eq!(document_stem("colors/warm.txt"), "warm");
        assert_eq!(document_stem("plain"), "plain");
        assert_eq!(sibling_path("colors/warm.txt", "hot"), "colors/hot.txt");
        assert_eq!(sibling_path("warm.txt", "Hot"), "Hot.txt");
    }

    #[test]
    fn fs_corpus_lists_matching_extension_sorted() {
        let dir = corpus_dir(&[
            ("b.txt", ""),
            ("a/c.txt", ""),
            ("a/notes.md", ""),
            ("z.txt", ""),
        ]);

        let corpus = FsCorpus::open(dir.path(), "txt").unwrap();
        assert_eq!(corpus.list().unwrap(), vec!["a/c.txt", "b.txt", "z.txt"]);
    }

    #[test]
    fn fs_corpus_applies_exclusion_predicate() {
        let dir = corpus_dir(&[("logic/or.txt", ""), ("!skip.txt", ""), ("keep.txt", "")]);

        let config = ExclusionConfig {
            dirs: vec!["logic".to_string()],
            name_prefixes: vec!["!".to_string()],
            globs: Vec::new(),
        };
        let corpus = FsCorpus::open(dir.path(), "txt")
            .unwrap()
            .with_exclusion(exclusion_from_config(&config));

        assert_eq!(corpus.list().unwrap(), vec!["keep.txt"]);
    }

    #[test]
    fn fs_corpus_rename_refuses_to_overwrite() {
        let dir = corpus_dir(&[("old.txt", "a"), ("new.txt", "b")]);
        let mut corpus = FsCorpus::open(dir.path(), "txt").unwrap();

        let err = corpus.rename("old.txt", "new.txt").unwrap_err();
        assert_eq!(err.code.as_str(), "rename.conflict");
        assert_eq!(fs::read_to_string(dir.path().join("new.txt")).unwrap(), "b");
    }

    #[test]
    fn fs_corpus_write_and_rename_roundtrip() {
        let dir = corpus_dir(&[("sub/old.txt", "a")]);
        let mut corpus = FsCorpus::open(dir.path(), "txt").unwrap();

        corpus.write("sub/old.txt", "changed").unwrap();
        corpus.rename("sub/old.txt", "sub/fresh.txt").unwrap();

        assert!(!corpus.exists("sub/old.txt"));
        assert_eq!(corpus.read("sub/fresh.txt").unwrap(), "changed");
    }

    #[test]
    fn fs_corpus_same_document_compares_files() {
        let dir = corpus_dir(&[("a.txt", "1"), ("b.txt", "2")]);
        let corpus = FsCorpus::open(dir.path(), "txt").unwrap();

        assert!(corpus.same_document("a.txt", "a.txt"));
        assert!(!corpus.same_document("a.txt", "b.txt"));
        assert!(!corpus.same_document("a.txt", "missing.txt"));
    }

    #[test]
    fn memory_corpus_case_variants_are_distinct_documents() {
        let corpus = MemoryCorpus::new().with("Color.txt", "").with("color.txt", "");
        assert!(!corpus.same_document("Color.txt", "color.txt"));
    }

    #[test]
    fn open_rejects_missing_root() {
        let err = FsCorpus::open("/nonexistent/corpus", "txt").err().unwrap();
        assert_eq!(err.code.as_str(), "corpus.not_found");
    }

    #[test]
    fn memory_corpus_rename_conflict() {
        let mut corpus = MemoryCorpus::new().with("a.txt", "1").with("b.txt", "2");
        assert!(corpus.rename("a.txt", "b.txt").is_err());
        corpus.rename("a.txt", "c.txt").unwrap();
        assert_eq!(corpus.get("c.txt"), Some("1"));
    }
}
