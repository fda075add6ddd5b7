//! Reference index: where each wildcard is used and which document owns it.
//!
//! Built from a snapshot of the corpus. Later edits to the store are not seen
//! until the index is rebuilt.

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::corpus::{self, Document, DocumentStore};
use crate::error::{Error, Result};
use crate::scanner::line_at;

/// Any `__name__` token. Names start with something other than an
/// underscore or space and end at the first closing delimiter.
static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__([^\s_]\S*?)__").expect("valid token regex"));

/// Lookup key for a wildcard name. Names are case-insensitive.
pub fn wildcard_key(name: &str) -> String {
    name.to_lowercase()
}

/// Canonical textual form of a wildcard.
pub fn token(name: &str) -> String {
    format!("__{}__", name)
}

/// Case-insensitive matcher for the literal `__name__`.
pub fn token_pattern(name: &str) -> Result<Regex> {
    RegexBuilder::new(&regex::escape(&token(name)))
        .case_insensitive(true)
        .build()
        .map_err(|e| Error::internal_unexpected(format!("build pattern for '{}': {}", name, e)))
}

/// A single reference site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    /// Line number (1-indexed).
    pub line: usize,
    /// The containing line, trimmed.
    pub text: String,
    /// The matched token as written in the document.
    pub matched: String,
}

/// Every occurrence of one wildcard within one document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReferences {
    pub document: String,
    pub occurrences: Vec<Occurrence>,
}

/// Something the index noticed but could not resolve.
#[derive(Debug, Clone, Serialize)]
pub struct IndexWarning {
    /// Warning category.
    pub kind: String,
    pub document: String,
    /// Human-readable description.
    pub message: String,
}

/// The document whose file name matches a wildcard. `duplicates` lists any
/// further matches, which the corpus is not supposed to have.
#[derive(Debug, Clone, Serialize)]
pub struct OwningDocument {
    pub document: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub duplicates: Vec<String>,
}

impl OwningDocument {
    pub fn warnings(&self) -> Vec<IndexWarning> {
        self.duplicates
            .iter()
            .map(|dup| IndexWarning {
                kind: "duplicate_owner".to_string(),
                document: dup.clone(),
                message: format!(
                    "'{}' also matches the wildcard name; using '{}'",
                    dup, self.document
                ),
            })
            .collect()
    }
}

/// One token site, as collected by `ReferenceIndex::tokens`.
#[derive(Debug, Clone, Serialize)]
pub struct TokenSite {
    pub document: String,
    #[serde(flatten)]
    pub occurrence: Occurrence,
}

/// Inventory line for one wildcard key.
#[derive(Debug, Clone, Serialize)]
pub struct WildcardEntry {
    pub key: String,
    /// Distinct spellings seen, e.g. `Color` and `COLOR`.
    pub spellings: Vec<String>,
    pub occurrences: usize,
    pub documents: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Referenced, but no document carries the name.
    pub dangling: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    documents: Vec<Document>,
    warnings: Vec<IndexWarning>,
}

impl ReferenceIndex {
    /// Snapshot the store. Unreadable documents become warnings.
    pub fn build(store: &dyn DocumentStore) -> Result<Self> {
        let (documents, failures) = corpus::snapshot(store)?;
        let warnings = failures
            .into_iter()
            .map(|err| IndexWarning {
                kind: "read_failed".to_string(),
                document: err
                    .details
                    .get("document")
                    .and_then(|d| d.as_str())
                    .unwrap_or_default()
                    .to_string(),
                message: err.summary(),
            })
            .collect();

        Ok(Self::with_warnings(documents, warnings))
    }

    pub fn from_documents(documents: Vec<Document>) -> Self {
        Self::with_warnings(documents, Vec::new())
    }

    fn with_warnings(mut documents: Vec<Document>, warnings: Vec<IndexWarning>) -> Self {
        documents.sort_by(|a, b| a.path.cmp(&b.path));
        Self {
            documents,
            warnings,
        }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn warnings(&self) -> &[IndexWarning] {
        &self.warnings
    }

    /// Every occurrence of `__name__`, case-insensitively, grouped by document
    /// in traversal order. Documents without a match are left out.
    pub fn find_references(&self, name: &str) -> Result<Vec<DocumentReferences>> {
        let pattern = token_pattern(name)?;

        Ok(self
            .documents
            .iter()
            .filter_map(|doc| {
                let occurrences: Vec<Occurrence> = pattern
                    .find_iter(&doc.content)
                    .map(|m| occurrence_at(&doc.content, m.start(), m.end()))
                    .collect();
                (!occurrences.is_empty()).then(|| DocumentReferences {
                    document: doc.path.clone(),
                    occurrences,
                })
            })
            .collect())
    }

    /// The document whose base name equals `name`, case-insensitively. The
    /// first match in traversal order wins; others are listed as duplicates.
    pub fn owning_document(&self, name: &str) -> Option<OwningDocument> {
        let key = wildcard_key(name);
        let mut matches = self
            .documents
            .iter()
            .filter(|doc| wildcard_key(doc.stem()) == key)
            .map(|doc| doc.path.clone());

        let document = matches.next()?;
        Some(OwningDocument {
            document,
            duplicates: matches.collect(),
        })
    }

    /// Every wildcard token in the corpus, keyed by lowercase name.
    pub fn tokens(&self) -> BTreeMap<String, Vec<TokenSite>> {
        let mut map: BTreeMap<String, Vec<TokenSite>> = BTreeMap::new();

        for doc in &self.documents {
            for caps in TOKEN.captures_iter(&doc.content) {
                let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };
                map.entry(wildcard_key(name.as_str()))
                    .or_default()
                    .push(TokenSite {
                        document: doc.path.clone(),
                        occurrence: occurrence_at(&doc.content, whole.start(), whole.end()),
                    });
            }
        }

        map
    }

    /// Summary of every wildcard used, with its owner if one exists.
    pub fn inventory(&self) -> Vec<WildcardEntry> {
        self.tokens()
            .into_iter()
            .map(|(key, sites)| {
                let mut spellings: Vec<String> = sites
                    .iter()
                    .map(|s| {
                        let m = &s.occurrence.matched;
                        m[2..m.len() - 2].to_string()
                    })
                    .collect();
                spellings.sort();
                spellings.dedup();

                let mut documents: Vec<&str> = sites.iter().map(|s| s.document.as_str()).collect();
                documents.dedup();

                let owner = self.owning_document(&key).map(|o| o.document);
                WildcardEntry {
                    dangling: owner.is_none(),
                    owner,
                    spellings,
                    occurrences: sites.len(),
                    documents: documents.len(),
                    key,
                }
            })
            .collect()
    }
}

fn occurrence_at(content: &str, start: usize, end: usize) -> Occurrence {
    let line_start = content[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line_end = content[end..]
        .find('\n')
        .map(|i| end + i)
        .unwrap_or(content.len());

    Occurrence {
        line: line_at(content, start),
        text: content[line_start..line_end].trim().to_string(),
        matched: content[start..end].to_string(),
    }
}
