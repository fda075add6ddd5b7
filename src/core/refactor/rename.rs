//! Rename engine: rename a wildcard across the corpus.
//!
//! A `RenameSession` walks one rename through its lifecycle:
//! 1. `propose(old)` looks up the owning document and every reference
//! 2. `preview(new)` summarizes the plan without touching anything
//! 3. `apply()` rewrites referencing documents and renames the owner
//!    (or `cancel()` drops the plan)
//!
//! The index computed at `propose` time is reused through `apply`. After an
//! apply the corpus is re-scanned so the next session starts fresh.

use regex::NoExpand;
use serde::Serialize;

use super::index::{
    token, token_pattern, wildcard_key, DocumentReferences, IndexWarning, Occurrence,
    ReferenceIndex,
};
use crate::corpus::{sibling_path, DocumentStore};
use crate::error::{Error, Result};
use crate::output::ItemStatus;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Proposed,
    Previewed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Proposed => "proposed",
            SessionState::Previewed => "previewed",
        }
    }
}

/// A pending rename.
#[derive(Debug, Clone, Serialize)]
pub struct RenamePlan {
    pub old_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
    /// Document named after the wildcard, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub references: Vec<DocumentReferences>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<IndexWarning>,
}

impl RenamePlan {
    pub fn total_references(&self) -> usize {
        self.references.iter().map(|r| r.occurrences.len()).sum()
    }
}

/// What `propose` found.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Proposal {
    /// No owning document and no references.
    NothingToDo { old_name: String },
    Proposed {
        old_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        target: Option<String>,
        total_references: usize,
        documents: usize,
    },
}

/// A file or directory rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRename {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewDocument {
    pub document: String,
    pub count: usize,
    /// First occurrences, up to the preview limit.
    pub shown: Vec<Occurrence>,
    /// Occurrences not shown. They are still applied.
    pub remaining: usize,
}

/// Read-only summary of a plan.
#[derive(Debug, Clone, Serialize)]
pub struct Preview {
    pub old_name: String,
    pub new_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_rename: Option<FileRename>,
    pub total_references: usize,
    pub documents: Vec<PreviewDocument>,
    /// Existing document the owner rename would collide with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<IndexWarning>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentOutcome {
    pub document: String,
    pub status: ItemStatus,
    pub replacements: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileRenameOutcome {
    pub from: String,
    pub to: String,
    pub renamed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of applying a plan. Every document and the owner rename succeed or
/// fail on their own.
#[derive(Debug, Clone, Serialize)]
pub struct ApplyReport {
    pub old_name: String,
    pub new_name: String,
    pub documents: Vec<DocumentOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_rename: Option<FileRenameOutcome>,
    pub updated: usize,
    pub failed: usize,
    pub total_replacements: usize,
}

impl ApplyReport {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
            || self
                .file_rename
                .as_ref()
                .is_some_and(|r| !r.renamed)
    }
}

// ============================================================================
// Planning
// ============================================================================

/// Build the plan for renaming `old_name` against an index snapshot.
/// Returns `None` when there is nothing to rename.
pub fn plan_rename(index: &ReferenceIndex, old_name: &str) -> Result<Option<RenamePlan>> {
    let references = index.find_references(old_name)?;
    let owner = index.owning_document(old_name);

    if owner.is_none() && references.is_empty() {
        return Ok(None);
    }

    let mut warnings: Vec<IndexWarning> = index.warnings().to_vec();
    if let Some(owner) = &owner {
        warnings.extend(owner.warnings());
    }

    Ok(Some(RenamePlan {
        old_name: old_name.to_string(),
        new_name: None,
        target: owner.map(|o| o.document),
        references,
        warnings,
    }))
}

fn validate_new_name(new_name: &str) -> Result<()> {
    if new_name.trim().is_empty() {
        return Err(Error::validation_invalid_argument(
            "new_name",
            "New wildcard name cannot be empty",
            None,
            None,
        ));
    }
    if new_name.contains('/') || new_name.contains('\\') {
        return Err(Error::validation_invalid_argument(
            "new_name",
            "Wildcard names cannot contain path separators",
            Some(new_name.to_string()),
            None,
        ));
    }
    Ok(())
}

/// Summarize a plan for `new_name`, showing at most `limit` occurrences per
/// document.
pub fn preview_plan(
    store: &dyn DocumentStore,
    plan: &RenamePlan,
    new_name: &str,
    limit: usize,
) -> Preview {
    let file_rename = plan.target.as_ref().map(|target| FileRename {
        from: target.clone(),
        to: sibling_path(target, new_name),
    });

    let conflict = file_rename
        .as_ref()
        .filter(|r| is_conflict(store, &r.from, &r.to))
        .map(|r| r.to.clone());

    let mut warnings = plan.warnings.clone();
    if plan.target.is_none() && wildcard_key(&plan.old_name) != wildcard_key(new_name) {
        if let Some(existing) = store
            .list()
            .unwrap_or_default()
            .into_iter()
            .find(|p| wildcard_key(crate::corpus::document_stem(p)) == wildcard_key(new_name))
        {
            warnings.push(IndexWarning {
                kind: "target_exists".to_string(),
                document: existing.clone(),
                message: format!(
                    "References will point at the existing document '{}'",
                    existing
                ),
            });
        }
    }

    let documents = plan
        .references
        .iter()
        .map(|r| PreviewDocument {
            document: r.document.clone(),
            count: r.occurrences.len(),
            shown: r.occurrences.iter().take(limit).cloned().collect(),
            remaining: r.occurrences.len().saturating_sub(limit),
        })
        .collect();

    Preview {
        old_name: plan.old_name.clone(),
        new_name: new_name.to_string(),
        file_rename,
        total_references: plan.total_references(),
        documents,
        conflict,
        warnings,
    }
}

/// A rename collides when the target exists and the store holds it as a
/// different document. A case-only rename that resolves to the same file does
/// not collide.
fn is_conflict(store: &dyn DocumentStore, from: &str, to: &str) -> bool {
    from != to && store.exists(to) && !store.same_document(from, to)
}

// ============================================================================
// Apply
// ============================================================================

/// Apply a plan: substitute `__new_name__` for every case-insensitive
/// `__old_name__` in the referencing documents, then rename the owner.
///
/// Each document is read, rewritten in memory and written back as a whole.
/// Failures are recorded per document and never stop the others.
pub fn apply_plan(
    store: &mut dyn DocumentStore,
    plan: &RenamePlan,
    new_name: &str,
) -> Result<ApplyReport> {
    let pattern = token_pattern(&plan.old_name)?;
    let replacement = token(new_name);

    let mut documents = Vec::new();
    for refs in &plan.references {
        let outcome = match rewrite_document(store, &refs.document, &pattern, &replacement) {
            Ok(0) => DocumentOutcome {
                document: refs.document.clone(),
                status: ItemStatus::Unchanged,
                replacements: 0,
                error: None,
            },
            Ok(count) => DocumentOutcome {
                document: refs.document.clone(),
                status: ItemStatus::Updated,
                replacements: count,
                error: None,
            },
            Err(err) => {
                crate::log_status!("refactor", "Error updating {}: {}", refs.document, err.summary());
                DocumentOutcome {
                    document: refs.document.clone(),
                    status: ItemStatus::Failed,
                    replacements: 0,
                    error: Some(err.summary()),
                }
            }
        };
        documents.push(outcome);
    }

    let file_rename = plan.target.as_ref().map(|target| {
        let to = sibling_path(target, new_name);
        match store.rename(target, &to) {
            Ok(()) => {
                crate::log_status!("refactor", "Renamed file: {} -> {}", target, to);
                FileRenameOutcome {
                    from: target.clone(),
                    to,
                    renamed: true,
                    error: None,
                }
            }
            Err(err) => {
                crate::log_status!("refactor", "Error renaming file: {}", err.message);
                FileRenameOutcome {
                    from: target.clone(),
                    to,
                    renamed: false,
                    error: Some(err.message),
                }
            }
        }
    });

    let updated = documents
        .iter()
        .filter(|d| d.status == ItemStatus::Updated)
        .count();
    let failed = documents
        .iter()
        .filter(|d| d.status == ItemStatus::Failed)
        .count();
    let total_replacements = documents.iter().map(|d| d.replacements).sum();

    crate::log_status!("refactor", "Updated {} file(s) with references", updated);

    Ok(ApplyReport {
        old_name: plan.old_name.clone(),
        new_name: new_name.to_string(),
        documents,
        file_rename,
        updated,
        failed,
        total_replacements,
    })
}

fn rewrite_document(
    store: &mut dyn DocumentStore,
    path: &str,
    pattern: &regex::Regex,
    replacement: &str,
) -> Result<usize> {
    let content = store.read(path)?;
    let count = pattern.find_iter(&content).count();
    if count == 0 {
        return Ok(0);
    }

    let new_content = pattern.replace_all(&content, NoExpand(replacement));
    store.write(path, &new_content)?;
    Ok(count)
}

// ============================================================================
// Session
// ============================================================================

/// One rename at a time over a store, carrying the index snapshot between
/// steps.
pub struct RenameSession<'a> {
    store: &'a mut dyn DocumentStore,
    index: ReferenceIndex,
    state: SessionState,
    plan: Option<RenamePlan>,
    preview_limit: usize,
}

impl<'a> RenameSession<'a> {
    pub fn new(store: &'a mut dyn DocumentStore, preview_limit: usize) -> Result<Self> {
        let index = ReferenceIndex::build(&*store)?;
        Ok(Self {
            store,
            index,
            state: SessionState::Idle,
            plan: None,
            preview_limit: preview_limit.max(1),
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn index(&self) -> &ReferenceIndex {
        &self.index
    }

    pub fn plan(&self) -> Option<&RenamePlan> {
        self.plan.as_ref()
    }

    pub fn propose(&mut self, old_name: &str) -> Result<Proposal> {
        if self.state != SessionState::Idle {
            return Err(Error::rename_invalid_state("propose", self.state.as_str()));
        }
        if old_name.trim().is_empty() {
            return Err(Error::validation_invalid_argument(
                "old_name",
                "Wildcard name cannot be empty",
                None,
                None,
            ));
        }

        let Some(plan) = plan_rename(&self.index, old_name)? else {
            return Ok(Proposal::NothingToDo {
                old_name: old_name.to_string(),
            });
        };

        let proposal = Proposal::Proposed {
            old_name: plan.old_name.clone(),
            target: plan.target.clone(),
            total_references: plan.total_references(),
            documents: plan.references.len(),
        };
        self.plan = Some(plan);
        self.state = SessionState::Proposed;
        Ok(proposal)
    }

    /// Fix the new name and summarize the plan. Can be repeated to try
    /// another name before applying.
    pub fn preview(&mut self, new_name: &str) -> Result<Preview> {
        let plan = match (&self.state, self.plan.as_mut()) {
            (SessionState::Proposed | SessionState::Previewed, Some(plan)) => plan,
            _ => return Err(Error::rename_invalid_state("preview", self.state.as_str())),
        };
        validate_new_name(new_name)?;

        plan.new_name = Some(new_name.to_string());
        let preview = preview_plan(&*self.store, plan, new_name, self.preview_limit);
        self.state = SessionState::Previewed;
        Ok(preview)
    }

    /// Apply the previewed plan and re-scan the corpus. A rename conflict is
    /// refused before anything is written and the plan stays pending.
    pub fn apply(&mut self) -> Result<ApplyReport> {
        let (plan, new_name) = match (&self.state, &self.plan) {
            (SessionState::Previewed, Some(plan)) => match &plan.new_name {
                Some(new_name) => (plan, new_name.clone()),
                None => return Err(Error::rename_invalid_state("apply", self.state.as_str())),
            },
            _ => return Err(Error::rename_invalid_state("apply", self.state.as_str())),
        };

        if let Some(target) = &plan.target {
            let to = sibling_path(target, &new_name);
            if is_conflict(&*self.store, target, &to) {
                return Err(Error::rename_conflict(target.clone(), to));
            }
        }

        let report = apply_plan(&mut *self.store, plan, &new_name)?;

        self.plan = None;
        self.state = SessionState::Idle;
        self.index = ReferenceIndex::build(&*self.store)?;
        Ok(report)
    }

    /// Drop any pending plan. Returns whether there was one.
    pub fn cancel(&mut self) -> bool {
        self.state = SessionState::Idle;
        self.plan.take().is_some()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{Document, MemoryCorpus};

    fn color_corpus() -> MemoryCorpus {
        MemoryCorpus::new()
            .with("color.txt", "pick a __color__,")
            .with("scene.txt", "__color__ sky, __color__ grass,")
    }

    /// Store whose writes fail for selected documents.
    struct FlakyStore {
        inner: MemoryCorpus,
        broken: Vec<String>,
    }

    impl DocumentStore for FlakyStore {
        fn list(&self) -> Result<Vec<String>> {
            self.inner.list()
        }
        fn read(&self, path: &str) -> Result<String> {
            self.inner.read(path)
        }
        fn write(&mut self, path: &str, content: &str) -> Result<()> {
            if self.broken.iter().any(|b| b == path) {
                return Err(Error::document_write(path, "disk full"));
            }
            self.inner.write(path, content)
        }
        fn rename(&mut self, from: &str, to: &str) -> Result<()> {
            self.inner.rename(from, to)
        }
        fn exists(&self, path: &str) -> bool {
            self.inner.exists(path)
        }
    }

    #[test]
    fn end_to_end_rename() {
        let mut store = color_corpus();
        {
            let mut session = RenameSession::new(&mut store, 3).unwrap();
            session.propose("color").unwrap();
            session.preview("hue").unwrap();
            let report = session.apply().unwrap();

            assert_eq!(report.updated, 2);
            assert_eq!(report.total_replacements, 3);
            assert!(report.file_rename.as_ref().unwrap().renamed);
            assert!(!report.has_failures());
            assert_eq!(session.state(), SessionState::Idle);
            assert!(session.index().owning_document("hue").is_some());
        }

        assert_eq!(store.get("scene.txt"), Some("__hue__ sky, __hue__ grass,"));
        assert_eq!(store.get("hue.txt"), Some("pick a __hue__,"));
        assert!(!store.exists("color.txt"));
    }

    #[test]
    fn new_name_casing_is_used_verbatim() {
        let mut store = MemoryCorpus::new().with("scene.txt", "__Color__ and __COLOR__");
        {
            let mut session = RenameSession::new(&mut store, 3).unwrap();
            session.propose("color").unwrap();
            session.preview("Hue").unwrap();
            session.apply().unwrap();
        }
        assert_eq!(store.get("scene.txt"), Some("__Hue__ and __Hue__"));
    }

    #[test]
    fn replacement_is_not_expanded() {
        let mut store = MemoryCorpus::new().with("a.txt", "__x__");
        {
            let mut session = RenameSession::new(&mut store, 3).unwrap();
            session.propose("x").unwrap();
            session.preview("$1y").unwrap();
            session.apply().unwrap();
        }
        assert_eq!(store.get("a.txt"), Some("__$1y__"));
    }

    #[test]
    fn propose_with_nothing_to_do_stays_idle() {
        let mut store = color_corpus();
        let mut session = RenameSession::new(&mut store, 3).unwrap();

        let proposal = session.propose("missing").unwrap();
        assert!(matches!(proposal, Proposal::NothingToDo { .. }));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn owner_without_references_is_still_proposed() {
        let mut store = MemoryCorpus::new().with("lonely.txt", "a,");
        let mut session = RenameSession::new(&mut store, 3).unwrap();

        match session.propose("LONELY").unwrap() {
            Proposal::Proposed {
                target,
                total_references,
                ..
            } => {
                assert_eq!(target.as_deref(), Some("lonely.txt"));
                assert_eq!(total_references, 0);
            }
            other => panic!("unexpected proposal: {:?}", other),
        }
    }

    #[test]
    fn preview_truncates_for_display_only() {
        let body = "__c__,\n".repeat(5);
        let mut store = MemoryCorpus::new().with("many.txt", &body);
        let mut session = RenameSession::new(&mut store, 3).unwrap();

        session.propose("c").unwrap();
        let preview = session.preview("d").unwrap();

        assert_eq!(preview.documents[0].count, 5);
        assert_eq!(preview.documents[0].shown.len(), 3);
        assert_eq!(preview.documents[0].remaining, 2);
        assert!(preview.file_rename.is_none());

        let report = session.apply().unwrap();
        assert_eq!(report.total_replacements, 5);
    }

    #[test]
    fn steps_out_of_order_are_rejected() {
        let mut store = color_corpus();
        let mut session = RenameSession::new(&mut store, 3).unwrap();

        let err = session.preview("hue").unwrap_err();
        assert_eq!(err.code.as_str(), "rename.invalid_state");

        session.propose("color").unwrap();
        assert!(session.apply().is_err());
        assert!(session.propose("color").is_err());
    }

    #[test]
    fn cancel_discards_plan_without_side_effects() {
        let mut store = color_corpus();
        {
            let mut session = RenameSession::new(&mut store, 3).unwrap();
            session.propose("color").unwrap();
            session.preview("hue").unwrap();
            assert!(session.cancel());
            assert_eq!(session.state(), SessionState::Idle);
            assert!(session.plan().is_none());
            assert!(!session.cancel());
        }
        assert_eq!(store.get("scene.txt"), Some("__color__ sky, __color__ grass,"));
        assert!(store.exists("color.txt"));
    }

    #[test]
    fn conflict_is_previewed_and_refused() {
        let mut store = color_corpus().with("hue.txt", "existing,");
        {
            let mut session = RenameSession::new(&mut store, 3).unwrap();
            session.propose("color").unwrap();
            let preview = session.preview("hue").unwrap();
            assert_eq!(preview.conflict.as_deref(), Some("hue.txt"));

            let err = session.apply().unwrap_err();
            assert_eq!(err.code.as_str(), "rename.conflict");
            assert_eq!(session.state(), SessionState::Previewed);
        }
        assert_eq!(store.get("scene.txt"), Some("__color__ sky, __color__ grass,"));
        assert_eq!(store.get("hue.txt"), Some("existing,"));
    }

    #[test]
    fn case_only_rename_is_not_a_conflict() {
        let store = color_corpus();
        let index = ReferenceIndex::build(&store).unwrap();
        let plan = plan_rename(&index, "color").unwrap().unwrap();
        let preview = preview_plan(&store, &plan, "Color", 3);

        assert!(preview.conflict.is_none());
        assert_eq!(preview.file_rename.unwrap().to, "Color.txt");
    }

    #[test]
    fn case_variant_owners_conflict_before_any_write() {
        let mut store = MemoryCorpus::new()
            .with("Color.txt", "red,")
            .with("color.txt", "blue,")
            .with("scene.txt", "__Color__ sky\n");
        {
            let mut session = RenameSession::new(&mut store, 3).unwrap();
            session.propose("Color").unwrap();
            let preview = session.preview("color").unwrap();
            assert_eq!(preview.conflict.as_deref(), Some("color.txt"));

            let err = session.apply().unwrap_err();
            assert_eq!(err.code.as_str(), "rename.conflict");
            assert_eq!(session.state(), SessionState::Previewed);
        }

        assert_eq!(store.get("scene.txt"), Some("__Color__ sky\n"));
        assert_eq!(store.get("Color.txt"), Some("red,"));
        assert_eq!(store.get("color.txt"), Some("blue,"));
    }

    #[test]
    fn write_failures_are_isolated_per_document() {
        let mut store = FlakyStore {
            inner: MemoryCorpus::new()
                .with("a.txt", "__x__")
                .with("b.txt", "__x__")
                .with("x.txt", "__x__"),
            broken: vec!["b.txt".to_string()],
        };
        {
            let mut session = RenameSession::new(&mut store, 3).unwrap();
            session.propose("x").unwrap();
            session.preview("y").unwrap();
            let report = session.apply().unwrap();

            assert_eq!(report.updated, 2);
            assert_eq!(report.failed, 1);
            assert_eq!(report.documents[1].status, ItemStatus::Failed);
            assert!(report.file_rename.as_ref().unwrap().renamed);
            assert!(report.has_failures());
        }
        assert_eq!(store.inner.get("a.txt"), Some("__y__"));
        assert_eq!(store.inner.get("b.txt"), Some("__x__"));
        assert_eq!(store.inner.get("y.txt"), Some("__y__"));
    }

    #[test]
    fn apply_uses_index_from_propose_time() {
        let store = color_corpus();
        let index = ReferenceIndex::build(&store).unwrap();
        let plan = plan_rename(&index, "color").unwrap().unwrap();

        // A document added after indexing is not part of the plan.
        let mut store = store.with("late.txt", "__color__");
        let report = apply_plan(&mut store, &plan, "hue").unwrap();

        assert_eq!(report.documents.len(), 2);
        assert_eq!(store.get("late.txt"), Some("__color__"));
    }

    #[test]
    fn duplicate_owner_warning_reaches_preview() {
        let index = ReferenceIndex::from_documents(vec![
            Document::new("a/color.txt", ""),
            Document::new("b/color.txt", ""),
        ]);
        let plan = plan_rename(&index, "color").unwrap().unwrap();
        let store = MemoryCorpus::new();
        let preview = preview_plan(&store, &plan, "hue", 3);

        assert_eq!(preview.file_rename.unwrap().from, "a/color.txt");
        assert!(preview.warnings.iter().any(|w| w.kind == "duplicate_owner"));
    }

    #[test]
    fn invalid_new_names_are_rejected() {
        let mut store = color_corpus();
        let mut session = RenameSession::new(&mut store, 3).unwrap();
        session.propose("color").unwrap();

        assert!(session.preview("  ").is_err());
        assert!(session.preview("a/b").is_err());
        assert_eq!(session.state(), SessionState::Proposed);
    }
}
