//! Wildcard refactoring: find every reference to a wildcard and rename it
//! across the corpus.
//!
//! `index` snapshots the corpus and answers reference queries; `rename` turns
//! a query into a plan and applies it through the document store.

mod index;
mod rename;

pub use index::{
    token, token_pattern, wildcard_key, DocumentReferences, IndexWarning, Occurrence,
    OwningDocument, ReferenceIndex, TokenSite, WildcardEntry,
};
pub use rename::{
    apply_plan, plan_rename, preview_plan, ApplyReport, DocumentOutcome, FileRename,
    FileRenameOutcome, Preview, PreviewDocument, Proposal, RenamePlan, RenameSession,
    SessionState,
};
