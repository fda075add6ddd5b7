//! Public output types for corpus passes.
//!
//! A pass visits every document once and records one item per document.
//! Commands serialize these directly and render them into run logs.

use serde::{Deserialize, Serialize};

/// Outcome of one document within a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Content changed (written, or would be written in a dry run).
    Updated,
    Unchanged,
    Failed,
}

/// Summary of a pass across the corpus.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PassReport {
    pub documents_processed: u32,
    pub updated: u32,
    pub unchanged: u32,
    pub errors: u32,
    /// Replacements or corrections, depending on the pass.
    pub total_changes: u32,
    pub written: bool,
    pub items: Vec<PassItem>,
}

/// Individual document result within a pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassItem {
    pub document: String,
    pub status: ItemStatus,
    pub changes: u32,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub messages: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PassReport {
    pub fn new(written: bool) -> Self {
        Self {
            written,
            ..Self::default()
        }
    }

    pub fn record_updated(&mut self, document: String, changes: u32, messages: Vec<String>) {
        self.documents_processed += 1;
        self.updated += 1;
        self.total_changes += changes;
        self.items.push(PassItem {
            document,
            status: ItemStatus::Updated,
            changes,
            messages,
            error: None,
        });
    }

    pub fn record_unchanged(&mut self, document: String) {
        self.documents_processed += 1;
        self.unchanged += 1;
        self.items.push(PassItem {
            document,
            status: ItemStatus::Unchanged,
            changes: 0,
            messages: Vec::new(),
            error: None,
        });
    }

    /// Failed documents are not counted as processed.
    pub fn record_error(&mut self, document: String, error: String) {
        self.errors += 1;
        self.items.push(PassItem {
            document,
            status: ItemStatus::Failed,
            changes: 0,
            messages: Vec::new(),
            error: Some(error),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_follow_recorded_items() {
        let mut report = PassReport::new(true);
        report.record_updated("a.txt".to_string(), 3, vec!["Line 1: x".to_string()]);
        report.record_unchanged("b.txt".to_string());
        report.record_error("c.txt".to_string(), "boom".to_string());

        assert_eq!(report.documents_processed, 2);
        assert_eq!(report.total_changes, 3);
        assert_eq!(report.errors, 1);
        assert!(report.has_errors());
        assert_eq!(report.items.len(), 3);
    }

    #[test]
    fn serializes_camel_case_and_skips_empty() {
        let mut report = PassReport::new(false);
        report.record_unchanged("b.txt".to_string());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["documentsProcessed"], 1);
        assert_eq!(json["items"][0]["status"], "unchanged");
        assert!(json["items"][0].get("messages").is_none());
        assert!(json["items"][0].get("error").is_none());
    }
}
