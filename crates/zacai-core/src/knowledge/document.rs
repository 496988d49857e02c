//! Portable knowledge document used by export/import.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::entry::{Category, KnowledgeEntry};
use crate::error::StoreError;
use crate::shared::now_ms;

pub const DOCUMENT_FORMAT: &str = "zacai-knowledge";
pub const DOCUMENT_VERSION: u32 = 1;

/// Serialized form of a whole Knowledge Store. Entries are sorted by key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    pub format: String,
    pub version: u32,
    #[serde(default)]
    pub exported_at: i64,
    #[serde(default)]
    pub categories: BTreeMap<Category, Vec<KnowledgeEntry>>,
}

impl KnowledgeDocument {
    pub fn empty() -> Self {
        Self {
            format: DOCUMENT_FORMAT.to_string(),
            version: DOCUMENT_VERSION,
            exported_at: now_ms(),
            categories: BTreeMap::new(),
        }
    }

    pub fn entry_count(&self) -> usize {
        self.categories.values().map(|v| v.len()).sum()
    }

    /// Rejects documents from another format or a newer version.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.format != DOCUMENT_FORMAT {
            return Err(StoreError::Document(format!("unexpected format '{}'", self.format)));
        }
        if self.version > DOCUMENT_VERSION {
            return Err(StoreError::Document(format!(
                "version {} is newer than supported version {}",
                self.version, DOCUMENT_VERSION
            )));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let doc: Self = serde_json::from_str(json)?;
        doc.validate()?;
        Ok(doc)
    }
}

/// Counts produced by merging a document into a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Categories that received at least one entry.
    #[serde(skip)]
    pub touched: Vec<Category>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_foreign_format() {
        let json = r#"{"format":"other","version":1,"categories":{}}"#;
        assert!(matches!(
            KnowledgeDocument::from_json(json),
            Err(StoreError::Document(_))
        ));
    }

    #[test]
    fn rejects_newer_version() {
        let json = r#"{"format":"zacai-knowledge","version":99,"categories":{}}"#;
        assert!(KnowledgeDocument::from_json(json).is_err());
    }

    #[test]
    fn json_roundtrip_keeps_entries() {
        let mut store = crate::knowledge::KnowledgeStore::new();
        crate::knowledge::initialize_seed_knowledge(&mut store);
        let doc = store.export();
        let back = KnowledgeDocument::from_json(&doc.to_json().unwrap()).unwrap();
        assert_eq!(back, doc);
        assert_eq!(back.entry_count(), store.total_len());
    }
}
