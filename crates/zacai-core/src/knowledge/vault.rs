//! Persistent store collaborator: segmented load/save per category.
//!
//! `SledVault` keeps one sled tree per (session namespace, category), e.g. `default/vocabulary`.
//! Each value is a JSON-encoded [`KnowledgeEntry`] keyed by its normalized key.

use sled::Db;
use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use super::entry::{Category, KnowledgeEntry};
use crate::error::{StoreError, StoreResult};
use crate::shared::DEFAULT_SESSION_ID;

const DEFAULT_PATH: &str = "./data/zacai_knowledge";

/// Storage contract consumed by the learning manager and orchestrator.
#[async_trait::async_trait]
pub trait PersistentStore: Send + Sync {
    /// Human-readable name for this backend.
    fn name(&self) -> &str;

    /// Loads every entry of one category. A failure here must not affect other categories.
    async fn load(&self, category: Category) -> StoreResult<Vec<KnowledgeEntry>>;

    /// Replaces the persisted contents of one category.
    async fn save(&self, category: Category, entries: &[KnowledgeEntry]) -> StoreResult<()>;
}

/// Sled-backed vault with one tree per category, namespaced by session.
pub struct SledVault {
    db: Db,
    namespace: String,
}

impl SledVault {
    /// Opens or creates the vault at `./data/zacai_knowledge` in the default namespace.
    pub fn new() -> Result<Self, sled::Error> {
        Self::open_path(DEFAULT_PATH)
    }

    /// Opens or creates the vault at the given path in the default namespace.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, sled::Error> {
        let db = sled::open(path)?;
        Ok(Self::with_db(db, DEFAULT_SESSION_ID))
    }

    /// Shares an already-open sled database under a session namespace.
    pub fn with_db(db: Db, namespace: &str) -> Self {
        let namespace = if namespace.is_empty() {
            DEFAULT_SESSION_ID.to_string()
        } else {
            namespace.to_string()
        };
        Self { db, namespace }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// True when `namespace` has been opened against `db` before, i.e. its trees exist.
    pub fn namespace_exists(db: &Db, namespace: &str) -> bool {
        let marker = format!("{}/{}", namespace, Category::Vocabulary.tree_name());
        db.tree_names().iter().any(|name| name.as_ref() == marker.as_bytes())
    }

    fn tree_name(&self, category: Category) -> String {
        format!("{}/{}", self.namespace, category.tree_name())
    }

    /// Returns the number of persisted entries for `category`.
    pub fn count(&self, category: Category) -> StoreResult<usize> {
        let tree = self.db.open_tree(self.tree_name(category))?;
        Ok(tree.len())
    }

    /// Probes every category tree; used by the gateway pre-flight check.
    pub fn verify(&self) -> StoreResult<()> {
        for category in Category::all() {
            let tree = self.db.open_tree(self.tree_name(category))?;
            tree.get(b"__verify_probe__")?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl PersistentStore for SledVault {
    fn name(&self) -> &str {
        "sled"
    }

    async fn load(&self, category: Category) -> StoreResult<Vec<KnowledgeEntry>> {
        let tree_name = self.tree_name(category);
        let tree = self.db.open_tree(&tree_name)?;
        let mut out = Vec::new();
        for item in tree.iter() {
            let (k, v) = item?;
            match KnowledgeEntry::from_bytes(&v) {
                Some(entry) => out.push(entry),
                None => {
                    tracing::warn!(
                        target: "zacai::vault",
                        tree = %tree_name,
                        key = %String::from_utf8_lossy(&k),
                        "Skipping unreadable record"
                    );
                }
            }
        }
        tracing::debug!(
            target: "zacai::vault",
            tree = %tree_name,
            entries = out.len(),
            "Loaded {} entries from '{}'",
            out.len(),
            tree_name
        );
        Ok(out)
    }

    async fn save(&self, category: Category, entries: &[KnowledgeEntry]) -> StoreResult<()> {
        let tree_name = self.tree_name(category);
        let tree = self.db.open_tree(&tree_name)?;

        let mut batch = sled::Batch::default();
        let keep: std::collections::HashSet<&str> = entries.iter().map(|e| e.key.as_str()).collect();
        for key in tree.iter().keys() {
            let key = key?;
            let stale = std::str::from_utf8(&key).map(|k| !keep.contains(k)).unwrap_or(true);
            if stale {
                batch.remove(key);
            }
        }
        for entry in entries {
            batch.insert(entry.key.as_bytes(), serde_json::to_vec(entry)?);
        }
        tree.apply_batch(batch)?;
        tree.flush()?;

        tracing::info!(
            target: "zacai::vault",
            tree = %tree_name,
            category = category.tree_name(),
            entries = entries.len(),
            "{} [{}] saved {} entries",
            tree_name,
            category.label(),
            entries.len()
        );
        Ok(())
    }
}

/// In-process vault for ephemeral sessions and tests.
#[derive(Default)]
pub struct MemoryVault {
    segments: RwLock<HashMap<Category, Vec<KnowledgeEntry>>>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries persisted for `category`.
    pub fn count(&self, category: Category) -> usize {
        self.segments
            .read()
            .map(|s| s.get(&category).map(|v| v.len()).unwrap_or(0))
            .unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl PersistentStore for MemoryVault {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load(&self, category: Category) -> StoreResult<Vec<KnowledgeEntry>> {
        let segments = self
            .segments
            .read()
            .map_err(|_| StoreError::Io(std::io::Error::other("memory vault lock poisoned")))?;
        Ok(segments.get(&category).cloned().unwrap_or_default())
    }

    async fn save(&self, category: Category, entries: &[KnowledgeEntry]) -> StoreResult<()> {
        let mut segments = self
            .segments
            .write()
            .map_err(|_| StoreError::Io(std::io::Error::other("memory vault lock poisoned")))?;
        segments.insert(category, entries.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::entry::{EntryPayload, Source};

    fn personal(key: &str, value: &str) -> KnowledgeEntry {
        KnowledgeEntry::new(
            Category::Personal,
            key,
            "personal",
            EntryPayload::Personal { value: value.to_string() },
            Source::Learned,
            0.95,
        )
    }

    #[tokio::test]
    async fn sled_vault_save_replaces_category_segment() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let vault = SledVault::open_path(dir.path().join("vault")).expect("open vault");

        vault
            .save(Category::Personal, &[personal("name", "Jordan"), personal("age", "30")])
            .await
            .unwrap();
        assert_eq!(vault.count(Category::Personal).unwrap(), 2);

        vault.save(Category::Personal, &[personal("name", "Sam")]).await.unwrap();
        let loaded = vault.load(Category::Personal).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].text(), "Sam");
        assert!(vault.load(Category::Facts).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sled_vault_skips_corrupt_records_and_isolates_namespaces() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let db = sled::open(dir.path().join("vault")).unwrap();
        let alice = SledVault::with_db(db.clone(), "alice");
        let bob = SledVault::with_db(db.clone(), "bob");

        alice.save(Category::Personal, &[personal("name", "Alice")]).await.unwrap();
        db.open_tree("alice/personal")
            .unwrap()
            .insert("garbage", b"not json".as_slice())
            .unwrap();

        let loaded = alice.load(Category::Personal).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(bob.load(Category::Personal).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn namespace_exists_only_after_trees_are_opened() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let db = sled::open(dir.path().join("vault")).unwrap();
        assert!(!SledVault::namespace_exists(&db, "carol"));

        SledVault::with_db(db.clone(), "carol").load(Category::Vocabulary).await.unwrap();
        assert!(SledVault::namespace_exists(&db, "carol"));
        assert!(!SledVault::namespace_exists(&db, "car"));
    }

    #[tokio::test]
    async fn memory_vault_roundtrip() {
        let vault = MemoryVault::new();
        vault.save(Category::Personal, &[personal("name", "Jordan")]).await.unwrap();
        assert_eq!(vault.count(Category::Personal), 1);
        assert_eq!(vault.load(Category::Personal).await.unwrap()[0].text(), "Jordan");
    }
}
