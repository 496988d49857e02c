//! In-memory Knowledge Store: four categorized collections with explicit get/put/merge.
//!
//! The store is the single owner of every [`KnowledgeEntry`]. Readers receive clones,
//! never references into the collections; mutations go through [`KnowledgeStore::merge`]
//! (non-destructive) or [`KnowledgeStore::put`] (raw replace, used when loading persisted data).
//!
//! ## Merge rule
//!
//! | Existing | Incoming | Payload      | Source | Confidence |
//! |----------|----------|--------------|--------|------------|
//! | seed     | non-seed | kept         | seed   | max        |
//! | any      | seed     | incoming     | seed   | max        |
//! | non-seed | non-seed | higher conf. | winner | max        |
//!
//! Enrichment is always unioned and usage counters take the maximum. The timestamp moves
//! forward only when the merge changed something else.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use super::document::{ImportReport, KnowledgeDocument};
use super::entry::{normalize_key, Category, KnowledgeEntry};
use crate::orchestrator::tokenize;

/// Result of merging one entry into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Inserted,
    Updated,
    Unchanged,
}

/// A fact entry scored against a free-text query.
#[derive(Debug, Clone)]
pub struct RankedEntry {
    /// Fraction of query words found in the fact, in (0, 1].
    pub score: f32,
    pub entry: KnowledgeEntry,
}

/// Entry counts for a single category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryStatus {
    pub category: Category,
    pub name: String,
    pub entry_count: usize,
    pub seed_count: usize,
}

/// Owned, categorized knowledge collections.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeStore {
    collections: [BTreeMap<String, KnowledgeEntry>; 4],
}

impl KnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn collection(&self, category: Category) -> &BTreeMap<String, KnowledgeEntry> {
        &self.collections[category.index()]
    }

    fn collection_mut(&mut self, category: Category) -> &mut BTreeMap<String, KnowledgeEntry> {
        &mut self.collections[category.index()]
    }

    /// Returns a copy of the entry at `key` (normalized) in `category`.
    pub fn get(&self, category: Category, key: &str) -> Option<KnowledgeEntry> {
        self.collection(category).get(&normalize_key(key)).cloned()
    }

    pub fn contains(&self, category: Category, key: &str) -> bool {
        self.collection(category).contains_key(&normalize_key(key))
    }

    /// Replaces the entry at its key without applying the merge rule. Returns the previous entry.
    pub fn put(&mut self, mut entry: KnowledgeEntry) -> Option<KnowledgeEntry> {
        entry.key = normalize_key(&entry.key);
        let category = entry.category;
        self.collection_mut(category).insert(entry.key.clone(), entry)
    }

    /// Replaces a whole category (used when loading a persisted segment).
    pub fn replace_category(&mut self, category: Category, entries: Vec<KnowledgeEntry>) {
        let collection = self.collection_mut(category);
        collection.clear();
        for mut entry in entries.into_iter().filter(|e| e.category == category) {
            entry.key = normalize_key(&entry.key);
            collection.insert(entry.key.clone(), entry);
        }
    }

    /// Merges `incoming` into the store under the non-destructive merge rule.
    pub fn merge(&mut self, mut incoming: KnowledgeEntry) -> MergeOutcome {
        incoming.key = normalize_key(&incoming.key);
        incoming.confidence = incoming.confidence.clamp(0.0, 1.0);
        let category = incoming.category;
        let key = incoming.key.clone();

        let collection = self.collection_mut(category);
        let outcome = match collection.get_mut(&key) {
            None => {
                collection.insert(key.clone(), incoming);
                MergeOutcome::Inserted
            }
            Some(existing) => {
                let before = existing.clone();
                let incoming_timestamp = incoming.timestamp;
                merge_into(existing, incoming);
                if *existing == before {
                    MergeOutcome::Unchanged
                } else {
                    existing.timestamp = existing.timestamp.max(incoming_timestamp);
                    MergeOutcome::Updated
                }
            }
        };

        tracing::debug!(
            target: "zacai::knowledge",
            category = category.tree_name(),
            key = %key,
            action = ?outcome,
            "{} [{}] merge '{}': {:?}",
            category.tree_name(),
            category.label(),
            key,
            outcome
        );
        outcome
    }

    /// Records one resolution attempt on a vocabulary entry. Returns false if the key is unknown.
    pub fn record_usage(&mut self, key: &str, success: bool) -> bool {
        match self.collection_mut(Category::Vocabulary).get_mut(&normalize_key(key)) {
            Some(entry) => {
                let usage = entry.usage.get_or_insert_with(Default::default);
                usage.attempts = usage.attempts.saturating_add(1);
                if success {
                    usage.successes = usage.successes.saturating_add(1);
                }
                true
            }
            None => false,
        }
    }

    /// All entries in `category`, ordered by key.
    pub fn entries(&self, category: Category) -> Vec<KnowledgeEntry> {
        self.collection(category).values().cloned().collect()
    }

    pub fn len(&self, category: Category) -> usize {
        self.collection(category).len()
    }

    pub fn total_len(&self) -> usize {
        self.collections.iter().map(|c| c.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_len() == 0
    }

    /// Ranks fact entries by the share of `query_words` found as whole tokens in their key or text.
    ///
    /// Descending by score; ties go to shorter (more specific) keys, then alphabetical.
    pub fn rank_facts(&self, query_words: &[String]) -> Vec<RankedEntry> {
        let mut words: Vec<String> = query_words.iter().flat_map(|w| tokenize(w)).collect();
        words.sort();
        words.dedup();
        if words.is_empty() {
            return Vec::new();
        }

        let mut ranked: Vec<RankedEntry> = self
            .collection(Category::Facts)
            .values()
            .filter_map(|entry| {
                let haystack: HashSet<String> = tokenize(&entry.key)
                    .into_iter()
                    .chain(tokenize(&entry.text()))
                    .collect();
                let found = words.iter().filter(|w| haystack.contains(*w)).count();
                if found == 0 {
                    return None;
                }
                Some(RankedEntry {
                    score: found as f32 / words.len() as f32,
                    entry: entry.clone(),
                })
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.entry.key.len().cmp(&b.entry.key.len()))
                .then_with(|| a.entry.key.cmp(&b.entry.key))
        });
        ranked
    }

    /// Serializes the entire store into a portable document.
    pub fn export(&self) -> KnowledgeDocument {
        let mut doc = KnowledgeDocument::empty();
        for category in Category::all() {
            doc.categories.insert(category, self.entries(category));
        }
        doc
    }

    /// Merges every entry of `doc` using the merge rule.
    pub fn import(&mut self, doc: KnowledgeDocument) -> ImportReport {
        let mut report = ImportReport::default();
        for (category, entries) in doc.categories {
            for mut entry in entries {
                entry.category = category;
                match self.merge(entry) {
                    MergeOutcome::Inserted => report.inserted += 1,
                    MergeOutcome::Updated => report.updated += 1,
                    MergeOutcome::Unchanged => report.unchanged += 1,
                }
                if !report.touched.contains(&category) {
                    report.touched.push(category);
                }
            }
        }
        report
    }

    /// Returns status information for all four categories.
    pub fn status(&self) -> Vec<CategoryStatus> {
        Category::all()
            .iter()
            .map(|category| {
                let collection = self.collection(*category);
                CategoryStatus {
                    category: *category,
                    name: category.label().to_string(),
                    entry_count: collection.len(),
                    seed_count: collection.values().filter(|e| e.source.is_seed()).count(),
                }
            })
            .collect()
    }
}

fn merge_into(existing: &mut KnowledgeEntry, incoming: KnowledgeEntry) {
    let confidence = existing.confidence.max(incoming.confidence);

    if existing.source.is_seed() && !incoming.source.is_seed() {
        // seed payload and provenance stay; only augment
    } else if incoming.source.is_seed() || incoming.confidence >= existing.confidence {
        existing.payload = incoming.payload;
        existing.source = incoming.source;
        existing.tag = incoming.tag;
    }

    existing.confidence = confidence;
    existing.enrichment.absorb(&incoming.enrichment);
    existing.usage = match (existing.usage, incoming.usage) {
        (Some(a), Some(b)) => Some(a.merged(&b)),
        (a, b) => a.or(b),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::entry::{Enrichment, EntryPayload, Source};

    fn definition(key: &str, text: &str, source: Source, confidence: f32) -> KnowledgeEntry {
        KnowledgeEntry::new(
            Category::Vocabulary,
            key,
            "essential",
            EntryPayload::Definition {
                definition: text.to_string(),
                part_of_speech: Some("noun".to_string()),
                examples: vec![],
            },
            source,
            confidence,
        )
    }

    fn fact(key: &str, text: &str) -> KnowledgeEntry {
        KnowledgeEntry::new(
            Category::Facts,
            key,
            "science",
            EntryPayload::Fact { text: text.to_string(), related_topics: vec![] },
            Source::Seed,
            0.95,
        )
    }

    #[test]
    fn merge_inserts_then_reports_unchanged_for_identical_entry() {
        let mut store = KnowledgeStore::new();
        let entry = definition("Cat", "A small domesticated feline.", Source::Seed, 0.95);
        assert_eq!(store.merge(entry.clone()), MergeOutcome::Inserted);
        assert_eq!(store.merge(entry), MergeOutcome::Unchanged);
        assert_eq!(store.len(Category::Vocabulary), 1);
        assert!(store.contains(Category::Vocabulary, "  CAT "));
    }

    #[test]
    fn seed_entry_is_never_downgraded_by_online_merge() {
        let mut store = KnowledgeStore::new();
        store.merge(definition("cat", "seed definition", Source::Seed, 0.9));

        let online = definition("cat", "online definition", Source::Online, 0.99).with_enrichment(
            Enrichment {
                synonyms: vec!["kitty".into()],
                fetched: true,
                ..Enrichment::default()
            },
        );
        assert_eq!(store.merge(online), MergeOutcome::Updated);

        let merged = store.get(Category::Vocabulary, "cat").unwrap();
        assert_eq!(merged.source, Source::Seed);
        assert_eq!(merged.text(), "seed definition");
        assert_eq!(merged.enrichment.synonyms, vec!["kitty".to_string()]);
        assert!((merged.confidence - 0.99).abs() < f32::EPSILON);
    }

    #[test]
    fn lower_confidence_learned_entry_does_not_lower_trust() {
        let mut store = KnowledgeStore::new();
        store.merge(definition("dog", "first", Source::Online, 0.8));
        store.merge(definition("dog", "second", Source::Learned, 0.5));
        let entry = store.get(Category::Vocabulary, "dog").unwrap();
        assert_eq!(entry.text(), "first");
        assert!((entry.confidence - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn seed_merge_upgrades_learned_entry() {
        let mut store = KnowledgeStore::new();
        store.merge(definition("tree", "learned", Source::Learned, 0.85));
        store.merge(definition("tree", "curated", Source::Seed, 0.95));
        let entry = store.get(Category::Vocabulary, "tree").unwrap();
        assert_eq!(entry.source, Source::Seed);
        assert_eq!(entry.text(), "curated");
    }

    #[test]
    fn record_usage_tracks_attempts_and_successes() {
        let mut store = KnowledgeStore::new();
        store.merge(definition("word", "a unit of language", Source::Seed, 0.95));
        assert!(store.record_usage("word", true));
        assert!(store.record_usage("word", false));
        assert!(!store.record_usage("missing", true));
        let usage = store.get(Category::Vocabulary, "word").unwrap().usage.unwrap();
        assert_eq!(usage.attempts, 2);
        assert_eq!(usage.successes, 1);
    }

    #[test]
    fn rank_facts_orders_by_score_then_shorter_key() {
        let mut store = KnowledgeStore::new();
        store.merge(fact("water cycle", "Water evaporates, condenses and falls as rain."));
        store.merge(fact("water", "Water boils at 100 degrees celsius at sea level."));
        store.merge(fact("moon", "The moon orbits the earth."));

        let words = vec!["water".to_string(), "boils".to_string()];
        let ranked = store.rank_facts(&words);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].entry.key, "water");
        assert!((ranked[0].score - 1.0).abs() < f32::EPSILON);
        assert!((ranked[1].score - 0.5).abs() < f32::EPSILON);

        let ranked = store.rank_facts(&["water".to_string()]);
        assert_eq!(ranked[0].entry.key, "water", "tie goes to the shorter key");
    }

    #[test]
    fn rank_facts_matches_whole_words_only() {
        let mut store = KnowledgeStore::new();
        store.merge(fact("earth", "Earth is the third planet from the Sun."));
        store.merge(fact("photosynthesis", "Green plants turn sunlight into sugar."));

        assert!(store.rank_facts(&["art".to_string()]).is_empty());
        assert!(store.rank_facts(&["ant".to_string()]).is_empty());
        let ranked = store.rank_facts(&["plants".to_string()]);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].entry.key, "photosynthesis");
    }

    #[test]
    fn export_then_import_is_idempotent() {
        let mut store = KnowledgeStore::new();
        store.merge(definition("cat", "feline", Source::Seed, 0.95));
        store.merge(fact("moon", "The moon orbits the earth."));
        let doc = store.export();

        let report = store.import(doc.clone());
        assert_eq!(report.inserted, 0);
        assert_eq!(report.updated, 0);
        assert_eq!(report.unchanged, 2);
        assert_eq!(store.export().categories, doc.categories);

        let mut fresh = KnowledgeStore::new();
        let report = fresh.import(doc.clone());
        assert_eq!(report.inserted, 2);
        assert_eq!(fresh.export().categories, doc.categories);
    }
}
