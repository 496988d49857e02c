//! Learning / persistence manager: normalizes pathway proposals into entries, merges them
//! into the store and persists the touched category segments.

use std::sync::Arc;

use crate::knowledge::{
    Category, Enrichment, EntryPayload, ImportReport, KnowledgeDocument, KnowledgeEntry,
    KnowledgeStore, MergeOutcome, PersistentStore, Source,
};
use crate::lookup::{DictionaryEntry, EncyclopediaArticle};

/// Confidence assigned to facts the user states about themself.
pub const PERSONAL_CONFIDENCE: f32 = 0.95;
/// Confidence assigned to solved calculations.
pub const CALCULATION_CONFIDENCE: f32 = 0.95;

/// New knowledge proposed by a pathway or the personal fact extractor.
#[derive(Debug, Clone, PartialEq)]
pub enum LearnEvent {
    Calculation {
        expression: String,
        result: f64,
        steps: Vec<String>,
    },
    Definition {
        entry: DictionaryEntry,
        source: Source,
        confidence: f32,
    },
    Fact {
        topic: String,
        article: EncyclopediaArticle,
        source: Source,
        confidence: f32,
    },
    Personal {
        key: String,
        value: String,
    },
    /// Attach enrichment to an existing entry; ignored when the entry is unknown.
    Enrich {
        category: Category,
        key: String,
        enrichment: Enrichment,
    },
    /// One vocabulary resolution attempt.
    Usage { key: String, success: bool },
}

impl LearnEvent {
    pub fn category(&self) -> Category {
        match self {
            LearnEvent::Calculation { .. } => Category::Mathematics,
            LearnEvent::Definition { .. } => Category::Vocabulary,
            LearnEvent::Fact { .. } => Category::Facts,
            LearnEvent::Personal { .. } => Category::Personal,
            LearnEvent::Enrich { category, .. } => *category,
            LearnEvent::Usage { .. } => Category::Vocabulary,
        }
    }
}

/// Builds the entry shape for an event. `Usage` and `Enrich` need the existing entry and
/// return `None` here.
pub fn normalize(event: &LearnEvent) -> Option<KnowledgeEntry> {
    match event {
        LearnEvent::Calculation { expression, result, steps } => Some(KnowledgeEntry::new(
            Category::Mathematics,
            expression,
            "calculation",
            EntryPayload::Calculation {
                expression: expression.clone(),
                result: *result,
                steps: steps.clone(),
            },
            Source::Learned,
            CALCULATION_CONFIDENCE,
        )),
        LearnEvent::Definition { entry, source, confidence } => Some(
            KnowledgeEntry::new(
                Category::Vocabulary,
                &entry.word,
                "learned",
                EntryPayload::Definition {
                    definition: entry.definition.clone(),
                    part_of_speech: entry.part_of_speech.clone(),
                    examples: entry.examples.clone(),
                },
                *source,
                *confidence,
            )
            .with_enrichment(Enrichment {
                synonyms: entry.synonyms.clone(),
                antonyms: entry.antonyms.clone(),
                phonetic: entry.phonetic.clone(),
                forms: Vec::new(),
                etymology: entry.etymology.clone(),
                fetched: true,
            }),
        ),
        LearnEvent::Fact { topic, article, source, confidence } => {
            let tag = if article.category.is_empty() {
                "general".to_string()
            } else {
                article.category.clone()
            };
            Some(KnowledgeEntry::new(
                Category::Facts,
                topic,
                tag,
                EntryPayload::Fact {
                    text: article.extract.clone(),
                    related_topics: article.related_topics.clone(),
                },
                *source,
                *confidence,
            ))
        }
        LearnEvent::Personal { key, value } => Some(KnowledgeEntry::new(
            Category::Personal,
            key,
            "personal",
            EntryPayload::Personal { value: value.clone() },
            Source::Learned,
            PERSONAL_CONFIDENCE,
        )),
        LearnEvent::Enrich { .. } | LearnEvent::Usage { .. } => None,
    }
}

/// Applies learn events to a store and persists each touched category once.
pub struct LearningManager {
    vault: Arc<dyn PersistentStore>,
}

impl LearningManager {
    pub fn new(vault: Arc<dyn PersistentStore>) -> Self {
        Self { vault }
    }

    /// Applies one event in memory. Returns true when the store changed.
    fn apply(&self, store: &mut KnowledgeStore, event: LearnEvent) -> bool {
        match event {
            LearnEvent::Usage { key, success } => store.record_usage(&key, success),
            LearnEvent::Enrich { category, key, enrichment } => match store.get(category, &key) {
                Some(mut entry) => {
                    entry.enrichment.absorb(&enrichment);
                    store.merge(entry) != MergeOutcome::Unchanged
                }
                None => {
                    tracing::debug!(target: "zacai::learning", key = %key, "Enrichment for unknown entry ignored");
                    false
                }
            },
            other => match normalize(&other) {
                Some(entry) => store.merge(entry) != MergeOutcome::Unchanged,
                None => false,
            },
        }
    }

    /// Merges one event and persists its category if anything changed.
    pub async fn learn(&self, store: &mut KnowledgeStore, event: LearnEvent) -> bool {
        self.learn_all(store, vec![event]).await > 0
    }

    /// Merges every event in order, then saves each changed category.
    /// Returns the number of events that changed the store.
    pub async fn learn_all(&self, store: &mut KnowledgeStore, events: Vec<LearnEvent>) -> usize {
        let mut touched: Vec<Category> = Vec::new();
        let mut changed = 0;
        for event in events {
            let category = event.category();
            if self.apply(store, event) {
                changed += 1;
                if !touched.contains(&category) {
                    touched.push(category);
                }
            }
        }
        for category in touched {
            self.persist(store, category).await;
        }
        changed
    }

    /// Merges an external document and persists the categories it touched.
    pub async fn import(&self, store: &mut KnowledgeStore, doc: KnowledgeDocument) -> ImportReport {
        let report = store.import(doc);
        for category in report.touched.clone() {
            self.persist(store, category).await;
        }
        tracing::info!(
            target: "zacai::learning",
            inserted = report.inserted,
            updated = report.updated,
            unchanged = report.unchanged,
            "Knowledge document imported"
        );
        report
    }

    /// Best-effort save; failures are logged and the in-memory state is kept.
    async fn persist(&self, store: &KnowledgeStore, category: Category) {
        let entries = store.entries(category);
        if let Err(e) = self.vault.save(category, &entries).await {
            tracing::warn!(
                target: "zacai::learning",
                vault = self.vault.name(),
                category = category.tree_name(),
                error = %e,
                "Persisting category failed; keeping in-memory state"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StoreError, StoreResult};
    use crate::knowledge::MemoryVault;

    struct FailingVault;

    #[async_trait::async_trait]
    impl PersistentStore for FailingVault {
        fn name(&self) -> &str {
            "failing"
        }

        async fn load(&self, _category: Category) -> StoreResult<Vec<KnowledgeEntry>> {
            Ok(Vec::new())
        }

        async fn save(&self, _category: Category, _entries: &[KnowledgeEntry]) -> StoreResult<()> {
            Err(StoreError::Io(std::io::Error::other("disk full")))
        }
    }

    fn dictionary_hit(word: &str) -> LearnEvent {
        LearnEvent::Definition {
            entry: DictionaryEntry {
                word: word.to_string(),
                part_of_speech: Some("noun".to_string()),
                definition: "A step-by-step procedure.".to_string(),
                synonyms: vec!["procedure".to_string()],
                ..DictionaryEntry::default()
            },
            source: Source::Online,
            confidence: 0.8,
        }
    }

    #[tokio::test]
    async fn learn_merges_and_persists_category() {
        let vault = Arc::new(MemoryVault::new());
        let manager = LearningManager::new(vault.clone());
        let mut store = KnowledgeStore::new();

        assert!(manager.learn(&mut store, dictionary_hit("Algorithm")).await);
        let entry = store.get(Category::Vocabulary, "algorithm").unwrap();
        assert_eq!(entry.source, Source::Online);
        assert!(entry.enrichment.fetched);
        assert_eq!(vault.count(Category::Vocabulary), 1);

        assert!(!manager.learn(&mut store, dictionary_hit("algorithm")).await);
    }

    #[tokio::test]
    async fn persistence_failure_keeps_in_memory_entry() {
        let manager = LearningManager::new(Arc::new(FailingVault));
        let mut store = KnowledgeStore::new();
        let event = LearnEvent::Personal { key: "name".into(), value: "Jordan".into() };
        assert!(manager.learn(&mut store, event).await);
        assert_eq!(store.get(Category::Personal, "name").unwrap().text(), "Jordan");
    }

    #[tokio::test]
    async fn usage_and_enrichment_apply_to_existing_entries_only() {
        let manager = LearningManager::new(Arc::new(MemoryVault::new()));
        let mut store = KnowledgeStore::new();
        let events = vec![
            LearnEvent::Usage { key: "ghost".into(), success: true },
            dictionary_hit("cat"),
            LearnEvent::Usage { key: "cat".into(), success: true },
            LearnEvent::Enrich {
                category: Category::Vocabulary,
                key: "cat".into(),
                enrichment: Enrichment { antonyms: vec!["dog".into()], ..Enrichment::default() },
            },
        ];
        assert_eq!(manager.learn_all(&mut store, events).await, 3);
        let cat = store.get(Category::Vocabulary, "cat").unwrap();
        assert_eq!(cat.usage.unwrap().successes, 1);
        assert_eq!(cat.enrichment.antonyms, vec!["dog".to_string()]);
    }

    #[test]
    fn calculation_is_keyed_by_expression() {
        let entry = normalize(&LearnEvent::Calculation {
            expression: "3×3+3".into(),
            result: 12.0,
            steps: vec!["3 × 3 = 9".into(), "9 + 3 = 12".into()],
        })
        .unwrap();
        assert_eq!(entry.category, Category::Mathematics);
        assert_eq!(entry.key, "3×3+3");
        assert_eq!(entry.text(), "3×3+3 = 12");
    }
}
