use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use zacai_core::{
    classify, select_pathways, AssistantSettings, Category, DictionaryEntry, DictionaryLookup,
    EncyclopediaArticle, EncyclopediaLookup, LookupError, MemoryVault, Orchestrator,
    PathwayKind, PathwayRegistry, SessionRegistry, Source,
};
use zacai_skills::{
    offline_registry, ArithmeticPathway, ConversationalPathway, PersonalPathway, VocabularyPathway,
};

#[derive(Default)]
struct CountingDictionary {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl DictionaryLookup for CountingDictionary {
    fn name(&self) -> &str {
        "mock-dictionary"
    }

    async fn define(&self, word: &str) -> Result<DictionaryEntry, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if word != "algorithm" {
            return Err(LookupError::NotFound(word.to_string()));
        }
        Ok(DictionaryEntry {
            word: word.to_string(),
            part_of_speech: Some("noun".to_string()),
            definition: "A finite sequence of well-defined instructions.".to_string(),
            synonyms: vec!["procedure".to_string()],
            ..DictionaryEntry::default()
        })
    }
}

#[derive(Default)]
struct CountingEncyclopedia {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl EncyclopediaLookup for CountingEncyclopedia {
    fn name(&self) -> &str {
        "mock-encyclopedia"
    }

    async fn summarize(&self, topic: &str) -> Result<EncyclopediaArticle, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if topic != "black holes" {
            return Err(LookupError::NotFound(topic.to_string()));
        }
        Ok(EncyclopediaArticle {
            title: "Black hole".to_string(),
            extract: "A black hole is a region of spacetime where gravity prevents anything from escaping.".to_string(),
            category: "astronomy".to_string(),
            related_topics: vec!["Event horizon".to_string()],
        })
    }
}

/// Never answers within any reasonable timeout.
struct HangingDictionary;

#[async_trait::async_trait]
impl DictionaryLookup for HangingDictionary {
    fn name(&self) -> &str {
        "hanging-dictionary"
    }

    async fn define(&self, word: &str) -> Result<DictionaryEntry, LookupError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Err(LookupError::NotFound(word.to_string()))
    }
}

struct UnreachableDictionary;

#[async_trait::async_trait]
impl DictionaryLookup for UnreachableDictionary {
    fn name(&self) -> &str {
        "unreachable-dictionary"
    }

    async fn define(&self, _word: &str) -> Result<DictionaryEntry, LookupError> {
        Err(LookupError::Network("connection refused".to_string()))
    }
}

/// Summarizes any topic, or fails every call with a network error when `extract` is None.
struct StubEncyclopedia {
    extract: Option<&'static str>,
}

#[async_trait::async_trait]
impl EncyclopediaLookup for StubEncyclopedia {
    fn name(&self) -> &str {
        "stub-encyclopedia"
    }

    async fn summarize(&self, topic: &str) -> Result<EncyclopediaArticle, LookupError> {
        match self.extract {
            Some(extract) => Ok(EncyclopediaArticle {
                title: topic.to_string(),
                extract: extract.to_string(),
                category: "astronomy".to_string(),
                related_topics: Vec::new(),
            }),
            None => Err(LookupError::Network("dns failure".to_string())),
        }
    }
}

fn registry_with(
    dictionary: Arc<dyn DictionaryLookup>,
    encyclopedia: Arc<dyn EncyclopediaLookup>,
) -> PathwayRegistry {
    let mut registry = PathwayRegistry::new();
    registry.register(Arc::new(ArithmeticPathway::new()));
    registry.register(Arc::new(
        VocabularyPathway::new()
            .with_dictionary(dictionary)
            .with_encyclopedia(encyclopedia),
    ));
    registry.register(Arc::new(PersonalPathway::new()));
    registry.register(Arc::new(ConversationalPathway::default()));
    registry
}

async fn offline_orchestrator() -> Orchestrator {
    Orchestrator::open(
        Arc::new(MemoryVault::new()),
        Arc::new(offline_registry()),
        AssistantSettings::default(),
    )
    .await
}

#[tokio::test]
async fn arithmetic_reply_shows_steps() {
    let orch = offline_orchestrator().await;
    let reply = orch.submit("3×3+3").await;
    assert_eq!(reply.pathway, PathwayKind::Mathematical);
    assert!(reply.confidence >= 0.9);
    assert_eq!(reply.text, "The answer is 12 (3 × 3 = 9 → 9 + 3 = 12).");
    assert!(orch.entry(Category::Mathematics, "3×3+3").await.is_some());
}

#[tokio::test]
async fn division_by_zero_is_low_confidence() {
    let orch = offline_orchestrator().await;
    let reply = orch.submit("5/0").await;
    assert!(reply.confidence <= 0.3);
    assert!(reply.text.contains("division by zero"));
    assert!(orch.entry(Category::Mathematics, "5÷0").await.is_none());
}

#[tokio::test]
async fn online_definition_is_learned_and_reused() {
    let dictionary = Arc::new(CountingDictionary::default());
    let encyclopedia = Arc::new(CountingEncyclopedia::default());
    let orch = Orchestrator::open(
        Arc::new(MemoryVault::new()),
        Arc::new(registry_with(dictionary.clone(), encyclopedia.clone())),
        AssistantSettings::default(),
    )
    .await;

    let first = orch.submit("what is algorithm").await;
    assert_eq!(first.pathway, PathwayKind::Factual);
    assert!((first.confidence - 0.8).abs() < 1e-4);
    assert!(first.text.starts_with("Algorithm (noun): A finite sequence"));
    assert!(first.trace.iter().any(|s| s.ends_with("Looking up 'algorithm'")));
    assert_eq!(dictionary.calls.load(Ordering::SeqCst), 1);

    let stored = orch.entry(Category::Vocabulary, "algorithm").await.unwrap();
    assert_eq!(stored.source, Source::Online);

    let second = orch.submit("what is algorithm").await;
    assert_eq!(second.pathway, PathwayKind::Factual);
    assert!((second.confidence - 0.85).abs() < 1e-4);
    assert!(second.trace.iter().any(|s| s.contains("Tier 2")));
    assert_eq!(dictionary.calls.load(Ordering::SeqCst), 1);
    assert_eq!(encyclopedia.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn encyclopedia_answers_multi_word_topics() {
    let dictionary = Arc::new(CountingDictionary::default());
    let encyclopedia = Arc::new(CountingEncyclopedia::default());
    let orch = Orchestrator::open(
        Arc::new(MemoryVault::new()),
        Arc::new(registry_with(dictionary.clone(), encyclopedia.clone())),
        AssistantSettings::default(),
    )
    .await;

    let reply = orch.submit("tell me about black holes").await;
    assert_eq!(reply.pathway, PathwayKind::Factual);
    assert!(reply.text.contains("region of spacetime"));
    assert!(reply.text.contains("Related topics: Event horizon."));
    assert_eq!(dictionary.calls.load(Ordering::SeqCst), 0);
    assert!(orch.entry(Category::Facts, "black holes").await.is_some());
}

#[tokio::test]
async fn hanging_dictionary_times_out_and_encyclopedia_answers() {
    let orch = Orchestrator::open(
        Arc::new(MemoryVault::new()),
        Arc::new(registry_with(
            Arc::new(HangingDictionary),
            Arc::new(StubEncyclopedia {
                extract: Some("A quasar is an extremely luminous active galactic nucleus."),
            }),
        )),
        AssistantSettings {
            lookup_timeout: Duration::from_millis(100),
            ..AssistantSettings::default()
        },
    )
    .await;

    let started = tokio::time::Instant::now();
    let reply = orch.submit("what is quasar").await;
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(reply.pathway, PathwayKind::Factual);
    assert!((reply.confidence - 0.8).abs() < 1e-4);
    assert!(reply.text.contains("extremely luminous"));
    assert!(reply.trace.iter().any(|s| s.contains("timed out")));
}

#[tokio::test]
async fn network_failures_fall_back_to_conversation() {
    let orch = Orchestrator::open(
        Arc::new(MemoryVault::new()),
        Arc::new(registry_with(
            Arc::new(UnreachableDictionary),
            Arc::new(StubEncyclopedia { extract: None }),
        )),
        AssistantSettings::default(),
    )
    .await;

    let reply = orch.submit("what is quasar").await;
    assert_eq!(reply.pathway, PathwayKind::Conversational);
    assert!(reply.trace.iter().any(|s| s.contains("dictionary miss (network error: connection refused)")));
    assert!(reply.trace.iter().any(|s| s.contains("encyclopedia miss (network error: dns failure)")));
    assert!(orch.entry(Category::Vocabulary, "quasar").await.is_none());
}

#[tokio::test]
async fn short_words_do_not_match_inside_seed_facts() {
    let orch = offline_orchestrator().await;
    for text in ["what is art", "what is ant"] {
        let reply = orch.submit(text).await;
        assert_eq!(reply.pathway, PathwayKind::Conversational, "{text}");
        assert!(!reply.text.contains("Sun"), "{text}");
        assert!(!reply.text.contains("plants"), "{text}");
    }
}

#[tokio::test]
async fn seed_knowledge_answers_offline() {
    let orch = offline_orchestrator().await;
    let reply = orch.submit("what is photosynthesis").await;
    assert_eq!(reply.pathway, PathwayKind::Factual);
    assert!(reply.confidence >= 0.9);

    let miss = orch.submit("what is zyzzyva").await;
    assert_eq!(miss.pathway, PathwayKind::Conversational);
}

#[tokio::test]
async fn personal_facts_are_remembered() {
    let orch = offline_orchestrator().await;
    let told = orch.submit("my name is Jordan").await;
    assert_eq!(told.learned, vec![("name".to_string(), "Jordan".to_string())]);
    assert!(told.text.contains("your name is Jordan"));

    let asked = orch.submit("what's my name").await;
    assert_eq!(asked.pathway, PathwayKind::Personal);
    assert!(asked.confidence >= 0.9);
    assert!(asked.text.contains("Jordan"));
}

#[tokio::test]
async fn empty_personal_memory_invites_sharing() {
    let orch = offline_orchestrator().await;
    let reply = orch.submit("what do you remember about me").await;
    assert_eq!(reply.pathway, PathwayKind::Personal);
    assert!((reply.confidence - 0.3).abs() < 1e-4);
    assert!(reply.text.contains("Tell me about yourself"));
}

#[test]
fn conversational_always_closes_the_route() {
    for text in ["3×3+3", "what is algorithm", "my name is Jordan", "hi", "", "tell me about gravity"] {
        let route = select_pathways(&classify(text));
        assert_eq!(route.last(), Some(&PathwayKind::Conversational), "{text}");
    }
}

#[tokio::test]
async fn sled_sessions_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vault");

    {
        let db = sled::open(&path).unwrap();
        let sessions = SessionRegistry::new(Some(db), Arc::new(offline_registry()), AssistantSettings::default());
        let orch = sessions.get_or_open(Some("jordan")).await;
        orch.submit("my name is Jordan").await;
        orch.submit("2+2").await;
    }

    let db = sled::open(&path).unwrap();
    let sessions = SessionRegistry::new(Some(db), Arc::new(offline_registry()), AssistantSettings::default());
    let orch = sessions.get_or_open(Some("jordan")).await;
    assert_eq!(orch.entry(Category::Personal, "name").await.unwrap().text(), "Jordan");
    assert!(orch.entry(Category::Mathematics, "2+2").await.is_some());

    let other = sessions.get_or_open(Some("someone-else")).await;
    assert!(other.entry(Category::Personal, "name").await.is_none());
}

#[tokio::test]
async fn export_import_is_idempotent() {
    let source = offline_orchestrator().await;
    source.submit("my name is Jordan").await;
    source.submit("7×6").await;
    let doc = source.export().await;

    let target = offline_orchestrator().await;
    let first = target.import(doc.clone()).await;
    assert_eq!(first.inserted, 2);
    let second = target.import(doc).await;
    assert_eq!(second.inserted + second.updated, 0);
    assert_eq!(target.export().await.entry_count(), source.export().await.entry_count());
}
