//! Query pipeline: classify → extract personal facts → route → run pathways → synthesize →
//! render → learn.

mod classifier;
mod extractor;
mod pathway;
mod response;
mod router;
mod synthesizer;
mod trace;

pub use classifier::{classify, tokenize, Features, InputKind};
pub use extractor::extract_personal_facts;
pub use pathway::{PathwayContext, PathwayData, PathwayKind, PathwayResult, Tier};
pub use response::{render, Response};
pub use router::{select_pathways, RouteRule, ROUTE_TABLE};
pub use synthesizer::{synthesize, Synthesis, GENERIC_ACKNOWLEDGMENT, NAME_KEY};
pub use trace::ReasoningTrace;

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::conversation::{ConversationLog, ConversationTurn};
use crate::knowledge::{
    initialize_seed_knowledge, Category, CategoryStatus, ImportReport, KnowledgeDocument,
    KnowledgeEntry, KnowledgeStore, PersistentStore,
};
use crate::learning::{LearnEvent, LearningManager};
use crate::shared::AssistantSettings;

/// Trait implemented by every pathway executor.
#[async_trait::async_trait]
pub trait Pathway: Send + Sync {
    fn kind(&self) -> PathwayKind;

    /// Resolves the query. Never fails: misses are low-confidence results.
    async fn execute(&self, ctx: &PathwayContext<'_>) -> PathwayResult;
}

/// Registry of pathway executors, looked up by kind.
pub struct PathwayRegistry {
    pathways: Vec<Arc<dyn Pathway>>,
}

impl PathwayRegistry {
    pub fn new() -> Self {
        Self {
            pathways: Vec::new(),
        }
    }

    /// Registers a pathway; a later registration replaces an earlier one of the same kind.
    pub fn register(&mut self, pathway: Arc<dyn Pathway>) {
        self.pathways.retain(|p| p.kind() != pathway.kind());
        self.pathways.push(pathway);
    }

    pub fn get(&self, kind: PathwayKind) -> Option<Arc<dyn Pathway>> {
        self.pathways.iter().find(|p| p.kind() == kind).cloned()
    }

    pub fn kinds(&self) -> Vec<PathwayKind> {
        self.pathways.iter().map(|p| p.kind()).collect()
    }
}

impl Default for PathwayRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Rendered answer for one submitted query.
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub text: String,
    pub confidence: f32,
    pub pathway: PathwayKind,
    pub trace: Vec<String>,
    /// Id of the assistant turn, usable for feedback.
    pub turn_id: String,
    /// Personal facts extracted from this query.
    pub learned: Vec<(String, String)>,
}

/// Owns one session's Knowledge Store and conversation log and runs the query pipeline.
pub struct Orchestrator {
    registry: Arc<PathwayRegistry>,
    store: RwLock<KnowledgeStore>,
    log: Mutex<ConversationLog>,
    learning: LearningManager,
    settings: AssistantSettings,
}

impl Orchestrator {
    /// Loads every category from `vault` (a failing category stays empty), then merges seeds.
    pub async fn open(
        vault: Arc<dyn PersistentStore>,
        registry: Arc<PathwayRegistry>,
        settings: AssistantSettings,
    ) -> Self {
        let mut store = KnowledgeStore::new();
        for category in Category::all() {
            match vault.load(category).await {
                Ok(entries) => store.replace_category(category, entries),
                Err(e) => tracing::warn!(
                    target: "zacai::knowledge",
                    vault = vault.name(),
                    category = category.tree_name(),
                    error = %e,
                    "Category failed to load; starting it empty"
                ),
            }
        }
        initialize_seed_knowledge(&mut store);
        tracing::info!(
            target: "zacai::knowledge",
            vault = vault.name(),
            entries = store.total_len(),
            pathways = ?registry.kinds(),
            "Knowledge store ready"
        );

        Self {
            registry,
            store: RwLock::new(store),
            log: Mutex::new(ConversationLog::new(settings.max_history)),
            learning: LearningManager::new(vault),
            settings,
        }
    }

    pub fn settings(&self) -> &AssistantSettings {
        &self.settings
    }

    /// Runs the full pipeline for one user message. Never fails.
    pub async fn submit(&self, text: &str) -> Reply {
        let mut trace = ReasoningTrace::new();

        let features = classify(text);
        trace.push(format!(
            "Classified as {} (complexity {:.2}, {} words)",
            features.kind.name(),
            features.complexity,
            features.word_count
        ));

        let learned = extract_personal_facts(text);
        if !learned.is_empty() {
            let events = learned
                .iter()
                .map(|(key, value)| LearnEvent::Personal {
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect();
            let mut store = self.store.write().await;
            self.learning.learn_all(&mut store, events).await;
            trace.push(format!(
                "Learned personal facts: {}",
                learned.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>().join(", ")
            ));
        }

        let route = select_pathways(&features);
        trace.push(format!(
            "Pathways: {}",
            route.iter().map(|p| p.name()).collect::<Vec<_>>().join(" → ")
        ));

        let (synthesis, proposals) = {
            let store = self.store.read().await;
            let mut results: Vec<PathwayResult> = Vec::with_capacity(route.len());
            for kind in &route {
                let Some(pathway) = self.registry.get(*kind) else {
                    trace.push(format!("{} pathway not registered; skipped", kind));
                    continue;
                };
                let ctx = PathwayContext {
                    text,
                    features: &features,
                    store: &store,
                    prior: &results,
                    settings: &self.settings,
                };
                let result = pathway.execute(&ctx).await;
                tracing::debug!(
                    target: "zacai::pathway",
                    pathway = kind.name(),
                    confidence = result.confidence,
                    has_data = result.data.is_some(),
                    "Pathway finished"
                );
                trace.extend_labeled(kind.name(), &result.trace);
                trace.push(format!("{} confidence {:.2}", kind, result.confidence));
                results.push(result);
            }

            let synthesis = synthesize(&results, &store, self.settings.min_confidence, learned.clone());
            let proposals: Vec<LearnEvent> = results.into_iter().flat_map(|r| r.learn).collect();
            (synthesis, proposals)
        };
        trace.extend_labeled("synthesis", &synthesis.trace);

        let response = render(&synthesis);

        if !proposals.is_empty() {
            let mut store = self.store.write().await;
            let changed = self.learning.learn_all(&mut store, proposals).await;
            if changed > 0 {
                trace.push(format!("Stored {} new or updated knowledge entries", changed));
            }
        }

        let steps = trace.into_steps();
        let assistant = ConversationTurn::assistant(
            response.text.clone(),
            response.confidence,
            vec![synthesis.pathway.name().to_string()],
            steps.clone(),
        );
        let turn_id = assistant.id.clone();
        {
            let mut log = self.log.lock().await;
            log.push(ConversationTurn::user(text));
            log.push(assistant);
        }

        tracing::info!(
            target: "zacai::chat",
            pathway = synthesis.pathway.name(),
            confidence = response.confidence,
            "Reply rendered"
        );

        Reply {
            text: response.text,
            confidence: response.confidence,
            pathway: synthesis.pathway,
            trace: steps,
            turn_id,
            learned,
        }
    }

    /// Serializes the entire Knowledge Store.
    pub async fn export(&self) -> KnowledgeDocument {
        self.store.read().await.export()
    }

    /// Merges a document with the store merge rule and persists touched categories.
    pub async fn import(&self, doc: KnowledgeDocument) -> ImportReport {
        let mut store = self.store.write().await;
        self.learning.import(&mut store, doc).await
    }

    pub async fn status(&self) -> Vec<CategoryStatus> {
        self.store.read().await.status()
    }

    pub async fn entry(&self, category: Category, key: &str) -> Option<KnowledgeEntry> {
        self.store.read().await.get(category, key)
    }

    pub async fn history(&self) -> Vec<ConversationTurn> {
        self.log.lock().await.turns()
    }

    /// Marks an assistant turn helpful or not. Returns false for unknown ids.
    pub async fn feedback(&self, turn_id: &str, helpful: bool) -> bool {
        self.log.lock().await.set_feedback(turn_id, helpful)
    }
}
