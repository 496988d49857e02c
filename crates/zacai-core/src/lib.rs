//! zacai-core: assistant core library (knowledge store, query pipeline, learning, sessions).
//!
//! Pathway executors and network lookup clients live in `zacai-skills`; the HTTP surface
//! lives in the `zacai-gateway` add-on.

mod conversation;
mod error;
mod knowledge;
mod learning;
mod lookup;
mod orchestrator;
mod session;
mod shared;

// Shared
pub use shared::{now_ms, AssistantSettings, CoreConfig, DEFAULT_SESSION_ID};

// Errors
pub use error::{LookupError, StoreError, StoreResult};

// Knowledge
pub use knowledge::{
    format_number, initialize_seed_knowledge, normalize_key, seed_entries, Category,
    CategoryStatus, Enrichment, EntryPayload, ImportReport, KnowledgeDocument, KnowledgeEntry,
    KnowledgeStore, MemoryVault, MergeOutcome, PersistentStore, RankedEntry, SledVault, Source,
    Usage, CATEGORY_LABELS, DOCUMENT_FORMAT, DOCUMENT_VERSION,
};

// Lookup contracts
pub use lookup::{
    with_soft_timeout, DictionaryEntry, DictionaryLookup, EncyclopediaArticle, EncyclopediaLookup,
};

// Learning
pub use learning::{normalize as normalize_learn_event, LearnEvent, LearningManager};

// Conversation
pub use conversation::{ConversationLog, ConversationTurn, Role};

// Orchestrator
pub use orchestrator::{
    classify, extract_personal_facts, render, select_pathways, synthesize, tokenize, Features,
    InputKind, Orchestrator, Pathway, PathwayContext, PathwayData, PathwayKind, PathwayRegistry,
    PathwayResult, ReasoningTrace, Reply, Response, RouteRule, Synthesis, Tier,
    GENERIC_ACKNOWLEDGMENT, NAME_KEY, ROUTE_TABLE,
};

// Sessions
pub use session::{resolve_session_id, session_span, SessionRegistry, DEFAULT_MAX_SESSIONS};
