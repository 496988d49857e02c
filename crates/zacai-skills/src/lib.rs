//! Pathway executors and network lookup clients for the ZacAI assistant.

pub use zacai_core::{Pathway, PathwayRegistry};

use std::sync::Arc;
use zacai_core::CoreConfig;

mod arithmetic;
mod conversational;
mod dictionary;
mod encyclopedia;
mod grammar;
mod personal;
mod vocabulary;

pub use arithmetic::{evaluate, normalize_expression, ArithmeticOutcome, ArithmeticPathway};
pub use conversational::ConversationalPathway;
pub use dictionary::{parse_dictionary_response, DictionaryClient};
pub use encyclopedia::{clean_snippet, parse_search, parse_summary, SearchHit, WikipediaClient};
pub use grammar::inflect;
pub use personal::PersonalPathway;
pub use vocabulary::{extract_term, query_hints, Hint, VocabularyPathway};

/// Registry with all four pathways. Lookup clients are attached when `online_lookups` is on;
/// a client that fails to build is logged and the vocabulary pathway stays offline for it.
pub fn default_registry(config: &CoreConfig) -> PathwayRegistry {
    let mut vocabulary = VocabularyPathway::new();
    if config.online_lookups {
        let timeout = std::time::Duration::from_millis(config.lookup_timeout_ms);
        match DictionaryClient::new(&config.dictionary_url, timeout) {
            Ok(client) => vocabulary = vocabulary.with_dictionary(Arc::new(client)),
            Err(e) => tracing::warn!(target: "zacai::skills", error = %e, "Dictionary client unavailable"),
        }
        match WikipediaClient::new(&config.encyclopedia_url, timeout) {
            Ok(client) => vocabulary = vocabulary.with_encyclopedia(Arc::new(client)),
            Err(e) => tracing::warn!(target: "zacai::skills", error = %e, "Encyclopedia client unavailable"),
        }
    } else {
        tracing::info!(
            target: "zacai::skills",
            "Online lookups disabled; vocabulary answers from the store only"
        );
    }

    let mut registry = PathwayRegistry::new();
    registry.register(Arc::new(ArithmeticPathway::new()));
    registry.register(Arc::new(vocabulary));
    registry.register(Arc::new(PersonalPathway::new()));
    registry.register(Arc::new(ConversationalPathway::new(config.app_name.clone())));
    registry
}

/// Registry without any network client.
pub fn offline_registry() -> PathwayRegistry {
    default_registry(&CoreConfig {
        online_lookups: false,
        ..CoreConfig::default()
    })
}
