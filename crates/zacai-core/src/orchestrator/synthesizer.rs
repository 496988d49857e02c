//! Knowledge synthesizer: picks the most useful pathway result and resolves personalization.

use serde::{Deserialize, Serialize};

use super::pathway::{PathwayData, PathwayKind, PathwayResult};
use super::trace::ReasoningTrace;
use crate::knowledge::{Category, KnowledgeStore};

/// Reply used when no conversational result is available at all.
pub const GENERIC_ACKNOWLEDGMENT: &str =
    "I understand. Tell me more, or ask me a question, a calculation or a word to define.";

/// Reserved personal key used to address the user.
pub const NAME_KEY: &str = "name";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Synthesis {
    pub pathway: PathwayKind,
    pub confidence: f32,
    pub data: Option<PathwayData>,
    pub user_name: Option<String>,
    /// Personal facts extracted from this very query.
    #[serde(default)]
    pub learned: Vec<(String, String)>,
    pub trace: ReasoningTrace,
}

/// Selects the highest-confidence non-conversational result at or above `min_confidence`.
/// Ties go to the pathway the router placed first. With no qualifying result the
/// conversational result is used.
pub fn synthesize(
    results: &[PathwayResult],
    store: &KnowledgeStore,
    min_confidence: f32,
    learned: Vec<(String, String)>,
) -> Synthesis {
    let mut trace = ReasoningTrace::new();

    let mut best: Option<&PathwayResult> = None;
    for result in results {
        if result.pathway == PathwayKind::Conversational {
            continue;
        }
        if result.is_miss() || result.confidence < min_confidence {
            trace.push(format!(
                "Discarded {} (confidence {:.2} below {:.2} or no data)",
                result.pathway, result.confidence, min_confidence
            ));
            continue;
        }
        if best.map_or(true, |b| result.confidence > b.confidence) {
            best = Some(result);
        }
    }

    let (pathway, confidence, data) = match best {
        Some(result) => {
            trace.push(format!(
                "Selected {} pathway (confidence {:.2})",
                result.pathway, result.confidence
            ));
            (result.pathway, result.confidence, result.data.clone())
        }
        None => match results.iter().find(|r| r.pathway == PathwayKind::Conversational) {
            Some(result) => {
                trace.push("No specialized pathway qualified; using conversational fallback");
                (result.pathway, result.confidence, result.data.clone())
            }
            None => {
                trace.push("No pathway produced a result; using built-in acknowledgment");
                (
                    PathwayKind::Conversational,
                    PathwayKind::Conversational.base_weight(),
                    Some(PathwayData::Conversation {
                        reply: GENERIC_ACKNOWLEDGMENT.to_string(),
                    }),
                )
            }
        },
    };

    let user_name = store
        .get(Category::Personal, NAME_KEY)
        .map(|e| e.text())
        .filter(|n| !n.trim().is_empty());
    if let Some(name) = &user_name {
        trace.push(format!("Personalizing reply for {}", name));
    }

    Synthesis {
        pathway,
        confidence: if confidence.is_finite() { confidence.clamp(0.0, 1.0) } else { 0.0 },
        data,
        user_name,
        learned,
        trace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::{EntryPayload, KnowledgeEntry, Source};

    fn result(pathway: PathwayKind, confidence: f32, reply: &str) -> PathwayResult {
        PathwayResult::new(
            pathway,
            confidence,
            Some(PathwayData::Conversation { reply: reply.to_string() }),
        )
    }

    #[test]
    fn highest_confidence_wins_and_ties_keep_router_order() {
        let store = KnowledgeStore::new();
        let results = vec![
            result(PathwayKind::Factual, 0.8, "fact"),
            result(PathwayKind::Personal, 0.8, "personal"),
            result(PathwayKind::Conversational, 0.6, "chat"),
        ];
        let s = synthesize(&results, &store, 0.3, Vec::new());
        assert_eq!(s.pathway, PathwayKind::Factual);
        assert!(s.user_name.is_none());
    }

    #[test]
    fn threshold_is_inclusive_and_misses_fall_back() {
        let store = KnowledgeStore::new();
        let results = vec![
            result(PathwayKind::Personal, 0.3, "nothing yet"),
            result(PathwayKind::Conversational, 0.6, "chat"),
        ];
        let s = synthesize(&results, &store, 0.3, Vec::new());
        assert_eq!(s.pathway, PathwayKind::Personal);
        assert!((s.confidence - 0.3).abs() < f32::EPSILON);

        let results = vec![
            PathwayResult::miss(PathwayKind::Factual, 0.15),
            result(PathwayKind::Conversational, 0.6, "chat"),
        ];
        let s = synthesize(&results, &store, 0.3, Vec::new());
        assert_eq!(s.pathway, PathwayKind::Conversational);
    }

    #[test]
    fn zero_confidence_is_a_miss_even_without_threshold() {
        let store = KnowledgeStore::new();
        let results = vec![
            result(PathwayKind::Factual, 0.0, "guess"),
            result(PathwayKind::Conversational, 0.6, "chat"),
        ];
        let s = synthesize(&results, &store, 0.0, Vec::new());
        assert_eq!(s.pathway, PathwayKind::Conversational);
    }

    #[test]
    fn empty_results_still_produce_a_reply() {
        let s = synthesize(&[], &KnowledgeStore::new(), 0.3, Vec::new());
        assert_eq!(s.pathway, PathwayKind::Conversational);
        assert!((0.0..=1.0).contains(&s.confidence));
        assert!(s.data.is_some());
    }

    #[test]
    fn resolves_user_name_from_personal_memory() {
        let mut store = KnowledgeStore::new();
        store.merge(KnowledgeEntry::new(
            Category::Personal,
            "name",
            "personal",
            EntryPayload::Personal { value: "Jordan".into() },
            Source::Learned,
            0.95,
        ));
        let s = synthesize(&[], &store, 0.3, Vec::new());
        assert_eq!(s.user_name.as_deref(), Some("Jordan"));
    }
}
