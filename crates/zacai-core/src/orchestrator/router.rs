//! Pathway router: static trigger table, deterministic ordering.

use super::classifier::{Features, InputKind};
use super::pathway::PathwayKind;

/// One row of the routing table.
#[derive(Debug, Clone, Copy)]
pub struct RouteRule {
    pub pathway: PathwayKind,
    pub triggers: &'static [&'static str],
    pub weight: f32,
}

/// Routing table in priority order. Conversational has no triggers; it is always appended.
pub static ROUTE_TABLE: [RouteRule; 4] = [
    RouteRule {
        pathway: PathwayKind::Mathematical,
        triggers: &["calculate", "compute", "solve", "plus", "minus", "times", "divided"],
        weight: 0.9,
    },
    RouteRule {
        pathway: PathwayKind::Factual,
        triggers: &[
            "define",
            "definition",
            "meaning",
            "means",
            "explain",
            "tell",
            "synonym",
            "synonyms",
            "antonym",
            "antonyms",
            "opposite",
            "pronounce",
            "pronunciation",
            "plural",
        ],
        weight: 0.8,
    },
    RouteRule {
        pathway: PathwayKind::Personal,
        triggers: &["my", "i", "me", "am", "have", "myself", "remember"],
        weight: 0.7,
    },
    RouteRule {
        pathway: PathwayKind::Conversational,
        triggers: &[],
        weight: 0.6,
    },
];

fn rule(pathway: PathwayKind) -> &'static RouteRule {
    ROUTE_TABLE
        .iter()
        .find(|r| r.pathway == pathway)
        .unwrap_or(&ROUTE_TABLE[3])
}

fn has_trigger(pathway: PathwayKind, features: &Features) -> bool {
    rule(pathway).triggers.iter().any(|t| features.has_token(t))
}

/// Queries about the user themself ("what's my name", "tell me about me") go to personal memory.
fn is_self_directed(features: &Features) -> bool {
    let tokens = &features.tokens;
    features.has_token("my")
        || features.has_token("myself")
        || tokens.windows(2).any(|w| w[0] == "about" && w[1] == "me")
        || tokens.last().is_some_and(|t| t == "me")
}

/// Ordered, duplicate-free pathway list; conversational is always last.
pub fn select_pathways(features: &Features) -> Vec<PathwayKind> {
    let mut selected = vec![PathwayKind::Conversational];

    if features.has_first_person || has_trigger(PathwayKind::Personal, features) {
        selected.insert(0, PathwayKind::Personal);
    }

    let factual = features.kind == InputKind::Inquiry
        || features.has_question_word
        || has_trigger(PathwayKind::Factual, features);
    if factual && !is_self_directed(features) {
        selected.insert(0, PathwayKind::Factual);
    }

    if features.kind == InputKind::Mathematics
        || (features.has_numbers && has_trigger(PathwayKind::Mathematical, features))
    {
        selected.insert(0, PathwayKind::Mathematical);
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::classifier::classify;

    fn route(text: &str) -> Vec<PathwayKind> {
        select_pathways(&classify(text))
    }

    #[test]
    fn conversational_is_always_last_and_unique() {
        for text in ["", "hello", "3+4", "what is gravity", "my name is Jordan", "!!!"] {
            let pathways = route(text);
            assert_eq!(pathways.last(), Some(&PathwayKind::Conversational), "{text}");
            assert_eq!(
                pathways.iter().filter(|p| **p == PathwayKind::Conversational).count(),
                1
            );
        }
    }

    #[test]
    fn arithmetic_goes_first() {
        assert_eq!(
            route("what is 3×3+3"),
            vec![PathwayKind::Mathematical, PathwayKind::Factual, PathwayKind::Conversational]
        );
    }

    #[test]
    fn self_directed_questions_skip_factual() {
        assert_eq!(
            route("what's my name"),
            vec![PathwayKind::Personal, PathwayKind::Conversational]
        );
        assert_eq!(
            route("what do you remember about me"),
            vec![PathwayKind::Personal, PathwayKind::Conversational]
        );
    }

    #[test]
    fn definitions_route_to_factual() {
        assert_eq!(
            route("what is algorithm"),
            vec![PathwayKind::Factual, PathwayKind::Conversational]
        );
        assert_eq!(
            route("define serendipity"),
            vec![PathwayKind::Factual, PathwayKind::Conversational]
        );
        assert_eq!(
            route("tell me about gravity"),
            vec![PathwayKind::Factual, PathwayKind::Personal, PathwayKind::Conversational]
        );
    }

    #[test]
    fn routing_is_deterministic() {
        let f = classify("how do I pronounce quinoa");
        assert_eq!(select_pathways(&f), select_pathways(&f));
    }

    #[test]
    fn table_weights_match_pathway_weights() {
        for rule in ROUTE_TABLE.iter() {
            assert_eq!(rule.weight, rule.pathway.base_weight());
        }
    }
}
