//! Personal memory pathway: recalls what the user has told us about themself.

use zacai_core::{
    tokenize, Category, Pathway, PathwayContext, PathwayData, PathwayKind, PathwayResult,
    ReasoningTrace,
};

pub const MATCH_CONFIDENCE: f32 = 0.95;
pub const UNMATCHED_CONFIDENCE: f32 = 0.6;
pub const EMPTY_CONFIDENCE: f32 = 0.3;

const STOP_WORDS: &[&str] = &[
    "what", "whats", "is", "are", "my", "me", "you", "do", "does", "know", "remember", "about",
    "tell", "the", "am", "who", "your", "of", "anything", "everything", "that", "myself", "have",
    "can", "please",
];

/// Query words that point at a stored key without containing it.
const KEY_ALIASES: &[(&str, &str)] = &[
    ("live", "location"),
    ("from", "location"),
    ("old", "age"),
    ("work", "occupation"),
    ("job", "occupation"),
    ("pet", "has"),
    ("own", "has"),
    ("called", "name"),
];

fn content_tokens(text: &str) -> Vec<String> {
    tokenize(text)
        .into_iter()
        .filter(|t| t.len() >= 2 && !STOP_WORDS.contains(&t.as_str()))
        .collect()
}

fn overlaps(token: &str, key: &str, value: &str) -> bool {
    key.contains(token)
        || value.to_lowercase().contains(token)
        || KEY_ALIASES.iter().any(|(alias, k)| *alias == token && *k == key)
}

#[derive(Debug, Default)]
pub struct PersonalPathway;

impl PersonalPathway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Pathway for PersonalPathway {
    fn kind(&self) -> PathwayKind {
        PathwayKind::Personal
    }

    async fn execute(&self, ctx: &PathwayContext<'_>) -> PathwayResult {
        let mut trace = ReasoningTrace::new();
        let facts: Vec<(String, String)> = ctx
            .store
            .entries(Category::Personal)
            .into_iter()
            .map(|e| {
                let value = e.text();
                (e.key, value)
            })
            .collect();

        if facts.is_empty() {
            trace.push("Nothing learned about the user yet");
            trace.push("Suggest the user share their name or interests");
            return PathwayResult::new(
                PathwayKind::Personal,
                EMPTY_CONFIDENCE,
                Some(PathwayData::PersonalFacts { facts, matched: false }),
            )
            .with_trace(trace);
        }

        let tokens = content_tokens(ctx.text);
        let matched: Vec<(String, String)> = facts
            .iter()
            .filter(|(key, value)| tokens.iter().any(|t| overlaps(t, key, value)))
            .cloned()
            .collect();

        if matched.is_empty() {
            trace.push(format!("No stored fact overlaps the query; returning all {} facts", facts.len()));
            PathwayResult::new(
                PathwayKind::Personal,
                UNMATCHED_CONFIDENCE,
                Some(PathwayData::PersonalFacts { facts, matched: false }),
            )
            .with_trace(trace)
        } else {
            trace.push(format!(
                "Matched stored facts: {}",
                matched.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>().join(", ")
            ));
            PathwayResult::new(
                PathwayKind::Personal,
                MATCH_CONFIDENCE,
                Some(PathwayData::PersonalFacts { facts: matched, matched: true }),
            )
            .with_trace(trace)
        }
    }
}
