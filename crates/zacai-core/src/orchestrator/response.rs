//! Response generator: turns a synthesis into reply text.

use serde::{Deserialize, Serialize};

use super::pathway::{PathwayData, PathwayKind};
use super::synthesizer::{Synthesis, GENERIC_ACKNOWLEDGMENT};
use crate::knowledge::format_number;

const MAX_PERSONAL_FACTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub text: String,
    pub confidence: f32,
}

fn join_list(items: &[String]) -> String {
    items.join(", ")
}

fn render_math(data: Option<&PathwayData>) -> String {
    match data {
        Some(PathwayData::Calculation { result, steps, .. }) => {
            if steps.is_empty() {
                format!("The answer is {}.", format_number(*result))
            } else {
                format!("The answer is {} ({}).", format_number(*result), steps.join(" → "))
            }
        }
        Some(PathwayData::ArithmeticError { expression, reason }) => format!(
            "I can't calculate {}: {}. Try a different expression.",
            expression, reason
        ),
        _ => "I couldn't work out that calculation.".to_string(),
    }
}

fn render_factual(data: Option<&PathwayData>) -> String {
    match data {
        Some(PathwayData::Definition {
            term,
            text,
            part_of_speech,
            examples,
            synonyms,
            antonyms,
            phonetic,
            forms,
            ..
        }) => {
            let mut out = match part_of_speech {
                Some(pos) => format!("{} ({}): {}", capitalize_first(term), pos, text),
                None => format!("{}: {}", capitalize_first(term), text),
            };
            if let Some(phonetic) = phonetic {
                out.push_str(&format!(" Pronunciation: {}.", phonetic));
            }
            if !synonyms.is_empty() {
                out.push_str(&format!(" Synonyms: {}.", join_list(synonyms)));
            }
            if !antonyms.is_empty() {
                out.push_str(&format!(" Antonyms: {}.", join_list(antonyms)));
            }
            if !forms.is_empty() {
                out.push_str(&format!(" Forms: {}.", join_list(forms)));
            }
            if let Some(example) = examples.first() {
                out.push_str(&format!(" Example: \"{}\"", example));
            }
            out
        }
        Some(PathwayData::Fact { text, related_topics, .. }) => {
            if related_topics.is_empty() {
                text.clone()
            } else {
                format!("{} Related topics: {}.", text, join_list(related_topics))
            }
        }
        _ => "I'm sorry, I don't have specific information about that yet.".to_string(),
    }
}

fn describe_fact(key: &str, value: &str) -> String {
    match key {
        "has" => format!("you have a {}", value),
        "age" => format!("you are {} years old", value),
        "location" => format!("you live in {}", value),
        "occupation" => format!("you work as {}", with_article(value)),
        _ => format!("your {} is {}", key, value),
    }
}

fn with_article(noun: &str) -> String {
    let article = match noun.chars().next() {
        Some(c) if "aeiouAEIOU".contains(c) => "an",
        _ => "a",
    };
    format!("{} {}", article, noun)
}

fn render_personal(data: Option<&PathwayData>, learned: &[(String, String)]) -> String {
    if !learned.is_empty() {
        let parts: Vec<String> = learned.iter().map(|(k, v)| describe_fact(k, v)).collect();
        return format!("I'll remember that {}.", parts.join(" and "));
    }
    match data {
        Some(PathwayData::PersonalFacts { facts, .. }) if !facts.is_empty() => {
            let listed: Vec<String> = facts
                .iter()
                .take(MAX_PERSONAL_FACTS)
                .map(|(k, v)| format!("{}: {}", k, v))
                .collect();
            format!("Here's what I know about you: {}.", listed.join(", "))
        }
        _ => concat!(
            "I don't know much about you yet. Tell me about yourself, ",
            "for example \"my name is Sam\" or \"I live in Paris\"."
        )
        .to_string(),
    }
}

fn render_conversational(data: Option<&PathwayData>) -> String {
    match data {
        Some(PathwayData::Conversation { reply }) if !reply.is_empty() => reply.clone(),
        _ => GENERIC_ACKNOWLEDGMENT.to_string(),
    }
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Prefixes `name, ` and lowercases the first letter unless the text opens with the pronoun "I".
fn personalize(name: &str, text: &str) -> String {
    let keep_case = text.starts_with("I ") || text.starts_with("I'");
    let body = if keep_case {
        text.to_string()
    } else {
        let mut chars = text.chars();
        match chars.next() {
            Some(first) => first.to_lowercase().chain(chars).collect(),
            None => String::new(),
        }
    };
    format!("{}, {}", name, body)
}

/// Confidence passes through unchanged.
pub fn render(synthesis: &Synthesis) -> Response {
    let data = synthesis.data.as_ref();
    let text = match synthesis.pathway {
        PathwayKind::Mathematical => render_math(data),
        PathwayKind::Factual => render_factual(data),
        PathwayKind::Personal => render_personal(data, &synthesis.learned),
        PathwayKind::Conversational => render_conversational(data),
    };
    let text = match &synthesis.user_name {
        Some(name) => personalize(name, &text),
        None => text,
    };
    Response {
        text,
        confidence: synthesis.confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::pathway::Tier;
    use crate::orchestrator::trace::ReasoningTrace;

    fn synthesis(pathway: PathwayKind, confidence: f32, data: Option<PathwayData>) -> Synthesis {
        Synthesis {
            pathway,
            confidence,
            data,
            user_name: None,
            learned: Vec::new(),
            trace: ReasoningTrace::new(),
        }
    }

    #[test]
    fn math_reply_joins_steps_with_arrows() {
        let s = synthesis(
            PathwayKind::Mathematical,
            0.95,
            Some(PathwayData::Calculation {
                expression: "3×3+3".into(),
                result: 12.0,
                steps: vec!["3 × 3 = 9".into(), "9 + 3 = 12".into()],
            }),
        );
        let r = render(&s);
        assert_eq!(r.text, "The answer is 12 (3 × 3 = 9 → 9 + 3 = 12).");
        assert_eq!(r.confidence, 0.95);
    }

    #[test]
    fn definition_reply_includes_pos_and_enrichment() {
        let s = synthesis(
            PathwayKind::Factual,
            0.8,
            Some(PathwayData::Definition {
                term: "algorithm".into(),
                text: "A step-by-step procedure.".into(),
                part_of_speech: Some("noun".into()),
                examples: vec![],
                synonyms: vec!["procedure".into()],
                antonyms: vec![],
                phonetic: None,
                forms: vec![],
                tier: Tier::External,
            }),
        );
        assert_eq!(
            render(&s).text,
            "Algorithm (noun): A step-by-step procedure. Synonyms: procedure."
        );
    }

    #[test]
    fn factual_without_data_apologizes() {
        let r = render(&synthesis(PathwayKind::Factual, 0.15, None));
        assert!(r.text.contains("don't have specific information"));
    }

    #[test]
    fn personal_lists_at_most_three_facts() {
        let facts = vec![
            ("name".to_string(), "Jordan".to_string()),
            ("age".to_string(), "30".to_string()),
            ("location".to_string(), "Paris".to_string()),
            ("has".to_string(), "dog".to_string()),
        ];
        let s = synthesis(
            PathwayKind::Personal,
            0.6,
            Some(PathwayData::PersonalFacts { facts, matched: false }),
        );
        let text = render(&s).text;
        assert!(text.contains("location: Paris"));
        assert!(!text.contains("dog"));
    }

    #[test]
    fn personal_acknowledges_just_learned_facts_and_invites_when_empty() {
        let mut s = synthesis(PathwayKind::Personal, 0.95, None);
        s.learned = vec![("name".into(), "Jordan".into())];
        s.user_name = Some("Jordan".into());
        assert_eq!(render(&s).text, "Jordan, I'll remember that your name is Jordan.");

        let s = synthesis(
            PathwayKind::Personal,
            0.3,
            Some(PathwayData::PersonalFacts { facts: vec![], matched: false }),
        );
        assert!(render(&s).text.contains("Tell me about yourself"));
    }

    #[test]
    fn name_prefix_lowercases_first_letter() {
        let mut s = synthesis(
            PathwayKind::Conversational,
            0.6,
            Some(PathwayData::Conversation { reply: "Hello there!".into() }),
        );
        s.user_name = Some("Sam".into());
        assert_eq!(render(&s).text, "Sam, hello there!");
    }
}
