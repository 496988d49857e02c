//! Lightweight personal fact extractor ("my name is X", "i live in Y").
//!
//! Runs before the pathways; extracted facts are written through the learning manager.

use regex::Regex;
use std::sync::OnceLock;

/// Words that follow "I am" without being a name.
const NOT_A_NAME: [&str; 16] = [
    "fine", "good", "ok", "okay", "great", "happy", "sad", "tired", "here", "back", "sure", "not",
    "so", "very", "just", "doing",
];

const QUESTION_OPENERS: [&str; 12] = [
    "what", "how", "why", "when", "where", "who", "which", "do", "does", "can", "is", "are",
];

enum KeyRule {
    Fixed(&'static str),
    /// Key comes from capture group 1, value from group 2.
    Captured { prefix: &'static str },
}

struct FactRule {
    pattern: &'static str,
    key: KeyRule,
    capitalize: bool,
}

impl FactRule {
    const fn fixed(pattern: &'static str, key: &'static str, capitalize: bool) -> Self {
        Self {
            pattern,
            key: KeyRule::Fixed(key),
            capitalize,
        }
    }

    const fn captured(pattern: &'static str, prefix: &'static str) -> Self {
        Self {
            pattern,
            key: KeyRule::Captured { prefix },
            capitalize: false,
        }
    }
}

const RULES: [FactRule; 9] = [
    FactRule::fixed(r"(?i)\bmy name is ([a-z][a-z' -]*)", "name", true),
    FactRule::fixed(r"(?i)\bcall me ([a-z][a-z'-]*)", "name", true),
    FactRule::fixed(r"(?i)\bi(?: am|'m) (\d{1,3}) years? old", "age", false),
    FactRule::fixed(r"\b(?:I|i)(?: am|'m) ([A-Z][a-zA-Z'-]*)\s*[.!]?$", "name", true),
    FactRule::fixed(r"(?i)\bi live in ([a-z][a-z .'-]*)", "location", true),
    FactRule::fixed(r"(?i)\bi work as (?:a|an) ([a-z][a-z -]*)", "occupation", false),
    FactRule::captured(r"(?i)\bmy favou?rite ([a-z]+) is ([a-z0-9][a-z0-9 '-]*)", "favorite "),
    FactRule::fixed(r"(?i)\bi have an? ([a-z][a-z -]*)", "has", false),
    FactRule::captured(r"(?i)\bmy ([a-z]+) is ([a-z0-9][a-z0-9 '-]*)", ""),
];

fn compiled() -> &'static [Option<Regex>] {
    static COMPILED: OnceLock<Vec<Option<Regex>>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        RULES
            .iter()
            .map(|r| match Regex::new(r.pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    tracing::error!(
                        target: "zacai::pathway",
                        pattern = r.pattern,
                        error = %e,
                        "Invalid fact pattern"
                    );
                    None
                }
            })
            .collect()
    })
}

fn capitalize_words(value: &str) -> String {
    value
        .split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn clean_value(raw: &str) -> String {
    raw.trim()
        .trim_end_matches(|c: char| c == '.' || c == '!' || c == ',' || c == '\'' || c == '-')
        .trim()
        .to_string()
}

/// Extracts `(key, value)` facts from a statement. Questions yield nothing; each key appears once.
pub fn extract_personal_facts(text: &str) -> Vec<(String, String)> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.ends_with('?') {
        return Vec::new();
    }
    let first = trimmed
        .split(|c: char| !c.is_alphanumeric())
        .find(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .unwrap_or_default();
    if QUESTION_OPENERS.contains(&first.as_str()) {
        return Vec::new();
    }

    let mut facts: Vec<(String, String)> = Vec::new();
    // Clauses keep "my name is Jordan and I live in Paris" from bleeding together.
    for clause in trimmed.split([',', ';']).flat_map(|c| c.split(" and ")) {
        let clause = clause.trim();
        for (rule, re) in RULES.iter().zip(compiled()) {
            let Some(caps) = re.as_ref().and_then(|re| re.captures(clause)) else {
                continue;
            };
            let (key, raw_value) = match rule.key {
                KeyRule::Fixed(key) => (key.to_string(), caps.get(1).map(|m| m.as_str())),
                KeyRule::Captured { prefix } => {
                    let subject = caps.get(1).map(|m| m.as_str().to_lowercase()).unwrap_or_default();
                    (format!("{}{}", prefix, subject), caps.get(2).map(|m| m.as_str()))
                }
            };
            let Some(raw_value) = raw_value else {
                continue;
            };
            let value = clean_value(raw_value);
            if value.is_empty() || key.trim().is_empty() {
                continue;
            }
            if key == "name" && NOT_A_NAME.contains(&value.to_lowercase().as_str()) {
                continue;
            }
            let value = if rule.capitalize { capitalize_words(&value) } else { value };
            if !facts.iter().any(|(k, _)| *k == key) {
                facts.push((key, value));
            }
            // first matching rule wins for this clause
            break;
        }
    }
    facts
}
