//! Knowledge entry model: one record shape per category, with provenance and usage metadata.

use serde::{Deserialize, Serialize};

use crate::shared::now_ms;

/// Internal tree names for the four categories.
const TREE_NAMES: [&str; 4] = ["vocabulary", "mathematics", "facts", "personal"];

/// Human-readable labels for the four categories.
pub const CATEGORY_LABELS: [&str; 4] = [
    "Vocabulary (Words)",
    "Mathematics (Calculations)",
    "Facts (General Knowledge)",
    "Personal (About You)",
];

/// Knowledge category enum for type-safe collection references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Vocabulary = 1,
    Mathematics = 2,
    Facts = 3,
    Personal = 4,
}

impl Category {
    /// Zero-based index into per-category arrays.
    #[inline]
    pub fn index(&self) -> usize {
        *self as usize - 1
    }

    #[inline]
    pub fn label(&self) -> &'static str {
        CATEGORY_LABELS[self.index()]
    }

    /// Returns the tree/segment name used by persistent stores.
    #[inline]
    pub fn tree_name(&self) -> &'static str {
        TREE_NAMES[self.index()]
    }

    /// Returns all categories in order.
    pub fn all() -> [Self; 4] {
        [Self::Vocabulary, Self::Mathematics, Self::Facts, Self::Personal]
    }
}

/// Provenance of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Curated, pre-shipped; never downgraded by a later merge.
    Seed,
    /// Acquired from conversation or computation.
    Learned,
    /// Acquired from an external lookup collaborator.
    Online,
}

impl Source {
    pub fn is_seed(&self) -> bool {
        matches!(self, Source::Seed)
    }
}

/// Category-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryPayload {
    Definition {
        definition: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        part_of_speech: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        examples: Vec<String>,
    },
    Calculation {
        expression: String,
        result: f64,
        #[serde(default)]
        steps: Vec<String>,
    },
    Constant {
        value: f64,
        description: String,
    },
    Fact {
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        related_topics: Vec<String>,
    },
    Personal {
        value: String,
    },
}

impl EntryPayload {
    /// Main human-readable text of the payload.
    pub fn text(&self) -> String {
        match self {
            EntryPayload::Definition { definition, .. } => definition.clone(),
            EntryPayload::Calculation { expression, result, .. } => {
                format!("{} = {}", expression, format_number(*result))
            }
            EntryPayload::Constant { value, description } => {
                format!("{} ({})", description, format_number(*value))
            }
            EntryPayload::Fact { text, .. } => text.clone(),
            EntryPayload::Personal { value } => value.clone(),
        }
    }
}

/// Supplementary data attached lazily to an entry (synonyms, phonetics, grammar forms).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Enrichment {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub antonyms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub forms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etymology: Option<String>,
    /// True once the enrichment lookup has been attempted; it is not repeated.
    #[serde(default)]
    pub fetched: bool,
}

impl Enrichment {
    pub fn is_empty(&self) -> bool {
        self.synonyms.is_empty()
            && self.antonyms.is_empty()
            && self.phonetic.is_none()
            && self.forms.is_empty()
            && self.etymology.is_none()
    }

    /// Union with `other`; existing scalar fields win, lists keep first-seen order.
    pub fn absorb(&mut self, other: &Enrichment) {
        union_into(&mut self.synonyms, &other.synonyms);
        union_into(&mut self.antonyms, &other.antonyms);
        union_into(&mut self.forms, &other.forms);
        if self.phonetic.is_none() {
            self.phonetic = other.phonetic.clone();
        }
        if self.etymology.is_none() {
            self.etymology = other.etymology.clone();
        }
        self.fetched |= other.fetched;
    }
}

fn union_into(target: &mut Vec<String>, incoming: &[String]) {
    for item in incoming {
        if !target.iter().any(|t| t.eq_ignore_ascii_case(item)) {
            target.push(item.clone());
        }
    }
}

/// Vocabulary usage counters for mastery tracking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub attempts: u32,
    pub successes: u32,
}

impl Usage {
    /// Success ratio in [0, 1]; 0 when never attempted.
    pub fn mastery(&self) -> f32 {
        if self.attempts == 0 {
            0.0
        } else {
            (self.successes as f32 / self.attempts as f32).clamp(0.0, 1.0)
        }
    }

    pub fn mastery_level(&self) -> &'static str {
        match (self.attempts, self.mastery()) {
            (0, _) => "new",
            (a, m) if a >= 5 && m >= 0.8 => "mastered",
            (a, m) if a >= 3 && m >= 0.6 => "familiar",
            _ => "learning",
        }
    }

    /// Counter-wise maximum; keeps re-imports idempotent.
    pub fn merged(&self, other: &Usage) -> Usage {
        Usage {
            attempts: self.attempts.max(other.attempts),
            successes: self.successes.max(other.successes),
        }
    }
}

/// A single knowledge record. `key` is unique within its category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub key: String,
    pub category: Category,
    /// Domain tag (e.g. "essential", "science", "learned").
    pub tag: String,
    pub payload: EntryPayload,
    pub source: Source,
    pub confidence: f32,
    /// Unix timestamp (ms) of creation or last update.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(default)]
    pub enrichment: Enrichment,
}

impl KnowledgeEntry {
    /// Creates an entry with a normalized key, clamped confidence and the current timestamp.
    pub fn new(
        category: Category,
        key: &str,
        tag: impl Into<String>,
        payload: EntryPayload,
        source: Source,
        confidence: f32,
    ) -> Self {
        Self {
            key: normalize_key(key),
            category,
            tag: tag.into(),
            payload,
            source,
            confidence: confidence.clamp(0.0, 1.0),
            timestamp: now_ms(),
            usage: if category == Category::Vocabulary {
                Some(Usage::default())
            } else {
                None
            },
            enrichment: Enrichment::default(),
        }
    }

    pub fn with_enrichment(mut self, enrichment: Enrichment) -> Self {
        self.enrichment = enrichment;
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn text(&self) -> String {
        self.payload.text()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice(bytes).ok()
    }
}

/// Lowercases, trims and collapses internal whitespace.
pub fn normalize_key(key: &str) -> String {
    key.split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Formats a number without a trailing `.0` for integral values; otherwise up to 6 decimals.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let s = format!("{:.6}", value);
        let s = s.trim_end_matches('0').trim_end_matches('.');
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_key_collapses_case_and_whitespace() {
        assert_eq!(normalize_key("  Solar   System "), "solar system");
    }

    #[test]
    fn format_number_trims_integral_and_trailing_zeros() {
        assert_eq!(format_number(12.0), "12");
        assert_eq!(format_number(-4.0), "-4");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(1.0 / 3.0), "0.333333");
    }

    #[test]
    fn enrichment_absorb_is_idempotent() {
        let mut a = Enrichment {
            synonyms: vec!["glad".into()],
            phonetic: Some("/ˈhæpi/".into()),
            ..Enrichment::default()
        };
        let b = Enrichment {
            synonyms: vec!["Glad".into(), "joyful".into()],
            phonetic: Some("other".into()),
            fetched: true,
            ..Enrichment::default()
        };
        a.absorb(&b);
        let once = a.clone();
        a.absorb(&b);
        assert_eq!(a, once);
        assert_eq!(a.synonyms, vec!["glad".to_string(), "joyful".to_string()]);
        assert_eq!(a.phonetic.as_deref(), Some("/ˈhæpi/"));
        assert!(a.fetched);
    }

    #[test]
    fn usage_mastery_levels() {
        assert_eq!(Usage::default().mastery_level(), "new");
        let u = Usage { attempts: 5, successes: 5 };
        assert_eq!(u.mastery_level(), "mastered");
        let u = Usage { attempts: 3, successes: 2 };
        assert_eq!(u.mastery_level(), "familiar");
        let u = Usage { attempts: 2, successes: 0 };
        assert_eq!(u.mastery_level(), "learning");
    }

    #[test]
    fn entry_roundtrips_through_bytes() {
        let entry = KnowledgeEntry::new(
            Category::Facts,
            "Gravity",
            "science",
            EntryPayload::Fact { text: "Objects attract.".into(), related_topics: vec![] },
            Source::Seed,
            0.95,
        );
        assert_eq!(entry.key, "gravity");
        assert!(entry.usage.is_none());
        let back = KnowledgeEntry::from_bytes(&entry.to_bytes()).unwrap();
        assert_eq!(back, entry);
    }
}
