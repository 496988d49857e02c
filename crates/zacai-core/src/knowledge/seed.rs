//! Curated seed knowledge merged into every store at startup.
//!
//! Seeds are merged after persisted data is loaded, so learned enrichment survives and
//! seed payloads stay authoritative. Re-running the bootstrap is a no-op.

use super::entry::{Category, Enrichment, EntryPayload, KnowledgeEntry, Source};
use super::store::{KnowledgeStore, MergeOutcome};

const SEED_CONFIDENCE: f32 = 0.95;

/// Fixed timestamp so repeated bootstraps produce identical entries.
const SEED_TIMESTAMP: i64 = 0;

struct SeedWord {
    word: &'static str,
    part_of_speech: &'static str,
    definition: &'static str,
    example: &'static str,
    synonyms: &'static [&'static str],
}

const SEED_WORDS: &[SeedWord] = &[
    SeedWord {
        word: "hello",
        part_of_speech: "interjection",
        definition: "Used as a greeting or to begin a conversation.",
        example: "Hello, how are you today?",
        synonyms: &["hi", "greetings"],
    },
    SeedWord {
        word: "knowledge",
        part_of_speech: "noun",
        definition: "Facts, information, and skills acquired through experience or education.",
        example: "She has a deep knowledge of history.",
        synonyms: &["understanding", "learning", "expertise"],
    },
    SeedWord {
        word: "learn",
        part_of_speech: "verb",
        definition: "To gain knowledge or skill by studying, practising, being taught, or experiencing something.",
        example: "Children learn quickly.",
        synonyms: &["study", "master", "acquire"],
    },
    SeedWord {
        word: "happy",
        part_of_speech: "adjective",
        definition: "Feeling or showing pleasure or contentment.",
        example: "I am happy to help.",
        synonyms: &["cheerful", "glad", "joyful"],
    },
    SeedWord {
        word: "computer",
        part_of_speech: "noun",
        definition: "An electronic device for storing and processing data according to instructions given to it in a program.",
        example: "The computer finished the calculation in a second.",
        synonyms: &["machine", "processor"],
    },
    SeedWord {
        word: "language",
        part_of_speech: "noun",
        definition: "The method of human communication, spoken or written, consisting of the use of words in a structured way.",
        example: "English is a widely spoken language.",
        synonyms: &["tongue", "speech"],
    },
    SeedWord {
        word: "friend",
        part_of_speech: "noun",
        definition: "A person with whom one has a bond of mutual affection.",
        example: "He is my best friend.",
        synonyms: &["companion", "ally"],
    },
    SeedWord {
        word: "remember",
        part_of_speech: "verb",
        definition: "To have in or be able to bring to one's mind an awareness of someone or something from the past.",
        example: "I remember your name.",
        synonyms: &["recall", "recollect"],
    },
    SeedWord {
        word: "question",
        part_of_speech: "noun",
        definition: "A sentence worded or expressed so as to elicit information.",
        example: "Ask me a question.",
        synonyms: &["query", "inquiry"],
    },
    SeedWord {
        word: "calculate",
        part_of_speech: "verb",
        definition: "To determine the amount or number of something mathematically.",
        example: "Calculate the total cost.",
        synonyms: &["compute", "work out"],
    },
];

const SEED_FACTS: &[(&str, &str, &str, &[&str])] = &[
    (
        "photosynthesis",
        "science",
        "Photosynthesis is the process by which green plants use sunlight, water and carbon dioxide to make glucose and release oxygen.",
        &["chlorophyll", "plants"],
    ),
    (
        "gravity",
        "science",
        "Gravity is the force by which objects with mass attract one another; on Earth it accelerates falling objects at about 9.8 m/s².",
        &["mass", "isaac newton"],
    ),
    (
        "water",
        "science",
        "Water is a compound of hydrogen and oxygen (H2O); it boils at 100 °C and freezes at 0 °C at sea level.",
        &["hydrogen", "oxygen"],
    ),
    (
        "sun",
        "astronomy",
        "The Sun is the star at the centre of the Solar System; its light takes about 8 minutes to reach Earth.",
        &["solar system", "star"],
    ),
    (
        "moon",
        "astronomy",
        "The Moon is Earth's only natural satellite and orbits the Earth about every 27.3 days.",
        &["earth", "tides"],
    ),
    (
        "earth",
        "astronomy",
        "Earth is the third planet from the Sun and the only known planet to support life.",
        &["sun", "moon"],
    ),
    (
        "dna",
        "biology",
        "DNA (deoxyribonucleic acid) is the molecule that carries the genetic instructions of living organisms.",
        &["gene", "cell"],
    ),
    (
        "speed of light",
        "physics",
        "The speed of light in a vacuum is 299,792,458 metres per second.",
        &["physics", "relativity"],
    ),
];

const SEED_CONSTANTS: &[(&str, f64, &str)] = &[
    ("pi", std::f64::consts::PI, "the ratio of a circle's circumference to its diameter"),
    ("e", std::f64::consts::E, "the base of the natural logarithm"),
    ("golden ratio", 1.618_033_988_749_895, "the ratio (1 + √5) / 2"),
];

/// Builds the full seed set.
pub fn seed_entries() -> Vec<KnowledgeEntry> {
    let mut out = Vec::with_capacity(SEED_WORDS.len() + SEED_FACTS.len() + SEED_CONSTANTS.len());

    for w in SEED_WORDS {
        out.push(
            KnowledgeEntry::new(
                Category::Vocabulary,
                w.word,
                "essential",
                EntryPayload::Definition {
                    definition: w.definition.to_string(),
                    part_of_speech: Some(w.part_of_speech.to_string()),
                    examples: vec![w.example.to_string()],
                },
                Source::Seed,
                SEED_CONFIDENCE,
            )
            .with_enrichment(Enrichment {
                synonyms: w.synonyms.iter().map(|s| s.to_string()).collect(),
                ..Enrichment::default()
            })
            .with_timestamp(SEED_TIMESTAMP),
        );
    }

    for (key, tag, text, related) in SEED_FACTS {
        out.push(
            KnowledgeEntry::new(
                Category::Facts,
                key,
                *tag,
                EntryPayload::Fact {
                    text: text.to_string(),
                    related_topics: related.iter().map(|s| s.to_string()).collect(),
                },
                Source::Seed,
                SEED_CONFIDENCE,
            )
            .with_timestamp(SEED_TIMESTAMP),
        );
    }

    for (key, value, description) in SEED_CONSTANTS {
        out.push(
            KnowledgeEntry::new(
                Category::Mathematics,
                key,
                "constant",
                EntryPayload::Constant {
                    value: *value,
                    description: description.to_string(),
                },
                Source::Seed,
                SEED_CONFIDENCE,
            )
            .with_timestamp(SEED_TIMESTAMP),
        );
    }

    out
}

/// Merges the seed set into `store`. Returns the number of entries inserted or updated.
pub fn initialize_seed_knowledge(store: &mut KnowledgeStore) -> usize {
    let changed = seed_entries()
        .into_iter()
        .map(|entry| store.merge(entry))
        .filter(|outcome| *outcome != MergeOutcome::Unchanged)
        .count();
    if changed > 0 {
        tracing::info!(target: "zacai::knowledge", changed, "Seed knowledge merged ({} entries changed)", changed);
    } else {
        tracing::debug!(target: "zacai::knowledge", "Seed knowledge already present");
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_bootstrap_is_idempotent() {
        let mut store = KnowledgeStore::new();
        let first = initialize_seed_knowledge(&mut store);
        assert_eq!(first, seed_entries().len());
        assert_eq!(initialize_seed_knowledge(&mut store), 0);
    }

    #[test]
    fn seeds_are_seed_sourced_and_exclude_algorithm() {
        let mut store = KnowledgeStore::new();
        initialize_seed_knowledge(&mut store);
        assert!(store.get(Category::Vocabulary, "algorithm").is_none());
        let pi = store.get(Category::Mathematics, "pi").unwrap();
        assert_eq!(pi.source, Source::Seed);
        assert!(store.len(Category::Personal) == 0);
    }
}
