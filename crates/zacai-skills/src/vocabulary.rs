//! Vocabulary / facts pathway: seed store → learned store → external lookup.

use std::sync::Arc;
use zacai_core::{
    format_number, tokenize, with_soft_timeout, Category, DictionaryEntry, DictionaryLookup,
    EncyclopediaLookup, Enrichment, EntryPayload, KnowledgeEntry, LearnEvent, Pathway,
    PathwayContext, PathwayData, PathwayKind, PathwayResult, ReasoningTrace, Source, Tier,
};

use crate::grammar::inflect;

/// Confidence of an external lookup hit.
pub const EXTERNAL_CONFIDENCE: f32 = 0.8;
/// Confidence when every tier missed.
pub const MISS_CONFIDENCE: f32 = 0.15;
/// Minimum ranking score for a free-text fact match.
const MIN_RANK_SCORE: f32 = 0.5;

const SEED_BAND: (f32, f32) = (0.9, 0.95);
const LEARNED_BAND: (f32, f32) = (0.85, 0.9);

/// Words dropped when extracting the looked-up term.
const STOP_WORDS: &[&str] = &[
    "what", "whats", "s", "is", "are", "was", "were", "the", "a", "an", "of", "does", "do", "did",
    "mean", "means", "meaning", "define", "definition", "tell", "me", "about", "explain", "who",
    "how", "to", "you", "can", "could", "please", "word", "for", "give", "show", "by", "in", "on",
    "synonym", "synonyms", "antonym", "antonyms", "opposite", "similar", "another", "pronounce",
    "pronunciation", "phonetic", "plural", "tense", "grammar", "form", "forms", "conjugate",
    "which", "where", "when", "why", "know", "term", "i", "say", "it",
];

/// Supplementary data a query asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hint {
    Synonyms,
    Antonyms,
    Phonetics,
    Grammar,
}

/// Hints derived from the raw query text.
pub fn query_hints(text: &str) -> Vec<Hint> {
    let lower = text.to_lowercase();
    let mut hints = Vec::new();
    if ["synonym", "similar", "another word"].iter().any(|k| lower.contains(k)) {
        hints.push(Hint::Synonyms);
    }
    if ["antonym", "opposite"].iter().any(|k| lower.contains(k)) {
        hints.push(Hint::Antonyms);
    }
    if ["pronounc", "phonetic"].iter().any(|k| lower.contains(k)) {
        hints.push(Hint::Phonetics);
    }
    if ["plural", "tense", "grammar", "forms", "conjugat"].iter().any(|k| lower.contains(k)) {
        hints.push(Hint::Grammar);
    }
    hints
}

/// The subject of the query with question and hint words removed.
pub fn extract_term(text: &str) -> String {
    tokenize(text)
        .into_iter()
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Knowledge entry that answered the query, with its ranking score.
struct Candidate {
    entry: KnowledgeEntry,
    score: f32,
}

impl Candidate {
    fn tier(&self) -> Tier {
        if self.entry.source.is_seed() {
            Tier::Seed
        } else {
            Tier::Learned
        }
    }

    fn confidence(&self) -> f32 {
        let (lo, hi) = match self.tier() {
            Tier::Seed => SEED_BAND,
            _ => LEARNED_BAND,
        };
        (self.entry.confidence.clamp(lo, hi) - (1.0 - self.score) * 0.1).clamp(0.0, 1.0)
    }
}

/// Vocabulary and general-knowledge pathway.
pub struct VocabularyPathway {
    dictionary: Option<Arc<dyn DictionaryLookup>>,
    encyclopedia: Option<Arc<dyn EncyclopediaLookup>>,
}

impl VocabularyPathway {
    /// Offline pathway: tiers 1 and 2 only.
    pub fn new() -> Self {
        Self {
            dictionary: None,
            encyclopedia: None,
        }
    }

    pub fn with_dictionary(mut self, dictionary: Arc<dyn DictionaryLookup>) -> Self {
        self.dictionary = Some(dictionary);
        self
    }

    pub fn with_encyclopedia(mut self, encyclopedia: Arc<dyn EncyclopediaLookup>) -> Self {
        self.encyclopedia = Some(encyclopedia);
        self
    }

    /// Exact key across vocabulary, facts and mathematics, then ranked facts.
    fn stored_candidates(&self, ctx: &PathwayContext<'_>, term: &str) -> Vec<Candidate> {
        let mut out: Vec<Candidate> = [Category::Vocabulary, Category::Facts, Category::Mathematics]
            .into_iter()
            .filter_map(|c| ctx.store.get(c, term))
            .map(|entry| Candidate { entry, score: 1.0 })
            .collect();
        let words: Vec<String> = term.split_whitespace().map(str::to_string).collect();
        for ranked in ctx.store.rank_facts(&words) {
            if ranked.score < MIN_RANK_SCORE {
                break;
            }
            if out.iter().all(|c| c.entry.key != ranked.entry.key) {
                out.push(Candidate { entry: ranked.entry, score: ranked.score });
            }
        }
        out
    }

    /// Builds the pathway payload for a stored entry, attaching the hinted enrichments.
    fn data_from_entry(entry: &KnowledgeEntry, tier: Tier, hints: &[Hint], forms: &[String]) -> PathwayData {
        match &entry.payload {
            EntryPayload::Definition { definition, part_of_speech, examples } => {
                let e = &entry.enrichment;
                PathwayData::Definition {
                    term: entry.key.clone(),
                    text: definition.clone(),
                    part_of_speech: part_of_speech.clone(),
                    examples: examples.clone(),
                    synonyms: if hints.contains(&Hint::Synonyms) { e.synonyms.clone() } else { Vec::new() },
                    antonyms: if hints.contains(&Hint::Antonyms) { e.antonyms.clone() } else { Vec::new() },
                    phonetic: if hints.contains(&Hint::Phonetics) { e.phonetic.clone() } else { None },
                    forms: if hints.contains(&Hint::Grammar) { forms.to_vec() } else { Vec::new() },
                    tier,
                }
            }
            EntryPayload::Fact { text, related_topics } => PathwayData::Fact {
                topic: entry.key.clone(),
                text: text.clone(),
                related_topics: related_topics.clone(),
                tier,
            },
            EntryPayload::Constant { value, description } => PathwayData::Fact {
                topic: entry.key.clone(),
                text: format!(
                    "{} is {}, approximately {}.",
                    capitalize(&entry.key),
                    description,
                    format_number(*value)
                ),
                related_topics: Vec::new(),
                tier,
            },
            other => PathwayData::Fact {
                topic: entry.key.clone(),
                text: other.text(),
                related_topics: Vec::new(),
                tier,
            },
        }
    }

    /// Fetches missing hinted enrichment once per entry and derives grammar forms locally.
    async fn enrich(
        &self,
        ctx: &PathwayContext<'_>,
        entry: &mut KnowledgeEntry,
        hints: &[Hint],
        trace: &mut ReasoningTrace,
        learn: &mut Vec<LearnEvent>,
    ) {
        if entry.category != Category::Vocabulary || hints.is_empty() {
            return;
        }
        let e = &entry.enrichment;
        let missing = hints.iter().any(|h| match h {
            Hint::Synonyms => e.synonyms.is_empty(),
            Hint::Antonyms => e.antonyms.is_empty(),
            Hint::Phonetics => e.phonetic.is_none(),
            Hint::Grammar => false,
        });

        let mut added = Enrichment::default();
        if missing && !e.fetched {
            if let Some(dictionary) = &self.dictionary {
                let fetched =
                    with_soft_timeout(ctx.settings.lookup_timeout, dictionary.define(&entry.key)).await;
                match fetched {
                    Ok(hit) => {
                        trace.push(format!(
                            "Fetched enrichment for '{}' from {}",
                            entry.key,
                            dictionary.name()
                        ));
                        added.synonyms = hit.synonyms;
                        added.antonyms = hit.antonyms;
                        added.phonetic = hit.phonetic;
                        added.etymology = hit.etymology;
                    }
                    Err(e) => trace.push(format!("Enrichment lookup failed: {}", e)),
                }
                added.fetched = true;
            }
        }

        if hints.contains(&Hint::Grammar) && entry.enrichment.forms.is_empty() {
            let part_of_speech = match &entry.payload {
                EntryPayload::Definition { part_of_speech, .. } => part_of_speech.as_deref(),
                _ => None,
            };
            added.forms = inflect(&entry.key, part_of_speech);
            if !added.forms.is_empty() {
                trace.push(format!("Derived grammar forms for '{}'", entry.key));
            }
        }

        if added != Enrichment::default() {
            entry.enrichment.absorb(&added);
            learn.push(LearnEvent::Enrich {
                category: entry.category,
                key: entry.key.clone(),
                enrichment: added,
            });
        }
    }

    /// Tier 3: dictionary for single words, then encyclopedia.
    async fn external(
        &self,
        ctx: &PathwayContext<'_>,
        term: &str,
        hints: &[Hint],
        trace: &mut ReasoningTrace,
    ) -> Option<(PathwayData, Vec<LearnEvent>)> {
        let timeout = ctx.settings.lookup_timeout;

        if let Some(dictionary) = self.dictionary.as_ref().filter(|_| !term.contains(' ')) {
            match with_soft_timeout(timeout, dictionary.define(term)).await {
                Ok(hit) => {
                    trace.push(format!("Tier 3: {} defined '{}'", dictionary.name(), term));
                    return Some(Self::from_dictionary(term, hit, hints));
                }
                Err(e) => {
                    tracing::debug!(target: "zacai::lookup", term, error = %e, "Dictionary miss");
                    trace.push(format!("Tier 3: dictionary miss ({})", e));
                }
            }
        }

        if let Some(encyclopedia) = &self.encyclopedia {
            match with_soft_timeout(timeout, encyclopedia.summarize(term)).await {
                Ok(article) if !article.extract.trim().is_empty() => {
                    trace.push(format!("Tier 3: {} summarized '{}'", encyclopedia.name(), article.title));
                    let data = PathwayData::Fact {
                        topic: article.title.clone(),
                        text: article.extract.clone(),
                        related_topics: article.related_topics.clone(),
                        tier: Tier::External,
                    };
                    let learn = vec![LearnEvent::Fact {
                        topic: term.to_string(),
                        article,
                        source: Source::Online,
                        confidence: EXTERNAL_CONFIDENCE,
                    }];
                    return Some((data, learn));
                }
                Ok(_) => trace.push("Tier 3: encyclopedia returned an empty summary"),
                Err(e) => {
                    tracing::debug!(target: "zacai::lookup", term, error = %e, "Encyclopedia miss");
                    trace.push(format!("Tier 3: encyclopedia miss ({})", e));
                }
            }
        }
        None
    }

    fn from_dictionary(term: &str, hit: DictionaryEntry, hints: &[Hint]) -> (PathwayData, Vec<LearnEvent>) {
        let forms = if hints.contains(&Hint::Grammar) {
            inflect(term, hit.part_of_speech.as_deref())
        } else {
            Vec::new()
        };
        let data = PathwayData::Definition {
            term: term.to_string(),
            text: hit.definition.clone(),
            part_of_speech: hit.part_of_speech.clone(),
            examples: hit.examples.clone(),
            synonyms: if hints.contains(&Hint::Synonyms) { hit.synonyms.clone() } else { Vec::new() },
            antonyms: if hints.contains(&Hint::Antonyms) { hit.antonyms.clone() } else { Vec::new() },
            phonetic: if hints.contains(&Hint::Phonetics) { hit.phonetic.clone() } else { None },
            forms: forms.clone(),
            tier: Tier::External,
        };
        let mut learn = vec![LearnEvent::Definition {
            entry: DictionaryEntry { word: term.to_string(), ..hit },
            source: Source::Online,
            confidence: EXTERNAL_CONFIDENCE,
        }];
        if !forms.is_empty() {
            learn.push(LearnEvent::Enrich {
                category: Category::Vocabulary,
                key: term.to_string(),
                enrichment: Enrichment { forms, ..Enrichment::default() },
            });
        }
        learn.push(LearnEvent::Usage { key: term.to_string(), success: true });
        (data, learn)
    }
}

impl Default for VocabularyPathway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Pathway for VocabularyPathway {
    fn kind(&self) -> PathwayKind {
        PathwayKind::Factual
    }

    async fn execute(&self, ctx: &PathwayContext<'_>) -> PathwayResult {
        let mut trace = ReasoningTrace::new();
        let term = extract_term(ctx.text);
        if term.is_empty() || term.chars().any(|c| c.is_ascii_digit()) {
            trace.push("No lookup term found");
            return PathwayResult::miss(PathwayKind::Factual, MISS_CONFIDENCE).with_trace(trace);
        }
        let hints = query_hints(ctx.text);
        if hints.is_empty() {
            trace.push(format!("Looking up '{}'", term));
        } else {
            trace.push(format!("Looking up '{}' with hints {:?}", term, hints));
        }

        let candidates = self.stored_candidates(ctx, &term);
        let chosen = candidates
            .iter()
            .position(|c| c.tier() == Tier::Seed)
            .or(if candidates.is_empty() { None } else { Some(0) });

        if let Some(index) = chosen {
            let candidate = &candidates[index];
            let tier = candidate.tier();
            let confidence = candidate.confidence();
            let mut entry = candidate.entry.clone();
            trace.push(format!(
                "Tier {}: found '{}' in {} (score {:.2})",
                if tier == Tier::Seed { 1 } else { 2 },
                entry.key,
                entry.category.tree_name(),
                candidate.score
            ));

            let mut learn = Vec::new();
            self.enrich(ctx, &mut entry, &hints, &mut trace, &mut learn).await;
            if entry.category == Category::Vocabulary {
                learn.push(LearnEvent::Usage { key: entry.key.clone(), success: true });
                if let Some(usage) = entry.usage {
                    trace.push(format!("Mastery: {}", usage.mastery_level()));
                }
            }
            let data = Self::data_from_entry(&entry, tier, &hints, &entry.enrichment.forms);
            return PathwayResult::new(PathwayKind::Factual, confidence, Some(data))
                .with_trace(trace)
                .with_learn(learn);
        }
        trace.push("Tiers 1-2: nothing stored");

        match self.external(ctx, &term, &hints, &mut trace).await {
            Some((data, learn)) => PathwayResult::new(PathwayKind::Factual, EXTERNAL_CONFIDENCE, Some(data))
                .with_trace(trace)
                .with_learn(learn),
            None => {
                trace.push("All tiers missed");
                PathwayResult::miss(PathwayKind::Factual, MISS_CONFIDENCE).with_trace(trace)
            }
        }
    }
}
