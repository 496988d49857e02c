//! Dictionary lookup client for the Free Dictionary API (`dictionaryapi.dev` JSON shape).

use serde::Deserialize;
use std::time::Duration;
use zacai_core::{DictionaryEntry, DictionaryLookup, LookupError};

const CLIENT_NAME: &str = "dictionary";
const MAX_LIST: usize = 8;
const MAX_EXAMPLES: usize = 3;

#[derive(Debug, Deserialize)]
struct ApiEntry {
    #[serde(default)]
    word: String,
    #[serde(default)]
    phonetic: Option<String>,
    #[serde(default)]
    phonetics: Vec<ApiPhonetic>,
    #[serde(default)]
    origin: Option<String>,
    #[serde(default)]
    meanings: Vec<ApiMeaning>,
}

#[derive(Debug, Deserialize)]
struct ApiPhonetic {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiMeaning {
    #[serde(default)]
    part_of_speech: Option<String>,
    #[serde(default)]
    definitions: Vec<ApiDefinition>,
    #[serde(default)]
    synonyms: Vec<String>,
    #[serde(default)]
    antonyms: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ApiDefinition {
    #[serde(default)]
    definition: String,
    #[serde(default)]
    example: Option<String>,
    #[serde(default)]
    synonyms: Vec<String>,
    #[serde(default)]
    antonyms: Vec<String>,
}

fn push_unique(target: &mut Vec<String>, items: &[String], cap: usize) {
    for item in items {
        if target.len() >= cap {
            break;
        }
        let item = item.trim();
        if !item.is_empty() && !target.iter().any(|t| t.eq_ignore_ascii_case(item)) {
            target.push(item.to_string());
        }
    }
}

/// Flattens the API response into one entry: first definition of the first meaning,
/// synonyms/antonyms/examples gathered across all meanings.
pub fn parse_dictionary_response(word: &str, body: &str) -> Result<DictionaryEntry, LookupError> {
    let entries: Vec<ApiEntry> =
        serde_json::from_str(body).map_err(|e| LookupError::Parse(e.to_string()))?;
    let first = entries
        .first()
        .ok_or_else(|| LookupError::NotFound(word.to_string()))?;

    let (part_of_speech, definition) = first
        .meanings
        .iter()
        .find_map(|m| {
            m.definitions
                .iter()
                .find(|d| !d.definition.trim().is_empty())
                .map(|d| (m.part_of_speech.clone(), d.definition.trim().to_string()))
        })
        .ok_or_else(|| LookupError::NotFound(word.to_string()))?;

    let mut out = DictionaryEntry {
        word: if first.word.is_empty() { word.to_string() } else { first.word.clone() },
        part_of_speech,
        definition,
        phonetic: first
            .phonetic
            .clone()
            .or_else(|| first.phonetics.iter().find_map(|p| p.text.clone()))
            .filter(|p| !p.trim().is_empty()),
        etymology: first.origin.clone().filter(|o| !o.trim().is_empty()),
        ..DictionaryEntry::default()
    };
    for entry in &entries {
        for meaning in &entry.meanings {
            push_unique(&mut out.synonyms, &meaning.synonyms, MAX_LIST);
            push_unique(&mut out.antonyms, &meaning.antonyms, MAX_LIST);
            for def in &meaning.definitions {
                push_unique(&mut out.synonyms, &def.synonyms, MAX_LIST);
                push_unique(&mut out.antonyms, &def.antonyms, MAX_LIST);
                if let Some(example) = &def.example {
                    push_unique(&mut out.examples, std::slice::from_ref(example), MAX_EXAMPLES);
                }
            }
        }
    }
    Ok(out)
}

/// HTTP dictionary client. `base_url` is the entries endpoint; the word is appended.
pub struct DictionaryClient {
    client: reqwest::Client,
    base_url: String,
}

impl DictionaryClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("ZacAI/0.1 (zacai-skills)")
            .build()
            .map_err(|e| LookupError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait::async_trait]
impl DictionaryLookup for DictionaryClient {
    fn name(&self) -> &str {
        CLIENT_NAME
    }

    async fn define(&self, word: &str) -> Result<DictionaryEntry, LookupError> {
        let word = word.trim().to_lowercase();
        if word.is_empty() || !word.chars().all(|c| c.is_alphabetic() || c == '-' || c == '\'') {
            return Err(LookupError::NotFound(word));
        }
        let url = format!("{}/{}", self.base_url, word);
        let res = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LookupError::Network(e.to_string()))?;
        let status = res.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LookupError::NotFound(word));
        }
        if !status.is_success() {
            return Err(LookupError::Network(format!("HTTP {}", status)));
        }
        let body = res
            .text()
            .await
            .map_err(|e| LookupError::Network(e.to_string()))?;
        let entry = parse_dictionary_response(&word, &body)?;
        tracing::info!(target: "zacai::lookup", word = %word, pos = ?entry.part_of_speech, "Dictionary hit");
        Ok(entry)
    }
}
