//! Lookup collaborator contracts (dictionary, encyclopedia).
//!
//! Concrete network clients live in `zacai-skills`; the core only depends on these traits.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::error::LookupError;

/// One dictionary hit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub word: String,
    pub part_of_speech: Option<String>,
    pub definition: String,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub antonyms: Vec<String>,
    pub phonetic: Option<String>,
    pub etymology: Option<String>,
}

/// One encyclopedia summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncyclopediaArticle {
    pub title: String,
    pub extract: String,
    pub category: String,
    #[serde(default)]
    pub related_topics: Vec<String>,
}

#[async_trait::async_trait]
pub trait DictionaryLookup: Send + Sync {
    fn name(&self) -> &str;

    async fn define(&self, word: &str) -> Result<DictionaryEntry, LookupError>;
}

#[async_trait::async_trait]
pub trait EncyclopediaLookup: Send + Sync {
    fn name(&self) -> &str;

    /// Summary for `topic`; implementations may fall back to search-then-fetch.
    async fn summarize(&self, topic: &str) -> Result<EncyclopediaArticle, LookupError>;
}

/// Runs a lookup under a soft timeout; expiry becomes [`LookupError::Timeout`].
pub async fn with_soft_timeout<T, F>(timeout: Duration, fut: F) -> Result<T, LookupError>
where
    F: Future<Output = Result<T, LookupError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(LookupError::Timeout(timeout.as_millis() as u64)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn soft_timeout_converts_expiry_into_error() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, LookupError>(1)
        };
        let result = with_soft_timeout(Duration::from_millis(10), slow).await;
        assert_eq!(result, Err(LookupError::Timeout(10)));

        let fast = async { Ok::<_, LookupError>(7) };
        assert_eq!(with_soft_timeout(Duration::from_secs(1), fast).await, Ok(7));
    }
}
