use serde::{Deserialize, Serialize};

/// Append-only list of human-readable reasoning steps for one query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReasoningTrace {
    steps: Vec<String>,
}

impl ReasoningTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: impl Into<String>) {
        self.steps.push(step.into());
    }

    /// Appends every step of `other`, each prefixed with `[label] `.
    pub fn extend_labeled(&mut self, label: &str, other: &ReasoningTrace) {
        self.steps
            .extend(other.steps.iter().map(|s| format!("[{}] {}", label, s)));
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn into_steps(self) -> Vec<String> {
        self.steps
    }
}
