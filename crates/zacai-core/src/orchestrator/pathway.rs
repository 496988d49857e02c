//! Pathway result model shared by every executor.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::classifier::Features;
use super::trace::ReasoningTrace;
use crate::knowledge::KnowledgeStore;
use crate::learning::LearnEvent;
use crate::shared::AssistantSettings;

/// Domain-specific resolution strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathwayKind {
    Mathematical,
    Factual,
    Personal,
    Conversational,
}

impl PathwayKind {
    pub fn name(&self) -> &'static str {
        match self {
            PathwayKind::Mathematical => "mathematical",
            PathwayKind::Factual => "factual",
            PathwayKind::Personal => "personal",
            PathwayKind::Conversational => "conversational",
        }
    }

    /// Base confidence weight from the routing table.
    pub fn base_weight(&self) -> f32 {
        match self {
            PathwayKind::Mathematical => 0.9,
            PathwayKind::Factual => 0.8,
            PathwayKind::Personal => 0.7,
            PathwayKind::Conversational => 0.6,
        }
    }
}

impl fmt::Display for PathwayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tier that answered a vocabulary/facts query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Seed,
    Learned,
    External,
}

/// Payload carried by a useful pathway result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PathwayData {
    Calculation {
        expression: String,
        result: f64,
        steps: Vec<String>,
    },
    /// Structurally recognized but undefined (e.g. division by zero). No numeric payload.
    ArithmeticError {
        expression: String,
        reason: String,
    },
    Definition {
        term: String,
        text: String,
        part_of_speech: Option<String>,
        examples: Vec<String>,
        synonyms: Vec<String>,
        antonyms: Vec<String>,
        phonetic: Option<String>,
        forms: Vec<String>,
        tier: Tier,
    },
    Fact {
        topic: String,
        text: String,
        related_topics: Vec<String>,
        tier: Tier,
    },
    PersonalFacts {
        facts: Vec<(String, String)>,
        /// True when at least one fact overlapped the query.
        matched: bool,
    },
    Conversation {
        reply: String,
    },
}

/// Outcome of one pathway execution.
#[derive(Debug, Clone, PartialEq)]
pub struct PathwayResult {
    pub pathway: PathwayKind,
    pub confidence: f32,
    pub data: Option<PathwayData>,
    pub trace: ReasoningTrace,
    /// Learn proposals applied by the orchestrator after rendering.
    pub learn: Vec<LearnEvent>,
}

impl PathwayResult {
    pub fn new(pathway: PathwayKind, confidence: f32, data: Option<PathwayData>) -> Self {
        Self {
            pathway,
            confidence: confidence.clamp(0.0, 1.0),
            data,
            trace: ReasoningTrace::new(),
            learn: Vec::new(),
        }
    }

    /// A result signalling "nothing usable".
    pub fn miss(pathway: PathwayKind, confidence: f32) -> Self {
        Self::new(pathway, confidence, None)
    }

    pub fn with_trace(mut self, trace: ReasoningTrace) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_learn(mut self, events: Vec<LearnEvent>) -> Self {
        self.learn = events;
        self
    }

    /// Zero confidence or no data.
    pub fn is_miss(&self) -> bool {
        self.confidence <= 0.0 || self.data.is_none()
    }
}

/// Read-only view handed to each pathway.
pub struct PathwayContext<'a> {
    pub text: &'a str,
    pub features: &'a Features,
    pub store: &'a KnowledgeStore,
    /// Results of pathways that already ran for this query, in router order.
    pub prior: &'a [PathwayResult],
    pub settings: &'a AssistantSettings,
}
