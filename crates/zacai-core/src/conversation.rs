//! Bounded conversation log.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::shared::now_ms;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One exchange half. Only `feedback` changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources_used: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<bool>,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: Role::User,
            content: content.into(),
            timestamp: now_ms(),
            confidence: None,
            sources_used: Vec::new(),
            trace: Vec::new(),
            feedback: None,
        }
    }

    pub fn assistant(
        content: impl Into<String>,
        confidence: f32,
        sources_used: Vec<String>,
        trace: Vec<String>,
    ) -> Self {
        Self {
            role: Role::Assistant,
            confidence: Some(confidence),
            sources_used,
            trace,
            ..Self::user(content)
        }
    }
}

/// In-memory log capped at `capacity` turns; the oldest turn is evicted first.
#[derive(Debug, Clone)]
pub struct ConversationLog {
    turns: VecDeque<ConversationTurn>,
    capacity: usize,
}

impl ConversationLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        while self.turns.len() >= self.capacity {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
    }

    /// Sets the feedback flag on an assistant turn. Returns false for unknown ids.
    pub fn set_feedback(&mut self, turn_id: &str, helpful: bool) -> bool {
        match self
            .turns
            .iter_mut()
            .find(|t| t.id == turn_id && t.role == Role::Assistant)
        {
            Some(turn) => {
                turn.feedback = Some(helpful);
                true
            }
            None => false,
        }
    }

    pub fn turns(&self) -> Vec<ConversationTurn> {
        self.turns.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
