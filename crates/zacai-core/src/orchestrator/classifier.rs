//! Input classifier: cheap lexical features of the raw query.

use serde::{Deserialize, Serialize};

const OPERATOR_GLYPHS: [char; 7] = ['+', '-', '×', '*', '÷', '/', '='];
const QUESTION_WORDS: [&str; 7] = ["what", "how", "why", "when", "where", "who", "which"];
const FIRST_PERSON: [&str; 5] = ["my", "i", "me", "am", "have"];

/// Coarse request type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Mathematics,
    Inquiry,
    Personal,
    Conversation,
}

impl InputKind {
    pub fn name(&self) -> &'static str {
        match self {
            InputKind::Mathematics => "mathematics",
            InputKind::Inquiry => "inquiry",
            InputKind::Personal => "personal",
            InputKind::Conversation => "conversation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Features {
    pub has_numbers: bool,
    pub has_operators: bool,
    pub has_question_word: bool,
    pub has_first_person: bool,
    pub word_count: usize,
    pub operator_count: usize,
    /// Lowercased alphanumeric tokens (apostrophes split: "what's" -> "what", "s").
    pub tokens: Vec<String>,
    pub kind: InputKind,
    pub complexity: f32,
}

impl Features {
    pub fn has_token(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }
}

/// Splits lowercased text into alphanumeric tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Counts operator glyphs, plus `x` used between two digits ("3x3").
fn count_operators(text: &str) -> usize {
    let chars: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    chars
        .iter()
        .enumerate()
        .filter(|&(i, &c)| {
            OPERATOR_GLYPHS.contains(&c)
                || (matches!(c, 'x' | 'X')
                    && i > 0
                    && chars[i - 1].is_ascii_digit()
                    && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit()))
        })
        .count()
}

/// Never fails; empty or garbage input classifies as conversation.
pub fn classify(text: &str) -> Features {
    let tokens = tokenize(text);
    let has_numbers = text.chars().any(|c| c.is_ascii_digit());
    let operator_count = count_operators(text);
    let has_operators = operator_count > 0;
    let has_question_word = tokens.iter().any(|t| QUESTION_WORDS.contains(&t.as_str()));
    let has_first_person = tokens.iter().any(|t| FIRST_PERSON.contains(&t.as_str()));

    let kind = if has_numbers && has_operators {
        InputKind::Mathematics
    } else if has_question_word {
        InputKind::Inquiry
    } else if has_first_person {
        InputKind::Personal
    } else {
        InputKind::Conversation
    };

    let complexity = match kind {
        InputKind::Mathematics => 0.3 + 0.2 * operator_count as f32,
        InputKind::Inquiry => 0.5,
        InputKind::Personal => 0.4,
        InputKind::Conversation => 0.3,
    }
    .min(0.9);

    Features {
        has_numbers,
        has_operators,
        has_question_word,
        has_first_person,
        word_count: text.split_whitespace().count(),
        operator_count,
        tokens,
        kind,
        complexity,
    }
}
