//! Conversational fallback pathway. Always answers, at a fixed modest confidence.

use zacai_core::{
    Pathway, PathwayContext, PathwayData, PathwayKind, PathwayResult, ReasoningTrace,
    GENERIC_ACKNOWLEDGMENT,
};

pub const CONVERSATIONAL_CONFIDENCE: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Small {
    Greeting,
    Thanks,
    Farewell,
    WellBeing,
}

fn detect(tokens: &[String]) -> Option<Small> {
    let has = |w: &str| tokens.iter().any(|t| t == w);
    let phrase = |a: &str, b: &str| tokens.windows(2).any(|p| p[0] == a && p[1] == b);

    if phrase("how", "are") && has("you") {
        Some(Small::WellBeing)
    } else if has("thanks") || has("thank") || has("thx") {
        Some(Small::Thanks)
    } else if has("bye") || has("goodbye") || phrase("see", "you") {
        Some(Small::Farewell)
    } else if ["hello", "hi", "hey", "greetings", "howdy"].iter().any(|w| has(w))
        || phrase("good", "morning")
        || phrase("good", "afternoon")
        || phrase("good", "evening")
    {
        Some(Small::Greeting)
    } else {
        None
    }
}

pub struct ConversationalPathway {
    app_name: String,
}

impl ConversationalPathway {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }

    fn reply(&self, kind: Option<Small>) -> String {
        match kind {
            Some(Small::Greeting) => format!(
                "Hello! I'm {}. Ask me a calculation, a word to define, or tell me about yourself.",
                self.app_name
            ),
            Some(Small::Thanks) => "You're welcome! Anything else I can help with?".to_string(),
            Some(Small::Farewell) => "Goodbye! I'll remember what I learned today.".to_string(),
            Some(Small::WellBeing) => {
                "I'm doing well, thanks for asking! What would you like to talk about?".to_string()
            }
            None => GENERIC_ACKNOWLEDGMENT.to_string(),
        }
    }
}

impl Default for ConversationalPathway {
    fn default() -> Self {
        Self::new("ZacAI")
    }
}

#[async_trait::async_trait]
impl Pathway for ConversationalPathway {
    fn kind(&self) -> PathwayKind {
        PathwayKind::Conversational
    }

    async fn execute(&self, ctx: &PathwayContext<'_>) -> PathwayResult {
        let kind = detect(&ctx.features.tokens);
        let mut trace = ReasoningTrace::new();
        match kind {
            Some(k) => trace.push(format!("Recognized small talk: {:?}", k)),
            None => trace.push("Generic acknowledgment"),
        }
        PathwayResult::new(
            PathwayKind::Conversational,
            CONVERSATIONAL_CONFIDENCE,
            Some(PathwayData::Conversation { reply: self.reply(kind) }),
        )
        .with_trace(trace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zacai_core::tokenize;

    #[test]
    fn small_talk_detection() {
        assert_eq!(detect(&tokenize("Hi there")), Some(Small::Greeting));
        assert_eq!(detect(&tokenize("how are you?")), Some(Small::WellBeing));
        assert_eq!(detect(&tokenize("thank you so much")), Some(Small::Thanks));
        assert_eq!(detect(&tokenize("ok bye")), Some(Small::Farewell));
        assert_eq!(detect(&tokenize("this is a boring sentence")), None);
    }
}
