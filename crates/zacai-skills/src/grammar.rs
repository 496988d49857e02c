//! Regular English inflection for grammar-form hints.

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// True when the word ends in consonant + `y` ("study", not "play").
fn consonant_y(word: &str) -> bool {
    let mut rev = word.chars().rev();
    matches!((rev.next(), rev.next()), (Some('y'), Some(c)) if !is_vowel(c))
}

fn stem_without_y(word: &str) -> &str {
    &word[..word.len() - 1]
}

/// Plural noun / third-person verb.
pub fn add_s(word: &str) -> String {
    if ["s", "x", "z", "ch", "sh"].iter().any(|end| word.ends_with(end)) {
        format!("{}es", word)
    } else if consonant_y(word) {
        format!("{}ies", stem_without_y(word))
    } else {
        format!("{}s", word)
    }
}

pub fn past_tense(word: &str) -> String {
    if word.ends_with('e') {
        format!("{}d", word)
    } else if consonant_y(word) {
        format!("{}ied", stem_without_y(word))
    } else {
        format!("{}ed", word)
    }
}

pub fn present_participle(word: &str) -> String {
    if word.ends_with('e') && !word.ends_with("ee") && word.len() > 2 {
        format!("{}ing", &word[..word.len() - 1])
    } else {
        format!("{}ing", word)
    }
}

fn with_suffix(word: &str, suffix: &str) -> String {
    if word.ends_with('e') {
        format!("{}{}", word, &suffix[1..])
    } else if consonant_y(word) {
        format!("{}i{}", stem_without_y(word), suffix)
    } else {
        format!("{}{}", word, suffix)
    }
}

/// Labelled grammar forms for `word` given its part of speech (noun when unknown).
pub fn inflect(word: &str, part_of_speech: Option<&str>) -> Vec<String> {
    let word = word.trim().to_lowercase();
    if word.is_empty() || !word.chars().all(|c| c.is_ascii_alphabetic()) {
        return Vec::new();
    }
    match part_of_speech.map(|p| p.to_lowercase()).as_deref() {
        Some("verb") => vec![
            format!("third person: {}", add_s(&word)),
            format!("past: {}", past_tense(&word)),
            format!("present participle: {}", present_participle(&word)),
        ],
        Some("adjective") => vec![
            format!("comparative: {}", with_suffix(&word, "er")),
            format!("superlative: {}", with_suffix(&word, "est")),
        ],
        Some("noun") | None => vec![format!("plural: {}", add_s(&word))],
        Some(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nouns_pluralize() {
        assert_eq!(inflect("algorithm", Some("noun")), vec!["plural: algorithms"]);
        assert_eq!(add_s("box"), "boxes");
        assert_eq!(add_s("city"), "cities");
        assert_eq!(add_s("day"), "days");
    }

    #[test]
    fn verbs_get_three_forms() {
        assert_eq!(
            inflect("study", Some("verb")),
            vec!["third person: studies", "past: studied", "present participle: studying"]
        );
        assert_eq!(past_tense("bake"), "baked");
        assert_eq!(present_participle("bake"), "baking");
        assert_eq!(present_participle("see"), "seeing");
    }

    #[test]
    fn adjectives_compare() {
        assert_eq!(
            inflect("happy", Some("adjective")),
            vec!["comparative: happier", "superlative: happiest"]
        );
        assert_eq!(with_suffix("large", "est"), "largest");
    }

    #[test]
    fn other_parts_of_speech_have_no_forms() {
        assert!(inflect("hello", Some("interjection")).is_empty());
        assert!(inflect("ice cream", None).is_empty());
    }
}
