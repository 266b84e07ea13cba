//! Entity extraction from free text

use std::sync::LazyLock;

use regex::Regex;

static CAPITALIZED_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*\b").expect("valid entity regex")
});

/// Finds entity mentions in text
pub trait EntityExtractor: Send + Sync {
    /// Every mention, in order of appearance; repeats are kept
    fn extract(&self, text: &str) -> Vec<String>;
}

/// Treats runs of capitalized words as entities
///
/// Crude: sentence-initial words count too.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapitalizedPhraseExtractor;

impl EntityExtractor for CapitalizedPhraseExtractor {
    fn extract(&self, text: &str) -> Vec<String> {
        CAPITALIZED_PHRASE
            .find_iter(text)
            .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_capitalized_runs() {
        let found = CapitalizedPhraseExtractor.extract("We met Acme Corp and then Acme Corp met Jane in Paris.");
        assert_eq!(found, vec!["We", "Acme Corp", "Acme Corp", "Jane", "Paris"]);
    }

    #[test]
    fn test_ignores_lowercase_and_acronyms() {
        assert!(CapitalizedPhraseExtractor.extract("all lowercase words").is_empty());
        assert!(CapitalizedPhraseExtractor.extract("HTML CSS").is_empty());
    }
}
