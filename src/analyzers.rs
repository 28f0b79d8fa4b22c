//! The tokenization seam.
//!
//! The index does not know how to turn text into terms; it consumes a
//! [`Analyzer`] that produces a bag of `(term, count)` pairs per document.
//! Full filter chains (stemming, stopping, n-grams) live outside this
//! crate. One reference implementation is provided so an index can be
//! built and tested end-to-end: a whitespace splitter with optional
//! lowercasing.

use hashbrown::HashMap;

/// Turns document or query text into term counts.
pub trait Analyzer: Send + Sync {
    /// Tokenizes `text` into a map from term to occurrence count.
    ///
    /// Repeated occurrences of a term within one document are summed.
    fn analyze(&self, text: &str) -> HashMap<String, u64>;
}

/// Splits on Unicode whitespace, optionally lowercasing each token.
#[derive(Debug, Clone)]
pub struct WhitespaceAnalyzer {
    lowercase: bool,
}

impl WhitespaceAnalyzer {
    /// Creates an analyzer that keeps token case.
    pub fn new() -> Self {
        Self { lowercase: false }
    }

    /// Creates an analyzer that lowercases every token.
    pub fn lowercased() -> Self {
        Self { lowercase: true }
    }
}

impl Default for WhitespaceAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for WhitespaceAnalyzer {
    fn analyze(&self, text: &str) -> HashMap<String, u64> {
        let mut counts = HashMap::new();
        for token in text.split_whitespace() {
            let term = if self.lowercase {
                token.to_lowercase()
            } else {
                token.to_string()
            };
            *counts.entry(term).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_repeated_terms() {
        let analyzer = WhitespaceAnalyzer::new();
        let counts = analyzer.analyze("the quick the lazy the");
        assert_eq!(counts.get("the"), Some(&3));
        assert_eq!(counts.get("quick"), Some(&1));
        assert_eq!(counts.get("lazy"), Some(&1));
        assert_eq!(counts.len(), 3);
    }

    #[test]
    fn empty_text_yields_no_terms() {
        let analyzer = WhitespaceAnalyzer::new();
        assert!(analyzer.analyze("").is_empty());
        assert!(analyzer.analyze("   \t\n ").is_empty());
    }

    #[test]
    fn lowercasing_folds_case() {
        let analyzer = WhitespaceAnalyzer::lowercased();
        let counts = analyzer.analyze("Dog dog DOG");
        assert_eq!(counts.get("dog"), Some(&3));
        assert_eq!(counts.len(), 1);
    }
}
