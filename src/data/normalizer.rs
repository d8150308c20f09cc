// ============================================================
// Layer 4: Answer Text Normaliser
// ============================================================
// Decides when two answer strings are "the same answer" for
// sampling purposes, the way QA evaluation scripts compare
// predictions with gold answers:
//
//   "The Beatles"  → "beatles"
//   "beatles!"     → "beatles"
//   "  A  Tale "   → "tale"
//
// Steps (in order):
//   1. Lower-case
//   2. Drop ASCII punctuation
//   3. Drop the articles "a", "an", "the" as whole words
//   4. Collapse runs of whitespace, trim the ends
//
// Corpus draws use this so that "The Beatles" is never offered
// as a substitute for "Beatles".
//
// Reference: Rust Book §8 (Strings in Rust)
//            SQuAD v1.1 official evaluation script

pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalise one answer string
    pub fn normalize(&self, text: &str) -> String {
        // ── Steps 1 & 2: lower-case, strip punctuation ───────────────────────
        let stripped: String = text
            .chars()
            .flat_map(char::to_lowercase)
            .filter(|c| !c.is_ascii_punctuation())
            .collect();

        // ── Steps 3 & 4: drop articles, re-join on single spaces ─────────────
        stripped
            .split_whitespace()
            .filter(|w| !matches!(*w, "a" | "an" | "the"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_strips_punctuation() {
        let n = Normalizer::new();
        assert_eq!(n.normalize("Paris!"), "paris");
        assert_eq!(n.normalize("U.S.A."), "usa");
    }

    #[test]
    fn test_drops_articles_as_words_only() {
        let n = Normalizer::new();
        assert_eq!(n.normalize("The Beatles"), "beatles");
        // "an" inside a word survives
        assert_eq!(n.normalize("Anne of the Island"), "anne of island");
    }

    #[test]
    fn test_collapses_whitespace() {
        let n = Normalizer::new();
        assert_eq!(n.normalize("  A   Tale \n of Two "), "tale of two");
    }

    #[test]
    fn test_article_variants_collide() {
        let n = Normalizer::new();
        assert_eq!(n.normalize("The Beatles"), n.normalize("beatles"));
        assert_ne!(n.normalize("Paris"), n.normalize("Lyon"));
    }

    #[test]
    fn test_empty_string() {
        assert_eq!(Normalizer::new().normalize(""), "");
    }
}
