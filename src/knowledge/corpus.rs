// ============================================================
// Layer 5: Corpus Answer Index
// ============================================================
// The "corpus" is every gold answer of the dataset currently
// loaded, grouped by answer type:
//
//   PERSON   → ["Marie Curie", "Alan Turing", ...]
//   LOCATION → ["Paris", "Lake Victoria", ...]
//   DATE     → ["1815", "4 July 1776", ...]
//
// Corpus and type-swap substitution draw replacements from
// here, so substitutes keep the answer distribution of the
// dataset itself. The index needs EVERY answer, so it is built
// once, after loading and before the first substitution.
//
// Texts are de-duplicated per type, keeping the first answer
// seen. Types iterate in taxonomy order and answers in input
// order, so the index is identical on every run.

use std::collections::{BTreeMap, HashSet};

use crate::domain::answer_type::AnswerType;
use crate::domain::qa_example::{Answer, QaExample};

#[derive(Debug, Clone, Default)]
pub struct CorpusIndex {
    by_type: BTreeMap<AnswerType, Vec<Answer>>,
}

impl CorpusIndex {
    /// Index the typed gold answers of `examples`
    pub fn build<'a, I>(examples: I) -> Self
    where
        I: IntoIterator<Item = &'a QaExample>,
    {
        let mut by_type: BTreeMap<AnswerType, Vec<Answer>> = BTreeMap::new();
        let mut seen: HashSet<(AnswerType, String)> = HashSet::new();

        for example in examples {
            for answer in &example.gold_answers {
                let Some(answer_type) = answer.answer_type else { continue };
                if !seen.insert((answer_type, answer.text.clone())) {
                    continue;
                }
                // A corpus answer is a template for a replacement, it
                // has no position in any context yet
                let mut template = answer.clone();
                template.spans.clear();
                by_type.entry(answer_type).or_default().push(template);
            }
        }

        let index = Self { by_type };
        tracing::debug!(
            "Corpus index: {} answers over {} types",
            index.len(),
            index.by_type.len()
        );
        index
    }

    /// Answers of one type, in first-seen order
    pub fn answers_of(&self, answer_type: AnswerType) -> &[Answer] {
        self.by_type.get(&answer_type).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every represented type other than `exclude`, in taxonomy order
    pub fn other_types(&self, exclude: AnswerType) -> impl Iterator<Item = AnswerType> + '_ {
        self.by_type.keys().copied().filter(move |t| *t != exclude)
    }

    pub fn len(&self) -> usize {
        self.by_type.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::span::Span;

    fn ex(uid: &str, answers: &[(&str, AnswerType)]) -> QaExample {
        let gold = answers
            .iter()
            .map(|(text, t)| {
                let mut a = Answer::new(*text, vec![Span::new(0, text.chars().count())]);
                a.answer_type = Some(*t);
                a
            })
            .collect();
        QaExample::new(uid, "q", "", gold)
    }

    #[test]
    fn test_groups_and_dedups() {
        let exs = vec![
            ex("1", &[("Paris", AnswerType::Location)]),
            ex("2", &[("Curie", AnswerType::Person), ("Paris", AnswerType::Location)]),
            ex("3", &[("Lyon", AnswerType::Location)]),
        ];
        let idx = CorpusIndex::build(&exs);
        let texts: Vec<&str> = idx
            .answers_of(AnswerType::Location)
            .iter()
            .map(|a| a.text.as_str())
            .collect();
        assert_eq!(texts, vec!["Paris", "Lyon"]);
        assert_eq!(idx.len(), 3);
        assert!(idx.answers_of(AnswerType::Location).iter().all(|a| a.spans.is_empty()));
    }

    #[test]
    fn test_untyped_answers_are_not_indexed() {
        let mut e = ex("1", &[("Paris", AnswerType::Location)]);
        e.gold_answers[0].answer_type = None;
        assert!(CorpusIndex::build(&[e]).is_empty());
    }

    #[test]
    fn test_other_types() {
        let exs = vec![
            ex("1", &[("Paris", AnswerType::Location)]),
            ex("2", &[("Curie", AnswerType::Person), ("1815", AnswerType::Date)]),
        ];
        let idx = CorpusIndex::build(&exs);
        let others: Vec<AnswerType> = idx.other_types(AnswerType::Location).collect();
        assert_eq!(others, vec![AnswerType::Person, AnswerType::Date]);
    }
}
