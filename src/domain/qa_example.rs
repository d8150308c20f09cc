// ============================================================
// Layer 3: QaExample and Answer Domain Types
// ============================================================
// A QA example is a question, a context passage and one or
// more gold answers. Each answer carries its character spans
// in the context plus whatever the annotation stage found:
//
//   Question: "What is the capital of France?"
//   Context:  "Paris is the capital of France. Paris has 2M people."
//   Answer:   "Paris" at [0,5] and [32,37], linked to Q90, GPE
//
// Substitution never mutates an example. It builds a NEW one
// whose answer and context agree again, and records where it
// came from (original_uid, substitution metadata).
//
// Reference: Rajpurkar et al. (2016) SQuAD
//            Longpre et al. (2021) Entity-Based Knowledge Conflicts

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::answer_type::{AnswerType, TypeEvidence};
use crate::domain::entity::{Entity, EntityId};
use crate::domain::errors::SchemaError;
use crate::domain::span::{char_len, CharOffsets, Span};

/// A gold answer with its annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// The raw, unchanged answer text
    pub text: String,

    /// Every [start, end) char span of this answer in the context.
    /// Empty when the answer does not appear in the passage.
    #[serde(default)]
    pub spans: Vec<Span>,

    /// Label from the NER annotator, e.g. "PERSON" or "GPE"
    #[serde(default)]
    pub ner_label: Option<String>,

    /// Entity link from the annotator, e.g. "Q90"
    #[serde(default)]
    pub kb_id: Option<EntityId>,

    #[serde(default)]
    pub wikidata_label: Option<String>,

    #[serde(default)]
    pub aliases: Vec<String>,

    #[serde(default)]
    pub wikidata_types: Vec<String>,

    #[serde(default)]
    pub wikipedia_page: Option<String>,

    #[serde(default)]
    pub popularity: Option<u64>,

    /// Derived by the annotator from ner_label + wikidata_types
    #[serde(default)]
    pub answer_type: Option<AnswerType>,
}

impl Answer {
    /// A bare answer with no annotations
    pub fn new(text: impl Into<String>, spans: Vec<Span>) -> Self {
        Self {
            text:           text.into(),
            spans,
            ner_label:      None,
            kb_id:          None,
            wikidata_label: None,
            aliases:        Vec::new(),
            wikidata_types: Vec::new(),
            wikipedia_page: None,
            popularity:     None,
            answer_type:    None,
        }
    }

    /// A replacement answer that surfaces `text` and is linked to `entity`
    pub fn from_entity(text: impl Into<String>, entity: &Entity) -> Self {
        Self {
            text:           text.into(),
            spans:          Vec::new(),
            ner_label:      None,
            kb_id:          Some(entity.id.clone()),
            wikidata_label: Some(entity.name.clone()),
            aliases:        entity.aliases.clone(),
            wikidata_types: entity.types.clone(),
            wikipedia_page: entity.wikipedia_page.clone(),
            popularity:     Some(entity.popularity),
            answer_type:    Some(entity.answer_type()),
        }
    }

    pub fn is_in_context(&self) -> bool {
        !self.spans.is_empty()
    }

    /// Typing evidence for the classifier
    pub fn evidence(&self) -> TypeEvidence {
        TypeEvidence::new(self.ner_label.clone(), self.wikidata_types.clone())
    }
}

/// Provenance of a substituted example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstitutionInfo {
    /// e.g. "alias-substitution"
    pub policy:               String,
    pub original_answer:      String,
    pub replacement:          String,
    pub entity_id:            Option<EntityId>,
    pub answer_type:          AnswerType,
    pub replaced_occurrences: usize,
    /// Popularity bracket the replacement was drawn from, if any
    pub bracket:              Option<String>,
}

/// A question answering example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaExample {
    pub uid:          String,
    pub query:        String,
    pub context:      String,
    pub gold_answers: Vec<Answer>,

    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,

    #[serde(default)]
    pub is_substitute: bool,

    /// Uid of the example this one was derived from
    #[serde(default)]
    pub original_uid: Option<String>,

    /// The full original, only kept when the run asks for it
    #[serde(default)]
    pub original_example: Option<Box<QaExample>>,

    #[serde(default)]
    pub substitution: Option<SubstitutionInfo>,
}

impl QaExample {
    pub fn new(
        uid:          impl Into<String>,
        query:        impl Into<String>,
        context:      impl Into<String>,
        gold_answers: Vec<Answer>,
    ) -> Self {
        Self {
            uid:              uid.into(),
            query:            query.into(),
            context:          context.into(),
            gold_answers,
            metadata:         BTreeMap::new(),
            is_substitute:    false,
            original_uid:     None,
            original_example: None,
            substitution:     None,
        }
    }

    /// The answer substitution operates on: the first gold answer
    /// annotated in the context.
    pub fn primary_answer(&self) -> Option<&Answer> {
        self.gold_answers.iter().find(|a| a.is_in_context())
    }

    /// The example's answer type: the most frequent type among its
    /// gold answers, ties going to the type seen first.
    pub fn example_answer_type(&self) -> Option<AnswerType> {
        let mut counts: Vec<(AnswerType, usize)> = Vec::new();
        for t in self.gold_answers.iter().filter_map(|a| a.answer_type) {
            match counts.iter_mut().find(|(seen, _)| *seen == t) {
                Some((_, n)) => *n += 1,
                None         => counts.push((t, 1)),
            }
        }
        // max_by_key keeps the LAST maximum, so walk in reverse
        counts
            .into_iter()
            .rev()
            .max_by_key(|(_, n)| *n)
            .map(|(t, _)| t)
    }

    /// Check that every annotated span lies inside the context and
    /// reads exactly the answer text.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let offsets = CharOffsets::new(&self.context);
        let len     = char_len(&self.context);

        for answer in &self.gold_answers {
            for &span in &answer.spans {
                let found = offsets.slice(&self.context, span).ok_or_else(|| {
                    SchemaError::SpanOutOfBounds { uid: self.uid.clone(), span, len }
                })?;
                if found != answer.text {
                    return Err(SchemaError::SpanTextMismatch {
                        uid:      self.uid.clone(),
                        span,
                        found:    found.to_string(),
                        expected: answer.text.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str, t: Option<AnswerType>) -> Answer {
        let mut a = Answer::new(text, Vec::new());
        a.answer_type = t;
        a
    }

    #[test]
    fn test_primary_answer_skips_unannotated() {
        let ex = QaExample::new(
            "q1",
            "Who?",
            "Paris is nice",
            vec![Answer::new("Lutetia", vec![]), Answer::new("Paris", vec![Span::new(0, 5)])],
        );
        assert_eq!(ex.primary_answer().map(|a| a.text.as_str()), Some("Paris"));
    }

    #[test]
    fn test_example_answer_type_majority() {
        let ex = QaExample::new("q", "", "", vec![
            typed("a", Some(AnswerType::Date)),
            typed("b", Some(AnswerType::Person)),
            typed("c", Some(AnswerType::Person)),
            typed("d", None),
        ]);
        assert_eq!(ex.example_answer_type(), Some(AnswerType::Person));
    }

    #[test]
    fn test_example_answer_type_tie_goes_to_first_seen() {
        let ex = QaExample::new("q", "", "", vec![
            typed("a", Some(AnswerType::Date)),
            typed("b", Some(AnswerType::Person)),
        ]);
        assert_eq!(ex.example_answer_type(), Some(AnswerType::Date));
        let none = QaExample::new("q", "", "", vec![typed("a", None)]);
        assert_eq!(none.example_answer_type(), None);
    }

    #[test]
    fn test_validate_accepts_matching_spans() {
        let ex = QaExample::new("q", "", "Paris is the capital. Paris!", vec![
            Answer::new("Paris", vec![Span::new(0, 5), Span::new(22, 27)]),
        ]);
        assert!(ex.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_mismatch_and_overflow() {
        let bad = QaExample::new("q", "", "Paris is the capital", vec![
            Answer::new("Paris", vec![Span::new(1, 6)]),
        ]);
        assert!(matches!(bad.validate(), Err(SchemaError::SpanTextMismatch { .. })));

        let far = QaExample::new("q", "", "Paris", vec![Answer::new("Paris", vec![Span::new(0, 9)])]);
        assert!(matches!(far.validate(), Err(SchemaError::SpanOutOfBounds { .. })));
    }
}
