// ============================================================
// Layer 4: Answer Annotator
// ============================================================
// Enriches loaded gold answers with what the knowledge base
// knows about them, then derives their answer type:
//
//   "Paris"  kb_id Q90
//     → wikidata_label "Paris", aliases ["City of Light", ...]
//       wikidata_types ["Q515"], popularity 1000
//     → answer_type LOCATION
//
// Answers without a kb_id are linked when exactly one entity
// carries their text as name or alias; ambiguous names stay
// unlinked. Fields already present in the input are kept.
//
// Runs before the corpus index is built, so corpus answers
// carry their types.

use crate::domain::answer_type::classify;
use crate::domain::qa_example::{Answer, QaExample};
use crate::knowledge::base::KnowledgeBase;

/// Linking counts for one annotation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotationStats {
    pub linked:   usize,
    pub unlinked: usize,
}

pub struct Annotator<'kb> {
    kb: &'kb KnowledgeBase,
}

impl<'kb> Annotator<'kb> {
    pub fn new(kb: &'kb KnowledgeBase) -> Self {
        Self { kb }
    }

    /// Annotate every gold answer of every example in place
    pub fn annotate_all(&self, examples: &mut [QaExample]) -> AnnotationStats {
        let mut stats = AnnotationStats::default();
        for example in examples.iter_mut() {
            for answer in example.gold_answers.iter_mut() {
                if self.annotate(answer) {
                    stats.linked += 1;
                } else {
                    stats.unlinked += 1;
                }
            }
        }
        tracing::info!("Annotated answers: {} linked, {} unlinked", stats.linked, stats.unlinked);
        stats
    }

    /// Annotate one answer. Returns whether it ended up linked to a
    /// known entity.
    pub fn annotate(&self, answer: &mut Answer) -> bool {
        if answer.kb_id.is_none() {
            if let [only] = self.kb.entities_named(&answer.text).as_slice() {
                answer.kb_id = Some(only.id.clone());
            }
        }

        let entity = answer.kb_id.as_deref().and_then(|id| self.kb.lookup(id));
        if let Some(entity) = entity {
            answer.wikidata_label.get_or_insert_with(|| entity.name.clone());
            if answer.wikipedia_page.is_none() {
                answer.wikipedia_page = entity.wikipedia_page.clone();
            }
            answer.popularity.get_or_insert(entity.popularity);
            if answer.wikidata_types.is_empty() {
                answer.wikidata_types = entity.types.clone();
            }
            for alias in &entity.aliases {
                if !answer.aliases.contains(alias) {
                    answer.aliases.push(alias.clone());
                }
            }
        }

        if answer.answer_type.is_none() {
            answer.answer_type = Some(classify(&answer.evidence()));
        }
        entity.is_some()
    }
}
