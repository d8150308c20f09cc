// ============================================================
// Layer 5: Alias Substitution
// ============================================================
// Replace the answer with another name of the same entity:
//
//   Q90  name "Paris", aliases ["City of Light", "Paname"]
//   answer "Paris"  →  "City of Light" or "Paname"
//
// Candidates are the entity's KB aliases plus any aliases the
// annotation stage stored on the answer, minus the answer's
// own surface text and the other gold answers of the example
// (exact, case-sensitive). The entity, and therefore the
// answer type, stays the same.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

use crate::domain::answer_type::AnswerType;
use crate::domain::errors::SubstitutionFailure;
use crate::domain::qa_example::{Answer, QaExample};
use crate::knowledge::base::KnowledgeBase;
use crate::substitution::{AliasOrder, AliasParams, SubstitutionResult};

/// Usable aliases in first-listed order, de-duplicated
pub fn candidates(answer: &Answer, example: &QaExample, kb: &KnowledgeBase) -> Vec<String> {
    let kb_aliases = answer
        .kb_id
        .as_deref()
        .map(|id| kb.aliases_of(id))
        .unwrap_or(&[]);

    let gold_texts: HashSet<&str> = example
        .gold_answers
        .iter()
        .map(|a| a.text.as_str())
        .chain(std::iter::once(answer.text.as_str()))
        .collect();

    let mut seen = HashSet::new();
    kb_aliases
        .iter()
        .chain(answer.aliases.iter())
        .filter(|alias| !alias.trim().is_empty())
        .filter(|alias| !gold_texts.contains(alias.as_str()))
        .filter(|alias| seen.insert(alias.as_str()))
        .cloned()
        .collect()
}

pub fn substitute<R: Rng + ?Sized>(
    answer:      &Answer,
    answer_type: AnswerType,
    example:     &QaExample,
    kb:          &KnowledgeBase,
    rng:         &mut R,
    params:      &AliasParams,
) -> Result<Vec<SubstitutionResult>, SubstitutionFailure> {
    let mut aliases = candidates(answer, example, kb);
    if aliases.is_empty() {
        return Err(SubstitutionFailure::AliasExhausted { answer: answer.text.clone() });
    }

    match params.order {
        AliasOrder::Random       => aliases.shuffle(rng),
        AliasOrder::FirstListed  => {}
        AliasOrder::Alphabetical => aliases.sort(),
    }
    if params.max_aliases > 0 {
        aliases.truncate(params.max_aliases);
    }

    Ok(aliases
        .into_iter()
        .map(|alias| {
            // Same entity under another name: the original surface
            // text becomes an alias of the replacement
            let mut replacement = answer.clone();
            replacement.text        = alias;
            replacement.spans       = Vec::new();
            replacement.aliases     = vec![answer.text.clone()];
            replacement.answer_type = Some(answer_type);
            SubstitutionResult::new(replacement)
        })
        .collect())
}
