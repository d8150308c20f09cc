// ============================================================
// Layer 5: Popularity Substitution
// ============================================================
// Replace the answer with a DIFFERENT knowledge-base entity of
// the same answer type, drawn from a popularity bracket:
//
//   "Marie Curie" (PERSON)
//     bracket bottom:50  → "Ada Lovelace" | "Alan Turing" | ...
//     bracket top:1      → the most viewed person in the KB
//
// One round of draws per configured bracket, least popular
// bracket first. An entity already drawn in an earlier round is
// never drawn again. A bracket with nothing left contributes
// nothing; only when EVERY bracket is empty does the example
// fail.

use rand::Rng;

use crate::domain::answer_type::AnswerType;
use crate::domain::errors::SubstitutionFailure;
use crate::domain::qa_example::{Answer, QaExample};
use crate::knowledge::base::KnowledgeBase;
use crate::knowledge::popularity::PopularityBracket;
use crate::substitution::{answer_entities, PopularityParams, SubstitutionResult};

pub fn substitute<R: Rng + ?Sized>(
    answer:      &Answer,
    answer_type: AnswerType,
    example:     &QaExample,
    kb:          &KnowledgeBase,
    rng:         &mut R,
    params:      &PopularityParams,
) -> Result<Vec<SubstitutionResult>, SubstitutionFailure> {
    // ── Step 1: Never draw the answer itself, under any gold name ────────────
    let mut exclude = answer_entities(answer, example, kb);

    // ── Step 2: One round per bracket ────────────────────────────────────────
    let whole_scale = PopularityBracket::equal_bins(1);
    let brackets = if params.brackets.is_empty() { &whole_scale } else { &params.brackets };

    let mut results = Vec::new();
    for bracket in brackets {
        let drawn = kb.sample_by_type(answer_type, Some(bracket), &exclude, params.per_bracket, rng);
        if drawn.is_empty() {
            tracing::debug!("No {} entity left in bracket {} for '{}'", answer_type, bracket, answer.text);
            continue;
        }
        for entity in drawn {
            exclude.insert(entity.id.clone());
            let mut replacement = Answer::from_entity(entity.name.clone(), entity);
            replacement.answer_type = Some(answer_type);
            results.push(SubstitutionResult { replacement, bracket: Some(*bracket) });
        }
    }

    if results.is_empty() {
        return Err(SubstitutionFailure::BracketEmpty {
            answer_type,
            bracket: brackets.iter().map(|b| b.to_string()).collect::<Vec<_>>().join(","),
        });
    }
    Ok(results)
}
