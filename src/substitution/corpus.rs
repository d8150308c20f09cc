// ============================================================
// Layer 5: Corpus and Type-Swap Substitution
// ============================================================
// Both policies draw replacements from the answers of the
// dataset being processed (the corpus index), not from the KB:
//
//   Corpus    same answer type       "1815" (DATE) → "1969"
//   TypeSwap  any OTHER answer type  "Paris" (LOCATION) → "1969"
//
// A candidate that normalises to the same text as any gold
// answer of the example ("The Beatles" vs "Beatles") is not a
// different answer and is never drawn.
//
// TypeSwap can instead draw knowledge-base entities of other
// types (`from_kb`), which works on single-type datasets.

use rand::Rng;

use crate::data::normalizer::Normalizer;
use crate::data::sampler::sample_without_replacement;
use crate::domain::answer_type::AnswerType;
use crate::domain::errors::SubstitutionFailure;
use crate::domain::qa_example::{Answer, QaExample};
use crate::knowledge::base::KnowledgeBase;
use crate::substitution::{
    answer_entities, CorpusParams, SubstitutionResult, TypeSwapParams,
};

/// Corpus answers of `answer_type` that differ from every gold answer
fn pool<'a>(
    kb:          &'a KnowledgeBase,
    answer_type: AnswerType,
    answer:      &Answer,
    example:     &QaExample,
) -> Vec<&'a Answer> {
    let normalizer = Normalizer::new();
    let gold: Vec<String> = example
        .gold_answers
        .iter()
        .map(|a| normalizer.normalize(&a.text))
        .chain(std::iter::once(normalizer.normalize(&answer.text)))
        .collect();

    kb.corpus()
        .answers_of(answer_type)
        .iter()
        .filter(|c| !gold.contains(&normalizer.normalize(&c.text)))
        .collect()
}

fn to_result(template: &Answer, answer_type: AnswerType) -> SubstitutionResult {
    let mut replacement = template.clone();
    replacement.spans.clear();
    replacement.answer_type = Some(answer_type);
    SubstitutionResult::new(replacement)
}

/// Same-type draw from the corpus
pub fn substitute<R: Rng + ?Sized>(
    answer:      &Answer,
    answer_type: AnswerType,
    example:     &QaExample,
    kb:          &KnowledgeBase,
    rng:         &mut R,
    params:      &CorpusParams,
) -> Result<Vec<SubstitutionResult>, SubstitutionFailure> {
    let candidates = pool(kb, answer_type, answer, example);

    let drawn = sample_without_replacement(&candidates, params.num_samples.max(1), rng);
    if drawn.is_empty() {
        return Err(SubstitutionFailure::CorpusExhausted { answer_type });
    }
    Ok(drawn.into_iter().map(|a| to_result(a, answer_type)).collect())
}

/// Draw from the corpus answers of every type except the answer's own.
///
/// Without `per_target_type` the draw is over the union of those
/// types; with it, `num_samples` are drawn from each type in turn.
pub fn substitute_other_type<R: Rng + ?Sized>(
    answer:      &Answer,
    answer_type: AnswerType,
    example:     &QaExample,
    kb:          &KnowledgeBase,
    rng:         &mut R,
    params:      &TypeSwapParams,
) -> Result<Vec<SubstitutionResult>, SubstitutionFailure> {
    let n = params.num_samples.max(1);

    let mut results = Vec::new();
    if params.from_kb {
        let exclude = answer_entities(answer, example, kb);
        let drawn: Vec<_> = if params.per_target_type {
            kb.type_counts()
                .into_iter()
                .filter(|(t, _)| *t != answer_type)
                .flat_map(|(t, _)| kb.sample_by_type(t, None, &exclude, n, rng))
                .collect()
        } else {
            kb.sample_different_type(answer_type, &exclude, n, rng)
        };
        results.extend(
            drawn
                .into_iter()
                .map(|e| SubstitutionResult::new(Answer::from_entity(e.name.clone(), e))),
        );
    } else if params.per_target_type {
        let targets: Vec<AnswerType> = kb.corpus().other_types(answer_type).collect();
        for target in targets {
            let candidates = pool(kb, target, answer, example);
            for a in sample_without_replacement(&candidates, n, rng) {
                results.push(to_result(a, target));
            }
        }
    } else {
        let targets: Vec<AnswerType> = kb.corpus().other_types(answer_type).collect();
        let candidates: Vec<(AnswerType, &Answer)> = targets
            .iter()
            .flat_map(|t| pool(kb, *t, answer, example).into_iter().map(move |a| (*t, a)))
            .collect();
        for (target, a) in sample_without_replacement(&candidates, n, rng) {
            results.push(to_result(a, *target));
        }
    }

    if results.is_empty() {
        return Err(SubstitutionFailure::NoOtherType { answer_type });
    }
    Ok(results)
}
