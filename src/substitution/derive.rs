// ============================================================
// Layer 5: Derived Example Builder
// ============================================================
// Turns (original example, chosen replacement) into a NEW
// example whose context and gold answer agree again:
//
//   original  q17  "Paris is the capital of France."  → "Paris" [0,5]
//   derived   alias-sub-0_q17
//             "City of Light is the capital of France."
//             → "City of Light" [0,13]
//
// The original is never mutated. The derived example records
// its provenance (original_uid, substitution info) and, when
// the run keeps full originals, a copy of the source example.

use crate::domain::errors::SubstitutionFailure;
use crate::domain::qa_example::{Answer, QaExample, SubstitutionInfo};
use crate::substitution::rewriter::{rewrite_all, RewriteTarget};
use crate::substitution::{answer_type_of, Policy, SubstitutionResult};

/// How derived examples are shaped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeriveOptions {
    /// Also replace the other gold answers' surface forms
    pub replace_every: bool,
    /// Embed the full original example in the output
    pub save_full:     bool,
}

/// Uid of the `index`-th substitute of `uid`, e.g. "pop-sub-2_q17"
pub fn derived_uid(policy: &Policy, index: usize, uid: &str) -> String {
    format!("{}-{}_{}", policy.uid_prefix(), index, uid)
}

/// Build the substituted example for one chosen replacement.
pub fn derive_example(
    original: &QaExample,
    primary:  &Answer,
    result:   &SubstitutionResult,
    policy:   &Policy,
    index:    usize,
    options:  DeriveOptions,
) -> Result<QaExample, SubstitutionFailure> {
    // ── Step 1: What to overwrite in the context ─────────────────────────────
    let mut targets = vec![RewriteTarget::new(&primary.text, &primary.spans)];
    if options.replace_every {
        for other in &original.gold_answers {
            if other.text != primary.text {
                targets.push(RewriteTarget::new(&other.text, &other.spans));
            }
        }
    }

    // ── Step 2: Rewrite and re-anchor the replacement ────────────────────────
    let rewritten = rewrite_all(&original.context, &targets, result.text())?;

    let occurrences = rewritten.occurrences();
    let mut replacement = result.replacement.clone();
    replacement.spans = rewritten.spans;

    let answer_type = replacement.answer_type.unwrap_or_else(|| answer_type_of(primary));

    // ── Step 3: Assemble with provenance ─────────────────────────────────────
    let mut derived = QaExample::new(
        derived_uid(policy, index, &original.uid),
        original.query.clone(),
        rewritten.context,
        vec![replacement],
    );
    derived.metadata      = original.metadata.clone();
    derived.is_substitute = true;
    derived.original_uid  = Some(original.uid.clone());
    derived.substitution  = Some(SubstitutionInfo {
        policy:               policy.name().to_string(),
        original_answer:      primary.text.clone(),
        replacement:          result.text().to_string(),
        entity_id:            result.entity_id().map(str::to_string),
        answer_type,
        replaced_occurrences: occurrences,
        bracket:              result.bracket.map(|b| b.to_string()),
    });
    if options.save_full {
        derived.original_example = Some(Box::new(original.clone()));
    }
    Ok(derived)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::answer_type::AnswerType;
    use crate::domain::span::{CharOffsets, Span};
    use crate::knowledge::popularity::PopularityBracket;
    use crate::substitution::{AliasParams, PopularityParams};

    fn paris() -> QaExample {
        let mut a = Answer::new("Paris", vec![Span::new(0, 5)]);
        a.kb_id       = Some("Q90".into());
        a.answer_type = Some(AnswerType::Location);
        QaExample::new(
            "q17",
            "What is the capital of France?",
            "Paris is the capital of France. Paris has 2M people.",
            vec![a],
        )
    }

    fn alias_result(text: &str) -> SubstitutionResult {
        let mut r = paris().gold_answers[0].clone();
        r.text  = text.into();
        r.spans = Vec::new();
        SubstitutionResult::new(r)
    }

    #[test]
    fn test_derived_example_is_consistent() {
        let original = paris();
        let policy   = Policy::Alias(AliasParams::default());
        let derived  = derive_example(
            &original,
            &original.gold_answers[0],
            &alias_result("City of Light"),
            &policy,
            0,
            DeriveOptions::default(),
        )
        .unwrap();

        assert_eq!(derived.uid, "alias-sub-0_q17");
        assert_eq!(derived.context, "City of Light is the capital of France. City of Light has 2M people.");
        assert_eq!(derived.gold_answers.len(), 1);
        assert_eq!(derived.gold_answers[0].spans, vec![Span::new(0, 13), Span::new(40, 53)]);
        assert!(derived.validate().is_ok());
        assert!(derived.is_substitute);
        assert_eq!(derived.original_uid.as_deref(), Some("q17"));
        assert!(derived.original_example.is_none());

        let info = derived.substitution.unwrap();
        assert_eq!(info.policy, "alias-substitution");
        assert_eq!(info.original_answer, "Paris");
        assert_eq!(info.replaced_occurrences, 2);
        assert_eq!(info.answer_type, AnswerType::Location);

        // The original is untouched
        assert_eq!(original.context, paris().context);
    }

    #[test]
    fn test_save_full_embeds_original() {
        let original = paris();
        let derived  = derive_example(
            &original,
            &original.gold_answers[0],
            &alias_result("Paname"),
            &Policy::Alias(AliasParams::default()),
            1,
            DeriveOptions { replace_every: false, save_full: true },
        )
        .unwrap();
        assert_eq!(derived.uid, "alias-sub-1_q17");
        assert_eq!(derived.original_example.as_deref(), Some(&original));
    }

    #[test]
    fn test_replace_every_rewrites_other_gold_answers() {
        let mut original = QaExample::new(
            "q2",
            "Which country?",
            "The USA, or United States, is large.",
            vec![Answer::new("USA", vec![Span::new(4, 7)]), Answer::new("United States", vec![Span::new(12, 25)])],
        );
        original.gold_answers[0].answer_type = Some(AnswerType::Location);
        let result = SubstitutionResult::new(Answer::new("Canada", vec![]));
        let policy = Policy::Alias(AliasParams::default());

        let only_primary = derive_example(
            &original, &original.gold_answers[0], &result, &policy, 0, DeriveOptions::default(),
        )
        .unwrap();
        assert_eq!(only_primary.context, "The Canada, or United States, is large.");

        let every = derive_example(
            &original,
            &original.gold_answers[0],
            &result,
            &policy,
            0,
            DeriveOptions { replace_every: true, save_full: false },
        )
        .unwrap();
        assert_eq!(every.context, "The Canada, or Canada, is large.");
        let off = CharOffsets::new(&every.context);
        for &span in &every.gold_answers[0].spans {
            assert_eq!(off.slice(&every.context, span), Some("Canada"));
        }
    }

    #[test]
    fn test_bracket_recorded() {
        let original = paris();
        let bracket  = PopularityBracket::bottom(50.0).unwrap();
        let mut result = alias_result("Lyon");
        result.bracket = Some(bracket);
        let derived = derive_example(
            &original,
            &original.gold_answers[0],
            &result,
            &Policy::Popularity(PopularityParams::default()),
            0,
            DeriveOptions::default(),
        )
        .unwrap();
        assert_eq!(derived.uid, "pop-sub-0_q17");
        assert_eq!(derived.substitution.and_then(|s| s.bracket).as_deref(), Some("0-50"));
    }

    #[test]
    fn test_unfindable_answer_fails() {
        let mut original = paris();
        original.gold_answers[0].spans = Vec::new();
        original.context = "Lyon is nice.".into();
        let err = derive_example(
            &original,
            &original.gold_answers[0],
            &alias_result("Paname"),
            &Policy::Alias(AliasParams::default()),
            0,
            DeriveOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.reason(), "rewrite-not-found");
    }
}
