// ============================================================
// Layer 5: Substitution Policies
// ============================================================
// A policy picks replacement answers for one gold answer.
// The set of policies is fixed, so they form a closed enum
// with one handler per variant:
//
//   Alias       another name of the SAME entity
//               "Paris" → "City of Light"
//   Popularity  a KB entity of the same type, drawn from a
//               popularity bracket
//               "Marie Curie" → "Ada Lovelace" (bottom 50%)
//   Corpus      another answer of the same type from the
//               loaded dataset
//               "1815" → "1969"
//   TypeSwap    an answer of a DIFFERENT type from the dataset,
//               or a KB entity of a different type
//               "Paris" → "1969"
//
// Every handler takes an explicit RNG, so a fixed seed picks
// the same replacements on every run. Running out of
// candidates is a SubstitutionFailure for that example only.
//
// Reference: Rust Book §6 (Enums and Pattern Matching)

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::answer_type::{classify, AnswerType, CategoryFilter};
use crate::domain::entity::EntityId;
use crate::domain::errors::SubstitutionFailure;
use crate::domain::qa_example::{Answer, QaExample};
use crate::knowledge::base::KnowledgeBase;
use crate::knowledge::popularity::PopularityBracket;

pub mod alias;
pub mod corpus;
pub mod derive;
pub mod popularity;
pub mod rewriter;

// ─── Policy Parameters ────────────────────────────────────────────────────────

/// How alias candidates are ordered before the first n are taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AliasOrder {
    /// Uniform random draw, seeded
    Random,
    /// The order the knowledge extract lists them in
    FirstListed,
    /// Lexicographic order
    Alphabetical,
}

impl std::str::FromStr for AliasOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random"       => Ok(AliasOrder::Random),
            "first-listed" => Ok(AliasOrder::FirstListed),
            "alphabetical" => Ok(AliasOrder::Alphabetical),
            other => Err(format!(
                "unknown alias order '{other}' (random, first-listed, alphabetical)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasParams {
    /// Substitutes per example; 0 means every usable alias
    pub max_aliases: usize,
    pub order:       AliasOrder,
}

impl Default for AliasParams {
    fn default() -> Self {
        Self { max_aliases: 1, order: AliasOrder::Random }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopularityParams {
    /// One round of draws per bracket. Empty means the whole type.
    pub brackets:    Vec<PopularityBracket>,
    /// Substitutes drawn from each bracket
    pub per_bracket: usize,
}

impl Default for PopularityParams {
    fn default() -> Self {
        Self { brackets: PopularityBracket::equal_bins(1), per_bracket: 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusParams {
    pub num_samples: usize,
}

impl Default for CorpusParams {
    fn default() -> Self {
        Self { num_samples: 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeSwapParams {
    pub num_samples:     usize,
    /// Draw num_samples from EACH other type instead of from their union
    pub per_target_type: bool,
    /// Draw knowledge-base entities instead of corpus answers
    #[serde(default)]
    pub from_kb:         bool,
}

impl Default for TypeSwapParams {
    fn default() -> Self {
        Self { num_samples: 1, per_target_type: false, from_kb: false }
    }
}

// ─── Policy ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "kebab-case")]
pub enum Policy {
    Alias(AliasParams),
    Popularity(PopularityParams),
    Corpus(CorpusParams),
    TypeSwap(TypeSwapParams),
}

impl Policy {
    /// Name written into every output record
    pub fn name(&self) -> &'static str {
        match self {
            Policy::Alias(_)      => "alias-substitution",
            Policy::Popularity(_) => "popularity-substitution",
            Policy::Corpus(_)     => "corpus-substitution",
            Policy::TypeSwap(_)   => "type-swap-substitution",
        }
    }

    /// Prefix of substituted uids, e.g. "alias-sub-0_q17"
    pub fn uid_prefix(&self) -> &'static str {
        match self {
            Policy::Alias(_)      => "alias-sub",
            Policy::Popularity(_) => "pop-sub",
            Policy::Corpus(_)     => "corpus-sub",
            Policy::TypeSwap(_)   => "type-swap-sub",
        }
    }

    /// Which examples the policy handles when the run does not say.
    /// DATE and NUMERIC answers have poor aliases; popularity is
    /// most meaningful for people.
    pub fn default_category(&self) -> CategoryFilter {
        match self {
            Policy::Alias(_)      => CategoryFilter::NonNumeric,
            Policy::Popularity(_) => CategoryFilter::Only(AnswerType::Person),
            Policy::Corpus(_)     => CategoryFilter::All,
            Policy::TypeSwap(_)   => CategoryFilter::All,
        }
    }

    /// Choose replacements for `answer`, the primary answer of `example`.
    ///
    /// `answer_type` is the type of the example as a whole (the one the
    /// category filter saw). Popularity and corpus draws keep it; type
    /// swap draws anything but it.
    pub fn substitute<R: Rng + ?Sized>(
        &self,
        answer:      &Answer,
        answer_type: AnswerType,
        example:     &QaExample,
        kb:          &KnowledgeBase,
        rng:         &mut R,
    ) -> Result<Vec<SubstitutionResult>, SubstitutionFailure> {
        let t = answer_type;
        let results = match self {
            Policy::Alias(p)      => alias::substitute(answer, t, example, kb, rng, p)?,
            Policy::Popularity(p) => popularity::substitute(answer, t, example, kb, rng, p)?,
            Policy::Corpus(p)     => corpus::substitute(answer, t, example, kb, rng, p)?,
            Policy::TypeSwap(p)   => corpus::substitute_other_type(answer, t, example, kb, rng, p)?,
        };
        tracing::debug!(
            "{} chose {:?} for '{}'",
            self.name(),
            results.iter().map(|r| r.text()).collect::<Vec<_>>(),
            answer.text
        );
        Ok(results)
    }
}

// ─── Results ──────────────────────────────────────────────────────────────────

/// One chosen replacement.
#[derive(Debug, Clone, PartialEq)]
pub struct SubstitutionResult {
    /// The replacement answer: its text plus the entity link and
    /// KB metadata when the policy knows them. No spans yet.
    pub replacement: Answer,
    /// Bracket the replacement was drawn from (popularity only)
    pub bracket:     Option<PopularityBracket>,
}

impl SubstitutionResult {
    pub fn new(replacement: Answer) -> Self {
        Self { replacement, bracket: None }
    }

    pub fn text(&self) -> &str {
        &self.replacement.text
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.replacement.kb_id.as_deref()
    }
}

/// Answer type of `answer`, classifying on the spot when the
/// annotator has not stored one.
pub fn answer_type_of(answer: &Answer) -> AnswerType {
    answer.answer_type.unwrap_or_else(|| classify(&answer.evidence()))
}

/// KB entities that ARE the example's answer: every linked gold
/// answer, plus every entity named like a gold answer's text.
pub fn answer_entities(answer: &Answer, example: &QaExample, kb: &KnowledgeBase) -> BTreeSet<EntityId> {
    let mut ids = BTreeSet::new();
    for gold in example.gold_answers.iter().chain(std::iter::once(answer)) {
        ids.extend(gold.kb_id.iter().cloned());
        ids.extend(kb.entities_named(&gold.text).into_iter().map(|e| e.id.clone()));
    }
    ids
}
