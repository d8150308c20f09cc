// ============================================================
// Layer 2: StatsUseCase
// ============================================================
// Answers "what would a run have to work with?" for a dataset:
//
//   Examples:      1000   (13 unusable)
//   Gold answers:  1312   (1180 linked, 132 unlinked)
//   PERSON          402
//   LOCATION        260
//   ...
//
// Loads and annotates exactly like `generate`, then counts
// examples per example answer type. Nothing is written.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::PathBuf;

use crate::data::annotator::Annotator;
use crate::data::loader::JsonlExampleLoader;
use crate::domain::answer_type::AnswerType;
use crate::domain::traits::ExampleSource;
use crate::knowledge::base::{KbOptions, KnowledgeBase};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatasetStats {
    pub examples:          usize,
    pub unusable:          usize,
    pub gold_answers:      usize,
    pub linked:            usize,
    pub unlinked:          usize,
    /// Usable examples per example answer type
    pub by_type:           BTreeMap<AnswerType, usize>,
    /// Usable examples with at least one answer annotated in context
    pub answer_in_context: usize,
    /// Knowledge-base entities per type
    pub kb_by_type:        BTreeMap<AnswerType, usize>,
}

impl DatasetStats {
    pub fn report(&self) -> String {
        let mut s = String::new();
        let _ = writeln!(s, "Examples:      {:>8}   ({} unusable)", self.examples, self.unusable);
        let _ = writeln!(
            s,
            "Gold answers:  {:>8}   ({} linked, {} unlinked)",
            self.gold_answers, self.linked, self.unlinked
        );
        let _ = writeln!(s, "In context:    {:>8}", self.answer_in_context);
        for t in AnswerType::ALL {
            let n = self.by_type.get(&t).copied().unwrap_or(0);
            let k = self.kb_by_type.get(&t).copied().unwrap_or(0);
            let _ = writeln!(s, "  {:<12}{:>8}   ({} in knowledge base)", t.as_str(), n, k);
        }
        s
    }
}

pub struct StatsUseCase {
    input:          PathBuf,
    knowledge_base: PathBuf,
}

impl StatsUseCase {
    pub fn new(input: impl Into<PathBuf>, knowledge_base: impl Into<PathBuf>) -> Self {
        Self { input: input.into(), knowledge_base: knowledge_base.into() }
    }

    pub fn execute(&self) -> Result<DatasetStats> {
        let kb = KnowledgeBase::load(&self.knowledge_base, &KbOptions::default())
            .with_context(|| "Cannot load the knowledge base")?;
        let source = JsonlExampleLoader::new(&self.input);
        compute(&source, &kb)
    }
}

/// Count what `source` holds, annotated against `kb`
pub fn compute<S: ExampleSource>(source: &S, kb: &KnowledgeBase) -> Result<DatasetStats> {
    let records = source.load_all()?;

    let mut stats = DatasetStats {
        examples:   records.len(),
        kb_by_type: kb.type_counts().into_iter().collect(),
        ..DatasetStats::default()
    };
    let mut examples: Vec<_> = records.into_iter().filter_map(|r| r.ok()).collect();
    stats.unusable = stats.examples - examples.len();

    let linking = Annotator::new(kb).annotate_all(&mut examples);
    stats.linked   = linking.linked;
    stats.unlinked = linking.unlinked;

    for example in &examples {
        stats.gold_answers += example.gold_answers.len();
        if example.primary_answer().is_some() {
            stats.answer_in_context += 1;
        }
        if let Some(t) = example.example_answer_type() {
            *stats.by_type.entry(t).or_default() += 1;
        }
    }
    Ok(stats)
}
