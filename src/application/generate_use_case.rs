// ============================================================
// Layer 2: GenerateUseCase
// ============================================================
// Orchestrates one substitution run end to end:
//
//   Step 1: Load the knowledge base         (Layer 5 - knowledge)
//   Step 2: Load the dataset                (Layer 4 - data)
//   Step 3: Save the run config             (Layer 6 - infra)
//   Step 4: Link and type the gold answers  (Layer 4 - data)
//   Step 5: Build the corpus index          (Layer 5 - knowledge)
//   Step 6: Substitute, example by example  (Layer 5 - substitution)
//   Step 7: Flush output and report         (Layer 6 - infra)
//
// A missing or corrupt input aborts the run before Step 6.
// After that, a problem with one example only skips that
// example: it is logged, counted by reason and written to
// the skip log, and the run moves on.
//
// Reference: Rust Book §13 (Iterators and Closures)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::annotator::Annotator;
use crate::data::loader::JsonlExampleLoader;
use crate::data::sampler::example_rng;
use crate::data::writer::JsonlExampleWriter;
use crate::domain::answer_type::{AnswerType, CategoryFilter};
use crate::domain::errors::{ExampleSkip, SchemaError, SubstitutionFailure};
use crate::domain::qa_example::QaExample;
use crate::domain::traits::{ExampleSink, ExampleSource, LoadedRecord};
use crate::infra::run_manifest;
use crate::infra::skip_log::SkipLog;
use crate::infra::summary::RunSummary;
use crate::knowledge::base::{KbOptions, KnowledgeBase};
use crate::knowledge::corpus::CorpusIndex;
use crate::substitution::derive::{derive_example, DeriveOptions};
use crate::substitution::{AliasParams, Policy};

// ─── Generation Configuration ────────────────────────────────────────────────
// Everything that determines the output of a run. Serialisable
// so it can be saved next to the output and replayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateConfig {
    pub input:          PathBuf,
    pub output:         PathBuf,
    pub knowledge_base: PathBuf,
    pub policy:         Policy,
    pub seed:           u64,
    /// None uses the policy's default category
    pub category:       Option<CategoryFilter>,
    pub replace_every:  bool,
    pub save_full:      bool,
    #[serde(default)]
    pub kb_options:     KbOptions,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            input:          PathBuf::from("datasets/dev.jsonl"),
            output:         PathBuf::from("substitutions/alias.jsonl"),
            knowledge_base: PathBuf::from("wikidata/entity_info.json"),
            policy:         Policy::Alias(AliasParams::default()),
            seed:           1,
            category:       None,
            replace_every:  false,
            save_full:      false,
            kb_options:     KbOptions::default(),
        }
    }
}

impl GenerateConfig {
    /// The category filter in effect for this run
    pub fn effective_category(&self) -> CategoryFilter {
        self.category.unwrap_or_else(|| self.policy.default_category())
    }
}

// ─── GenerateUseCase ──────────────────────────────────────────────────────────
pub struct GenerateUseCase {
    config: GenerateConfig,
}

impl GenerateUseCase {
    pub fn new(config: GenerateConfig) -> Self {
        Self { config }
    }

    /// Run against the files named in the config
    pub fn execute(&self) -> Result<RunSummary> {
        let cfg = &self.config;

        // ── Step 1: Knowledge base ───────────────────────────────────────────
        tracing::info!("Loading knowledge base from '{}'", cfg.knowledge_base.display());
        let kb = KnowledgeBase::load(&cfg.knowledge_base, &cfg.kb_options)
            .with_context(|| "Cannot load the knowledge base")?;

        // ── Step 2: Dataset (read fully before any output is created) ────────
        tracing::info!("Loading examples from '{}'", cfg.input.display());
        let records = JsonlExampleLoader::new(&cfg.input)
            .load_all()
            .with_context(|| "Cannot load the dataset")?;

        // ── Step 3: Run config, output and skip log ──────────────────────────
        let manifest = run_manifest::save(cfg)?;
        tracing::info!("Run config saved to '{}'", manifest.display());
        let mut sink     = JsonlExampleWriter::create(&cfg.output)?;
        let mut skip_log = SkipLog::create(run_manifest::sibling(&cfg.output, "skipped.csv"))?;

        let summary = self.process(records, kb, &mut sink, Some(&mut skip_log))?;
        skip_log.finish()?;

        tracing::info!("Wrote {} substituted examples to '{}'", sink.written(), sink.path().display());
        if summary.skipped() > 0 {
            tracing::info!("Skipped examples listed in '{}'", skip_log.path().display());
        }
        Ok(summary)
    }

    /// Run against any example source and sink, without touching the
    /// file system for anything but the optional skip log.
    pub fn run<S, K>(&self, source: &S, kb: KnowledgeBase, sink: &mut K) -> Result<RunSummary>
    where
        S: ExampleSource,
        K: ExampleSink,
    {
        let records = source.load_all()?;
        self.process(records, kb, sink, None)
    }

    fn process<K: ExampleSink>(
        &self,
        records:      Vec<LoadedRecord>,
        kb:           KnowledgeBase,
        sink:         &mut K,
        mut skip_log: Option<&mut SkipLog>,
    ) -> Result<RunSummary> {
        let cfg = &self.config;
        let mut summary = RunSummary::new();
        summary.examples_read = records.len();

        // Positions in the input drive the per-example RNG, so they are
        // kept even for records that turn out to be unusable
        let mut indices  = Vec::new();
        let mut examples = Vec::new();
        for (idx, record) in records.into_iter().enumerate() {
            match record {
                Ok(example) => {
                    indices.push(idx);
                    examples.push(example);
                }
                Err(e) => {
                    let uid = schema_uid(&e);
                    record_skip(&mut summary, skip_log.as_deref_mut(), &uid, e.into())?;
                }
            }
        }

        // ── Step 4: Link and type ────────────────────────────────────────────
        Annotator::new(&kb).annotate_all(&mut examples);

        // ── Step 5: Corpus index over every usable example ───────────────────
        let kb = kb.with_corpus(CorpusIndex::build(&examples));

        // ── Step 6: Substitute ───────────────────────────────────────────────
        let category = cfg.effective_category();
        let options  = DeriveOptions { replace_every: cfg.replace_every, save_full: cfg.save_full };
        tracing::info!(
            "Running {} over {} examples (category {}, seed {})",
            cfg.policy.name(),
            examples.len(),
            category,
            cfg.seed
        );

        for (idx, example) in indices.into_iter().zip(examples.iter()) {
            let answer_type = example.example_answer_type().unwrap_or(AnswerType::Misc);
            if !category.accepts(answer_type) {
                tracing::debug!("'{}' filtered: {} not in {}", example.uid, answer_type, category);
                summary.filtered += 1;
                continue;
            }

            match self.substitute_one(example, answer_type, idx, &kb, options) {
                Ok(derived) => {
                    for d in &derived {
                        sink.write(d)?;
                    }
                    summary.substituted     += 1;
                    summary.records_written += derived.len();
                }
                Err(skip) => {
                    record_skip(&mut summary, skip_log.as_deref_mut(), &example.uid, skip)?;
                }
            }
        }

        // ── Step 7: Flush ────────────────────────────────────────────────────
        sink.finish()?;
        tracing::info!(
            "Done: {} of {} examples substituted, {} filtered, {} skipped",
            summary.substituted,
            summary.examples_read,
            summary.filtered,
            summary.skipped()
        );
        Ok(summary)
    }

    /// Every substitute of one example, or why there are none
    fn substitute_one(
        &self,
        example:     &QaExample,
        answer_type: AnswerType,
        idx:         usize,
        kb:          &KnowledgeBase,
        options:     DeriveOptions,
    ) -> Result<Vec<QaExample>, ExampleSkip> {
        let policy  = &self.config.policy;
        let primary = example.primary_answer().ok_or(SubstitutionFailure::NoAnswerInContext)?;

        let mut rng = example_rng(self.config.seed, idx);
        let results = policy.substitute(primary, answer_type, example, kb, &mut rng)?;

        let mut derived   = Vec::with_capacity(results.len());
        let mut first_err = None;
        for (i, result) in results.iter().enumerate() {
            match derive_example(example, primary, result, policy, i, options) {
                Ok(d)  => derived.push(d),
                Err(e) => {
                    tracing::debug!("'{}': substitute {} dropped: {}", example.uid, i, e);
                    first_err.get_or_insert(e);
                }
            }
        }

        match first_err {
            Some(e) if derived.is_empty() => Err(e.into()),
            _ => Ok(derived),
        }
    }
}

fn schema_uid(e: &SchemaError) -> String {
    match e {
        SchemaError::InvalidRecord { line, .. } => format!("line {line}"),
        SchemaError::MissingField { uid, .. }
        | SchemaError::SpanOutOfBounds { uid, .. }
        | SchemaError::SpanTextMismatch { uid, .. } => uid.clone(),
    }
}

fn record_skip(
    summary:  &mut RunSummary,
    skip_log: Option<&mut SkipLog>,
    uid:      &str,
    skip:     ExampleSkip,
) -> Result<()> {
    tracing::warn!("Skipping '{}' [{}]: {}", uid, skip.reason(), skip);
    summary.record_skip(skip.reason());
    if let Some(log) = skip_log {
        log.record(uid, &skip)?;
    }
    Ok(())
}
