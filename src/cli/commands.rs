// ============================================================
// Layer 1: CLI Commands and Arguments
// ============================================================
// Three subcommands:
//
//   generate  -i dev.jsonl -o out.jsonl [flags] <POLICY> [policy flags]
//   replay    --config out.jsonl.config.json
//   stats     -i dev.jsonl
//
// The policy is itself a subcommand of `generate`, so each
// policy only accepts the flags that mean something to it:
//
//   generate -i dev.jsonl -o pop.jsonl popularity-substitution -n 3
//   generate -i dev.jsonl -o pop.jsonl popularity-substitution \
//            --bracket top:1 --bracket bottom:50
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::generate_use_case::GenerateConfig;
use crate::domain::answer_type::CategoryFilter;
use crate::knowledge::base::KbOptions;
use crate::knowledge::popularity::PopularityBracket;
use crate::substitution::{
    AliasOrder, AliasParams, CorpusParams, Policy, PopularityParams, TypeSwapParams,
};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate substituted examples from a QA dataset
    Generate(GenerateArgs),

    /// Re-run a generation from its saved config
    Replay(ReplayArgs),

    /// Report answer types and entity links of a dataset
    Stats(StatsArgs),
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Input dataset (.jsonl)
    #[arg(short = 'i', long)]
    pub input: PathBuf,

    /// Output file for substituted examples (.jsonl)
    #[arg(short = 'o', long)]
    pub output: PathBuf,

    /// Wikidata entity extract (.json keyed by id, or .jsonl)
    #[arg(short = 'w', long, default_value = "wikidata/entity_info.json")]
    pub wikidata: PathBuf,

    /// Seed for every random choice of the run
    #[arg(long, default_value_t = 1)]
    pub seed: u64,

    /// Rewrite every gold answer's occurrences, not only the primary's
    #[arg(short = 'r', long)]
    pub replace_every: bool,

    /// Embed the full original example in each output record
    #[arg(short = 's', long)]
    pub save_full: bool,

    #[command(subcommand)]
    pub policy: PolicyCommand,
}

#[derive(Subcommand, Debug)]
pub enum PolicyCommand {
    /// Swap the answer for another name of the same entity
    AliasSubstitution {
        /// Substitutes per example (0 = every alias)
        #[arg(short = 'n', long = "max-aliases", default_value_t = 1)]
        max_aliases: usize,

        /// ALL, NONNUMERIC or one answer type [default: NONNUMERIC]
        #[arg(short = 'c', long)]
        category: Option<CategoryFilter>,

        /// random, first-listed or alphabetical
        #[arg(long, default_value = "random")]
        order: AliasOrder,
    },

    /// Swap the answer for a same-type entity from a popularity bracket
    PopularitySubstitution {
        /// Split the popularity scale into this many equal brackets
        #[arg(short = 'n', long = "num-bins", default_value_t = 1)]
        num_bins: usize,

        /// Explicit bracket (top:1, bottom:50, 40-60); overrides --num-bins
        #[arg(long = "bracket")]
        brackets: Vec<PopularityBracket>,

        /// Substitutes drawn from each bracket
        #[arg(long, default_value_t = 1)]
        per_bracket: usize,

        /// Entities kept per identical popularity value (0 = all)
        #[arg(short = 'm', long, default_value_t = 10)]
        max_per_popularity: usize,

        /// ALL, NONNUMERIC or one answer type [default: PERSON]
        #[arg(short = 'c', long)]
        category: Option<CategoryFilter>,
    },

    /// Swap the answer for a same-type answer from the dataset
    CorpusSubstitution {
        #[arg(short = 'n', long = "num-samples", default_value_t = 1)]
        num_samples: usize,

        /// ALL, NONNUMERIC or one answer type [default: ALL]
        #[arg(short = 'c', long)]
        category: Option<CategoryFilter>,
    },

    /// Swap the answer for an answer of a different type from the dataset
    TypeSwapSubstitution {
        #[arg(short = 'n', long = "num-samples", default_value_t = 1)]
        num_samples: usize,

        /// ALL, NONNUMERIC or one answer type [default: ALL]
        #[arg(short = 'c', long)]
        category: Option<CategoryFilter>,

        /// Draw --num-samples from each other type, not from their union
        #[arg(long)]
        per_target_type: bool,

        /// Draw knowledge-base entities instead of dataset answers
        #[arg(long)]
        from_kb: bool,
    },
}

/// Convert CLI GenerateArgs into the application-layer GenerateConfig.
/// The application layer never sees clap types.
impl From<GenerateArgs> for GenerateConfig {
    fn from(a: GenerateArgs) -> Self {
        let mut kb_options = KbOptions::default();

        let (policy, category) = match a.policy {
            PolicyCommand::AliasSubstitution { max_aliases, category, order } => {
                (Policy::Alias(AliasParams { max_aliases, order }), category)
            }
            PolicyCommand::PopularitySubstitution {
                num_bins,
                brackets,
                per_bracket,
                max_per_popularity,
                category,
            } => {
                let brackets = if brackets.is_empty() {
                    PopularityBracket::equal_bins(num_bins)
                } else {
                    brackets
                };
                kb_options.max_per_popularity = Some(max_per_popularity).filter(|m| *m > 0);
                (Policy::Popularity(PopularityParams { brackets, per_bracket }), category)
            }
            PolicyCommand::CorpusSubstitution { num_samples, category } => {
                (Policy::Corpus(CorpusParams { num_samples }), category)
            }
            PolicyCommand::TypeSwapSubstitution { num_samples, category, per_target_type, from_kb } => {
                (Policy::TypeSwap(TypeSwapParams { num_samples, per_target_type, from_kb }), category)
            }
        };

        GenerateConfig {
            input:          a.input,
            output:         a.output,
            knowledge_base: a.wikidata,
            policy,
            seed:           a.seed,
            category,
            replace_every:  a.replace_every,
            save_full:      a.save_full,
            kb_options,
        }
    }
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// A <output>.config.json written by an earlier run
    #[arg(long)]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Input dataset (.jsonl)
    #[arg(short = 'i', long)]
    pub input: PathBuf,

    /// Wikidata entity extract
    #[arg(short = 'w', long, default_value = "wikidata/entity_info.json")]
    pub wikidata: PathBuf,
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::domain::answer_type::AnswerType;
    use clap::Parser;

    fn generate_config(argv: &[&str]) -> GenerateConfig {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Commands::Generate(args) => args.into(),
            other => panic!("expected generate, got {other:?}"),
        }
    }

    #[test]
    fn test_alias_flags() {
        let cfg = generate_config(&[
            "qa-entity-swap", "generate", "-i", "dev.jsonl", "-o", "out.jsonl", "--seed", "9",
            "alias-substitution", "-n", "3", "--order", "alphabetical",
        ]);
        assert_eq!(cfg.seed, 9);
        assert_eq!(
            cfg.policy,
            Policy::Alias(AliasParams { max_aliases: 3, order: AliasOrder::Alphabetical })
        );
        assert_eq!(cfg.effective_category(), CategoryFilter::NonNumeric);
        assert_eq!(cfg.knowledge_base, PathBuf::from("wikidata/entity_info.json"));
    }

    #[test]
    fn test_popularity_bins_and_brackets() {
        let cfg = generate_config(&[
            "qa-entity-swap", "generate", "-i", "d.jsonl", "-o", "o.jsonl",
            "popularity-substitution", "-n", "4",
        ]);
        match &cfg.policy {
            Policy::Popularity(p) => assert_eq!(p.brackets.len(), 4),
            other => panic!("unexpected policy {other:?}"),
        }
        assert_eq!(cfg.kb_options.max_per_popularity, Some(10));
        assert_eq!(cfg.effective_category(), CategoryFilter::Only(AnswerType::Person));

        let cfg = generate_config(&[
            "qa-entity-swap", "generate", "-i", "d.jsonl", "-o", "o.jsonl",
            "popularity-substitution", "--bracket", "top:1", "--bracket", "bottom:50", "-m", "0",
            "-c", "ALL",
        ]);
        match &cfg.policy {
            Policy::Popularity(p) => {
                assert_eq!(p.brackets[0], PopularityBracket::top(1.0).unwrap());
                assert_eq!(p.brackets[1], PopularityBracket::bottom(50.0).unwrap());
            }
            other => panic!("unexpected policy {other:?}"),
        }
        assert_eq!(cfg.kb_options.max_per_popularity, None);
        assert_eq!(cfg.category, Some(CategoryFilter::All));
    }

    #[test]
    fn test_type_swap_flags() {
        let cfg = generate_config(&[
            "qa-entity-swap", "generate", "-i", "d.jsonl", "-o", "o.jsonl", "-r", "-s",
            "type-swap-substitution", "-n", "2", "--per-target-type",
        ]);
        assert!(cfg.replace_every);
        assert!(cfg.save_full);
        assert_eq!(
            cfg.policy,
            Policy::TypeSwap(TypeSwapParams { num_samples: 2, per_target_type: true, from_kb: false })
        );
    }

    #[test]
    fn test_bad_bracket_is_rejected() {
        let parsed = Cli::try_parse_from([
            "qa-entity-swap", "generate", "-i", "d.jsonl", "-o", "o.jsonl",
            "popularity-substitution", "--bracket", "60-40",
        ]);
        assert!(parsed.is_err());
    }
}
