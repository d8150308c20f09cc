// ============================================================
// Layer 1: CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap, hands a config to Layer 2, prints the result.
//
// Three commands are supported:
//   1. `generate` runs one substitution policy over a dataset
//   2. `replay`   re-runs a generation from its saved config
//   3. `stats`    reports what a dataset contains
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, GenerateArgs, ReplayArgs, StatsArgs};

use crate::application::generate_use_case::{GenerateConfig, GenerateUseCase};
use crate::application::stats_use_case::StatsUseCase;
use crate::infra::run_manifest;

#[derive(Parser, Debug)]
#[command(
    name = "qa-entity-swap",
    version = "0.1.0",
    about = "Generate knowledge-conflict QA examples by substituting answer entities."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route to the matching use case. Routing only, no work.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Generate(args) => run_generate(args),
            Commands::Replay(args)   => run_replay(args),
            Commands::Stats(args)    => run_stats(args),
        }
    }
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    let config: GenerateConfig = args.into();
    tracing::info!("Generating with {} from '{}'", config.policy.name(), config.input.display());
    generate(config)
}

fn run_replay(args: ReplayArgs) -> Result<()> {
    let config = run_manifest::load(&args.config)?;
    tracing::info!("Replaying run from '{}'", args.config.display());
    generate(config)
}

fn generate(config: GenerateConfig) -> Result<()> {
    let output  = config.output.clone();
    let summary = GenerateUseCase::new(config).execute()?;

    println!("{}", summary.report());
    println!("Output: {}", output.display());
    Ok(())
}

fn run_stats(args: StatsArgs) -> Result<()> {
    let stats = StatsUseCase::new(args.input, args.wikidata).execute()?;
    println!("{}", stats.report());
    Ok(())
}
