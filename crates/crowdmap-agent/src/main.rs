//! crowdmap: competitive-landscape crowding analysis for drug targets.
//! Entry point for the CLI binary.

mod batch;
mod cli;
mod config;
mod output;

use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crowdmap_common::SourceTag;
use crowdmap_ingestion::sources::JsonFileSource;
use crowdmap_ingestion::Lexicon;
use crowdmap_ranker::AnalysisPipeline;

use crate::batch::{expand_targets, run_batch, BatchOptions};
use crate::cli::{Cli, Command, RunArgs};
use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .init();

    info!("crowdmap {}", env!("CARGO_PKG_VERSION"));

    let config = Config::load(cli.config.as_deref())?;
    let lexicon = match &config.lexicon.path {
        Some(path) => Lexicon::from_path(path)?,
        None => Lexicon::builtin()?,
    };

    match cli.command {
        Command::Lexicon => {
            print_lexicon(&lexicon);
            Ok(())
        }
        Command::Run(args) => {
            let failed = run(args, config, lexicon).await?;
            if failed > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

/// Returns the number of targets that failed.
async fn run(args: RunArgs, config: Config, lexicon: Lexicon) -> anyhow::Result<usize> {
    let targets = expand_targets(&args.targets)?;
    if targets.is_empty() {
        anyhow::bail!("no targets given");
    }

    let mentions_dir = args.mentions_dir.unwrap_or(config.sources.mentions_dir.clone());
    let options = BatchOptions {
        output_dir: args.output_dir.unwrap_or(config.output.dir.clone()),
        workers: args.workers.unwrap_or(config.execution.parallel_workers),
        dry_run: args.dry_run,
        default_source: SourceTag::parse(&config.sources.default_source),
    };

    let source = Arc::new(JsonFileSource::new(mentions_dir));
    let pipeline = Arc::new(AnalysisPipeline::new(Arc::new(lexicon), Arc::new(config.analysis)));

    let report = run_batch(targets, source, pipeline, &options).await;
    for result in &report.results {
        let r = &result.outcome.report;
        println!(
            "{:<16} competitors={:<4} crowding={:.3} flags={}{}",
            result.target,
            r.total_competitors,
            r.crowding_score,
            r.white_space_flags.len(),
            if result.error.is_some() { "  (FAILED)" } else { "" }
        );
    }
    Ok(report.failed())
}

fn print_lexicon(lexicon: &Lexicon) {
    println!("Aliases: {} canonical drugs, {} lookup keys",
        lexicon.aliases.n_canonical(), lexicon.aliases.n_lookup_entries());

    println!("\nModalities:");
    for rule in lexicon.modality.rules() {
        println!("  {:<24} {}", rule.term, rule.keywords.join(", "));
    }

    println!("\nMechanisms:");
    for rule in lexicon.mechanism.rules() {
        let scope = rule.target.as_deref().map(|t| format!(" [{t}]")).unwrap_or_default();
        println!("  {:<24} {}{}", rule.term, rule.keywords.join(", "), scope);
    }
}
