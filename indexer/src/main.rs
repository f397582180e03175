use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use coursematch_core::catalog::load_catalog;
use coursematch_core::persist::{open_snapshot, save_snapshot, SnapshotPaths};
use coursematch_core::{Level, Snapshot, StopWords, Tokenizer};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build course catalog snapshots and run recommendations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a snapshot directory from a CSV, JSON or JSONL catalog
    Build {
        /// Catalog file
        #[arg(long)]
        input: String,
        /// Output snapshot directory
        #[arg(long)]
        output: String,
        /// Keep English stop words in the vocabulary
        #[arg(long, default_value_t = false)]
        no_stop_words: bool,
        /// Drop tokens shorter than this many characters
        #[arg(long, default_value_t = 2)]
        min_token_len: usize,
    },
    /// Rank a catalog file or snapshot directory against a query
    Recommend {
        /// Catalog file or snapshot directory
        #[arg(long)]
        input: String,
        /// Free-text query
        #[arg(long, conflicts_with_all = ["field", "level"])]
        query: Option<String>,
        /// Field of study, combined with --level into a query
        #[arg(long, requires = "level")]
        field: Option<String>,
        #[arg(long, requires = "field")]
        level: Option<String>,
        #[arg(long, default_value_t = 5, allow_negative_numbers = true)]
        limit: i64,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, no_stop_words, min_token_len } => {
            let stop_words = if no_stop_words { StopWords::none() } else { StopWords::english() };
            build_snapshot(&input, &output, Tokenizer::new(stop_words, min_token_len))
        }
        Commands::Recommend { input, query, field, level, limit } => {
            let query = match (query, field, level) {
                (Some(q), _, _) => q,
                (None, Some(f), Some(l)) => format!("{} {}", f.trim(), l.parse::<Level>()?),
                _ => bail!("either --query or --field with --level is required"),
            };
            recommend(&input, &query, limit)
        }
    }
}

fn build_snapshot(input: &str, output: &str, tokenizer: Tokenizer) -> Result<()> {
    let report = load_catalog(input)?;
    let snapshot = Snapshot::build(report.items, tokenizer, 1)?;
    let meta = save_snapshot(&SnapshotPaths::new(output), &snapshot)?;
    tracing::info!(output, items = meta.num_items, terms = meta.num_terms, skipped = report.skipped, "snapshot build complete");
    Ok(())
}

fn recommend(input: &str, query: &str, limit: i64) -> Result<()> {
    let snapshot = open_snapshot(input)?;
    let ranking = snapshot.rank(query, limit)?;
    if ranking.query_terms == 0 {
        tracing::warn!(query, "query has no terms in the catalog vocabulary");
    }
    println!("{:>6}  {:<12}  {:<48}  {:<24}  {}", "score", "id", "title", "subject", "level");
    for entry in ranking.iter() {
        let item = entry.item;
        println!("{:>6.3}  {:<12}  {:<48}  {:<24}  {}", entry.score, item.id, item.title, item.subject, item.level);
    }
    Ok(())
}
