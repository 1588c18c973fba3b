//! SER Benchmark CLI

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ser::{Corpus, RawResponse};
use ser_benchmark::{
    analysis::{evaluate_responses, write_run_outputs},
    config::Config,
    corpus::load_corpus,
    recognizers::{create_pair, EntityRecognizer},
    reporting::print_console_report,
    runner::{read_responses, CacheError, Executor, ExecutorConfig, LogProgress, ResponseCache},
};

#[derive(Parser)]
#[command(name = "ser-benchmark")]
#[command(about = "Compare system entity recognizers against a labeled corpus")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Query both recognizers and compare them
    Run {
        /// Clean queries, one per line
        #[arg(long)]
        clean: PathBuf,

        /// Annotated queries, aligned with the clean file
        #[arg(long)]
        annotated: PathBuf,

        /// Output directory for results
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Ignore cached responses and query the recognizers again
        #[arg(long)]
        refresh: bool,

        /// Number of parallel requests per recognizer
        #[arg(long)]
        parallel: Option<usize>,
    },

    /// Compare previously saved responses without any network calls
    Evaluate {
        /// Clean queries, one per line
        #[arg(long)]
        clean: PathBuf,

        /// Annotated queries, aligned with the clean file
        #[arg(long)]
        annotated: PathBuf,

        /// Baseline (Mallard) response file
        #[arg(long)]
        baseline: PathBuf,

        /// Candidate (Duckling) response file
        #[arg(long)]
        candidate: PathBuf,

        /// Output directory for results
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the ground-truth spans extracted from the corpus
    Spans {
        /// Clean queries, one per line
        #[arg(long)]
        clean: PathBuf,

        /// Annotated queries, aligned with the clean file
        #[arg(long)]
        annotated: PathBuf,

        /// Only show the first N queries
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Generate sample configuration
    InitConfig {
        /// Output path for configuration file
        #[arg(short, long, default_value = "config/ser.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("ser_benchmark=debug,ser=debug,info")
    } else {
        EnvFilter::new("ser_benchmark=info,ser=warn,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load_or_default(),
    };

    match cli.command {
        Commands::Run {
            clean,
            annotated,
            output,
            refresh,
            parallel,
        } => {
            run_benchmark(config, &clean, &annotated, output, refresh, parallel).await?;
        }

        Commands::Evaluate {
            clean,
            annotated,
            baseline,
            candidate,
            output,
        } => {
            evaluate_files(config, &clean, &annotated, &baseline, &candidate, output)?;
        }

        Commands::Spans {
            clean,
            annotated,
            limit,
        } => {
            print_spans(&clean, &annotated, limit)?;
        }

        Commands::InitConfig { output } => {
            init_config(output)?;
        }
    }

    Ok(())
}

async fn run_benchmark(
    mut config: Config,
    clean: &Path,
    annotated: &Path,
    output_dir: Option<PathBuf>,
    refresh: bool,
    parallel: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let run_id = Utc::now().format("%Y%m%d-%H%M%S").to_string();

    if let Some(parallel) = parallel {
        config.benchmark.parallel_requests = parallel;
    }

    println!("=== SER Benchmark ===");
    println!("Run ID: {}", run_id);

    let corpus = load_corpus(clean, annotated)?;
    if corpus.is_empty() {
        eprintln!("Error: corpus is empty");
        std::process::exit(1);
    }
    println!("Queries: {}, Entities: {}", corpus.len(), corpus.entity_count());

    let (baseline, candidate) = create_pair(&config)?;
    println!("Recognizers: {} (baseline), {} (candidate)", baseline.name(), candidate.name());
    println!();

    let texts: Vec<String> = corpus.iter().map(|q| q.text.clone()).collect();
    let cache = ResponseCache::new(config.cache_dir());

    let baseline_responses = fetch_responses(baseline, &cache, &texts, &config, refresh).await?;
    let candidate_responses = fetch_responses(candidate, &cache, &texts, &config, refresh).await?;

    let report = evaluate_responses(corpus, &baseline_responses, &candidate_responses, &config)?;
    print_console_report(&report);

    let output_dir = output_dir.unwrap_or_else(|| config.output_dir());
    let outputs = write_run_outputs(&output_dir, &run_id, &report, &config)?;
    println!("\nResults saved to: {}", outputs.dir.display());

    Ok(())
}

/// Load responses from the cache, or query the recognizer and cache them
async fn fetch_responses(
    recognizer: Arc<dyn EntityRecognizer>,
    cache: &ResponseCache,
    texts: &[String],
    config: &Config,
    refresh: bool,
) -> Result<Vec<Option<RawResponse>>, Box<dyn std::error::Error>> {
    let name = recognizer.name().to_string();
    let kind = recognizer.kind();

    if !refresh && cache.exists(kind, &name) {
        match cache.load(kind, &name, texts) {
            Ok(responses) => return Ok(responses),
            Err(e @ CacheError::Stale { .. }) => {
                tracing::warn!("{}; querying {} again", e, name);
            }
            Err(e) => return Err(e.into()),
        }
    }

    println!("Querying {}...", name);
    let executor = Executor::new(recognizer, ExecutorConfig::from(&config.benchmark))
        .with_progress(Arc::new(LogProgress::new(config.benchmark.progress_every)));
    let responses = executor.execute_all(texts).await;

    let path = cache.store(kind, &name, texts, &responses)?;
    tracing::info!("Cached {} responses at {}", name, path.display());

    Ok(responses)
}

fn evaluate_files(
    config: Config,
    clean: &Path,
    annotated: &Path,
    baseline: &Path,
    candidate: &Path,
    output_dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let run_id = Utc::now().format("%Y%m%d-%H%M%S").to_string();

    let corpus = load_corpus(clean, annotated)?;
    let baseline_responses = read_responses(baseline)?;
    let candidate_responses = read_responses(candidate)?;

    let report = evaluate_responses(corpus, &baseline_responses, &candidate_responses, &config)?;
    print_console_report(&report);

    let output_dir = output_dir.unwrap_or_else(|| config.output_dir());
    let outputs = write_run_outputs(&output_dir, &run_id, &report, &config)?;
    println!("\nResults saved to: {}", outputs.dir.display());

    Ok(())
}

fn print_spans(clean: &Path, annotated: &Path, limit: Option<usize>) -> Result<(), Box<dyn std::error::Error>> {
    let corpus: Corpus = load_corpus(clean, annotated)?;
    let limit = limit.unwrap_or(corpus.len());

    for query in corpus.iter().take(limit) {
        println!("[{}] {}", query.id, query.text);
        for entity in &query.ground_truth {
            let text: String = query
                .text
                .chars()
                .skip(entity.start())
                .take(entity.span.len())
                .collect();
            println!("  {} {} {:?}", entity.span, entity.label, text);
        }
    }

    println!(
        "\nTotal: {} queries, {} entities",
        corpus.len(),
        corpus.entity_count()
    );
    Ok(())
}

fn init_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();

    // Ensure parent directory exists
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    config.save_toml(&output)?;
    println!("Configuration written to: {}", output.display());
    Ok(())
}
