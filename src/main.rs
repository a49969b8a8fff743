use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use newswire_digest::researcher::default_sources;
use newswire_digest::{
    Catalog, FeedbackResponse, FeedbackStore, FetchConfig, HttpFetcher, JsonCatalog, ReaderAgent,
    ResearcherAgent, SummaryExtractor,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "newswire-digest", about = "News digest pipeline and catalog tools")]
struct Cli {
    /// Path to the JSON source catalog.
    #[arg(long, default_value = "data/source_catalog.json", global = true)]
    catalog: PathBuf,

    /// Path to the feedback queue file.
    #[arg(long, default_value = "data/feedback.json", global = true)]
    feedback: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the reader: collect stories and write the daily digest.
    Read {
        /// Override date (YYYY-MM-DD); defaults to the current UTC date.
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Directory receiving digest_<date>.json files.
        #[arg(long, default_value = "digests")]
        digests_dir: PathBuf,
    },
    /// Run the researcher: refresh the catalog from baselines and feedback.
    Research {
        /// Minimum aggregate score for baseline sources.
        #[arg(long, default_value_t = 0.6)]
        min_score: f64,

        /// Optional JSON file with one-off feedback responses to ingest.
        #[arg(long)]
        extra_feedback: Option<PathBuf>,
    },
    /// Seed the catalog from the baseline source list.
    Seed,
    /// Print the current catalog as JSON.
    Dump,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let catalog = Arc::new(JsonCatalog::new(&cli.catalog));

    let result = match cli.command {
        Command::Read { date, digests_dir } => {
            let target_date = date.unwrap_or_else(|| Utc::now().date_naive());
            let fetcher = Arc::new(HttpFetcher::new(FetchConfig::default())?);
            let summarizer = SummaryExtractor::with_defaults(fetcher.clone());
            let reader = ReaderAgent::new(catalog, fetcher, summarizer, digests_dir);
            reader.run(target_date).await.map(|path| {
                info!(path = %path.display(), "Digest run finished");
            })
        }
        Command::Research {
            min_score,
            extra_feedback,
        } => {
            let injected = match extra_feedback {
                Some(path) => load_feedback_file(&path).await?,
                None => Vec::new(),
            };
            let feedback = FeedbackStore::new(&cli.feedback);
            let researcher = ResearcherAgent::new(catalog, feedback, min_score);
            researcher.run(injected).await.map(|count| {
                info!(count, "Researcher finished");
            })
        }
        Command::Seed => {
            let sources = default_sources();
            let count = sources.len();
            catalog.upsert_sources(&sources).await.map(|_| {
                info!(count, path = %cli.catalog.display(), "Seeded catalog");
            })
        }
        Command::Dump => match catalog.fetch_sources().await {
            Ok(sources) => {
                println!("{}", serde_json::to_string_pretty(&sources)?);
                Ok(())
            }
            Err(e) => Err(e),
        },
    };

    if let Err(e) = &result {
        error!(error = %e, "Run failed");
    }
    result.map_err(Into::into)
}

/// Load a standalone feedback file: either a bare array of responses or an
/// object with a `responses` field.
async fn load_feedback_file(path: &std::path::Path) -> anyhow::Result<Vec<FeedbackResponse>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading feedback file {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)?;
    let responses = match value {
        serde_json::Value::Array(_) => serde_json::from_value(value)?,
        serde_json::Value::Object(mut map) => match map.remove("responses") {
            Some(inner) => serde_json::from_value(inner)?,
            None => Vec::new(),
        },
        _ => anyhow::bail!("unsupported feedback format; expected list or {{responses: []}}"),
    };
    Ok(responses)
}
