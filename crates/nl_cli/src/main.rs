use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Once;

use chrono::Utc;
use clap::{Parser, Subcommand};
use futures::future::join_all;
use nl_core::{Article, Result, Similarity, Summarizer, SummaryStyle, TrackingContext};
use nl_inference::similarity::{CharFrequencyEmbedder, EmbeddingSimilarity, KeywordSimilarity};
use nl_inference::{create_summarizer, Config};
use nl_storage::MemoryStorage;
use nl_tracking::{StoryClusteringEngine, SummaryCache, TrackingConfig, TrackingCoordinator};
use tracing::{info, Level};

static INIT: Once = Once::new();

fn init_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .init();
    });
}

#[derive(Parser)]
#[command(name = "nl", about = "Track news stories and cache article summaries")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run articles through summarization and story assignment
    Track {
        /// Text files, one article body per file
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// User the tracked stories belong to
        #[arg(long, default_value = "local")]
        owner: String,

        /// Keyword labelling the tracking context
        #[arg(long)]
        keyword: String,

        /// Summary style: default, opposing-views or simplified
        #[arg(long, default_value = "default")]
        style: String,

        /// Summarizer backend: dummy or chat
        #[arg(long, default_value = "dummy")]
        summarizer: String,

        /// API key for the chat summarizer
        #[arg(long)]
        api_key: Option<String>,

        /// Similarity engine: keyword or embedding
        #[arg(long, default_value = "keyword")]
        similarity: String,

        /// Score above which an article joins an existing story
        #[arg(long, default_value_t = 0.8)]
        threshold: f32,

        /// How many recent story members to compare against
        #[arg(long, default_value_t = 5)]
        representative_set: usize,
    },
    /// List recognized summary styles
    Styles,
}

fn create_similarity(name: &str) -> Result<Arc<dyn Similarity>> {
    match name {
        "keyword" => Ok(Arc::new(KeywordSimilarity)),
        "embedding" => Ok(Arc::new(EmbeddingSimilarity::new(Arc::new(
            CharFrequencyEmbedder,
        )))),
        other => Err(nl_core::Error::Similarity(format!(
            "unknown similarity engine: {}",
            other
        ))),
    }
}

fn read_article(path: &PathBuf) -> Result<Article> {
    let body_text = std::fs::read_to_string(path)?;
    let title = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "untitled".to_string());
    let source_url = format!("file:///{}", path.display());
    let published_at = Utc::now();
    Ok(Article {
        id: Article::derive_id(&source_url, published_at),
        source_url,
        title,
        body_text,
        published_at,
        fetched_at: Utc::now(),
    })
}

async fn run_track(
    files: &[PathBuf],
    owner: &str,
    keyword: &str,
    style: SummaryStyle,
    summarizer: Arc<dyn Summarizer>,
    similarity: Arc<dyn Similarity>,
    config: TrackingConfig,
) -> Result<()> {
    let storage = Arc::new(MemoryStorage::new());
    let cache = SummaryCache::new(storage.clone());
    let engine =
        StoryClusteringEngine::new(storage.clone(), storage.clone(), similarity, config)?;
    let coordinator = TrackingCoordinator::new(cache, engine, summarizer, storage);
    let context = TrackingContext::new(owner, keyword);

    let articles = files
        .iter()
        .map(read_article)
        .collect::<Result<Vec<_>>>()?;

    info!(count = articles.len(), context = %context, "processing articles");
    let outcomes = join_all(
        articles
            .iter()
            .map(|article| coordinator.process_article(article, style, &context)),
    )
    .await;

    for (article, outcome) in articles.iter().zip(outcomes) {
        let outcome = outcome?;
        println!("== {} ==", article.title);
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }

    println!("== stories for {} ==", owner);
    let stories = coordinator.stories_for_owner(owner).await?;
    println!("{}", serde_json::to_string_pretty(&stories)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Track {
            files,
            owner,
            keyword,
            style,
            summarizer,
            api_key,
            similarity,
            threshold,
            representative_set,
        } => {
            let style: SummaryStyle = style.parse()?;
            let config = TrackingConfig {
                similarity_threshold: threshold,
                representative_set_size: representative_set,
            };
            let inference_config = Config {
                api_key,
                ..Config::default()
            };
            let summarizer = create_summarizer(&summarizer, &inference_config)?;
            let similarity = create_similarity(&similarity)?;
            run_track(
                &files, &owner, &keyword, style, summarizer, similarity, config,
            )
            .await
        }
        Commands::Styles => {
            for style in SummaryStyle::ALL {
                println!("{}", style);
            }
            Ok(())
        }
    }
}
