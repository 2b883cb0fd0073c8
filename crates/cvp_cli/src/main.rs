use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use cvp_core::ArticleStorage;
use cvp_crawler::{init_logging, CrawlArgs, CvprCrawler};
use cvp_inference::EmbeddingService;

mod pipeline;
mod settings;

use pipeline::{run_pipeline, PipelineOptions};
use settings::Settings;

/// Harvests CVPR paper metadata and optionally stores it with embeddings.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    crawl: CrawlArgs,

    /// Embed the results and upsert them into Supabase
    #[arg(long)]
    upsert: bool,

    /// Number of records per upsert request
    #[arg(long, default_value_t = cvp_storage::DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// JSON file receiving the articles that could not be embedded
    #[arg(long, default_value = "embedding_failures.json")]
    embedding_failure_log: PathBuf,

    /// Do not write the embedding failure log
    #[arg(long)]
    no_embedding_failure_log: bool,
}

impl Cli {
    fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            upsert_requested: self.upsert,
            batch_size: self.batch_size,
            embedding_failure_log: (!self.no_embedding_failure_log).then(|| self.embedding_failure_log.clone()),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = cli.crawl.to_config().context("Invalid crawl options")?;
    let crawler = CvprCrawler::new(config)?;

    let mut storage: Option<Arc<dyn ArticleStorage>> = None;
    let mut embedding_service: Option<EmbeddingService> = None;
    if cli.upsert {
        let settings = Settings::from_env().context("Failed to load settings")?;
        storage = Some(cvp_storage::create_storage("supabase", &settings.backend_config()).await?);
        let model = cvp_inference::create_model(&settings.inference_config())?;
        embedding_service = Some(EmbeddingService::new(model));
        info!("Supabase client initialized: {}", settings.supabase_url);
    }

    run_pipeline(
        &crawler,
        embedding_service.as_ref(),
        storage.as_deref(),
        &cli.pipeline_options(),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["cvp"]);
        assert!(!cli.upsert);
        assert_eq!(cli.batch_size, 100);
        let options = cli.pipeline_options();
        assert_eq!(options.embedding_failure_log, Some(PathBuf::from("embedding_failures.json")));
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from([
            "cvp", "--years", "2024", "--limit", "3", "--upsert", "--batch-size", "10", "--no-embedding-failure-log",
        ]);
        assert!(cli.upsert);
        assert_eq!(cli.crawl.limit, Some(3));
        let options = cli.pipeline_options();
        assert_eq!(options.batch_size, 10);
        assert!(options.embedding_failure_log.is_none());
    }
}
