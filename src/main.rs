//! pdf-gloss - Entry point
//!
//! MCP server over stdio that annotates difficult words in PDFs.

use pdf_gloss::{run_server_with_config, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the MCP transport, so logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf_gloss=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load()?;
    tracing::info!(
        max_pages = config.pipeline.max_pages,
        max_words_per_page = config.pipeline.max_words_per_page,
        dictionary = %config.dictionary.base_url,
        "Starting pdf-gloss"
    );

    run_server_with_config(config).await
}
