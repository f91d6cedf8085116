use clap::Parser;
use std::sync::Arc;
use syntra_core::{EmbeddingService, FastEmbedService, OpenAiEmbeddingService, Syntra};
use syntra_server::{create_router, AppState, Config, EmbeddingProvider};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing. Core logs through `log` and is bridged in.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    info!("Starting Syntra server v{}", env!("CARGO_PKG_VERSION"));
    info!("HTTP: {}", config.http_addr);
    info!("Data: {:?}", config.data_dir);

    info!("Loading embedding service...");
    let embedder = build_embedder(&config)?;
    info!(
        "Embedding service ready: {} ({} dimensions)",
        embedder.model_name(),
        embedder.dimension()
    );

    info!("Opening database...");
    let syntra = Syntra::open(config.db_path(), embedder, config.library_config())?;
    let stats = syntra.stats()?;
    info!(
        "Database loaded: {} nodes, {} connections",
        stats.node_count, stats.connection_count
    );
    info!(
        "Similarity threshold: {}",
        syntra.graph_config().similarity_threshold
    );

    let app = create_router(AppState::new(Arc::new(syntra)));

    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    info!("HTTP server listening on {}", config.http_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down");
    Ok(())
}

fn build_embedder(config: &Config) -> anyhow::Result<Arc<dyn EmbeddingService>> {
    let embedder: Arc<dyn EmbeddingService> = match config.embedding_provider {
        EmbeddingProvider::Openai => Arc::new(OpenAiEmbeddingService::new(config.openai_config())?),
        EmbeddingProvider::Fastembed => Arc::new(FastEmbedService::from_name(&config.embedding_model)?),
    };
    Ok(embedder)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
