//! QA server binary
//!
//! Run with: cargo run -p fin-rag --bin fin-rag-server

use clap::Parser;
use fin_rag::{config::RagConfig, server::RagServer};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "fin-rag-server", version, about = "Financial document QA server")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "FIN_RAG_CONFIG")]
    config: Option<PathBuf>,

    /// Override the bind host
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port
    #[arg(short, long)]
    port: Option<u16>,

    /// Index documents already on disk before accepting requests
    #[arg(long)]
    index_on_startup: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fin_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = RagConfig::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.index_on_startup {
        config.server.index_on_startup = true;
    }

    tracing::info!("Configuration loaded");
    tracing::info!("  - Documents: {}", config.documents.dir.display());
    tracing::info!("  - Embedding model: {}", config.gemini.embed_model);
    tracing::info!("  - LLM model: {}", config.gemini.generate_model);
    tracing::info!("  - Pinecone index: {}", config.pinecone.index_name);
    tracing::info!(
        "  - Chunking: {} chars, {} overlap",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );

    let server = RagServer::new(config)?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST /fetch_document/?url=...   - Download and index a document");
    println!("  POST /upload_document/          - Upload and index a document");
    println!("  GET  /submit/?question=...      - Ask a question");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
