use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crpt_client::client::CrptClient;
use crpt_client::config::ClientConfig;
use crpt_client::document::Document;

/// Submit goods introduction documents to the CRPT API.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Configuration file (YAML). `CRPT_*` environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Signature sent with every document
    #[arg(short, long, env = "CRPT_SIGNATURE")]
    signature: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Document files (JSON)
    #[arg(required = true)]
    documents: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if args.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(true)
            .init();
    }

    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = ClientConfig::load(args.config.as_deref())?;
    info!(endpoint = %config.endpoint, "Configuration loaded");

    let client = CrptClient::new(&config)?;

    let mut documents = Vec::with_capacity(args.documents.len());
    for path in &args.documents {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let document: Document = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid document {}", path.display()))?;
        documents.push((path.clone(), document));
    }

    let handles: Vec<_> = documents
        .into_iter()
        .map(|(path, document)| (path, client.create_document(document, args.signature.clone())))
        .collect();

    let mut failures = 0;
    for (path, handle) in handles {
        let result = handle.await;
        if !result.is_accepted() {
            failures += 1;
        }
        println!("{}: {}", path.display(), result);
    }

    if failures > 0 {
        anyhow::bail!("{} of {} documents were not accepted", failures, args.documents.len());
    }

    Ok(())
}
