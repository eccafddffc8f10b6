use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::info;

use ragloop_cli::{ingest_path, init_tracing, load_config, open_engine};

/// Bulk ingestion of a document directory into the configured store.
#[derive(Parser, Debug)]
#[command(name = "ragloop-indexer", version)]
struct Args {
    /// Directory (or single file) to ingest
    data_dir: PathBuf,
    /// Clear the store before ingesting
    #[arg(long, short = 'f')]
    fresh: bool,
    /// Import the configured remote knowledge base first
    #[arg(long)]
    bootstrap: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    if !args.data_dir.exists() {
        bail!("{} does not exist", args.data_dir.display());
    }
    let cfg = load_config()?;
    println!("ragloop indexer\n===============");
    println!("Data directory: {}", args.data_dir.display());
    println!("Store: {} (table {})", cfg.store.uri, cfg.store.table);

    let engine = open_engine(cfg).await?;
    if args.fresh {
        engine.clear().await?;
        info!("store cleared before indexing");
    }
    if args.bootstrap && !engine.bootstrap().await {
        println!("Bootstrap skipped");
    }

    let (docs, chunks) = ingest_path(&engine, &args.data_dir).await?;
    let stats = engine.stats().await?;
    println!("\nIndexed {docs} documents into {chunks} chunks");
    println!("Store now holds {} records ({:.2} MB)", stats.count, stats.size_mb);
    println!("\nTo search, use: cargo run --bin ragloop -- search '<query>'");
    Ok(())
}
