use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use ragloop_cli::{ingest_path, init_tracing, load_config, open_engine};
use ragloop_core::types::SearchResult;

#[derive(Parser, Debug)]
#[command(name = "ragloop", version, about = "Local document retrieval with iterative query refinement")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Chunk, embed and store a file or every text file under a directory
    Ingest { path: PathBuf },
    /// Retrieve chunks for a query
    Search {
        query: String,
        #[arg(long, value_enum, default_value_t = Mode::Rag)]
        mode: Mode,
        /// Overrides retrieval.top_k
        #[arg(long)]
        top_k: Option<usize>,
        /// Overrides retrieval.target_tokens (tokens mode)
        #[arg(long)]
        target_tokens: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Answer a question with iterative retrieval
    Ask {
        query: String,
        /// Overrides agent.max_questions
        #[arg(long)]
        max_questions: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Write every record to a JSON file
    Export { out: PathBuf },
    /// Upsert the records of a JSON backup
    Import { file: PathBuf },
    /// Import the remote knowledge base (best effort)
    Bootstrap {
        #[arg(long)]
        url: Option<String>,
    },
    /// Record count and approximate size
    Stats,
    /// Delete every record
    Clear {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    /// Top-K with context bonus
    Rag,
    /// Top-K with sibling-chunk windows
    Context,
    /// Packed into a token budget
    Tokens,
}

fn print_results(results: &[SearchResult]) {
    println!("Found {} results", results.len());
    for (i, r) in results.iter().enumerate() {
        let tokens = r.tokens.map(|t| format!("  tokens={t}")).unwrap_or_default();
        println!("\n  {}. score={:.4}  id={}{tokens}", i + 1, r.similarity, r.id());
        if let Some(ctx) = &r.context {
            if !ctx.before.is_empty() {
                println!("     before: {}", ctx.before);
            }
        }
        println!("     {}", r.content);
        if let Some(ctx) = &r.context {
            if !ctx.after.is_empty() {
                println!("     after: {}", ctx.after);
            }
        }
    }
}

fn results_json(results: &[SearchResult]) -> serde_json::Value {
    serde_json::Value::Array(
        results
            .iter()
            .map(|r| {
                serde_json::json!({
                    "id": r.id(),
                    "similarity": r.similarity,
                    "content": r.content,
                    "text": r.text(),
                    "context": r.context,
                    "tokens": r.tokens,
                    "metadata": r.metadata(),
                })
            })
            .collect(),
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let mut cfg = load_config()?;

    match cli.command {
        Command::Ingest { path } => {
            if !path.exists() {
                bail!("{} does not exist", path.display());
            }
            let engine = open_engine(cfg).await?;
            let (docs, chunks) = ingest_path(&engine, &path).await?;
            println!("Ingested {docs} documents into {chunks} chunks");
        }
        Command::Search { query, mode, top_k, target_tokens, json } => {
            if let Some(k) = top_k {
                cfg.retrieval.top_k = k;
            }
            if let Some(t) = target_tokens {
                cfg.retrieval.target_tokens = t;
            }
            cfg.validate()?;
            let engine = open_engine(cfg).await?;
            let results = match mode {
                Mode::Rag => engine.search(&query).await?,
                Mode::Context => engine.search_with_context(&query).await?,
                Mode::Tokens => engine.search_with_tokens(&query).await?,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&results_json(&results))?);
            } else {
                print_results(&results);
            }
        }
        Command::Ask { query, max_questions, json } => {
            let engine = open_engine(cfg).await?;
            let rounds = max_questions.unwrap_or(engine.config().agent.max_questions);
            let answer = engine.recursive_query(&query, rounds).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&answer)?);
            } else {
                for (i, h) in answer.search_history.iter().enumerate() {
                    println!("Search {}: {} ({} matches)", i + 1, h.question, h.matches.len());
                }
                println!("\n{}", answer.final_answer);
            }
        }
        Command::Export { out } => {
            let engine = open_engine(cfg).await?;
            let blob = engine.export_json().await?;
            fs::write(&out, &blob).with_context(|| format!("writing {}", out.display()))?;
            println!("Exported {} bytes to {}", blob.len(), out.display());
        }
        Command::Import { file } => {
            let blob = fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
            let engine = open_engine(cfg).await?;
            let n = engine.import_json(&blob).await?;
            println!("Imported {n} records");
        }
        Command::Bootstrap { url } => {
            if url.is_some() {
                cfg.store.bootstrap_url = url;
            }
            if cfg.store.bootstrap_url.is_none() {
                bail!("no bootstrap URL: pass --url or set store.bootstrap_url");
            }
            let engine = open_engine(cfg).await?;
            if engine.bootstrap().await {
                println!("Bootstrap complete ({} records)", engine.stats().await?.count);
            } else {
                println!("Bootstrap skipped");
            }
        }
        Command::Stats => {
            let engine = open_engine(cfg).await?;
            let stats = engine.stats().await?;
            println!("records: {}\nsize: {:.2} MB", stats.count, stats.size_mb);
        }
        Command::Clear { yes } => {
            if !yes {
                bail!("refusing to clear without --yes");
            }
            let engine = open_engine(cfg).await?;
            engine.clear().await?;
            println!("Store cleared");
        }
    }
    Ok(())
}
