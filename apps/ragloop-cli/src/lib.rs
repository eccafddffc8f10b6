//! Shared plumbing for the ragloop binaries: logging, engine setup and
//! directory ingestion.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use ragloop_agent::RagEngine;
use ragloop_core::config::{Config, RagConfig};
use ragloop_core::types::Meta;

const INGESTED_EXTENSIONS: [&str; 4] = ["txt", "md", "markdown", "text"];

/// `RUST_LOG` wins; otherwise `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();
}

pub fn load_config() -> Result<RagConfig> {
    let config = Config::load().context("loading config")?;
    Ok(config.rag()?)
}

pub async fn open_engine(cfg: RagConfig) -> Result<RagEngine> {
    RagEngine::from_config(cfg).await.context("opening engine")
}

/// Text files under `root` (or `root` itself when it is a file), sorted.
pub fn collect_documents(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|x| x.to_str())
                .is_some_and(|x| INGESTED_EXTENSIONS.contains(&x.to_ascii_lowercase().as_str()))
        })
        .collect();
    files.sort();
    files
}

/// Document id: the path relative to `root` without its extension, with
/// `/` separators. A single-file root uses the file stem.
pub fn doc_id_for(root: &Path, file: &Path) -> String {
    let rel = match file.strip_prefix(root) {
        Ok(r) if !r.as_os_str().is_empty() => r.to_path_buf(),
        _ => PathBuf::from(file.file_name().unwrap_or_default()),
    };
    rel.with_extension("")
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Caller metadata attached to every chunk of `file`.
pub fn document_metadata(file: &Path) -> Meta {
    let mut meta = Meta::new();
    let kind = match file.extension().and_then(|x| x.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("md" | "markdown") => "md",
        _ => "txt",
    };
    meta.insert("type".into(), kind.into());
    meta.insert("source".into(), file.display().to_string().into());
    meta
}

/// Ingest every text file under `root`, one document at a time, with a
/// progress bar per document. Returns `(documents, chunks)`.
pub async fn ingest_path(engine: &RagEngine, root: &Path) -> Result<(usize, usize)> {
    let files = collect_documents(root);
    if files.is_empty() {
        warn!(path = %root.display(), "no text files to ingest");
        return Ok((0, 0));
    }
    info!(files = files.len(), path = %root.display(), "ingesting");

    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")?
        .progress_chars("#>-");
    let mut chunks = 0usize;
    for file in &files {
        let content = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
        let doc_id = doc_id_for(root, file);
        let pb = ProgressBar::new(100);
        pb.set_style(style.clone());
        pb.set_message(doc_id.clone());
        let report = |pct: f32, _doc: &str| pb.set_position(pct.round() as u64);
        let n = engine
            .ingest(&doc_id, &content, &document_metadata(file), Some(&report))
            .await
            .with_context(|| format!("ingesting {}", file.display()))?;
        pb.finish_with_message(format!("{doc_id} ({n} chunks)"));
        chunks += n;
    }
    Ok((files.len(), chunks))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_ids_are_relative_paths() {
        let root = Path::new("/data/docs");
        assert_eq!(doc_id_for(root, Path::new("/data/docs/guides/setup.md")), "guides/setup");
        assert_eq!(doc_id_for(Path::new("/data/docs/a.txt"), Path::new("/data/docs/a.txt")), "a");
    }

    #[test]
    fn markdown_files_are_tagged() {
        assert_eq!(document_metadata(Path::new("x/README.MD")).get("type"), Some(&"md".into()));
        assert_eq!(document_metadata(Path::new("x/notes.txt")).get("type"), Some(&"txt".into()));
    }

    #[test]
    fn collects_only_text_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("b.md"), "# B").unwrap();
        fs::write(dir.path().join("sub/a.txt"), "a").unwrap();
        fs::write(dir.path().join("image.png"), [0u8]).unwrap();
        let files = collect_documents(dir.path());
        assert_eq!(files, vec![dir.path().join("b.md"), dir.path().join("sub/a.txt")]);
    }
}
