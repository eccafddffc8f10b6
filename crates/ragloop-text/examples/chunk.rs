use std::env;

use ragloop_core::types::Meta;
use ragloop_text::{chunk_text, estimate_tokens, DEFAULT_MAX_TOKENS};

// Print the chunks a file would be split into.
// Usage:
//   cargo run -p ragloop-text --example chunk -- <file> [max_tokens]
// Files ending in `.md` are sanitized as markdown first.

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let Some(path) = args.first() else {
        eprintln!("usage: chunk <file> [max_tokens]");
        std::process::exit(2);
    };
    let max_tokens = match args.get(1) {
        Some(s) => s.parse()?,
        None => DEFAULT_MAX_TOKENS,
    };
    let text = std::fs::read_to_string(path)?;
    let mut meta = Meta::new();
    if path.ends_with(".md") {
        meta.insert("type".into(), "md".into());
    }
    let chunks = chunk_text(&text, max_tokens, &meta);
    println!("{} chunks (max {} tokens, document {} tokens)", chunks.len(), max_tokens, estimate_tokens(&text));
    for (i, c) in chunks.iter().enumerate() {
        println!("--- #{i} ({} tokens)\n{c}", estimate_tokens(c));
    }
    Ok(())
}
