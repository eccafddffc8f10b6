use ragloop_core::config::Config;
use ragloop_embed::get_default_embedder;

// Embed two strings with the configured provider and print their similarity.
// Usage:
//   cargo run -p ragloop-embed --example embed
//   APP_USE_FAKE_EMBEDDINGS=1 cargo run -p ragloop-embed --example embed

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Config::load()?.rag()?;
    let embedder = get_default_embedder(&cfg.provider)?;
    embedder.health_check().await?;
    let a = embedder.embed("hello world").await?;
    let b = embedder.embed("rust embeddings").await?;
    let dot: f32 = a.iter().zip(&b).map(|(x, y)| x * y).sum();
    println!("model={} dim={} dot={dot:.4}", embedder.model(), a.len());
    Ok(())
}
