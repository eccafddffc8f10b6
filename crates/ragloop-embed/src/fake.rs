//! Deterministic stand-ins for the model server, used offline and in tests.

use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

use async_trait::async_trait;
use twox_hash::XxHash64;

use ragloop_core::error::{Error, Result};
use ragloop_core::traits::{Completer, Embedder};

pub const FAKE_DIM: usize = 384;

/// Hashed bag-of-words embedder. Texts sharing words land close together;
/// identical texts embed identically. Empty text yields the zero vector.
pub struct FakeEmbedder {
    dim: usize,
}

impl FakeEmbedder {
    /// A `dim` of zero is raised to one.
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for token in text.split_whitespace() {
            let token = token.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
            if token.is_empty() {
                continue;
            }
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            v[idx] += 0.5 + (((h >> 32) as u32) as f32) / (u32::MAX as f32);
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }
}

impl Default for FakeEmbedder {
    fn default() -> Self {
        Self::new(FAKE_DIM)
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    fn model(&self) -> &str {
        "fake"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_sync(text))
    }
}

/// Completer replaying canned replies in order, then a fixed fallback.
/// Every prompt it receives is recorded.
#[derive(Default)]
pub struct ScriptedCompleter {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    fail_on_call: Option<usize>,
}

impl ScriptedCompleter {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
            fail_on_call: None,
        }
    }

    /// Make the `n`-th call (0-based) fail as if the provider were down.
    pub fn failing_on(mut self, n: usize) -> Self {
        self.fail_on_call = Some(n);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Completer for ScriptedCompleter {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let call = {
            let mut prompts = self.prompts.lock().map_err(|e| Error::ProviderUnavailable(e.to_string()))?;
            prompts.push(prompt.to_string());
            prompts.len() - 1
        };
        if self.fail_on_call == Some(call) {
            return Err(Error::ProviderUnavailable("scripted failure".into()));
        }
        let mut replies = self.replies.lock().map_err(|e| Error::ProviderUnavailable(e.to_string()))?;
        Ok(replies.pop_front().unwrap_or_else(|| "fake completion".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn shared_words_score_higher() {
        let e = FakeEmbedder::default();
        let q = e.embed_sync("director room");
        let near = e.embed_sync("The director controls the room.");
        let far = e.embed_sync("Bananas grow in bunches.");
        assert!(cosine(&q, &near) > cosine(&q, &far));
    }

    #[test]
    fn empty_text_is_zero_vector() {
        assert!(FakeEmbedder::new(8).embed_sync("").iter().all(|x| *x == 0.0));
    }

    #[test]
    fn zero_dim_is_raised_to_one() {
        let v = FakeEmbedder::new(0).embed_sync("a b");
        assert_eq!(v.len(), 1);
        assert!((v[0] - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn script_then_fallback() {
        let c = ScriptedCompleter::new(["one"]);
        assert_eq!(c.complete("p1").await.unwrap(), "one");
        assert_eq!(c.complete("p2").await.unwrap(), "fake completion");
        assert_eq!(c.prompts(), vec!["p1", "p2"]);
    }
}
