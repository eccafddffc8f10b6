//! Bounded multi-round retrieval.
//!
//! Each round searches with a query derived from everything found so far,
//! so rounds run strictly in order. The loop ends after the configured
//! number of rounds (never more than [`MAX_ROUNDS`]) or as soon as more
//! matches than `max_accumulated_chunks` were gathered. Any failing round
//! aborts the whole run.

use std::sync::Arc;

use tracing::{debug, info};

use ragloop_core::config::{AgentConfig, MAX_ROUNDS};
use ragloop_core::error::Result;
use ragloop_core::traits::Completer;
use ragloop_core::types::{HistoryMatch, RagAnswer, SearchHistoryEntry, SearchResult, Source};
use ragloop_vector::Retriever;

use crate::prompt::{gathered_context, PromptBuilder};

/// Why the loop stopped gathering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    MaxRounds,
    ChunkBudgetExceeded,
}

pub struct IterativeRetrievalLoop {
    retriever: Arc<Retriever>,
    completer: Arc<dyn Completer>,
    prompts: PromptBuilder,
    settings: AgentConfig,
}

impl IterativeRetrievalLoop {
    pub fn new(retriever: Arc<Retriever>, completer: Arc<dyn Completer>, settings: AgentConfig) -> Self {
        let prompts = PromptBuilder::new(settings.default_context.clone());
        Self { retriever, completer, prompts, settings }
    }

    /// Run with the configured number of rounds.
    pub async fn run(&self, query: &str) -> Result<RagAnswer> {
        self.run_with_rounds(query, self.settings.max_questions).await
    }

    pub async fn run_with_rounds(&self, query: &str, max_questions: usize) -> Result<RagAnswer> {
        let rounds = max_questions.min(MAX_ROUNDS);
        let mut history: Vec<SearchHistoryEntry> = Vec::new();
        let mut gathered: Vec<SearchResult> = Vec::new();
        let mut termination = Termination::MaxRounds;

        for round in 0..rounds {
            let question = self.next_query(query, &history).await?;
            let matches = self
                .retriever
                .search_with_context(&question, self.settings.round_top_k, self.settings.round_context_window)
                .await?;
            debug!(round, question = %question, matches = matches.len(), "retrieval round");

            if !matches.is_empty() {
                history.push(SearchHistoryEntry {
                    question,
                    matches: matches.iter().map(HistoryMatch::from).collect(),
                });
                gathered.extend(matches);
            }
            if gathered.len() > self.settings.max_accumulated_chunks {
                termination = Termination::ChunkBudgetExceeded;
                break;
            }
        }
        info!(rounds = history.len(), gathered = gathered.len(), ?termination, "retrieval loop finished");

        let prompt = self.prompts.final_answer(query, &gathered_context(&gathered));
        let final_answer = self.completer.complete(&prompt).await?;
        Ok(RagAnswer {
            final_answer,
            search_history: history,
            sources: gathered.iter().map(Source::from).collect(),
        })
    }

    /// The literal query while nothing was found yet; afterwards a query
    /// generated from the history, falling back to the original when the
    /// provider returns nothing usable.
    async fn next_query(&self, original: &str, history: &[SearchHistoryEntry]) -> Result<String> {
        if history.is_empty() {
            return Ok(original.to_string());
        }
        let prompt = self.prompts.next_question(original, history);
        let generated = self.completer.complete(&prompt).await?;
        let generated = generated.trim();
        Ok(if generated.is_empty() { original.to_string() } else { generated.to_string() })
    }
}
