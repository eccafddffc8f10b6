//! Prompt templates for query refinement and the final answer.

use ragloop_core::types::{SearchHistoryEntry, SearchResult};

const QUERY_INSTRUCTIONS: &str = "Generate a new search query that would help gather additional relevant information. The query should:
1. Explore aspects not covered by previous searches
2. Help fill knowledge gaps based on existing results
3. Be specific and focused
4. Relate directly to the original question

Return only the search query without any other text.";

#[derive(Debug, Clone)]
pub struct PromptBuilder {
    default_context: String,
}

impl PromptBuilder {
    pub fn new(default_context: impl Into<String>) -> Self {
        Self { default_context: default_context.into() }
    }

    /// Prompt asking for the next search query.
    ///
    /// With no history this is the original query itself.
    pub fn next_question(&self, original: &str, history: &[SearchHistoryEntry]) -> String {
        if history.is_empty() {
            return original.to_string();
        }
        let rounds: Vec<String> = history
            .iter()
            .enumerate()
            .map(|(n, entry)| {
                let matches: Vec<String> = entry
                    .matches
                    .iter()
                    .enumerate()
                    .map(|(i, m)| {
                        let ctx = m.context.as_ref();
                        format!(
                            "\n{}. Context before: {}\n   Main content: {}\n   Context after: {}",
                            i + 1,
                            or_none(ctx.map(|c| c.before.as_str())),
                            m.content,
                            or_none(ctx.map(|c| c.after.as_str())),
                        )
                    })
                    .collect();
                format!("\nQuestion {}: {}\nTop Matches:\n{}", n + 1, entry.question, matches.join("\n"))
            })
            .collect();

        format!(
            "Original question: {original}\n\nPrevious searches and their results, including context:\n{}\n\n{QUERY_INSTRUCTIONS}",
            rounds.join("\n\n")
        )
    }

    /// Prompt for the final answer over the gathered `context`; the default
    /// context stands in when nothing was gathered.
    pub fn final_answer(&self, original: &str, context: &str) -> String {
        let context = if context.trim().is_empty() { self.default_context.as_str() } else { context };
        format!(
            "Context:\n{context}\n\n\
             Based on all the information gathered, please answer this question: {original}\n\n\
             Provide a focused, direct response that synthesizes the relevant information, including \
             contextual details where relevant. Speak as if you are the author of the information."
        )
    }
}

fn or_none(text: Option<&str>) -> &str {
    match text {
        Some(t) if !t.is_empty() => t,
        _ => "[none]",
    }
}

/// One "previous / relevant / following" block per gathered match,
/// separated by `---` lines.
pub fn gathered_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| {
            let (before, after) = r.context.as_ref().map_or(("", ""), |c| (c.before.as_str(), c.after.as_str()));
            format!("Previous context:\n{before}\n\nRelevant text:\n{}\n\nFollowing context:\n{after}", r.content)
        })
        .collect::<Vec<_>>()
        .join("\n---\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragloop_core::types::{HistoryMatch, SearchContext};

    fn entry(question: &str, before: &str) -> SearchHistoryEntry {
        SearchHistoryEntry {
            question: question.into(),
            matches: vec![HistoryMatch {
                content: "main text".into(),
                context: Some(SearchContext { before: before.into(), after: String::new() }),
                similarity: 0.5,
            }],
        }
    }

    #[test]
    fn empty_history_is_the_query() {
        let p = PromptBuilder::new("fallback");
        assert_eq!(p.next_question("How do scenes work?", &[]), "How do scenes work?");
    }

    #[test]
    fn history_prompt_lists_rounds_and_matches() {
        let p = PromptBuilder::new("fallback");
        let prompt = p.next_question("orig", &[entry("first", "earlier"), entry("second", "")]);
        assert!(prompt.starts_with("Original question: orig\n\nPrevious searches and their results, including context:\n"));
        assert!(prompt.contains("\nQuestion 1: first\nTop Matches:\n\n1. Context before: earlier\n   Main content: main text\n   Context after: [none]"));
        assert!(prompt.contains("Question 2: second"));
        assert!(prompt.contains("Context before: [none]"));
        assert!(prompt.ends_with("Return only the search query without any other text."));
    }

    #[test]
    fn final_answer_falls_back_to_default_context() {
        let p = PromptBuilder::new("nothing found");
        let with = p.final_answer("q?", "gathered");
        assert!(with.starts_with("Context:\ngathered\n\n"));
        assert!(with.contains("please answer this question: q?"));
        assert!(with.ends_with("Speak as if you are the author of the information."));
        assert!(p.final_answer("q?", "  ").starts_with("Context:\nnothing found\n\n"));
    }
}
