//! Cascading chunker.
//!
//! Text is split on the coarsest boundary that keeps units within the token
//! budget: sections (headers, bullets, blank lines), then sentences, then
//! phrases (`,;:` and the conjunctions and/or/but), then single words. Units
//! below budget are packed greedily; a unit that would overflow the running
//! chunk flushes it first. Boundaries always fall on whitespace and markers
//! stay in the text, so the whitespace-separated tokens of the emitted chunks
//! are exactly those of the (sanitized) input.

use once_cell::sync::Lazy;
use regex::Regex;

use ragloop_core::types::Meta;

use crate::markdown::sanitize_markdown;
use crate::tokens::estimate_tokens;

pub const DEFAULT_MAX_TOKENS: usize = 300;

static SECTION_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*[*•]\s+|\n#{1,6}\s|\n\n+").expect("section regex"));
static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").expect("sentence regex"));
static PHRASE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[,;:]\s+|\s+(?:and|or|but)\s").expect("phrase regex"));

/// Split `text` into chunks of at most `max_tokens` estimated tokens.
///
/// `metadata` is the caller's document metadata; `type = "md"` routes the
/// text through [`sanitize_markdown`] first. The only chunks allowed over
/// budget are single words whose own estimate exceeds it.
pub fn chunk_text(text: &str, max_tokens: usize, metadata: &Meta) -> Vec<String> {
    let prepared = if is_markdown(metadata) { sanitize_markdown(text) } else { text.to_string() };

    let mut chunks = Vec::new();
    for section in split_sections(&prepared) {
        if estimate_tokens(section) <= max_tokens {
            chunks.push(section.to_string());
        } else {
            split_section(section, max_tokens, &mut chunks);
        }
    }
    verify(chunks, max_tokens)
}

pub fn is_markdown(metadata: &Meta) -> bool {
    metadata.get("type").and_then(|v| v.as_str()) == Some("md")
}

fn split_section(section: &str, max_tokens: usize, out: &mut Vec<String>) {
    let mut packer = Packer::new(max_tokens);
    for sentence in split_sentences(section) {
        if estimate_tokens(sentence) > max_tokens {
            packer.flush(out);
            split_sentence(sentence, max_tokens, out);
        } else {
            packer.push(sentence, out);
        }
    }
    packer.flush(out);
}

fn split_sentence(sentence: &str, max_tokens: usize, out: &mut Vec<String>) {
    let mut packer = Packer::new(max_tokens);
    for phrase in split_phrases(sentence) {
        if estimate_tokens(phrase) > max_tokens {
            packer.flush(out);
            pack_words(phrase, max_tokens, out);
        } else {
            packer.push(phrase, out);
        }
    }
    packer.flush(out);
}

fn pack_words(text: &str, max_tokens: usize, out: &mut Vec<String>) {
    let mut packer = Packer::new(max_tokens);
    for word in text.split_whitespace() {
        packer.push(word, out);
    }
    packer.flush(out);
}

/// Re-check every chunk; anything still over budget is split word by word.
fn verify(chunks: Vec<String>, max_tokens: usize) -> Vec<String> {
    let mut verified = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        if estimate_tokens(&chunk) <= max_tokens {
            verified.push(chunk);
        } else {
            pack_words(&chunk, max_tokens, &mut verified);
        }
    }
    verified
}

/// Greedy accumulator shared by every level of the cascade.
struct Packer {
    max_tokens: usize,
    current: String,
}

impl Packer {
    fn new(max_tokens: usize) -> Self {
        Self { max_tokens, current: String::new() }
    }

    fn push(&mut self, unit: &str, out: &mut Vec<String>) {
        if self.current.is_empty() {
            self.current.push_str(unit);
            return;
        }
        let candidate = format!("{} {}", self.current, unit);
        if estimate_tokens(&candidate) > self.max_tokens {
            out.push(std::mem::replace(&mut self.current, unit.to_string()));
        } else {
            self.current = candidate;
        }
    }

    fn flush(&mut self, out: &mut Vec<String>) {
        if !self.current.is_empty() {
            out.push(std::mem::take(&mut self.current));
        }
    }
}

/// Header and bullet markers open the next section; blank lines vanish.
fn split_sections(text: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut start = 0;
    for m in SECTION_BREAK.find_iter(text) {
        sections.push(&text[start..m.start()]);
        start = if m.as_str().trim().is_empty() { m.end() } else { m.start() + 1 };
    }
    sections.push(&text[start..]);
    trimmed(sections)
}

/// Sentences end at `.`, `!` or `?` followed by whitespace; the mark stays.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in SENTENCE_END.find_iter(text) {
        sentences.push(&text[start..=m.start()]);
        start = m.end();
    }
    sentences.push(&text[start..]);
    trimmed(sentences)
}

/// Punctuation stays with the phrase it closes; a conjunction opens the next.
fn split_phrases(text: &str) -> Vec<&str> {
    let mut phrases = Vec::new();
    let mut start = 0;
    for m in PHRASE_BREAK.find_iter(text) {
        let matched = m.as_str();
        if matched.starts_with([',', ';', ':']) {
            phrases.push(&text[start..=m.start()]);
            start = m.end();
        } else {
            let conjunction_at = m.start() + (matched.len() - matched.trim_start().len());
            phrases.push(&text[start..conjunction_at]);
            start = conjunction_at;
        }
    }
    phrases.push(&text[start..]);
    trimmed(phrases)
}

fn trimmed(parts: Vec<&str>) -> Vec<&str> {
    parts.into_iter().map(str::trim).filter(|p| !p.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tokens_of(text: &str) -> Vec<&str> {
        text.split_whitespace().collect()
    }

    fn assert_reconstitutes(input: &str, chunks: &[String]) {
        let joined = chunks.join(" ");
        assert_eq!(tokens_of(&joined), tokens_of(input));
    }

    #[test]
    fn two_paragraphs_become_two_chunks() {
        let chunks = chunk_text("Section A text here.\n\nSection B text here.", 300, &Meta::new());
        assert_eq!(chunks, vec!["Section A text here.", "Section B text here."]);
    }

    #[test]
    fn headers_and_bullets_start_sections() {
        let text = "Intro line\n## Setup\nInstall it\n* first step\n• second step";
        let chunks = chunk_text(text, 300, &Meta::new());
        assert_eq!(chunks, vec!["Intro line", "## Setup\nInstall it", "* first step", "• second step"]);
    }

    #[test]
    fn long_section_packs_sentences() {
        let text = "One two three. Four five six. Seven eight nine. Ten eleven twelve.";
        // each sentence: 3 words + 1 period = 4.2 -> 5; two sentences: 6 words + 2 = 8.4 -> 9
        let chunks = chunk_text(text, 10, &Meta::new());
        assert_eq!(chunks, vec!["One two three. Four five six.", "Seven eight nine. Ten eleven twelve."]);
    }

    #[test]
    fn long_sentence_splits_on_phrases_and_keeps_delimiters() {
        let text = "red apples, green pears and yellow bananas but no grapes";
        let chunks = chunk_text(text, 5, &Meta::new());
        assert_eq!(chunks, vec!["red apples,", "green pears", "and yellow bananas", "but no grapes"]);
        for c in &chunks {
            assert!(estimate_tokens(c) <= 5, "{c:?}");
        }
    }

    #[test]
    fn pending_sentences_flush_before_an_oversized_one() {
        let text = "Short one. alpha beta gamma delta epsilon zeta eta theta iota kappa";
        let chunks = chunk_text(text, 6, &Meta::new());
        assert_eq!(chunks[0], "Short one.");
        assert_reconstitutes(text, &chunks);
    }

    #[test]
    fn oversized_word_stands_alone() {
        let word = "x".repeat(10) + &"|".repeat(20);
        let text = format!("small {word} tail");
        let chunks = chunk_text(&text, 3, &Meta::new());
        assert_eq!(chunks, vec!["small".to_string(), word.clone(), "tail".to_string()]);
        assert!(estimate_tokens(&word) > 3);
    }

    #[test]
    fn markdown_is_sanitized_first() {
        let meta: Meta = serde_json::from_value(json!({ "type": "md" })).unwrap();
        let chunks = chunk_text("Read **this** [doc](http://x.y).", 300, &meta);
        assert_eq!(chunks, vec!["Read this doc."]);
    }

    #[test]
    fn every_chunk_fits_and_nothing_is_lost() {
        let text = "The director controls the room: guests join, scenes mix streams, and links \
                    publish video. Push links send; view links receive!\n\n\
                    | col | col |\n| 1 | 2 |\n\n\
                    A very long sentence that keeps going with many words and more words or even \
                    more words but eventually it has to end somewhere around here, right?";
        for max in [1, 3, 8, 20, 300] {
            let chunks = chunk_text(text, max, &Meta::new());
            assert_reconstitutes(text, &chunks);
            for c in &chunks {
                let single_word = c.split_whitespace().count() == 1;
                assert!(estimate_tokens(c) <= max || single_word, "max={max} chunk={c:?}");
            }
        }
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk_text("", 300, &Meta::new()).is_empty());
        assert!(chunk_text(" \n\n ", 300, &Meta::new()).is_empty());
    }
}
