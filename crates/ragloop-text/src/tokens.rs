//! Heuristic token estimate.
//!
//! Not a tokenizer: a weighted count of surface features that deliberately
//! over-estimates. Chunk budgets and the token-budgeted retrieval mode are
//! calibrated against this exact formula, so the category definitions, the
//! weights and the order of summation must stay as they are.

const WORD_WEIGHT: f64 = 1.3;
const WHITESPACE_RUN_WEIGHT: f64 = 0.1;
const TABLE_SEPARATOR_WEIGHT: f64 = 0.5;
const NUMBER_WEIGHT: f64 = 0.5;
const PUNCTUATION_WEIGHT: f64 = 0.3;
const SPECIAL_CHAR_WEIGHT: f64 = 1.5;
const NEWLINE_WEIGHT: f64 = 0.2;
const MULTIBYTE_FACTOR: f64 = 1.2;

const PUNCTUATION: &[char] = &['.', ',', '!', '?', ';', ':', '\'', '"', '(', ')', '[', ']', '{', '}'];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Counts {
    words: usize,
    whitespace_runs: usize,
    table_separators: usize,
    numbers: usize,
    punctuation: usize,
    special_chars: usize,
    newlines: usize,
}

pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    let c = count(text);
    let mut estimate = 0.0_f64;
    estimate += c.words as f64 * WORD_WEIGHT;
    estimate += c.whitespace_runs as f64 * WHITESPACE_RUN_WEIGHT;
    estimate += c.table_separators as f64 * TABLE_SEPARATOR_WEIGHT;
    estimate += c.numbers as f64 * NUMBER_WEIGHT;
    estimate += c.punctuation as f64 * PUNCTUATION_WEIGHT;
    estimate += c.special_chars as f64 * SPECIAL_CHAR_WEIGHT;
    estimate += c.newlines as f64 * NEWLINE_WEIGHT;
    // UTF-8 longer than UTF-16 exactly when a non-ASCII char is present.
    if !text.is_ascii() {
        estimate *= MULTIBYTE_FACTOR;
    }
    estimate.ceil() as usize
}

fn count(text: &str) -> Counts {
    let mut c = Counts { words: count_words(text), ..Counts::default() };

    let mut run_len = 0usize;
    let mut in_digits = false;
    for ch in text.chars() {
        if matches!(ch, ' ' | '\t' | '\n' | '\r') {
            run_len += 1;
        } else {
            if run_len > 1 {
                c.whitespace_runs += 1;
            }
            run_len = 0;
        }

        let is_digit = ch.is_ascii_digit();
        if is_digit && !in_digits {
            c.numbers += 1;
        }
        in_digits = is_digit;

        if ch == '|' {
            c.table_separators += 1;
        }
        if ch == '\n' {
            c.newlines += 1;
        }
        if PUNCTUATION.contains(&ch) {
            c.punctuation += 1;
        } else if !(ch.is_ascii_alphanumeric() || ch.is_whitespace()) {
            // Astral chars weigh as two UTF-16 units.
            c.special_chars += ch.len_utf16();
        }
    }
    if run_len > 1 {
        c.whitespace_runs += 1;
    }
    c
}

/// Words after collapsing blank runs and repeated newlines. A text made only
/// of whitespace still counts as one (empty) word.
fn count_words(text: &str) -> usize {
    let normalized = normalize_whitespace(text);
    if normalized.is_empty() {
        1
    } else {
        normalized.split_whitespace().count()
    }
}

fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev: Option<char> = None;
    for ch in text.chars() {
        match ch {
            ' ' | '\t' if matches!(prev, Some(' ')) => continue,
            ' ' | '\t' => {
                out.push(' ');
                prev = Some(' ');
            }
            '\n' if matches!(prev, Some('\n')) => continue,
            _ => {
                out.push(ch);
                prev = Some(ch);
            }
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_zero() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn plain_sentence() {
        // 4 words * 1.3 + 1 period * 0.3 = 5.5 -> 6
        assert_eq!(estimate_tokens("Section A text here."), 6);
    }

    #[test]
    fn whitespace_only_still_costs() {
        // one empty word (1.3) + one run of two blanks (0.1)
        assert_eq!(estimate_tokens("  "), 2);
    }

    #[test]
    fn counts_every_category() {
        let c = count("a | 12 b\n\nc!");
        assert_eq!(c.words, 5, "a | 12 b c!");
        assert_eq!(c.table_separators, 1);
        assert_eq!(c.numbers, 1);
        assert_eq!(c.punctuation, 1);
        assert_eq!(c.special_chars, 1, "the pipe is also a special char");
        assert_eq!(c.newlines, 2);
        assert_eq!(c.whitespace_runs, 1);
    }

    #[test]
    fn digit_runs_count_once() {
        assert_eq!(count("2024-01-15").numbers, 3);
    }

    #[test]
    fn multibyte_text_is_scaled() {
        // "café" = 1 word (1.3) + 1 special char (1.5) = 2.8, * 1.2 = 3.36 -> 4
        assert_eq!(estimate_tokens("café"), 4);
        // emoji is two UTF-16 units: 1.3 + 3.0 = 4.3, * 1.2 = 5.16 -> 6
        assert_eq!(estimate_tokens("🙂"), 6);
    }

    #[test]
    fn appending_content_never_lowers_estimate() {
        let samples = ["alpha", "beta.", " gamma", "| 42 |", "\n\nnew paragraph", "naïve", "x"];
        let mut text = String::new();
        let mut last = 0;
        for s in samples {
            text.push_str(s);
            let now = estimate_tokens(&text);
            assert!(now >= last, "{text:?}: {now} < {last}");
            last = now;
        }
    }

    #[test]
    fn normalization_collapses_runs() {
        assert_eq!(normalize_whitespace("  a \t b\n\n\nc  "), "a b\nc");
    }
}
