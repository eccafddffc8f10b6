//! Markdown cleanup applied before segmenting `type = "md"` documents.

use once_cell::sync::Lazy;
use regex::Regex;

static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").expect("link regex"));
static EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[*_]{1,2}([^*_]+)[*_]{1,2}").expect("emphasis regex"));
static BLANKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").expect("blank regex"));
static NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n+").expect("newline regex"));
static CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").expect("code regex"));

/// Unescape doubled backslashes, keep link text, drop bold/italic/inline-code
/// markers and collapse whitespace.
///
/// Newline runs are collapsed to one, so blank-line section breaks do not
/// survive sanitization; sections then come from headers and bullets only.
pub fn sanitize_markdown(text: &str) -> String {
    let text = text.replace("\\\\", "\\");
    let text = LINK.replace_all(&text, "$1");
    let text = EMPHASIS.replace_all(&text, "$1");
    let text = BLANKS.replace_all(&text, " ");
    let text = NEWLINES.replace_all(&text, "\n");
    let text = CODE.replace_all(&text, "$1");
    text.trim().to_string()
}
