//! Blocklist input filter for the query endpoint.
//!
//! Strips SQL keywords and comment markers by plain case-insensitive
//! substring removal, then strips anything that looks like an HTML tag.
//! Matches inside words are stripped too (`"Charlie"` becomes `"lie"`).
//!
//! This is a blocklist, not a parser: it does not make a value safe to
//! splice into SQL or HTML. Callers that need those guarantees must use
//! parameterized queries and context-aware escaping.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

/// Terms removed from input, in removal order.
pub const BLACKLIST: [&str; 18] = [
    "select", "union", "insert", "update", "delete", "drop", "alter", "--", ";", "/*", "*/",
    "@@", "@", "char", "nchar", "varchar", "nvarchar", "xp_",
];

static TERM_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    BLACKLIST
        .iter()
        .map(|term| {
            RegexBuilder::new(&regex::escape(term))
                .case_insensitive(true)
                .build()
                .expect("escaped literal is a valid pattern")
        })
        .collect()
});

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<.*?>").expect("tag pattern is valid"));

/// Longest input, in bytes, the query endpoint will sanitize. Each pass of
/// the fixpoint loop rescans the whole text, and nested input such as
/// `"selselectect"` peels one layer per pass.
pub const MAX_INPUT_LEN: usize = 1024;

/// Remove blocklisted terms and tags from user input and trim the result.
///
/// Removal repeats until nothing changes, so terms spliced together by an
/// earlier removal (`"seleselectct"`) are caught as well. Callers handling
/// untrusted input should reject anything longer than [`MAX_INPUT_LEN`]
/// first.
pub fn sanitize(input: &str) -> String {
    strip_to_fixpoint(input).0.trim().to_string()
}

/// Returns the stripped text and the number of passes that changed it.
fn strip_to_fixpoint(input: &str) -> (String, usize) {
    let mut current = input.to_string();
    let mut passes = 0;
    while !current.is_empty() {
        let next = strip_once(&current);
        if next == current {
            break;
        }
        current = next;
        passes += 1;
    }
    (current, passes)
}

fn strip_once(input: &str) -> String {
    let without_terms = TERM_PATTERNS.iter().fold(input.to_string(), |text, pattern| {
        pattern.replace_all(&text, "").into_owned()
    });
    TAG_PATTERN.replace_all(&without_terms, "").into_owned()
}
