// src/extractors/branch.rs
//! Splits the "Pelapor + Cabang" cell of a block header.
//!
//! The rendered header repeats the reporting bank in front of the branch,
//! e.g. `BANK MANDIRI BANK MANDIRI KC TJ.PINANG`. The split is heuristic:
//! strategies are tried in order and the first that recognises the shape wins.
//! When none does, the whole string is returned as the organization with an
//! empty branch.

use crate::extractors::text::normalize;
use once_cell::sync::Lazy;
use regex::Regex;

/// A single way of recognising `(organization, branch)`.
type SplitStrategy = fn(&str) -> Option<(String, String)>;

// KC, KCP, KCK, KCU..., CAPEM (sub-branch) and "Kantor Cabang" (branch office)
static BRANCH_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s+(KC[A-Z]*|CAPEM|KANTOR\s+CABANG)(?:\s|$)")
        .expect("Failed to compile BRANCH_MARKER_RE")
});

const STRATEGIES: &[(&str, SplitStrategy)] = &[
    ("doubled-prefix", split_on_doubled_prefix),
    ("doubled-word", split_on_doubled_word),
    ("branch-marker", split_on_branch_marker),
];

/// Returns `(organization, branch)` for a raw header cell. Never fails; the
/// worst case is `(raw, "")`.
pub fn split_bank_branch(raw: &str) -> (String, String) {
    let text = normalize(raw);

    for (name, strategy) in STRATEGIES {
        if let Some((organization, branch)) = strategy(&text) {
            tracing::trace!("Split '{}' with {} strategy", text, name);
            return (organization, branch);
        }
    }

    tracing::debug!("No bank/branch split recognised for '{}'", text);
    (text, String::new())
}

/// Shortest prefix of two or more words that is immediately repeated and
/// followed by a non-empty remainder.
fn split_on_doubled_prefix(text: &str) -> Option<(String, String)> {
    let words: Vec<&str> = text.split(' ').collect();

    for i in 2..=words.len() {
        let candidate = words[..i].join(" ");
        let rest = text[candidate.len()..].trim();
        if let Some(after) = rest.strip_prefix(candidate.as_str()) {
            let branch = after.trim();
            if !branch.is_empty() {
                return Some((candidate, branch.to_string()));
            }
        }
    }
    None
}

/// Everything from the first branch-office marker onward is the branch. The
/// part before it is halved when it is two identical word sequences.
fn split_on_branch_marker(text: &str) -> Option<(String, String)> {
    let marker = BRANCH_MARKER_RE.find(text)?;
    let before = text[..marker.start()].trim();
    let branch = text[marker.start()..].trim().to_string();

    let words: Vec<&str> = before.split_whitespace().collect();
    let half = words.len() / 2;
    let organization = if half > 0 && words[..half] == words[half..] {
        words[..half].join(" ")
    } else {
        before.to_string()
    };

    Some((organization, branch))
}

/// One-word bank names (`BCA BCA CABANG UTAMA`) are invisible to the prefix
/// search, which starts at two words. Must run before the marker strategy so a
/// marker inside the branch (`BRI BRI KANCA KC SLEMAN`) stays in the branch.
fn split_on_doubled_word(text: &str) -> Option<(String, String)> {
    let words: Vec<&str> = text.split(' ').collect();
    if words.len() >= 3 && words[0] == words[1] {
        return Some((words[0].to_string(), words[2..].join(" ")));
    }
    None
}
