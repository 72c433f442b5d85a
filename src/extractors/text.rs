// src/extractors/text.rs
//! Whitespace normalization and label-anchored scalar lookups.
//!
//! Every lookup here is total: a missing label yields `None`, never an error.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

static WHITESPACE_RUN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s+").expect("Failed to compile WHITESPACE_RUN_RE")
});

/// Collapses every whitespace run (newlines included) to one space and trims.
pub fn normalize(text: &str) -> String {
    WHITESPACE_RUN_RE.replace_all(text, " ").trim().to_string()
}

/// Builds a case-insensitive regex of `label` (escaped) followed by `suffix`.
fn label_regex(label: &str, suffix: &str) -> Option<Regex> {
    RegexBuilder::new(&format!("{}{}", regex::escape(label), suffix))
        .case_insensitive(true)
        .build()
        .ok()
}

/// Returns the value following `label` in `window`.
///
/// Whitespace after the label may span lines; the value itself runs to the end
/// of its line. It is cut at the earliest (case-insensitive) occurrence of any
/// terminator and normalized. `None` means the label was not found; a label
/// with nothing after it gives `Some("")`.
pub fn extract_field(window: &str, label: &str, terminators: &[&str]) -> Option<String> {
    let re = label_regex(label, r"\s*(.*)")?;
    let caps = re.captures(window)?;
    let value = caps.get(1).map_or("", |m| m.as_str()).trim();

    let cut = terminators
        .iter()
        .filter(|t| !t.is_empty())
        .filter_map(|t| {
            RegexBuilder::new(&regex::escape(t))
                .case_insensitive(true)
                .build()
                .ok()
                .and_then(|re| re.find(value))
                .map(|m| m.start())
        })
        .min()
        .unwrap_or(value.len());

    Some(normalize(&value[..cut]))
}

/// Returns `"Rp <number>"` when `label` is directly followed by the `Rp` marker
/// and a numeric literal (digits, `.` and `,`).
pub fn extract_currency(window: &str, label: &str) -> Option<String> {
    let re = label_regex(label, r"\s*Rp\s*([\d.,]+)")?;
    let caps = re.captures(window)?;
    Some(format!("Rp {}", caps.get(1)?.as_str().trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_all_whitespace() {
        assert_eq!(normalize("  BANK \t ACME\n\n KC  A \r\n"), "BANK ACME KC A");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \n\t "), "");
    }

    #[test]
    fn test_extract_field_with_terminator() {
        let value = extract_field(
            "Jenis Penggunaan MODAL KERJA Frekuensi 2",
            "Jenis Penggunaan",
            &["Frekuensi"],
        );
        assert_eq!(value.as_deref(), Some("MODAL KERJA"));
    }

    #[test]
    fn test_extract_field_earliest_terminator_wins() {
        let value = extract_field(
            "Jenis Penggunaan KONSUMSI Suku Bunga 9% Frekuensi 0",
            "jenis penggunaan",
            &["Frekuensi", "suku bunga"],
        );
        assert_eq!(value.as_deref(), Some("KONSUMSI"));
    }

    #[test]
    fn test_extract_field_stops_at_line_end() {
        let window = "Jenis Penggunaan INVESTASI\nNilai Proyek Rp 10";
        assert_eq!(extract_field(window, "Jenis Penggunaan", &[]).as_deref(), Some("INVESTASI"));
    }

    #[test]
    fn test_extract_field_absent_and_empty() {
        assert_eq!(extract_field("Plafon Rp 1", "Jenis Penggunaan", &[]), None);
        assert_eq!(extract_field("Jenis Penggunaan", "Jenis Penggunaan", &[]).as_deref(), Some(""));
    }

    #[test]
    fn test_extract_field_label_is_literal() {
        // Regex metacharacters in the label must not be interpreted
        let window = "Suku Bunga/Imbalan (%) 7.5";
        assert_eq!(extract_field(window, "Imbalan (%)", &[]).as_deref(), Some("7.5"));
    }

    #[test]
    fn test_extract_currency_shapes() {
        assert_eq!(
            extract_currency("Plafon Awal Rp 1.000.000", "Plafon Awal").as_deref(),
            Some("Rp 1.000.000")
        );
        assert_eq!(
            extract_currency("plafon awal\nRp25.000.000,00 Baki", "Plafon Awal").as_deref(),
            Some("Rp 25.000.000,00")
        );
        assert_eq!(extract_currency("Plafon Awal -", "Plafon Awal"), None);
        assert_eq!(extract_currency("Plafon Awal -", "Plafon Awal").unwrap_or_default(), "");
    }
}
