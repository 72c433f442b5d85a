// src/extractors/document.rs
//! Singleton fields that appear once per report: the debtor name and the
//! report number.

use crate::extractors::text::normalize;
use once_cell::sync::Lazy;
use regex::Regex;

// Debtor name patterns, most specific first
static SUBJECT_NAME_RE: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // "Nama Sesuai Identitas ... Identitas" table, name on the row that ends in NIK
        r"(?s)Nama Sesuai Identitas\s+Identitas.*?\n(\S[^\n]+?)\s+NIK",
        // "Nama  Jenis Kelamin  <n>" column header, name on the following line
        r"Nama\s+Jenis Kelamin\s+\d+\n(\S[^\n]+)",
        // Bare "Nama" label followed by an upper-case line
        r"Nama\s*\n([A-Z ]+)",
    ]
    .iter()
    .filter_map(|pat| Regex::new(pat).ok())
    .collect()
});

// e.g. 41897/IDEB/0101564/2019
static REPORT_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d+/IDEB/[\d/]+").expect("Failed to compile REPORT_ID_RE")
});

/// Debtor name from the first pattern that yields a non-empty value.
pub fn extract_subject_name(text: &str) -> Option<String> {
    SUBJECT_NAME_RE.iter().enumerate().find_map(|(idx, re)| {
        let name = normalize(re.captures(text)?.get(1)?.as_str());
        if name.is_empty() {
            return None;
        }
        tracing::debug!("Debtor name matched by pattern {}: '{}'", idx + 1, name);
        Some(name)
    })
}

/// First `<digits>/IDEB/<digits>/...` identifier in the document.
pub fn extract_report_id(text: &str) -> Option<String> {
    REPORT_ID_RE.find(text).map(|m| m.as_str().trim().to_string())
}

/// Byte spans of every report identifier, for the debug view.
pub fn report_id_spans(text: &str) -> Vec<(usize, usize)> {
    REPORT_ID_RE.find_iter(text).map(|m| (m.start(), m.end())).collect()
}
