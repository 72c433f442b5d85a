// src/extractors/blocks.rs
//! Facility block segmentation and per-block field assembly.
//!
//! The report has no explicit block delimiters. Every block starts with a
//! header line (`NNN - <bank> Rp <amount> <date>`) and runs until the next
//! header or the end of the document. Special facilities (guarantees, L/Cs,
//! securities, other) are introduced by a heading line somewhere after the
//! previous header; plain loans have none.

use crate::extractors::branch::split_bank_branch;
use crate::extractors::document::{extract_report_id, extract_subject_name};
use crate::extractors::models::{
    BlockHeader, ExtractedDocument, FacilityCategory, FacilityRecord, SectionHeading, SectionKind,
};
use crate::extractors::text::{extract_currency, extract_field, normalize};
use once_cell::sync::Lazy;
use regex::Regex;

// --- Regex Patterns (Lazy Static) ---
static BLOCK_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{3})\s*-\s*(.+?)\s+Rp\s*([\d.,]+)\s+(\d{2}\s+\w+\s+\d{4})")
        .expect("Failed to compile BLOCK_HEADER_RE")
});

// A heading must be the only thing on its line
static SECTION_HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    let labels: Vec<String> = SectionKind::ALL
        .iter()
        .map(|kind| regex::escape(kind.label()))
        .collect();
    Regex::new(&format!(r"(?im)^({})\s*$", labels.join("|")))
        .expect("Failed to compile SECTION_HEADING_RE")
});

// Usage value ends before the next label on the same line or at the line end
static USAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Jenis Penggunaan\s+([A-Za-z][^\n\d]+?)(?:\s+Frekuensi|\s+Nilai|\s+Suku|\s*\n)")
        .expect("Failed to compile USAGE_RE")
});

static INTEREST_RATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Suku Bunga/Imbalan\s+([\d.,]+\s*%)").expect("Failed to compile INTEREST_RATE_RE")
});

static DECIMAL_POINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d)\.(\d)").expect("Failed to compile DECIMAL_POINT_RE")
});

static ORIGINATION_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Tanggal Akad Awal\s+(\d{2}\s+\w+\s+\d{4})")
        .expect("Failed to compile ORIGINATION_DATE_RE")
});

static MATURITY_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Tanggal Jatuh Tempo\s+(\d{2}\s+\w+\s+\d{4})")
        .expect("Failed to compile MATURITY_DATE_RE")
});

// Quality code patterns, tried in order
static QUALITY_RE: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // Account-number row through to the "Kualitas" cell
        r"(?s)No Rekening.*?Kualitas\s+(\d+\s*-\s*[^\n]+)",
        // Bare "Kualitas" label with a short code
        r"Kualitas\s+(\d+\s*-\s*\w[^\n]{0,30})",
    ]
    .iter()
    .filter_map(|pat| Regex::new(pat).ok())
    .collect()
});

static RESTRUCTURING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Frekuensi Restrukturisasi\s+(\d+)").expect("Failed to compile RESTRUCTURING_RE")
});

/// All block headers, in document order.
pub fn find_block_headers(text: &str) -> Vec<BlockHeader> {
    BLOCK_HEADER_RE
        .captures_iter(text)
        .filter_map(|caps| {
            Some(BlockHeader {
                start: caps.get(0)?.start(),
                organization_raw: caps.get(2)?.as_str().trim().to_string(),
                amount_raw: caps.get(3)?.as_str().to_string(),
                date_raw: caps.get(4)?.as_str().to_string(),
            })
        })
        .collect()
}

/// All section headings, in document order.
pub fn find_section_headings(text: &str) -> Vec<SectionHeading> {
    SECTION_HEADING_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let label = caps.get(1)?;
            Some(SectionHeading {
                start: label.start(),
                kind: SectionKind::from_label(label.as_str())?,
                label: label.as_str().to_string(),
            })
        })
        .collect()
}

/// Byte spans of every header match, for the debug view.
pub fn header_spans(text: &str) -> Vec<(usize, usize)> {
    BLOCK_HEADER_RE.find_iter(text).map(|m| (m.start(), m.end())).collect()
}

/// Byte spans of every heading match, for the debug view.
pub fn heading_spans(text: &str) -> Vec<(usize, usize)> {
    SECTION_HEADING_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| (m.start(), m.end()))
        .collect()
}

/// The heading with the greatest offset in `[previous_start, block_start)`.
///
/// `headings` must be sorted by `start`.
fn heading_before(
    headings: &[SectionHeading],
    previous_start: usize,
    block_start: usize,
) -> Option<&SectionHeading> {
    let idx = headings.partition_point(|h| h.start < block_start);
    headings[..idx].last().filter(|h| h.start >= previous_start)
}

fn first_capture(re: &Regex, window: &str) -> Option<String> {
    re.captures(window)
        .and_then(|caps| caps.get(1))
        .map(|m| normalize(m.as_str()))
}

fn extract_usage(window: &str) -> Option<String> {
    first_capture(&USAGE_RE, window)
        .or_else(|| extract_field(window, "Jenis Penggunaan", &["Frekuensi", "\n"]))
}

/// Interest rate with decimal points rendered as commas (`10.25 %` -> `10,25 %`).
fn extract_interest_rate(window: &str) -> Option<String> {
    let rate = first_capture(&INTEREST_RATE_RE, window)?;
    Some(DECIMAL_POINT_RE.replace_all(&rate, "${1},${2}").into_owned())
}

fn extract_quality(window: &str) -> Option<String> {
    QUALITY_RE.iter().find_map(|re| first_capture(re, window))
}

/// Restructuring count for loans; an absent label means zero.
fn extract_restructuring_count(window: &str) -> u64 {
    let Some(digits) = first_capture(&RESTRUCTURING_RE, window) else {
        return 0;
    };
    match digits.parse() {
        Ok(count) => count,
        Err(e) => {
            tracing::warn!("Unreadable restructuring count '{}': {}", digits, e);
            0
        }
    }
}

fn assemble_record(header: &BlockHeader, window: &str, category: FacilityCategory) -> FacilityRecord {
    let (organization, branch) = split_bank_branch(&header.organization_raw);

    let (usage, restructuring_count) = if category.is_loan() {
        (extract_usage(window), Some(extract_restructuring_count(window)))
    } else {
        (Some(category.label().to_string()), None)
    };

    FacilityRecord {
        organization,
        branch,
        usage,
        report_id: None,
        original_principal: extract_currency(window, "Plafon Awal"),
        outstanding_balance: format!("Rp {}", header.amount_raw),
        interest_rate: extract_interest_rate(window),
        origination_date: first_capture(&ORIGINATION_DATE_RE, window),
        maturity_date: first_capture(&MATURITY_DATE_RE, window),
        quality: extract_quality(window),
        restructuring_count,
        category,
    }
}

/// Splits the document into facility blocks and extracts one record per block,
/// in document order. A document without block headers yields no records.
pub fn extract_credit_blocks(text: &str) -> Vec<FacilityRecord> {
    let headers = find_block_headers(text);
    if headers.is_empty() {
        tracing::debug!("No facility block headers found");
        return Vec::new();
    }

    let headings = find_section_headings(text);
    tracing::debug!("Found {} block headers and {} section headings", headers.len(), headings.len());

    headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            let block_end = headers.get(i + 1).map_or(text.len(), |next| next.start);
            let previous_start = if i > 0 { headers[i - 1].start } else { 0 };
            let window = &text[header.start..block_end];

            let category = match heading_before(&headings, previous_start, header.start) {
                Some(heading) => FacilityCategory::Section {
                    kind: heading.kind,
                    label: heading.label.clone(),
                },
                None => FacilityCategory::Loan,
            };
            tracing::trace!(
                "Block {} at {}..{} dated {} is '{}'",
                i + 1,
                header.start,
                block_end,
                header.date_raw,
                category.label()
            );

            assemble_record(header, window, category)
        })
        .collect()
}

/// Runs the document-level and block-level extractors over one report and
/// stamps the report number onto every record.
pub fn extract_document(text: &str) -> ExtractedDocument {
    let subject_name = extract_subject_name(text);
    let report_id = extract_report_id(text);

    let mut records = extract_credit_blocks(text);
    for record in &mut records {
        record.report_id = report_id.clone();
    }

    ExtractedDocument { subject_name, report_id, records }
}
