// src/utils/html_debug.rs
use crate::extractors::blocks::{header_spans, heading_spans};
use crate::extractors::document::report_id_spans;
use crate::utils::error::AppError;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Renders the document text as HTML with the given byte spans highlighted.
/// Spans overlapping an earlier one are dropped.
pub fn render_debug_html(text: &str, highlights: &[(usize, usize, &str)]) -> String {
    let mut debug_html = String::from("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<style>\n");

    // CSS for highlight colors
    debug_html.push_str(".highlight-header { background-color: #90EE90; }\n");
    debug_html.push_str(".highlight-heading { background-color: #ADD8E6; }\n");
    debug_html.push_str(".highlight-report-id { background-color: #FFD700; }\n");
    debug_html.push_str(".highlight-custom { background-color: #FFC0CB; }\n");
    debug_html.push_str("</style>\n</head>\n<body>\n<pre>\n");

    let mut last_pos = 0;
    let mut sorted_highlights = highlights.to_vec();
    sorted_highlights.sort_by_key(|h| h.0); // Sort by position

    for (start, end, highlight_type) in sorted_highlights {
        if start < last_pos || end > text.len() || start > end {
            tracing::trace!("Skipping overlapping highlight {}-{} ({})", start, end, highlight_type);
            continue;
        }

        debug_html.push_str(&escape_html(&text[last_pos..start]));

        let css_class = match highlight_type {
            "header" => "highlight-header",
            "heading" => "highlight-heading",
            "report-id" => "highlight-report-id",
            _ => "highlight-custom",
        };

        debug_html.push_str(&format!(
            "<span class=\"{}\" title=\"Position: {}-{}, Type: {}\">",
            css_class, start, end, highlight_type
        ));
        debug_html.push_str(&escape_html(&text[start..end]));
        debug_html.push_str("</span>");

        last_pos = end;
    }

    debug_html.push_str(&escape_html(&text[last_pos..]));
    debug_html.push_str("\n</pre>\n</body>\n</html>");
    debug_html
}

/// Writes `document.txt` (the joined page text) and `annotated.html` (block
/// headers, section headings and report identifiers highlighted) into
/// `debug_dir`.
pub fn write_debug_bundle(text: &str, debug_dir: &Path) -> Result<PathBuf, AppError> {
    fs::create_dir_all(debug_dir)?;

    let text_path = debug_dir.join("document.txt");
    fs::write(&text_path, text)?;
    tracing::info!("Saved raw document text to {}", text_path.display());

    let mut highlights: Vec<(usize, usize, &str)> = header_spans(text)
        .into_iter()
        .map(|(start, end)| (start, end, "header"))
        .collect();
    highlights.extend(heading_spans(text).into_iter().map(|(start, end)| (start, end, "heading")));
    highlights.extend(report_id_spans(text).into_iter().map(|(start, end)| (start, end, "report-id")));

    let html_path = debug_dir.join("annotated.html");
    let mut file = File::create(&html_path)?;
    file.write_all(render_debug_html(text, &highlights).as_bytes())?;

    tracing::info!("Saved debug HTML to {} ({} highlights)", html_path.display(), highlights.len());
    Ok(html_path)
}
