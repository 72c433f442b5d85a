// src/pdf/reader.rs
use crate::utils::error::PdfError;
use lopdf::Document;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;

// Cheap per-page peek for a block header
static CREDIT_BLOCK_PEEK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{3}\s*-\s*[A-Z]").expect("Failed to compile CREDIT_BLOCK_PEEK_RE")
});

/// A document that can hand out its text one page at a time, in page order.
pub trait PageTextSource {
    fn page_count(&self) -> usize;

    /// Text of the page at `index` (0-based).
    fn page_text(&self, index: usize) -> Result<String, PdfError>;
}

/// Page text recovered from a PDF with lopdf.
pub struct PdfSource {
    document: Document,
    page_numbers: Vec<u32>,
}

impl PdfSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PdfError> {
        let path = path.as_ref();
        tracing::debug!("Loading PDF {}", path.display());

        let document = Document::load(path)?;
        // get_pages() is keyed by page number, so this is page order
        let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();

        tracing::debug!("PDF {} has {} pages", path.display(), page_numbers.len());
        Ok(Self { document, page_numbers })
    }
}

impl PageTextSource for PdfSource {
    fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    fn page_text(&self, index: usize) -> Result<String, PdfError> {
        let page_number = *self.page_numbers.get(index).ok_or_else(|| PdfError::Page {
            page: index + 1,
            message: "page out of range".to_string(),
        })?;

        self.document
            .extract_text(&[page_number])
            .map_err(|e| PdfError::Page { page: index + 1, message: e.to_string() })
    }
}

/// Pre-extracted report text with pages separated by form feeds.
pub struct TextFileSource {
    pages: Vec<String>,
}

impl TextFileSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PdfError> {
        let text = fs::read_to_string(path)?;
        Ok(Self::from_text(&text))
    }

    pub fn from_text(text: &str) -> Self {
        Self { pages: text.split('\x0C').map(str::to_string).collect() }
    }
}

impl PageTextSource for TextFileSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> Result<String, PdfError> {
        self.pages.get(index).cloned().ok_or_else(|| PdfError::Page {
            page: index + 1,
            message: "page out of range".to_string(),
        })
    }
}

/// Picks a source by extension: `.txt` is read as text, anything else as PDF.
pub fn open_source(path: &Path) -> Result<Box<dyn PageTextSource>, PdfError> {
    let is_text = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("txt"));

    if is_text {
        Ok(Box::new(TextFileSource::open(path)?))
    } else {
        Ok(Box::new(PdfSource::open(path)?))
    }
}

/// Reported after every page; carries no backpressure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageProgress {
    pub done: usize,
    pub total: usize,
    /// The page appears to contain a facility block header.
    pub has_credit_block: bool,
}

/// Reads every page in order and joins them with newlines. A page whose text
/// cannot be extracted contributes an empty string.
pub fn read_document<F>(source: &dyn PageTextSource, mut on_page: F) -> String
where
    F: FnMut(&PageProgress),
{
    let total = source.page_count();
    let mut pages = Vec::with_capacity(total);

    for index in 0..total {
        let text = source.page_text(index).unwrap_or_else(|e| {
            tracing::warn!("{}; continuing with an empty page", e);
            String::new()
        });

        let progress = PageProgress {
            done: index + 1,
            total,
            has_credit_block: CREDIT_BLOCK_PEEK_RE.is_match(&text),
        };
        on_page(&progress);
        pages.push(text);
    }

    pages.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    struct FlakySource;

    impl PageTextSource for FlakySource {
        fn page_count(&self) -> usize {
            3
        }

        fn page_text(&self, index: usize) -> Result<String, PdfError> {
            match index {
                1 => Err(PdfError::Page { page: 2, message: "broken content stream".to_string() }),
                _ => Ok(format!("page {}", index + 1)),
            }
        }
    }

    #[test]
    fn test_text_source_splits_on_form_feed() {
        let source = TextFileSource::from_text("satu\x0Cdua\x0Ctiga");
        assert_eq!(source.page_count(), 3);
        assert_eq!(source.page_text(1).unwrap(), "dua");
        assert!(source.page_text(3).is_err());
    }

    #[test]
    fn test_read_document_joins_pages_and_reports_progress() {
        let source = TextFileSource::from_text(
            "Header\x0C001 - BANK A BANK A KC B Rp 1 01 Mei 2020\x0Cakhir",
        );
        let mut events = Vec::new();
        let text = read_document(&source, |p| events.push(*p));

        assert_eq!(text, "Header\n001 - BANK A BANK A KC B Rp 1 01 Mei 2020\nakhir");
        assert_eq!(events.len(), 3);
        assert_eq!(events.iter().map(|p| p.done).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(events.iter().all(|p| p.total == 3));
        assert_eq!(
            events.iter().map(|p| p.has_credit_block).collect::<Vec<_>>(),
            vec![false, true, false]
        );
    }

    #[test]
    fn test_failed_page_becomes_empty() {
        let mut calls = 0;
        let text = read_document(&FlakySource, |_| calls += 1);
        assert_eq!(text, "page 1\n\npage 3");
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_open_source_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let txt = dir.path().join("laporan.TXT");
        fs::write(&txt, "a\x0Cb").unwrap();
        assert_eq!(open_source(&txt).unwrap().page_count(), 2);

        let fake_pdf = dir.path().join("laporan.pdf");
        let mut file = fs::File::create(&fake_pdf).unwrap();
        file.write_all(b"not a pdf at all").unwrap();
        assert!(matches!(open_source(&fake_pdf), Err(PdfError::Load(_))));

        let missing = dir.path().join("hilang.txt");
        assert!(matches!(open_source(&missing), Err(PdfError::Io(_))));
    }
}
