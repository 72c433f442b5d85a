// src/main.rs
mod extractors;
mod pdf;
mod storage;
mod utils;

use clap::Parser;
use extractors::{extract_document, ExtractedDocument, FacilityRecord};
use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use storage::projection::{project, project_master};
use storage::{StorageManager, TableMetadata};
use utils::AppError;

static UNSAFE_NAME_CHARS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^\w\-]").expect("Failed to compile UNSAFE_NAME_CHARS_RE")
});

static UNDERSCORE_RUN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"_+").expect("Failed to compile UNDERSCORE_RUN_RE")
});

/// Extracts SLIK OJK credit/financing facilities into a spreadsheet table
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input report: a PDF, or a .txt file with form-feed separated pages
    #[arg(required_unless_present = "batch_dir")]
    input: Option<PathBuf>,

    /// Output table (.csv or .json). Derived from the input name when omitted
    output: Option<PathBuf>,

    /// Process every report in this directory into one combined table
    #[arg(long, conflicts_with = "input")]
    batch_dir: Option<PathBuf>,

    /// Output table for --batch-dir
    #[arg(long, default_value = "MASTER_SLIK.csv")]
    master_output: PathBuf,

    /// Debug mode - save the joined page text and an annotated HTML view
    #[arg(short, long)]
    debug: bool,

    /// Do not draw the page progress bar
    #[arg(long)]
    no_progress: bool,
}

#[derive(Debug, Clone, Copy)]
struct RunOptions {
    debug: bool,
    progress: bool,
}

/// How a run ended when nothing fatal happened.
#[derive(Debug, PartialEq, Eq)]
enum RunOutcome {
    Written(PathBuf),
    /// No facility blocks were found; nothing was written.
    NoData,
}

fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let args = Args::parse();
    tracing::debug!("Starting processing for args: {:?}", args);

    let options = RunOptions { debug: args.debug, progress: !args.no_progress };

    let outcome = match (&args.batch_dir, &args.input) {
        (Some(dir), _) => run_batch(dir, &args.master_output, &options)?,
        (None, Some(input)) => {
            let output = args.output.clone().unwrap_or_else(|| auto_output_name(input));
            run_single(input, &output, &options)?
        }
        (None, None) => return Err(AppError::Config("No input report given".to_string())),
    };

    match outcome {
        RunOutcome::Written(path) => tracing::info!("Done: {}", path.display()),
        RunOutcome::NoData => tracing::warn!("No facility data found; no output written"),
    }

    Ok(())
}

/// Output name derived from the input file name, e.g.
/// `SLIK Budi (2023).pdf` -> `SLIK_Budi_2023_slik.csv`.
fn auto_output_name(input: &Path) -> PathBuf {
    let base = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let safe = UNSAFE_NAME_CHARS_RE.replace_all(&base, "_");
    let safe = UNDERSCORE_RUN_RE.replace_all(safe.trim_matches('_'), "_");
    PathBuf::from(format!("{}_slik.csv", safe))
}

fn page_progress_bar(total: usize, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::with_template("  [{bar:30.cyan/blue}] {percent:>3}%  ({pos}/{len} hal) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("██░"),
    );
    pb
}

/// Reads one report page by page and runs the extractors over the joined text.
fn load_report(input: &Path, options: &RunOptions) -> Result<(String, ExtractedDocument), AppError> {
    let source = pdf::open_source(input)?;
    tracing::info!("Reading {} pages from {}", source.page_count(), input.display());

    let pb = page_progress_bar(source.page_count(), options.progress);
    let text = pdf::read_document(source.as_ref(), |progress| {
        pb.set_position(progress.done as u64);
        pb.set_message(if progress.has_credit_block { "kredit ditemukan" } else { "" });
    });
    pb.finish_and_clear();

    let document = extract_document(&text);
    tracing::info!(
        "Debtor: {} | Report: {} | {} facility blocks",
        document.subject_name.as_deref().unwrap_or("(not found)"),
        document.report_id.as_deref().unwrap_or("(not found)"),
        document.records.len()
    );
    for record in &document.records {
        tracing::debug!(
            "  {} / {} -> {}",
            record.organization,
            record.branch,
            record.category.label()
        );
    }

    Ok((text, document))
}

/// Storage rooted at the output's directory, plus the output file name.
fn storage_for(output: &Path) -> Result<(StorageManager, String), AppError> {
    let file_name = output
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| AppError::Config(format!("Invalid output path: {}", output.display())))?
        .to_string();
    let dir = output.parent().unwrap_or_else(|| Path::new(""));
    Ok((StorageManager::new(dir)?, file_name))
}

fn save_debug(text: &str, input: &Path, output_dir: &Path) {
    let stem = input.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let debug_dir = output_dir.join(format!("{}_debug", stem));
    if let Err(e) = utils::html_debug::write_debug_bundle(text, &debug_dir) {
        tracing::warn!("Failed to write debug output: {}", e);
    }
}

fn run_single(input: &Path, output: &Path, options: &RunOptions) -> Result<RunOutcome, AppError> {
    tracing::info!("Input: {} | Output: {}", input.display(), output.display());

    let (text, document) = load_report(input, options)?;

    if options.debug {
        save_debug(&text, input, output.parent().unwrap_or_else(|| Path::new("")));
    }

    if document.records.is_empty() {
        tracing::warn!("No Kredit/Pembiayaan blocks found in {}", input.display());
        return Ok(RunOutcome::NoData);
    }

    let (storage, file_name) = storage_for(output)?;
    print_summary(&document.records);

    let table = project(&document.records);
    let path = storage.save_table(&file_name, &table)?;
    let metadata = TableMetadata {
        sources: vec![input.display().to_string()],
        subject_name: document.subject_name.clone(),
        report_id: document.report_id.clone(),
    };
    storage.save_table_metadata(&file_name, &table, &metadata)?;

    Ok(RunOutcome::Written(path))
}

/// Report files directly inside `dir`, sorted by name.
fn list_reports(dir: &Path) -> Result<Vec<PathBuf>, AppError> {
    let mut reports: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map_or(false, |ext| ext.eq_ignore_ascii_case("pdf") || ext.eq_ignore_ascii_case("txt"))
        })
        .collect();
    reports.sort();
    Ok(reports)
}

fn run_batch(dir: &Path, output: &Path, options: &RunOptions) -> Result<RunOutcome, AppError> {
    let reports = list_reports(dir)?;
    tracing::info!("Found {} reports in {}", reports.len(), dir.display());

    if reports.is_empty() {
        tracing::warn!("No PDF or text reports found in {}", dir.display());
        return Ok(RunOutcome::NoData);
    }

    let (storage, file_name) = storage_for(output)?;
    let mut documents = Vec::with_capacity(reports.len());
    let mut sources = Vec::with_capacity(reports.len());

    for report in &reports {
        tracing::info!("Processing {}", report.display());
        let (text, document) = load_report(report, options).map_err(|e| {
            tracing::error!("Failed to read {}: {}", report.display(), e);
            e
        })?;
        if options.debug {
            save_debug(&text, report, storage.base_dir());
        }
        sources.push(report.display().to_string());
        documents.push(document);
    }

    tracing::info!("Processing finished. Reports read: {}", documents.len());

    let table = project_master(&documents);
    if table.is_empty() {
        return Ok(RunOutcome::NoData);
    }

    let path = storage.save_table(&file_name, &table)?;
    let metadata = TableMetadata { sources, ..TableMetadata::default() };
    storage.save_table_metadata(&file_name, &table, &metadata)?;

    println!("  Total rows: {}", table.rows.len());
    Ok(RunOutcome::Written(path))
}

/// Cuts `value` to at most `width` characters.
fn fit(value: &str, width: usize) -> String {
    value.chars().take(width).collect()
}

fn print_summary(records: &[FacilityRecord]) {
    println!("\n  {} facilities found\n", records.len());
    println!("  {:<4} {:<24} {:<14} {:>18}  {:>18}", "#", "Bank (Pelapor)", "Kualitas", "Plafon Awal", "Baki Debet");
    println!("  {} {} {} {}  {}", "─".repeat(4), "─".repeat(24), "─".repeat(14), "─".repeat(18), "─".repeat(18));
    for (i, record) in records.iter().enumerate() {
        println!(
            "  {:<4} {:<24} {:<14} {:>18}  {:>18}",
            i + 1,
            fit(&record.organization, 24),
            fit(record.quality.as_deref().unwrap_or(""), 14),
            record.original_principal.as_deref().unwrap_or(""),
            record.outstanding_balance,
        );
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::projection::COLUMNS;

    const QUIET: RunOptions = RunOptions { debug: false, progress: false };

    const REPORT_PAGE_1: &str = "\
Nomor Laporan
Nama Pengguna 100/IDEB/200/2024
Nama
SITI RAHAYU
";

    const REPORT_PAGE_2: &str = "\
001 - BANK ACME BANK ACME KC PUSAT Rp 50.000.000 01 Januari 2020
Jenis Penggunaan Modal Kerja Frekuensi Restrukturisasi 1
Plafon Awal Rp 75.000.000
Garansi Yang Diberikan
002 - BANK ACME BANK ACME KC PUSAT Rp 10.000.000 02 Januari 2020
Kualitas 1 - Lancar
";

    #[test]
    fn test_auto_output_name() {
        assert_eq!(auto_output_name(Path::new("SLIK Budi (2023).pdf")), PathBuf::from("SLIK_Budi_2023_slik.csv"));
        assert_eq!(auto_output_name(Path::new("/data/ideb-2024__final.PDF")), PathBuf::from("ideb-2024_final_slik.csv"));
        assert_eq!(auto_output_name(Path::new("laporan")), PathBuf::from("laporan_slik.csv"));
    }

    #[test]
    fn test_fit_truncates_by_characters() {
        assert_eq!(fit("BANK RAKYAT INDONESIA", 4), "BANK");
        assert_eq!(fit("BPD", 24), "BPD");
        assert_eq!(fit("ÉÉÉ", 2), "ÉÉ");
    }

    #[test]
    fn test_run_single_writes_table_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("laporan.txt");
        fs::write(&input, format!("{}\x0C{}", REPORT_PAGE_1, REPORT_PAGE_2)).unwrap();
        let output = dir.path().join("out").join("hasil.csv");

        let outcome = run_single(&input, &output, &QUIET).unwrap();
        assert_eq!(outcome, RunOutcome::Written(output.clone()));

        let mut reader = csv::Reader::from_path(&output).unwrap();
        assert_eq!(reader.headers().unwrap().len(), COLUMNS.len());
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "BANK ACME");
        assert_eq!(&rows[0][1], "Modal Kerja");
        assert_eq!(&rows[0][2], "100/IDEB/200/2024");
        assert_eq!(&rows[0][9], "1");
        assert_eq!(&rows[1][1], "Garansi Yang Diberikan");
        assert_eq!(&rows[1][8], "1 - Lancar");
        assert_eq!(&rows[1][9], "");

        assert!(dir.path().join("out").join("hasil_meta.json").exists());
    }

    #[test]
    fn test_run_single_without_blocks_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bersih.txt");
        fs::write(&input, REPORT_PAGE_1).unwrap();
        let output = dir.path().join("bersih.csv");

        assert_eq!(run_single(&input, &output, &QUIET).unwrap(), RunOutcome::NoData);
        assert!(!output.exists());
    }

    #[test]
    fn test_run_single_debug_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("laporan.txt");
        fs::write(&input, REPORT_PAGE_2).unwrap();
        let output = dir.path().join("hasil.json");

        let options = RunOptions { debug: true, progress: false };
        run_single(&input, &output, &options).unwrap();

        assert!(dir.path().join("laporan_debug").join("annotated.html").exists());
        assert!(dir.path().join("laporan_debug").join("document.txt").exists());
    }

    #[test]
    fn test_run_single_missing_input_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_single(&dir.path().join("hilang.txt"), &dir.path().join("x.csv"), &QUIET);
        assert!(matches!(result, Err(AppError::Pdf(_))));
    }

    fn plant_batch(dir: &Path) -> PathBuf {
        let reports = dir.join("slik_data");
        fs::create_dir(&reports).unwrap();
        fs::write(reports.join("b.txt"), format!("{}\x0C{}", REPORT_PAGE_1, REPORT_PAGE_2)).unwrap();
        fs::write(
            reports.join("a.txt"),
            "Nama\nANDI\n003 - BCA BCA KCP SUDIRMAN Rp 5.000 03 Maret 2021\n",
        )
        .unwrap();
        fs::write(reports.join("catatan.md"), "ignored").unwrap();
        reports
    }

    #[test]
    fn test_run_batch_combines_reports_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        let reports = plant_batch(dir.path());
        let output = dir.path().join("MASTER_SLIK.csv");

        let outcome = run_batch(&reports, &output, &QUIET).unwrap();
        assert_eq!(outcome, RunOutcome::Written(output.clone()));

        let mut reader = csv::Reader::from_path(&output).unwrap();
        assert_eq!(reader.headers().unwrap().len(), COLUMNS.len() + 1);
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        let banks: Vec<&str> = rows.iter().map(|r| &r[0]).collect();
        assert_eq!(banks, vec!["BCA", "BANK ACME", "BANK ACME"]);
        assert_eq!(&rows[0][10], "ANDI");
        assert_eq!(&rows[2][10], "SITI RAHAYU");
    }

    #[test]
    fn test_run_batch_unreadable_report_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let reports = plant_batch(dir.path());
        fs::write(reports.join("rusak.pdf"), "not a pdf").unwrap();
        let output = dir.path().join("MASTER_SLIK.csv");

        let result = run_batch(&reports, &output, &QUIET);
        assert!(matches!(result, Err(AppError::Pdf(_))));
        assert!(!output.exists());
    }

    #[test]
    fn test_run_batch_empty_directory_has_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out").join("m.csv");
        let outcome = run_batch(dir.path(), &output, &QUIET).unwrap();
        assert_eq!(outcome, RunOutcome::NoData);
        assert!(!output.exists());
    }
}
