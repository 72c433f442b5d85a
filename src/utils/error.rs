// src/utils/error.rs
use thiserror::Error;

// Errors raised while turning an input file into page text
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Failed to load PDF: {0}")]
    Load(#[from] lopdf::Error), // Automatically convert lopdf errors

    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not extract text from page {page}: {message}")]
    Page { page: usize, message: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Reading input failed: {0}")]
    Pdf(#[from] PdfError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
