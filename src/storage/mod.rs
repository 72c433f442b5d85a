// src/storage/mod.rs
pub mod projection;

use crate::storage::projection::Table;
use crate::utils::error::StorageError;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    /// `.json` selects JSON; everything else is written as CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => OutputFormat::Json,
            _ => OutputFormat::Csv,
        }
    }
}

/// Describes where a table came from; written next to it as JSON.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TableMetadata {
    pub sources: Vec<String>,
    pub subject_name: Option<String>,
    pub report_id: Option<String>,
}

/// Layout of the `_meta.json` sidecar.
#[derive(Debug, Serialize)]
struct MetadataSidecar<'a> {
    #[serde(flatten)]
    metadata: &'a TableMetadata,
    table_file: &'a str,
    columns: &'a [&'static str],
    record_count: usize,
    extraction_timestamp: String,
}

/// One table row as a JSON object, keys in column order.
struct JsonRow<'a> {
    columns: &'a [&'static str],
    cells: &'a [Option<String>],
}

impl Serialize for JsonRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, cell) in self.columns.iter().zip(self.cells) {
            map.serialize_entry(column, cell)?;
        }
        map.end()
    }
}

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.as_os_str().is_empty() && !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self { base_dir: base_path })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Writes the table as CSV or JSON depending on the file extension
    pub fn save_table(&self, file_name: &str, table: &Table) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(file_name);

        match OutputFormat::from_path(&file_path) {
            OutputFormat::Csv => write_csv(&file_path, table)?,
            OutputFormat::Json => write_json(&file_path, table)?,
        }

        tracing::info!("Saved {} rows to {}", table.rows.len(), file_path.display());
        Ok(file_path)
    }

    /// Saves metadata about the table in JSON format as `<stem>_meta.json`
    pub fn save_table_metadata(
        &self,
        file_name: &str,
        table: &Table,
        metadata: &TableMetadata,
    ) -> Result<PathBuf, StorageError> {
        let stem = Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name);
        let file_path = self.base_dir.join(format!("{}_meta.json", stem));

        let document = MetadataSidecar {
            metadata,
            table_file: file_name,
            columns: &table.columns,
            record_count: table.rows.len(),
            extraction_timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let metadata_str = serde_json::to_string_pretty(&document)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        fs::write(&file_path, metadata_str).map_err(StorageError::IoError)?;

        tracing::info!("Saved metadata to {}", file_path.display());

        Ok(file_path)
    }
}

fn write_csv(path: &Path, table: &Table) -> Result<(), StorageError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json(path: &Path, table: &Table) -> Result<(), StorageError> {
    let rows: Vec<JsonRow<'_>> = table
        .rows
        .iter()
        .map(|row| JsonRow { columns: &table.columns, cells: row })
        .collect();

    let body = serde_json::to_string_pretty(&rows)
        .map_err(|e| StorageError::SerializationError(e.to_string()))?;
    fs::write(path, body)?;
    Ok(())
}
