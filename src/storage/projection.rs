// src/storage/projection.rs
//! Maps extracted records onto the fixed spreadsheet column layout. Pure
//! projection: values are copied, never re-derived or validated.

use crate::extractors::models::{ExtractedDocument, FacilityRecord};

pub const COLUMNS: [&str; 10] = [
    "Bank (Pelapor)",
    "Jenis Penggunaan",
    "Nomor Laporan",
    "Plafon Awal",
    "Baki Debet",
    "Suku Bunga/Imbalan",
    "Tanggal Akad Awal",
    "Tanggal Jatuh Tempo",
    "Kualitas",
    "Frekuensi Restrukturisasi",
];

/// Extra column of the combined (multi-report) table.
pub const SUBJECT_COLUMN: &str = "Nama Debitur";

/// Ordered column names plus rows of optional cells (`None` renders empty).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn project_record(record: &FacilityRecord) -> Vec<Option<String>> {
    vec![
        Some(record.organization.clone()),
        record.usage.clone(),
        record.report_id.clone(),
        record.original_principal.clone(),
        Some(record.outstanding_balance.clone()),
        record.interest_rate.clone(),
        record.origination_date.clone(),
        record.maturity_date.clone(),
        record.quality.clone(),
        record.restructuring_count.map(|n| n.to_string()),
    ]
}

/// One row per record, in record order.
pub fn project(records: &[FacilityRecord]) -> Table {
    Table {
        columns: COLUMNS.to_vec(),
        rows: records.iter().map(project_record).collect(),
    }
}

/// Rows of several reports in the given order, each tagged with its debtor name.
pub fn project_master(documents: &[ExtractedDocument]) -> Table {
    let mut columns = COLUMNS.to_vec();
    columns.push(SUBJECT_COLUMN);

    let rows = documents
        .iter()
        .flat_map(|document| {
            document.records.iter().map(move |record| {
                let mut row = project_record(record);
                row.push(document.subject_name.clone());
                row
            })
        })
        .collect();

    Table { columns, rows }
}
