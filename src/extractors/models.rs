// src/extractors/models.rs

/// Usage label for blocks that sit under no special section heading.
pub const DEFAULT_CATEGORY_LABEL: &str = "Kredit/Pembiayaan";

/// The closed set of special facility sections in an iDeb report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Guarantee,
    IrrevocableLc,
    Securities,
    OtherFacility,
}

impl SectionKind {
    pub const ALL: [SectionKind; 4] = [
        SectionKind::Guarantee,
        SectionKind::IrrevocableLc,
        SectionKind::Securities,
        SectionKind::OtherFacility,
    ];

    /// Heading text as printed in the report.
    pub fn label(self) -> &'static str {
        match self {
            SectionKind::Guarantee => "Garansi Yang Diberikan",
            SectionKind::IrrevocableLc => "Irrevocable L/C",
            SectionKind::Securities => "Surat Berharga",
            SectionKind::OtherFacility => "Fasilitas Lain",
        }
    }

    /// Case-insensitive lookup by heading text.
    pub fn from_label(text: &str) -> Option<SectionKind> {
        let text = text.trim();
        SectionKind::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(text))
    }
}

/// `NNN - <bank + branch> Rp <amount> <DD Month YYYY>`, located by byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    pub start: usize,
    pub organization_raw: String,
    pub amount_raw: String,
    pub date_raw: String,
}

/// A section heading alone on its line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionHeading {
    pub start: usize,
    pub kind: SectionKind,
    /// Matched text, verbatim (case preserved).
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacilityCategory {
    Loan,
    Section { kind: SectionKind, label: String },
}

impl FacilityCategory {
    pub fn label(&self) -> &str {
        match self {
            FacilityCategory::Loan => DEFAULT_CATEGORY_LABEL,
            FacilityCategory::Section { label, .. } => label,
        }
    }

    pub fn is_loan(&self) -> bool {
        matches!(self, FacilityCategory::Loan)
    }
}

/// One output row, assembled from one facility block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacilityRecord {
    pub organization: String,
    pub branch: String,
    pub category: FacilityCategory,
    pub usage: Option<String>,
    pub report_id: Option<String>,
    pub original_principal: Option<String>,
    pub outstanding_balance: String,
    pub interest_rate: Option<String>,
    pub origination_date: Option<String>,
    pub maturity_date: Option<String>,
    pub quality: Option<String>,
    /// Only meaningful for loans; `None` for special sections.
    pub restructuring_count: Option<u64>,
}

/// Everything extracted from one report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractedDocument {
    pub subject_name: Option<String>,
    pub report_id: Option<String>,
    pub records: Vec<FacilityRecord>,
}
