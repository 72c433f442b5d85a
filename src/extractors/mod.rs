// src/extractors/mod.rs
pub mod blocks;
pub mod branch;
pub mod document;
pub mod models;
pub mod text;

// Re-export key extraction types for convenience
#[allow(unused_imports)]
pub use blocks::{extract_credit_blocks, extract_document};
#[allow(unused_imports)]
pub use models::{
    ExtractedDocument,
    FacilityCategory,
    FacilityRecord,
    SectionKind,
};
