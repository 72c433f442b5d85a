// src/pdf/mod.rs
pub mod reader;

pub use reader::{open_source, read_document};
