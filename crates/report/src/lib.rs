//! Single-template PDF report for an equipment summary.
//!
//! [`layout`] decides where every line of text goes; [`render`] draws a
//! layout with builtin PDF fonts. Coordinates are PDF points with the origin
//! at the bottom-left of a US Letter page.

mod layout;
mod pdf;

pub use layout::{layout, Align, Font, ReportLayout, TextLine, PAGE_HEIGHT, PAGE_WIDTH};
pub use pdf::{render, render_layout};

use thiserror::Error;

pub const REPORT_TITLE: &str = "Chemical Equipment Summary Report";
pub const REPORT_FILENAME: &str = "chemical_equipment_report.pdf";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("PDF error: {0}")]
    Pdf(String),
}

pub type Result<T> = std::result::Result<T, ReportError>;
