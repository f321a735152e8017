//! Error types for the IC++ breakdown pipeline.
//!
//! Only fatal conditions live here. Per-transaction problems never become
//! errors: they are absorbed into default values or skip reasons.

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, ReconError>;

/// Errors that abort a run.
#[derive(Error, Debug)]
pub enum ReconError {
    /// Failed to open, read or write a file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fee CSV could not be read
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Spreadsheet is not a readable ZIP archive
    #[error("Spreadsheet archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Malformed XML inside a spreadsheet part
    #[error("Malformed spreadsheet XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The archive has no worksheet part
    #[error("Spreadsheet has no worksheet part ({0})")]
    MissingWorksheet(String),

    /// A spreadsheet part that is not a complete XML document
    #[error("Malformed spreadsheet part {part}: {reason}")]
    MalformedPart { part: String, reason: String },

    /// A shared-string cell whose value is not an integer index
    #[error("Cell {cell} references shared string {value:?}, which is not an index")]
    InvalidSharedStringIndex { cell: String, value: String },

    /// Missing input file arguments
    #[error("Missing input file arguments. Usage: icpp-breakdown <transactions.xlsx> <fees.csv>")]
    MissingArgument,
}

impl From<quick_xml::events::attributes::AttrError> for ReconError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        ReconError::Xml(quick_xml::Error::from(err))
    }
}
