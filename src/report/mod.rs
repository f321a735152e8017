//! Report rendering.
//!
//! Renderers only read finalized [`Aggregator`] statistics; they never
//! recompute totals.

mod csv_report;
mod html;
mod text;

pub use csv_report::{write_csv, CSV_COLUMNS};
pub use html::render_html;
pub use text::{format_currency, write_text};

use crate::aggregate::Aggregator;
use crate::error::Result;
use crate::money::Money;
use log::info;
use rust_decimal::Decimal;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// File name of the aggregated CSV report.
pub const CSV_REPORT_NAME: &str = "icpp_breakdown_report.csv";

/// File name of the HTML report.
pub const HTML_REPORT_NAME: &str = "icpp_breakdown_report.html";

/// Whether an amount is too small to list in a breakdown (|x| <= 0.001).
pub(crate) fn is_negligible(amount: Money) -> bool {
    amount.abs() <= Money::new(Decimal::new(1, 3))
}

/// Paths of the report files written by [`write_report_files`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub csv: PathBuf,
    pub html: PathBuf,
}

/// Writes the CSV and HTML reports into `dir`.
pub fn write_report_files(stats: &Aggregator, dir: &Path) -> Result<ReportPaths> {
    let paths = ReportPaths {
        csv: dir.join(CSV_REPORT_NAME),
        html: dir.join(HTML_REPORT_NAME),
    };

    info!("Exporting CSV report to: {}", paths.csv.display());
    let file = File::create(&paths.csv)?;
    write_csv(stats, BufWriter::new(file))?;

    info!("Exporting HTML report to: {}", paths.html.display());
    fs::write(&paths.html, render_html(stats))?;

    Ok(paths)
}
