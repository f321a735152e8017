//! IC++ breakdown CLI
//!
//! Reads a transaction spreadsheet and a fee export, prints the breakdown
//! to stdout and writes `icpp_breakdown_report.csv` and
//! `icpp_breakdown_report.html` into the current directory.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- transactions.xlsx fees.csv
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `info` to control logging verbosity

use icpp_breakdown::{engine, report, ReconError, Result};
use std::env;
use std::io;
use std::path::Path;
use std::process;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        return Err(ReconError::MissingArgument);
    }

    let stats = engine::run(Path::new(&args[1]), Path::new(&args[2]))?;

    let stdout = io::stdout();
    report::write_text(&stats, stdout.lock())?;

    let paths = report::write_report_files(&stats, Path::new("."))?;
    println!();
    println!("CSV report saved to: {}", paths.csv.display());
    println!("HTML report saved to: {}", paths.html.display());

    Ok(())
}
