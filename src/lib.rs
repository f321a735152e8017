//! # IC++ Breakdown
//!
//! Reconciles a gateway transaction spreadsheet against an acquirer fee
//! export and decomposes each transaction's merchant discount rate into
//! Interchange, 1st Plus (scheme fee) and 2nd Plus (acquirer markup).
//!
//! ## Design Principles
//!
//! - **Exact arithmetic**: every amount is a `rust_decimal` value wrapped in [`Money`]
//! - **No spreadsheet engine**: `.xlsx` parts are read straight from the zip archive
//! - **Declared identifier chains**: join keys are resolved in a fixed column order
//! - **Deterministic output**: buckets sorted by region, then card type
//!
//! ## Example
//!
//! ```no_run
//! use icpp_breakdown::{engine, report};
//! use std::path::Path;
//!
//! let stats = engine::run(Path::new("transactions.xlsx"), Path::new("fees.csv")).unwrap();
//! report::write_text(&stats, std::io::stdout()).unwrap();
//! ```

pub mod aggregate;
pub mod column;
pub mod engine;
pub mod error;
pub mod fees;
pub mod icpp;
pub mod identifier;
pub mod money;
pub mod reconcile;
pub mod region;
pub mod report;
pub mod transaction;
pub mod xlsx;

pub use aggregate::{AggregationBucket, Aggregator};
pub use engine::IcppEngine;
pub use error::{ReconError, Result};
pub use fees::{FeeRecord, FeeRecordStore};
pub use icpp::IcppBreakdown;
pub use identifier::IdentifierChain;
pub use money::Money;
pub use reconcile::{ReconciliationEngine, SkipReason};
pub use region::Region;
pub use transaction::Transaction;
pub use xlsx::SpreadsheetReader;
