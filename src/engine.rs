//! End-to-end IC++ pipeline.
//!
//! Runs as one sequential pass: read the spreadsheet, load the fee export,
//! reconcile each transaction in sheet order, aggregate, finalize. Any
//! load failure aborts the run before a single transaction is processed.

use crate::aggregate::Aggregator;
use crate::error::Result;
use crate::fees::FeeRecordStore;
use crate::reconcile::ReconciliationEngine;
use crate::transaction::Transaction;
use crate::xlsx;
use log::{debug, info};
use std::path::Path;

/// The IC++ breakdown engine.
///
/// Owns the fee store and the running statistics. Transactions are
/// processed in the order given; that order is preserved in each bucket's
/// transaction list.
pub struct IcppEngine {
    fees: FeeRecordStore,
    aggregator: Aggregator,
}

impl IcppEngine {
    /// Creates an engine over a loaded fee store.
    pub fn new(fees: FeeRecordStore) -> Self {
        IcppEngine {
            fees,
            aggregator: Aggregator::new(),
        }
    }

    /// Reconciles and aggregates a batch of transactions.
    ///
    /// Rejected transactions are tallied by reason and logged at debug level.
    pub fn process_transactions(&mut self, transactions: &[Transaction]) {
        let reconciler = ReconciliationEngine::new(&self.fees);

        for (idx, tx) in transactions.iter().enumerate() {
            match reconciler.reconcile(tx) {
                Ok(reconciled) => {
                    debug!(
                        "Transaction {} ({}): {} MDR {}",
                        idx + 1,
                        tx.reference(),
                        reconciled.region,
                        reconciled.breakdown.mdr
                    );
                    self.aggregator.add_transaction(tx, &reconciled);
                }
                Err(reason) => {
                    debug!(
                        "Transaction {} ({}): skipped, {}",
                        idx + 1,
                        tx.reference(),
                        reason
                    );
                    self.aggregator.skip_transaction(&reason);
                }
            }
        }
    }

    /// Finalizes percentages and returns the statistics.
    pub fn finish(mut self) -> Aggregator {
        self.aggregator.finalize();
        info!(
            "Processed {} transactions into {} buckets, skipped {}",
            self.aggregator.total_transactions(),
            self.aggregator.bucket_count(),
            self.aggregator.skipped()
        );
        self.aggregator
    }
}

/// Runs the whole pipeline over a spreadsheet and a fee export.
pub fn run(spreadsheet: &Path, fee_csv: &Path) -> Result<Aggregator> {
    let transactions = xlsx::read_transactions(spreadsheet)?;
    let fees = FeeRecordStore::load(fee_csv)?;

    let mut engine = IcppEngine::new(fees);
    engine.process_transactions(&transactions);
    Ok(engine.finish())
}
