//! Matching transactions to fee records.
//!
//! A transaction is accepted only when it is a settled sale with a usable
//! amount and a fee record carrying a non-zero MDR. Everything else is
//! rejected with a [`SkipReason`]; rejections are counted, never raised.

use crate::fees::{FeeRecord, FeeRecordStore};
use crate::icpp::IcppBreakdown;
use crate::money::Money;
use crate::region::Region;
use crate::transaction::Transaction;
use std::fmt;

/// Processor statuses that mark a failed transaction.
pub const REJECTED_STATUSES: [&str; 3] = ["DECLINED", "FAILED", "ERROR"];

/// Why a transaction was left out of the breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Payment type names a refund.
    Refund,
    /// Amount is not a number.
    InvalidAmount,
    /// Amount is exactly zero.
    ZeroAmount,
    /// Processor reported a failure; holds the upper-cased status.
    Status(String),
    /// No fee record matches the transaction identifier.
    MissingFeeData,
    /// The matched fee record has a zero MDR.
    ZeroMdr,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Refund => f.write_str("Refund transaction"),
            SkipReason::InvalidAmount => f.write_str("Invalid amount"),
            SkipReason::ZeroAmount => f.write_str("Zero amount"),
            SkipReason::Status(status) => write!(f, "Status: {}", status),
            SkipReason::MissingFeeData => f.write_str("Missing fee data"),
            SkipReason::ZeroMdr => f.write_str("Zero MDR"),
        }
    }
}

/// An accepted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub region: Region,
    /// The transaction amount, as parsed by the validity filter.
    pub amount: Money,
    pub breakdown: IcppBreakdown,
}

/// Applies the transaction-level rules: refund, amount, processor status.
///
/// Returns the parsed amount when the transaction passes. Rules run in that
/// order and the first failure wins. A sheet without an `Amount` column
/// reads as zero.
pub fn check_transaction(tx: &Transaction) -> Result<Money, SkipReason> {
    let payment_type = tx.payment_type.as_deref().unwrap_or("").to_uppercase();
    if payment_type.contains("REFUND") || payment_type == "RF" {
        return Err(SkipReason::Refund);
    }

    let amount = Money::parse_strict(tx.amount.as_deref().unwrap_or("0"))
        .map_err(|_| SkipReason::InvalidAmount)?;
    if amount.is_zero() {
        return Err(SkipReason::ZeroAmount);
    }

    let status = tx.processor_status.as_deref().unwrap_or("").to_uppercase();
    if REJECTED_STATUSES.contains(&status.as_str()) {
        return Err(SkipReason::Status(status));
    }

    Ok(amount)
}

/// Reconciles transactions against a fee store.
pub struct ReconciliationEngine<'a> {
    fees: &'a FeeRecordStore,
    classify: fn(&str, &str) -> Region,
}

impl<'a> ReconciliationEngine<'a> {
    /// Creates an engine using [`Region::classify`].
    pub fn new(fees: &'a FeeRecordStore) -> Self {
        ReconciliationEngine {
            fees,
            classify: Region::classify,
        }
    }

    /// Replaces the region classifier (merchant name, card country).
    pub fn with_classifier(mut self, classify: fn(&str, &str) -> Region) -> Self {
        self.classify = classify;
        self
    }

    /// Finds the fee record for a transaction.
    pub fn match_fees(&self, tx: &Transaction) -> Option<&'a FeeRecord> {
        tx.identifier().and_then(|id| self.fees.get(id))
    }

    /// Region of a transaction, from its merchant name and card country.
    pub fn region_of(&self, tx: &Transaction) -> Region {
        (self.classify)(
            tx.merchant.as_deref().unwrap_or(""),
            tx.card_country.as_deref().unwrap_or(""),
        )
    }

    /// Validates one transaction and, if it passes, computes its breakdown.
    pub fn reconcile(&self, tx: &Transaction) -> Result<Reconciled, SkipReason> {
        let amount = check_transaction(tx)?;

        let fees = self.match_fees(tx).ok_or(SkipReason::MissingFeeData)?;
        if fees.mdr.amount.is_zero() {
            return Err(SkipReason::ZeroMdr);
        }

        let region = self.region_of(tx);
        Ok(Reconciled {
            region,
            amount,
            breakdown: IcppBreakdown::compute(fees, region),
        })
    }
}
