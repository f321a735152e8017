//! Grouped IC++ statistics.
//!
//! Accepted transactions are summed into one bucket per (region, card type).
//! Percentages are derived once, by [`Aggregator::finalize`], after every
//! transaction has been added.

use crate::icpp::IcppBreakdown;
use crate::money::Money;
use crate::reconcile::{Reconciled, SkipReason};
use crate::region::Region;
use crate::transaction::Transaction;
use log::debug;
use std::collections::BTreeMap;

/// Card type used when the sheet has no `Card Type` column.
pub const UNKNOWN_CARD_TYPE: &str = "UNKNOWN";

/// Composite bucket key: region and upper-cased card type.
pub type BucketKey = (Region, String);

/// One accepted transaction as listed inside its bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRef {
    /// Gateway UUID, or `N/A`.
    pub id: String,
    pub amount: Money,
    pub breakdown: IcppBreakdown,
}

/// Running totals for one (region, card type) pair.
///
/// # Currency
///
/// `currency` is the currency of the last transaction added. Buckets are
/// assumed to be single-currency; mixing currencies is not rejected and
/// makes the totals meaningless.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationBucket {
    pub count: usize,
    pub total_volume: Money,

    /// Field-by-field sum of every breakdown in the bucket.
    pub totals: IcppBreakdown,

    pub currency: String,

    /// Accepted transactions, in spreadsheet order.
    pub transactions: Vec<TransactionRef>,

    /// `abs(totals.ic / total_volume * 100)`; set by [`Aggregator::finalize`].
    pub avg_ic_pct: Money,
    pub avg_first_plus_pct: Money,
    pub avg_second_plus_pct: Money,
    pub avg_mdr_pct: Money,
}

impl AggregationBucket {
    fn add(&mut self, id: &str, currency: &str, reconciled: &Reconciled) {
        self.count += 1;
        self.total_volume += reconciled.amount;
        self.totals += reconciled.breakdown;
        self.currency = currency.to_string();
        self.transactions.push(TransactionRef {
            id: id.to_string(),
            amount: reconciled.amount,
            breakdown: reconciled.breakdown,
        });
    }

    fn compute_percentages(&mut self) {
        let volume = self.total_volume;
        self.avg_ic_pct = self.totals.ic.percent_of(volume);
        self.avg_first_plus_pct = self.totals.first_plus.percent_of(volume);
        self.avg_second_plus_pct = self.totals.second_plus.percent_of(volume);
        self.avg_mdr_pct = self.totals.mdr.percent_of(volume);
    }

    /// Share of the bucket volume taken by `amount`, as a positive percentage.
    pub fn share_of_volume(&self, amount: Money) -> Money {
        amount.percent_of(self.total_volume)
    }
}

/// Collects accepted transactions into buckets and tallies rejections.
#[derive(Debug, Default)]
pub struct Aggregator {
    buckets: BTreeMap<BucketKey, AggregationBucket>,
    skipped_reasons: BTreeMap<String, usize>,
    skipped: usize,
}

impl Aggregator {
    /// Creates an empty aggregator.
    pub fn new() -> Self {
        Aggregator {
            buckets: BTreeMap::new(),
            skipped_reasons: BTreeMap::new(),
            skipped: 0,
        }
    }

    /// Adds an accepted transaction to its (region, card type) bucket,
    /// creating the bucket on first use.
    pub fn add_transaction(&mut self, tx: &Transaction, reconciled: &Reconciled) {
        let card_type = tx
            .card_type
            .as_deref()
            .unwrap_or(UNKNOWN_CARD_TYPE)
            .to_uppercase();
        let currency = tx.currency.as_deref().unwrap_or("");
        let key = (reconciled.region, card_type);

        if !self.buckets.contains_key(&key) {
            debug!("New bucket {} / {}", key.0, key.1);
        }
        let bucket = self.buckets.entry(key).or_default();

        if bucket.count > 0 && bucket.currency != currency {
            debug!(
                "Bucket currency changes from {} to {} at transaction {}",
                bucket.currency,
                currency,
                tx.reference()
            );
        }
        bucket.add(tx.reference(), currency, reconciled);
    }

    /// Records a rejected transaction.
    pub fn skip_transaction(&mut self, reason: &SkipReason) {
        self.skipped += 1;
        *self.skipped_reasons.entry(reason.to_string()).or_insert(0) += 1;
    }

    /// Computes the percentage fields of every bucket.
    ///
    /// Call once all transactions have been added; calling again simply
    /// recomputes them.
    pub fn finalize(&mut self) {
        for bucket in self.buckets.values_mut() {
            bucket.compute_percentages();
        }
    }

    /// Looks up a bucket.
    pub fn bucket(&self, region: Region, card_type: &str) -> Option<&AggregationBucket> {
        self.buckets.get(&(region, card_type.to_string()))
    }

    /// All buckets, ordered by region then card type.
    pub fn buckets(&self) -> impl Iterator<Item = (&BucketKey, &AggregationBucket)> {
        self.buckets.iter()
    }

    /// Buckets of one region, ordered by card type.
    pub fn region_buckets(
        &self,
        region: Region,
    ) -> impl Iterator<Item = (&str, &AggregationBucket)> {
        self.buckets
            .range((region, String::new())..)
            .take_while(move |((r, _), _)| *r == region)
            .map(|((_, card_type), bucket)| (card_type.as_str(), bucket))
    }

    /// Regions that have at least one bucket, in report order.
    pub fn regions(&self) -> Vec<Region> {
        let mut regions: Vec<Region> = self.buckets.keys().map(|(region, _)| *region).collect();
        regions.dedup();
        regions
    }

    /// Number of buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of accepted transactions.
    pub fn total_transactions(&self) -> usize {
        self.buckets.values().map(|b| b.count).sum()
    }

    /// Number of rejected transactions.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Rejection counts by reason.
    pub fn skipped_reasons(&self) -> &BTreeMap<String, usize> {
        &self.skipped_reasons
    }
}
