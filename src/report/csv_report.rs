//! Aggregated CSV export: one row per (region, card type) bucket.

use crate::aggregate::{AggregationBucket, Aggregator};
use crate::error::Result;
use crate::money::Money;
use crate::region::Region;
use csv::WriterBuilder;
use serde::Serialize;
use std::io::Write;

/// Column headers, in output order.
pub const CSV_COLUMNS: [&str; 26] = [
    "Region",
    "CardType",
    "TxnCount",
    "TotalVolume",
    "Currency",
    "IC_Total",
    "IC_Avg_Pct",
    "FirstPlus_Total",
    "FirstPlus_Avg_Pct",
    "SecondPlus_Total",
    "SecondPlus_Avg_Pct",
    "GatewayFee_Total",
    "AuthorizationFee_Total",
    "ClearingFee_Total",
    "CrossBorderFee_Total",
    "CrossCurrencyFee_Total",
    "PreauthFee_Total",
    "ThreeDSFee_Total",
    "NonThreeDSFee_Total",
    "VAT_Total",
    "WHT_Total",
    "GRT_Total",
    "ST_Total",
    "NetAcquirerMarkup_Total",
    "MDR_Total",
    "MDR_Avg_Pct",
];

/// One CSV line. Field order must match [`CSV_COLUMNS`]; `Money` renders
/// with two decimals.
#[derive(Serialize)]
struct ReportRow<'a> {
    region: Region,
    card_type: &'a str,
    txn_count: usize,
    total_volume: Money,
    currency: &'a str,
    ic_total: Money,
    ic_avg_pct: Money,
    first_plus_total: Money,
    first_plus_avg_pct: Money,
    second_plus_total: Money,
    second_plus_avg_pct: Money,
    gateway_fee_total: Money,
    authorization_fee_total: Money,
    clearing_fee_total: Money,
    cross_border_fee_total: Money,
    cross_currency_fee_total: Money,
    preauth_fee_total: Money,
    three_ds_fee_total: Money,
    non_three_ds_fee_total: Money,
    vat_total: Money,
    wht_total: Money,
    grt_total: Money,
    st_total: Money,
    net_acquirer_markup_total: Money,
    mdr_total: Money,
    mdr_avg_pct: Money,
}

impl<'a> ReportRow<'a> {
    fn new(region: Region, card_type: &'a str, bucket: &'a AggregationBucket) -> Self {
        let totals = &bucket.totals;
        let parts = &totals.components;
        ReportRow {
            region,
            card_type,
            txn_count: bucket.count,
            total_volume: bucket.total_volume,
            currency: &bucket.currency,
            ic_total: totals.ic,
            ic_avg_pct: bucket.avg_ic_pct,
            first_plus_total: totals.first_plus,
            first_plus_avg_pct: bucket.avg_first_plus_pct,
            second_plus_total: totals.second_plus,
            second_plus_avg_pct: bucket.avg_second_plus_pct,
            gateway_fee_total: parts.gateway_fee,
            authorization_fee_total: parts.authorization_fee,
            clearing_fee_total: parts.clearing_fee,
            cross_border_fee_total: parts.cross_border_fee,
            cross_currency_fee_total: parts.cross_currency_fee,
            preauth_fee_total: parts.preauth_fee,
            three_ds_fee_total: parts.three_ds_fee,
            non_three_ds_fee_total: parts.non_three_ds_fee,
            vat_total: parts.vat,
            wht_total: parts.wht,
            grt_total: parts.grt,
            st_total: parts.st,
            net_acquirer_markup_total: parts.net_acquirer_markup,
            mdr_total: totals.mdr,
            mdr_avg_pct: bucket.avg_mdr_pct,
        }
    }
}

/// Writes the aggregated CSV report.
///
/// Rows are sorted by region code, then card type. The header is written
/// even when there are no buckets.
pub fn write_csv<W: Write>(stats: &Aggregator, writer: W) -> Result<()> {
    let mut csv_writer = WriterBuilder::new().has_headers(false).from_writer(writer);
    csv_writer.write_record(CSV_COLUMNS)?;

    for ((region, card_type), bucket) in stats.buckets() {
        if bucket.count == 0 {
            continue;
        }
        csv_writer.serialize(ReportRow::new(*region, card_type, bucket))?;
    }

    csv_writer.flush()?;
    Ok(())
}
