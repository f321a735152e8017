//! Console report.

use super::is_negligible;
use crate::aggregate::{AggregationBucket, Aggregator};
use crate::money::Money;
use crate::region::Region;
use std::io::{self, Write};

const HEAVY_RULE: &str = "═════════════════════════════════════════════════════════════════";
const LIGHT_RULE: &str = "─────────────────────────────────────────────────────────────────";

/// Display symbol for a currency code; unknown codes print as `CODE `.
fn currency_symbol(currency: &str) -> String {
    match currency {
        "HKD" => "HK$".to_string(),
        "MYR" => "RM".to_string(),
        "THB" => "฿".to_string(),
        "USD" => "$".to_string(),
        "EUR" => "€".to_string(),
        "GBP" => "£".to_string(),
        other => format!("{} ", other),
    }
}

/// Formats the absolute value of `amount` with a currency symbol and
/// thousands separators: `HK$1,234.50`.
pub fn format_currency(amount: Money, currency: &str) -> String {
    let plain = amount.abs().to_string();
    let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}{}.{}", currency_symbol(currency), grouped, frac_part)
}

/// Writes the human-readable breakdown, region by region.
pub fn write_text<W: Write>(stats: &Aggregator, mut out: W) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", HEAVY_RULE)?;
    writeln!(out, "IC++ PRICING BREAKDOWN ANALYSIS")?;
    writeln!(out, "{}", HEAVY_RULE)?;
    writeln!(out, "Total Transactions Processed: {}", stats.total_transactions())?;
    writeln!(out, "Transactions Skipped: {}", stats.skipped())?;

    if !stats.skipped_reasons().is_empty() {
        writeln!(out)?;
        writeln!(out, "Skipped Breakdown:")?;
        for (reason, count) in stats.skipped_reasons() {
            writeln!(out, "  - {}: {}", reason, count)?;
        }
    }
    writeln!(out, "{}", HEAVY_RULE)?;

    for region in stats.regions() {
        writeln!(out)?;
        writeln!(out)?;
        writeln!(out, "REGION: {} ({})", region.display_name(), region.code())?;
        writeln!(out, "{}", LIGHT_RULE)?;

        for (card_type, bucket) in stats.region_buckets(region) {
            if bucket.count > 0 {
                write_bucket(&mut out, region, card_type, bucket)?;
            }
        }
    }

    writeln!(out)?;
    writeln!(out, "{}", HEAVY_RULE)?;
    out.flush()
}

fn write_bucket<W: Write>(
    out: &mut W,
    region: Region,
    card_type: &str,
    bucket: &AggregationBucket,
) -> io::Result<()> {
    let currency = bucket.currency.as_str();
    let totals = &bucket.totals;
    let money = |amount: Money| format_currency(amount, currency);

    writeln!(out)?;
    writeln!(out, "Card Type: {}", card_type)?;
    writeln!(
        out,
        "  Count: {} | Volume: {}",
        bucket.count,
        money(bucket.total_volume)
    )?;
    writeln!(out)?;
    writeln!(out, "  Fee Breakdown:")?;
    writeln!(
        out,
        "    IC (Interchange):      {:>15}  ({}%)",
        money(totals.ic),
        bucket.avg_ic_pct
    )?;
    let waiver = if region.waives_scheme_fee() {
        "  (scheme fee waived)"
    } else {
        ""
    };
    writeln!(
        out,
        "    1st Plus (Scheme):     {:>15}  ({}%){}",
        money(totals.first_plus),
        bucket.avg_first_plus_pct,
        waiver
    )?;
    writeln!(
        out,
        "    2nd Plus (Acquirer):   {:>15}  ({}%)",
        money(totals.second_plus),
        bucket.avg_second_plus_pct
    )?;

    write_second_plus(out, bucket)?;

    writeln!(out, "    {}", "─".repeat(55))?;
    writeln!(
        out,
        "    Total MDR:             {:>15}  ({}%)",
        money(totals.mdr),
        bucket.avg_mdr_pct
    )
}

fn write_component<W: Write>(
    out: &mut W,
    prefix: &str,
    label: &str,
    amount: Money,
    bucket: &AggregationBucket,
) -> io::Result<()> {
    writeln!(
        out,
        "{} {:<26} {:>12}  ({}%)",
        prefix,
        label,
        format_currency(amount, &bucket.currency),
        bucket.share_of_volume(amount).format_dp(3)
    )
}

fn write_second_plus<W: Write>(out: &mut W, bucket: &AggregationBucket) -> io::Result<()> {
    let parts = &bucket.totals.components;

    writeln!(out, "      │")?;
    writeln!(out, "      ├─ 2nd Plus Breakdown:")?;

    let operational = [
        ("Gateway Fee", parts.gateway_fee),
        ("Authorization Fee", parts.authorization_fee),
        ("Clearing Fee", parts.clearing_fee),
        ("Cross-Border Fee", parts.cross_border_fee),
        ("Cross-Currency Fee", parts.cross_currency_fee),
        ("Preauthorization Fee", parts.preauth_fee),
        ("3DS Fee", parts.three_ds_fee),
        ("Non-3DS Fee", parts.non_three_ds_fee),
    ];
    for (label, amount) in operational {
        if !is_negligible(amount) {
            write_component(out, "      │  ├─", label, amount, bucket)?;
        }
    }

    if !is_negligible(parts.tax_total()) {
        writeln!(out, "      │  ├─ Tax Components:")?;
        let taxes = [
            ("VAT", parts.vat),
            ("WHT (Withholding Tax)", parts.wht),
            ("GRT (Gross Receipt Tax)", parts.grt),
            ("ST (Sales Tax)", parts.st),
        ];
        for (label, amount) in taxes {
            if !is_negligible(amount) {
                write_component(out, "      │  │  ├─", label, amount, bucket)?;
            }
        }
    }

    if !is_negligible(parts.net_acquirer_markup) {
        write_component(
            out,
            "      │  └─",
            "Net Acquirer Markup",
            parts.net_acquirer_markup,
            bucket,
        )?;
    }
    writeln!(out, "      │")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fees::{FeeAmount, FeeRecord};
    use crate::icpp::IcppBreakdown;
    use crate::reconcile::{Reconciled, SkipReason};
    use crate::transaction::Transaction;

    fn money(s: &str) -> Money {
        Money::parse_strict(s).unwrap()
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(money("1234567.891"), "HKD"), "HK$1,234,567.89");
        assert_eq!(format_currency(money("-12.5"), "MYR"), "RM12.50");
        assert_eq!(format_currency(money("999"), "THB"), "฿999.00");
        assert_eq!(format_currency(money("1000"), "SGD"), "SGD 1,000.00");
        assert_eq!(format_currency(Money::ZERO, ""), " 0.00");
    }

    #[test]
    fn test_report_sections() {
        let amount = |s: &str| FeeAmount {
            amount: money(s),
            currency: "MYR".to_string(),
        };
        let fees = FeeRecord {
            mdr: amount("3.00"),
            interchange: amount("1.50"),
            scheme_fee: amount("0.30"),
            clearing: amount("0.20"),
            vat: amount("0.06"),
            ..FeeRecord::default()
        };
        let tx: Transaction = [("Card Type", "Visa"), ("Currency", "MYR")]
            .into_iter()
            .collect();
        let reconciled = Reconciled {
            region: Region::Malaysia,
            amount: money("100"),
            breakdown: IcppBreakdown::compute(&fees, Region::Malaysia),
        };

        let mut stats = Aggregator::new();
        stats.add_transaction(&tx, &reconciled);
        stats.skip_transaction(&SkipReason::ZeroMdr);
        stats.finalize();

        let mut output = Vec::new();
        write_text(&stats, &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();

        assert!(text.contains("Total Transactions Processed: 1"));
        assert!(text.contains("Transactions Skipped: 1"));
        assert!(text.contains("  - Zero MDR: 1"));
        assert!(text.contains("REGION: MALAYSIA (MY)"));
        assert!(text.contains("Card Type: VISA"));
        assert!(text.contains("(scheme fee waived)"));
        assert!(text.contains("Clearing Fee"));
        assert!(text.contains("Tax Components:"));
        assert!(text.contains("RM1.24"));
        assert!(!text.contains("Gateway Fee"));
        assert!(!text.contains("REGION: HONG KONG"));
    }
}
