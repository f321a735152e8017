//! Self-contained HTML report.

use super::is_negligible;
use super::text::format_currency;
use crate::aggregate::{AggregationBucket, Aggregator};
use crate::money::Money;
use std::fmt::Write;

const STYLE: &str = "\
body { font-family: sans-serif; margin: 2em; color: #222; background: #f7f7f9; }
h1 { margin-bottom: 0.2em; }
.cards { display: flex; gap: 1em; margin: 1em 0; }
.card { background: #fff; border-radius: 6px; padding: 1em 1.5em; box-shadow: 0 1px 3px rgba(0,0,0,0.15); }
.card .value { font-size: 1.8em; font-weight: bold; }
.region { background: #fff; border-radius: 6px; padding: 1em; margin: 1.5em 0; box-shadow: 0 1px 3px rgba(0,0,0,0.15); }
table { border-collapse: collapse; width: 100%; margin: 0.5em 0 1.5em; }
th, td { border-bottom: 1px solid #ddd; padding: 0.35em 0.6em; text-align: right; }
th:first-child, td:first-child { text-align: left; }
tr.sub td:first-child { padding-left: 2em; color: #555; }
tr.total td { font-weight: bold; border-top: 2px solid #222; }
.note { color: #a15c00; font-size: 0.9em; }
";

/// Escapes text for use in element content and attribute values.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Renders the full report as a standalone HTML document.
pub fn render_html(stats: &Aggregator) -> String {
    let mut html = String::new();
    write_document(&mut html, stats).expect("writing to a String cannot fail");
    html
}

fn write_document(html: &mut String, stats: &Aggregator) -> std::fmt::Result {
    writeln!(html, "<!DOCTYPE html>")?;
    writeln!(html, "<html lang=\"en\">")?;
    writeln!(html, "<head>")?;
    writeln!(html, "<meta charset=\"utf-8\">")?;
    writeln!(html, "<title>IC++ Pricing Breakdown</title>")?;
    writeln!(html, "<style>\n{}</style>", STYLE)?;
    writeln!(html, "</head>")?;
    writeln!(html, "<body>")?;
    writeln!(html, "<h1>IC++ Pricing Breakdown</h1>")?;

    let regions = stats.regions();
    writeln!(html, "<div class=\"cards\">")?;
    overview_card(html, "Transactions processed", stats.total_transactions())?;
    overview_card(html, "Transactions skipped", stats.skipped())?;
    overview_card(html, "Regions", regions.len())?;
    writeln!(html, "</div>")?;

    if !stats.skipped_reasons().is_empty() {
        writeln!(html, "<h2>Skipped transactions</h2>")?;
        writeln!(html, "<table>")?;
        writeln!(html, "<tr><th>Reason</th><th>Count</th></tr>")?;
        for (reason, count) in stats.skipped_reasons() {
            writeln!(html, "<tr><td>{}</td><td>{}</td></tr>", escape(reason), count)?;
        }
        writeln!(html, "</table>")?;
    }

    for region in regions {
        writeln!(html, "<section class=\"region\">")?;
        writeln!(
            html,
            "<h2>{} ({})</h2>",
            escape(region.display_name()),
            region.code()
        )?;
        if region.waives_scheme_fee() {
            writeln!(
                html,
                "<p class=\"note\">Scheme fee (1st Plus) is waived in this region.</p>"
            )?;
        }
        for (card_type, bucket) in stats.region_buckets(region) {
            if bucket.count > 0 {
                write_bucket_table(html, card_type, bucket)?;
            }
        }
        writeln!(html, "</section>")?;
    }

    writeln!(html, "</body>")?;
    writeln!(html, "</html>")
}

fn overview_card(html: &mut String, label: &str, value: usize) -> std::fmt::Result {
    writeln!(
        html,
        "<div class=\"card\"><div class=\"value\">{}</div><div>{}</div></div>",
        value,
        escape(label)
    )
}

fn write_row(
    html: &mut String,
    class: &str,
    label: &str,
    amount: Money,
    pct: &str,
    currency: &str,
) -> std::fmt::Result {
    writeln!(
        html,
        "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}%</td></tr>",
        class,
        escape(label),
        escape(&format_currency(amount, currency)),
        pct
    )
}

fn write_bucket_table(
    html: &mut String,
    card_type: &str,
    bucket: &AggregationBucket,
) -> std::fmt::Result {
    let totals = &bucket.totals;
    let parts = &totals.components;
    let currency = bucket.currency.as_str();

    writeln!(
        html,
        "<h3>{} <small>{} transactions, volume {}</small></h3>",
        escape(card_type),
        bucket.count,
        escape(&format_currency(bucket.total_volume, currency))
    )?;
    writeln!(html, "<table>")?;
    writeln!(html, "<tr><th>Component</th><th>Amount</th><th>% of volume</th></tr>")?;

    let headline = [
        ("IC (Interchange)", totals.ic, bucket.avg_ic_pct),
        ("1st Plus (Scheme)", totals.first_plus, bucket.avg_first_plus_pct),
        ("2nd Plus (Acquirer)", totals.second_plus, bucket.avg_second_plus_pct),
    ];
    for (label, amount, pct) in headline {
        write_row(html, "", label, amount, &pct.to_string(), currency)?;
    }

    let components = [
        ("Gateway Fee", parts.gateway_fee),
        ("Authorization Fee", parts.authorization_fee),
        ("Clearing Fee", parts.clearing_fee),
        ("Cross-Border Fee", parts.cross_border_fee),
        ("Cross-Currency Fee", parts.cross_currency_fee),
        ("Preauthorization Fee", parts.preauth_fee),
        ("3DS Fee", parts.three_ds_fee),
        ("Non-3DS Fee", parts.non_three_ds_fee),
        ("VAT", parts.vat),
        ("WHT (Withholding Tax)", parts.wht),
        ("GRT (Gross Receipt Tax)", parts.grt),
        ("ST (Sales Tax)", parts.st),
        ("Net Acquirer Markup", parts.net_acquirer_markup),
    ];
    for (label, amount) in components {
        if !is_negligible(amount) {
            let pct = bucket.share_of_volume(amount).format_dp(3);
            write_row(html, "sub", label, amount, &pct, currency)?;
        }
    }

    write_row(
        html,
        "total",
        "Total MDR",
        totals.mdr,
        &bucket.avg_mdr_pct.to_string(),
        currency,
    )?;
    writeln!(html, "</table>")
}
