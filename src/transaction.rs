//! Settled-transaction records read from the spreadsheet export.

use crate::identifier::IdentifierChain;
use std::collections::BTreeMap;

/// Header names of the spreadsheet columns the pipeline consults.
pub mod columns {
    pub const GATEWAY_UUID: &str = "Gateway UUID";
    pub const TRANSACTION_ID: &str = "Transaction ID";
    pub const GATEWAY_REFERENCE: &str = "Gateway Reference";
    pub const MERCHANT: &str = "Merchant";
    pub const AMOUNT: &str = "Amount";
    pub const CURRENCY: &str = "Currency";
    pub const CARD_TYPE: &str = "Card Type";
    pub const PAYMENT_TYPE: &str = "Payment Type";
    pub const PROCESSOR_STATUS: &str = "Processor Status";
    pub const CARD_COUNTRY: &str = "Card Country";
}

/// One worksheet data row.
///
/// Every column the pipeline reads has a named field. A field is `None`
/// only when the sheet has no such header; a header whose cell is missing
/// in this row yields `Some("")`. Columns without a named field are kept in
/// [`Transaction::extra`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    pub gateway_uuid: Option<String>,
    pub transaction_id: Option<String>,
    pub gateway_reference: Option<String>,
    pub merchant: Option<String>,
    pub amount: Option<String>,
    pub currency: Option<String>,
    pub card_type: Option<String>,
    pub payment_type: Option<String>,
    pub processor_status: Option<String>,
    pub card_country: Option<String>,

    /// Passthrough columns, keyed by header.
    pub extra: BTreeMap<String, String>,
}

impl Transaction {
    /// Zips a row with the header list.
    ///
    /// Cells beyond the last header are dropped; headers beyond the last
    /// cell map to the empty string. Repeated headers keep the rightmost
    /// value.
    pub fn from_row(headers: &[String], cells: &[String]) -> Self {
        headers
            .iter()
            .enumerate()
            .map(|(i, header)| (header.clone(), cells.get(i).cloned().unwrap_or_default()))
            .collect()
    }

    /// Looks up a column by header name.
    pub fn field(&self, name: &str) -> Option<&str> {
        let named = match name {
            columns::GATEWAY_UUID => &self.gateway_uuid,
            columns::TRANSACTION_ID => &self.transaction_id,
            columns::GATEWAY_REFERENCE => &self.gateway_reference,
            columns::MERCHANT => &self.merchant,
            columns::AMOUNT => &self.amount,
            columns::CURRENCY => &self.currency,
            columns::CARD_TYPE => &self.card_type,
            columns::PAYMENT_TYPE => &self.payment_type,
            columns::PROCESSOR_STATUS => &self.processor_status,
            columns::CARD_COUNTRY => &self.card_country,
            other => return self.extra.get(other).map(String::as_str),
        };
        named.as_deref()
    }

    fn set_field(&mut self, name: String, value: String) {
        let slot = match name.as_str() {
            columns::GATEWAY_UUID => Some(&mut self.gateway_uuid),
            columns::TRANSACTION_ID => Some(&mut self.transaction_id),
            columns::GATEWAY_REFERENCE => Some(&mut self.gateway_reference),
            columns::MERCHANT => Some(&mut self.merchant),
            columns::AMOUNT => Some(&mut self.amount),
            columns::CURRENCY => Some(&mut self.currency),
            columns::CARD_TYPE => Some(&mut self.card_type),
            columns::PAYMENT_TYPE => Some(&mut self.payment_type),
            columns::PROCESSOR_STATUS => Some(&mut self.processor_status),
            columns::CARD_COUNTRY => Some(&mut self.card_country),
            _ => None,
        };
        match slot {
            Some(slot) => *slot = Some(value),
            None => {
                self.extra.insert(name, value);
            }
        }
    }

    /// Whether the row carries a `Gateway UUID` or `Transaction ID`.
    ///
    /// Rows without either are not transactions (totals, blank lines, notes).
    pub fn has_identity(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        filled(&self.gateway_uuid) || filled(&self.transaction_id)
    }

    /// Join key against the fee export.
    pub fn identifier(&self) -> Option<&str> {
        IdentifierChain::TRANSACTION.resolve(|name| self.field(name))
    }

    /// Reference used in bucket listings: the gateway UUID, or `N/A`.
    pub fn reference(&self) -> &str {
        self.gateway_uuid
            .as_deref()
            .filter(|uuid| !uuid.is_empty())
            .unwrap_or("N/A")
    }
}

impl<K, V> FromIterator<(K, V)> for Transaction
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tx = Transaction::default();
        for (name, value) in iter {
            tx.set_field(name.into(), value.into());
        }
        tx
    }
}
