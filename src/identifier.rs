//! Identifier fallback policy.
//!
//! Both feeds identify a transaction by whichever of several columns is
//! filled in. The priority is declared once per feed as an
//! [`IdentifierChain`] instead of being spelled out as nested conditionals.

use crate::transaction::columns;

/// Column name used only by the fee export.
pub const NP_TRANSACTION_ID: &str = "NP Transaction ID";

/// An ordered list of columns; the first non-empty value wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentifierChain {
    fields: &'static [&'static str],
}

impl IdentifierChain {
    /// Identity of a spreadsheet transaction.
    pub const TRANSACTION: IdentifierChain = IdentifierChain::new(&[
        columns::GATEWAY_UUID,
        columns::TRANSACTION_ID,
        columns::GATEWAY_REFERENCE,
    ]);

    /// Identity of a fee-export row.
    pub const FEE_RECORD: IdentifierChain = IdentifierChain::new(&[
        NP_TRANSACTION_ID,
        columns::TRANSACTION_ID,
        columns::GATEWAY_REFERENCE,
        columns::GATEWAY_UUID,
    ]);

    /// Creates a chain that tries `fields` in the given order.
    pub const fn new(fields: &'static [&'static str]) -> Self {
        IdentifierChain { fields }
    }

    /// The columns in priority order.
    pub fn fields(&self) -> &'static [&'static str] {
        self.fields
    }

    /// Returns the first non-empty value produced by `lookup`, trying the
    /// columns in priority order and stopping at the first hit.
    pub fn resolve<'a, F>(&self, lookup: F) -> Option<&'a str>
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        self.fields
            .iter()
            .filter_map(|field| lookup(field))
            .find(|value| !value.is_empty())
    }
}
