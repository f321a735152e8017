//! Fee export loading.
//!
//! The fee export is a header-driven CSV with one row per transaction and an
//! amount/currency column pair per fee component. Amounts are parsed
//! leniently: a blank or garbled amount is a zero fee, never an error.

use crate::error::Result;
use crate::identifier::{IdentifierChain, NP_TRANSACTION_ID};
use crate::money::Money;
use crate::transaction::columns;
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// One fee component: an amount and the currency it is quoted in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeeAmount {
    pub amount: Money,
    pub currency: String,
}

impl FeeAmount {
    fn from_columns(amount: Option<String>, currency: Option<String>) -> Self {
        FeeAmount {
            amount: amount.as_deref().map_or(Money::ZERO, Money::parse_lenient),
            currency: currency.unwrap_or_default(),
        }
    }
}

/// Fee components of a single transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeeRecord {
    pub mdr: FeeAmount,
    pub interchange: FeeAmount,
    pub scheme_fee: FeeAmount,
    pub gateway_fee: FeeAmount,
    pub authorization: FeeAmount,
    pub clearing: FeeAmount,
    pub cross_border: FeeAmount,
    pub cross_currency: FeeAmount,
    pub preauthorization: FeeAmount,
    pub three_ds: FeeAmount,
    pub non_three_ds: FeeAmount,
    pub vat: FeeAmount,
    pub wht: FeeAmount,
    pub grt: FeeAmount,
    pub st: FeeAmount,
}

/// Raw fee-export row as read from CSV.
///
/// Every column is optional; columns the export does not carry read as
/// `None`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FeeRow {
    #[serde(rename = "NP Transaction ID")]
    pub np_transaction_id: Option<String>,
    #[serde(rename = "Transaction ID")]
    pub transaction_id: Option<String>,
    #[serde(rename = "Gateway Reference")]
    pub gateway_reference: Option<String>,
    #[serde(rename = "Gateway UUID")]
    pub gateway_uuid: Option<String>,

    #[serde(rename = "MDR Amount")]
    pub mdr_amount: Option<String>,
    #[serde(rename = "MDR Currency")]
    pub mdr_currency: Option<String>,
    #[serde(rename = "Interchange Amount")]
    pub interchange_amount: Option<String>,
    #[serde(rename = "Interchange Currency")]
    pub interchange_currency: Option<String>,
    #[serde(rename = "Scheme Fee Bucket Amount")]
    pub scheme_fee_amount: Option<String>,
    #[serde(rename = "Scheme Fee Bucket Currency")]
    pub scheme_fee_currency: Option<String>,
    #[serde(rename = "Gateway Fee Amount")]
    pub gateway_fee_amount: Option<String>,
    #[serde(rename = "Gateway Fee Currency")]
    pub gateway_fee_currency: Option<String>,
    #[serde(rename = "Authorization Amount")]
    pub authorization_amount: Option<String>,
    #[serde(rename = "Authorization Currency")]
    pub authorization_currency: Option<String>,
    #[serde(rename = "Clearing Amount")]
    pub clearing_amount: Option<String>,
    #[serde(rename = "Clearing Currency")]
    pub clearing_currency: Option<String>,
    #[serde(rename = "Cross Border Amount")]
    pub cross_border_amount: Option<String>,
    #[serde(rename = "Cross Border Currency")]
    pub cross_border_currency: Option<String>,
    #[serde(rename = "Cross Currency Amount")]
    pub cross_currency_amount: Option<String>,
    #[serde(rename = "Cross Currency Currency")]
    pub cross_currency_currency: Option<String>,
    #[serde(rename = "Preauthorization Amount")]
    pub preauthorization_amount: Option<String>,
    #[serde(rename = "Preauthorization Currency")]
    pub preauthorization_currency: Option<String>,
    #[serde(rename = "Three Ds Amount")]
    pub three_ds_amount: Option<String>,
    #[serde(rename = "Three Ds Currency")]
    pub three_ds_currency: Option<String>,
    #[serde(rename = "Non Three Ds Amount")]
    pub non_three_ds_amount: Option<String>,
    #[serde(rename = "Non Three Ds Currency")]
    pub non_three_ds_currency: Option<String>,
    #[serde(rename = "VAT Amount")]
    pub vat_amount: Option<String>,
    #[serde(rename = "VAT Currency")]
    pub vat_currency: Option<String>,
    #[serde(rename = "WHT Amount")]
    pub wht_amount: Option<String>,
    #[serde(rename = "WHT Currency")]
    pub wht_currency: Option<String>,
    #[serde(rename = "GRT Amount")]
    pub grt_amount: Option<String>,
    #[serde(rename = "GRT Currency")]
    pub grt_currency: Option<String>,
    #[serde(rename = "ST Amount")]
    pub st_amount: Option<String>,
    #[serde(rename = "ST Currency")]
    pub st_currency: Option<String>,
}

impl FeeRow {
    /// Looks up an identifier column by header name.
    fn identifier_field(&self, name: &str) -> Option<&str> {
        let value = match name {
            NP_TRANSACTION_ID => &self.np_transaction_id,
            columns::TRANSACTION_ID => &self.transaction_id,
            columns::GATEWAY_REFERENCE => &self.gateway_reference,
            columns::GATEWAY_UUID => &self.gateway_uuid,
            _ => return None,
        };
        value.as_deref()
    }

    /// The row's transaction identifier, if any identifier column is filled.
    pub fn identifier(&self) -> Option<String> {
        IdentifierChain::FEE_RECORD
            .resolve(|name| self.identifier_field(name))
            .map(str::to_string)
    }

    /// Converts the raw columns into a [`FeeRecord`].
    pub fn into_record(self) -> FeeRecord {
        FeeRecord {
            mdr: FeeAmount::from_columns(self.mdr_amount, self.mdr_currency),
            interchange: FeeAmount::from_columns(self.interchange_amount, self.interchange_currency),
            scheme_fee: FeeAmount::from_columns(self.scheme_fee_amount, self.scheme_fee_currency),
            gateway_fee: FeeAmount::from_columns(self.gateway_fee_amount, self.gateway_fee_currency),
            authorization: FeeAmount::from_columns(
                self.authorization_amount,
                self.authorization_currency,
            ),
            clearing: FeeAmount::from_columns(self.clearing_amount, self.clearing_currency),
            cross_border: FeeAmount::from_columns(
                self.cross_border_amount,
                self.cross_border_currency,
            ),
            cross_currency: FeeAmount::from_columns(
                self.cross_currency_amount,
                self.cross_currency_currency,
            ),
            preauthorization: FeeAmount::from_columns(
                self.preauthorization_amount,
                self.preauthorization_currency,
            ),
            three_ds: FeeAmount::from_columns(self.three_ds_amount, self.three_ds_currency),
            non_three_ds: FeeAmount::from_columns(
                self.non_three_ds_amount,
                self.non_three_ds_currency,
            ),
            vat: FeeAmount::from_columns(self.vat_amount, self.vat_currency),
            wht: FeeAmount::from_columns(self.wht_amount, self.wht_currency),
            grt: FeeAmount::from_columns(self.grt_amount, self.grt_currency),
            st: FeeAmount::from_columns(self.st_amount, self.st_currency),
        }
    }
}

/// Fee records indexed by transaction identifier.
///
/// Holds at most one record per identifier; loading a later row with the
/// same identifier replaces the earlier one.
#[derive(Debug, Default)]
pub struct FeeRecordStore {
    records: HashMap<String, FeeRecord>,
}

impl FeeRecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        FeeRecordStore {
            records: HashMap::new(),
        }
    }

    /// Loads the fee export at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading fee data from: {}", path.display());
        let file = File::open(path)?;
        let store = Self::from_reader(BufReader::new(file))?;
        info!("Loaded fee data for {} transactions", store.len());
        Ok(store)
    }

    /// Loads a fee export from any reader.
    ///
    /// Rows without an identifier are skipped silently; rows the CSV layer
    /// cannot decode are logged at warn level and skipped. When a column
    /// name appears more than once in the header, the last one is used.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);
        let headers = last_wins_headers(csv_reader.headers()?);

        let mut store = FeeRecordStore::new();
        for (row_idx, result) in csv_reader.records().enumerate() {
            let row_num = row_idx + 2; // 1-indexed, accounting for header row

            let decoded = result.and_then(|record| record.deserialize::<FeeRow>(Some(&headers)));
            let row = match decoded {
                Ok(row) => row,
                Err(e) => {
                    warn!("Fee row {}: CSV parse error: {}", row_num, e);
                    continue;
                }
            };

            let Some(id) = row.identifier() else {
                debug!("Fee row {}: no transaction identifier, skipped", row_num);
                continue;
            };

            if store.insert(id.clone(), row.into_record()).is_some() {
                debug!("Fee row {}: replaces earlier record for {}", row_num, id);
            }
        }

        Ok(store)
    }

    /// Stores a record, returning the one it replaced.
    pub fn insert(&mut self, id: String, record: FeeRecord) -> Option<FeeRecord> {
        self.records.insert(id, record)
    }

    /// Looks up the record for a transaction identifier.
    pub fn get(&self, id: &str) -> Option<&FeeRecord> {
        self.records.get(id)
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no records are stored.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Blanks out every header that is repeated further right, so that a
/// duplicated column resolves to its last occurrence.
fn last_wins_headers(headers: &StringRecord) -> StringRecord {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let repeated = headers.iter().skip(idx + 1).any(|later| later == name);
            if repeated {
                ""
            } else {
                name
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn load_str(csv: &str) -> FeeRecordStore {
        FeeRecordStore::from_reader(Cursor::new(csv)).unwrap()
    }

    fn money(s: &str) -> Money {
        Money::parse_strict(s).unwrap()
    }

    #[test]
    fn test_load_basic_record() {
        let store = load_str(
            "NP Transaction ID,MDR Amount,MDR Currency,Interchange Amount,Scheme Fee Bucket Amount,Gateway Fee Amount
T1,3.00,HKD,1.50,0.30,0.10",
        );

        let record = store.get("T1").unwrap();
        assert_eq!(record.mdr.amount, money("3.00"));
        assert_eq!(record.mdr.currency, "HKD");
        assert_eq!(record.interchange.amount, money("1.50"));
        assert_eq!(record.scheme_fee.amount, money("0.30"));
        assert_eq!(record.gateway_fee.amount, money("0.10"));
        assert_eq!(record.interchange.currency, "");
        assert_eq!(record.vat.amount, Money::ZERO);
    }

    #[test]
    fn test_non_numeric_amounts_are_zero() {
        let store = load_str(
            "Transaction ID,MDR Amount,VAT Amount,WHT Amount
T1,abc,,-",
        );

        let record = store.get("T1").unwrap();
        assert_eq!(record.mdr.amount, Money::ZERO);
        assert_eq!(record.vat.amount, Money::ZERO);
        assert_eq!(record.wht.amount, Money::ZERO);
    }

    #[test]
    fn test_duplicate_identifier_keeps_later_row() {
        let store = load_str(
            "NP Transaction ID,MDR Amount
X,1.00
X,2.00",
        );

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("X").unwrap().mdr.amount, money("2.00"));
    }

    #[test]
    fn test_identifier_fallback_chain() {
        let store = load_str(
            "NP Transaction ID,Transaction ID,Gateway Reference,Gateway UUID,MDR Amount
NP1,TX1,REF1,UUID1,1
,TX2,REF2,UUID2,2
,,REF3,UUID3,3
,,,UUID4,4
,,,,5",
        );

        assert_eq!(store.len(), 4);
        assert!(store.get("NP1").is_some());
        assert!(store.get("TX1").is_none());
        assert!(store.get("TX2").is_some());
        assert!(store.get("REF3").is_some());
        assert!(store.get("UUID4").is_some());
    }

    #[test]
    fn test_short_rows_and_extra_columns() {
        let store = load_str(
            "Gateway UUID,Merchant Name,MDR Amount,Interchange Amount
U1,Shop,2.5",
        );

        let record = store.get("U1").unwrap();
        assert_eq!(record.mdr.amount, money("2.5"));
        assert_eq!(record.interchange.amount, Money::ZERO);
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let store = load_str(
            "NP Transaction ID , MDR Amount
 T1 , 3.00 ",
        );

        assert_eq!(store.get("T1").unwrap().mdr.amount, money("3.00"));
    }

    #[test]
    fn test_repeated_column_uses_last_value() {
        let store = load_str(
            "NP Transaction ID,MDR Amount,Interchange Amount,MDR Amount
T1,1.00,0.50,3.00",
        );

        assert_eq!(store.len(), 1);
        let record = store.get("T1").unwrap();
        assert_eq!(record.mdr.amount, money("3.00"));
        assert_eq!(record.interchange.amount, money("0.50"));
    }

    #[test]
    fn test_repeated_identifier_column() {
        let store = load_str(
            "NP Transaction ID,NP Transaction ID,MDR Amount
OLD,NEW,2",
        );

        assert!(store.get("OLD").is_none());
        assert_eq!(store.get("NEW").unwrap().mdr.amount, money("2"));
    }

    #[test]
    fn test_empty_file() {
        let store = load_str("");
        assert!(store.is_empty());
    }
}
