//! Region classification.

use serde::Serialize;
use std::fmt;

/// Pricing region of a transaction.
///
/// Variants are declared in report order, so sorting by region sorts
/// HK, MY, TH, then UNKNOWN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Region {
    #[serde(rename = "HK")]
    HongKong,
    #[serde(rename = "MY")]
    Malaysia,
    #[serde(rename = "TH")]
    Thailand,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

/// Merchant-name keywords, checked in this order.
pub const MERCHANT_KEYWORDS: [(&str, Region); 3] = [
    ("Hong Kong", Region::HongKong),
    ("Malaysia", Region::Malaysia),
    ("Thailand", Region::Thailand),
];

/// Card-country codes used when the merchant name has no keyword.
pub const CARD_COUNTRY_CODES: [(&[&str], Region); 3] = [
    (&["HKG", "HK"], Region::HongKong),
    (&["MYS", "MY"], Region::Malaysia),
    (&["THA", "TH"], Region::Thailand),
];

impl Region {
    /// All regions, in report order.
    pub const ALL: [Region; 4] = [
        Region::HongKong,
        Region::Malaysia,
        Region::Thailand,
        Region::Unknown,
    ];

    /// Classifies a transaction by merchant name, then card country.
    ///
    /// The first keyword in [`MERCHANT_KEYWORDS`] order contained in the
    /// merchant name wins, regardless of where it appears in the name. Both
    /// matches are exact and case-sensitive. Falling through both yields
    /// [`Region::Unknown`], which is a valid region and not an error.
    pub fn classify(merchant: &str, card_country: &str) -> Region {
        let by_merchant = MERCHANT_KEYWORDS
            .iter()
            .find(|(keyword, _)| merchant.contains(keyword))
            .map(|(_, region)| *region);

        by_merchant
            .or_else(|| {
                CARD_COUNTRY_CODES
                    .iter()
                    .find(|(codes, _)| codes.iter().any(|code| *code == card_country))
                    .map(|(_, region)| *region)
            })
            .unwrap_or(Region::Unknown)
    }

    /// Short code used in reports and CSV output.
    pub fn code(&self) -> &'static str {
        match self {
            Region::HongKong => "HK",
            Region::Malaysia => "MY",
            Region::Thailand => "TH",
            Region::Unknown => "UNKNOWN",
        }
    }

    /// Heading used in the console report.
    pub fn display_name(&self) -> &'static str {
        match self {
            Region::HongKong => "HONG KONG",
            Region::Malaysia => "MALAYSIA",
            Region::Thailand => "THAILAND",
            Region::Unknown => "OTHER/UNKNOWN",
        }
    }

    /// Whether scheme fees are waived for transactions in this region.
    pub fn waives_scheme_fee(&self) -> bool {
        matches!(self, Region::Malaysia)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
