//! Interchange++ fee waterfall.
//!
//! ```text
//! MDR = IC (interchange) + 1st Plus (scheme fee) + 2nd Plus (acquirer markup)
//! 2nd Plus = operational fees + taxes + net acquirer markup
//! ```
//!
//! The net acquirer markup is a residual: whatever of 2nd Plus the named
//! sub-fees do not explain. It is negative when the sub-fees exceed 2nd Plus
//! and is kept that way.

use crate::fees::FeeRecord;
use crate::money::Money;
use crate::region::Region;
use std::ops::AddAssign;

/// The named components of 2nd Plus, plus the residual markup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SecondPlusComponents {
    pub gateway_fee: Money,
    pub authorization_fee: Money,
    pub clearing_fee: Money,
    pub cross_border_fee: Money,
    pub cross_currency_fee: Money,
    pub preauth_fee: Money,
    pub three_ds_fee: Money,
    pub non_three_ds_fee: Money,
    pub vat: Money,
    pub wht: Money,
    pub grt: Money,
    pub st: Money,
    pub net_acquirer_markup: Money,
}

impl SecondPlusComponents {
    /// Operational sub-fees, excluding taxes.
    pub fn operational_total(&self) -> Money {
        [
            self.gateway_fee,
            self.authorization_fee,
            self.clearing_fee,
            self.cross_border_fee,
            self.cross_currency_fee,
            self.preauth_fee,
            self.three_ds_fee,
            self.non_three_ds_fee,
        ]
        .into_iter()
        .sum()
    }

    /// VAT + WHT + GRT + ST.
    pub fn tax_total(&self) -> Money {
        [self.vat, self.wht, self.grt, self.st].into_iter().sum()
    }

    /// Sum of the twelve named sub-fees (the residual is not included).
    pub fn named_total(&self) -> Money {
        self.operational_total() + self.tax_total()
    }
}

impl AddAssign for SecondPlusComponents {
    fn add_assign(&mut self, rhs: Self) {
        self.gateway_fee += rhs.gateway_fee;
        self.authorization_fee += rhs.authorization_fee;
        self.clearing_fee += rhs.clearing_fee;
        self.cross_border_fee += rhs.cross_border_fee;
        self.cross_currency_fee += rhs.cross_currency_fee;
        self.preauth_fee += rhs.preauth_fee;
        self.three_ds_fee += rhs.three_ds_fee;
        self.non_three_ds_fee += rhs.non_three_ds_fee;
        self.vat += rhs.vat;
        self.wht += rhs.wht;
        self.grt += rhs.grt;
        self.st += rhs.st;
        self.net_acquirer_markup += rhs.net_acquirer_markup;
    }
}

/// IC++ decomposition of one transaction's MDR.
///
/// # Invariants
///
/// - `second_plus == mdr - ic - first_plus`
/// - `components.net_acquirer_markup == second_plus - components.named_total()`
///
/// Summing breakdowns with `+=` preserves both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IcppBreakdown {
    pub ic: Money,
    pub first_plus: Money,
    pub second_plus: Money,
    pub mdr: Money,
    pub components: SecondPlusComponents,
}

impl IcppBreakdown {
    /// Computes the waterfall for a matched fee record.
    ///
    /// The scheme fee is zeroed for regions that waive it (Malaysia),
    /// whatever the fee export says.
    pub fn compute(fees: &FeeRecord, region: Region) -> Self {
        let mdr = fees.mdr.amount;
        let ic = fees.interchange.amount;
        let first_plus = if region.waives_scheme_fee() {
            Money::ZERO
        } else {
            fees.scheme_fee.amount
        };
        let second_plus = mdr - ic - first_plus;

        let mut components = SecondPlusComponents {
            gateway_fee: fees.gateway_fee.amount,
            authorization_fee: fees.authorization.amount,
            clearing_fee: fees.clearing.amount,
            cross_border_fee: fees.cross_border.amount,
            cross_currency_fee: fees.cross_currency.amount,
            preauth_fee: fees.preauthorization.amount,
            three_ds_fee: fees.three_ds.amount,
            non_three_ds_fee: fees.non_three_ds.amount,
            vat: fees.vat.amount,
            wht: fees.wht.amount,
            grt: fees.grt.amount,
            st: fees.st.amount,
            net_acquirer_markup: Money::ZERO,
        };
        components.net_acquirer_markup = second_plus - components.named_total();

        IcppBreakdown {
            ic,
            first_plus,
            second_plus,
            mdr,
            components,
        }
    }
}

impl AddAssign for IcppBreakdown {
    fn add_assign(&mut self, rhs: Self) {
        self.ic += rhs.ic;
        self.first_plus += rhs.first_plus;
        self.second_plus += rhs.second_plus;
        self.mdr += rhs.mdr;
        self.components += rhs.components;
    }
}
