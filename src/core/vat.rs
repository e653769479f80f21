//! Tanzanian VAT categories and the VAT-inclusive price decomposition.
//!
//! | Code | Id | Category       | Rate |
//! |------|----|----------------|------|
//! | 1    | A  | Standard       | 18%  |
//! | 2    | B  | Special rate   | 10%  |
//! | 3    | C  | Zero rated     | 0%   |
//! | 4    | D  | Special relief | 0%   |
//! | 5    | E  | Exempted       | 0%   |
//!
//! Unknown codes and ids resolve to the standard category `A`.

use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Item tax code for taxable supplies.
pub const TAXABLE_ITEM_CODE: i64 = 1;

/// Item tax code for non-taxable supplies.
pub const NON_TAXABLE_ITEM_CODE: i64 = 3;

/// One of the five fixed VAT categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "char", into = "char")]
pub enum VatCategory {
    /// A: standard rate, 18%.
    Standard,
    /// B: special rate, 10%.
    Special,
    /// C: zero rated.
    Zero,
    /// D: special relief.
    SpecialRelief,
    /// E: exempted.
    Exempted,
}

impl VatCategory {
    pub const ALL: [VatCategory; 5] = [
        Self::Standard,
        Self::Special,
        Self::Zero,
        Self::SpecialRelief,
        Self::Exempted,
    ];

    /// Letter identifier used in `VATRATE` and `TAXCODES`.
    pub fn id(self) -> char {
        match self {
            Self::Standard => 'A',
            Self::Special => 'B',
            Self::Zero => 'C',
            Self::SpecialRelief => 'D',
            Self::Exempted => 'E',
        }
    }

    /// Numeric code as used in item `TAXCODE`.
    pub fn code(self) -> i64 {
        match self {
            Self::Standard => 1,
            Self::Special => 2,
            Self::Zero => 3,
            Self::SpecialRelief => 4,
            Self::Exempted => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Standard => "Standard VAT",
            Self::Special => "Special VAT",
            Self::Zero => "Zero VAT",
            Self::SpecialRelief => "Special Relief VAT",
            Self::Exempted => "Exempted VAT",
        }
    }

    /// Rate in percent (18 for 18%).
    pub fn rate(self) -> Decimal {
        match self {
            Self::Standard => dec!(18),
            Self::Special => dec!(10),
            Self::Zero | Self::SpecialRelief | Self::Exempted => Decimal::ZERO,
        }
    }

    /// Look up a category by numeric code, if it is one of the five.
    pub fn try_from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    /// Look up a category by letter id (case-insensitive), if it is one of the five.
    pub fn try_from_id(id: char) -> Option<Self> {
        let id = id.to_ascii_uppercase();
        Self::ALL.into_iter().find(|c| c.id() == id)
    }

    /// Category for a numeric code. Unknown codes fall back to [`VatCategory::Standard`].
    pub fn from_code(code: i64) -> Self {
        Self::try_from_code(code).unwrap_or(Self::Standard)
    }

    /// Category for a letter id. Unknown ids fall back to [`VatCategory::Standard`].
    pub fn from_id(id: char) -> Self {
        Self::try_from_id(id).unwrap_or(Self::Standard)
    }

    /// Split a VAT-inclusive amount into `(net, tax)`.
    ///
    /// `tax = amount × r / (100 + r)` and `net = amount − tax`. Not rounded.
    pub fn net_and_tax(self, amount: Decimal) -> (Decimal, Decimal) {
        let rate = self.rate();
        if rate.is_zero() {
            return (amount, Decimal::ZERO);
        }
        let tax = amount * rate / (dec!(100) + rate);
        (amount - tax, tax)
    }

    /// `VATRATE` as printed in Z reports, e.g. `A-18.00`.
    pub fn report_rate(self) -> String {
        format!("{}-{:.2}", self.id(), self.rate())
    }
}

impl fmt::Display for VatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl From<VatCategory> for char {
    fn from(category: VatCategory) -> Self {
        category.id()
    }
}

impl TryFrom<char> for VatCategory {
    type Error = String;

    fn try_from(id: char) -> Result<Self, Self::Error> {
        Self::try_from_id(id).ok_or_else(|| format!("unknown VAT category id '{id}'"))
    }
}

/// Rate in percent for a numeric code, with the standard fallback.
pub fn rate_for(code: i64) -> Decimal {
    VatCategory::from_code(code).rate()
}

/// `(net, tax)` for an amount charged under item tax code `code`.
pub fn net_and_tax(code: i64, amount: Decimal) -> (Decimal, Decimal) {
    VatCategory::from_code(code).net_and_tax(amount)
}
