use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::vat::{NON_TAXABLE_ITEM_CODE, TAXABLE_ITEM_CODE, VatCategory};

/// A purchased item as supplied by the caller.
///
/// `price` is VAT inclusive. `tax_code` is 1 for taxable and 3 for non-taxable
/// supplies; codes 2, 4 and 5 select the remaining VAT categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub description: String,
    pub tax_code: i64,
    pub quantity: Decimal,
    pub price: Decimal,
    #[serde(default)]
    pub discount: Decimal,
}

impl Item {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        tax_code: i64,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            tax_code,
            quantity,
            price,
            discount: Decimal::ZERO,
        }
    }

    /// Item under the standard 18% category.
    pub fn taxable(
        id: impl Into<String>,
        description: impl Into<String>,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        Self::new(id, description, TAXABLE_ITEM_CODE, quantity, price)
    }

    /// Item that carries no VAT.
    pub fn non_taxable(
        id: impl Into<String>,
        description: impl Into<String>,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        Self::new(id, description, NON_TAXABLE_ITEM_CODE, quantity, price)
    }

    pub fn with_discount(mut self, discount: Decimal) -> Self {
        self.discount = discount;
        self
    }

    /// `price × quantity`, unrounded.
    pub fn amount(&self) -> Decimal {
        self.price * self.quantity
    }

    pub fn category(&self) -> VatCategory {
        VatCategory::from_code(self.tax_code)
    }
}

/// Mode of payment (`PMTTYPE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentType {
    Cash,
    Cheque,
    #[serde(rename = "CCARD")]
    CreditCard,
    #[serde(rename = "EMONEY")]
    EMoney,
    /// Invoice issued, payment not yet received.
    Invoice,
}

impl PaymentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "CASH",
            Self::Cheque => "CHEQUE",
            Self::CreditCard => "CCARD",
            Self::EMoney => "EMONEY",
            Self::Invoice => "INVOICE",
        }
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CASH" => Ok(Self::Cash),
            "CHEQUE" => Ok(Self::Cheque),
            "CCARD" => Ok(Self::CreditCard),
            "EMONEY" => Ok(Self::EMoney),
            "INVOICE" => Ok(Self::Invoice),
            other => Err(format!("unknown payment type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub payment_type: PaymentType,
    pub amount: Decimal,
}

impl Payment {
    pub fn new(payment_type: PaymentType, amount: Decimal) -> Self {
        Self {
            payment_type,
            amount,
        }
    }

    pub fn cash(amount: Decimal) -> Self {
        Self::new(PaymentType::Cash, amount)
    }
}

/// Kind of customer identification (`CUSTIDTYPE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CustomerIdType {
    TaxIdNumber,
    DrivingLicense,
    VoterId,
    Passport,
    NationalId,
    #[default]
    None,
    MeterNumber,
}

impl CustomerIdType {
    pub fn code(self) -> u8 {
        match self {
            Self::TaxIdNumber => 1,
            Self::DrivingLicense => 2,
            Self::VoterId => 3,
            Self::Passport => 4,
            Self::NationalId => 5,
            Self::None => 6,
            Self::MeterNumber => 7,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::TaxIdNumber),
            2 => Some(Self::DrivingLicense),
            3 => Some(Self::VoterId),
            4 => Some(Self::Passport),
            5 => Some(Self::NationalId),
            6 => Some(Self::None),
            7 => Some(Self::MeterNumber),
            _ => None,
        }
    }
}

/// Buyer details printed on the receipt. All fields may be empty for walk-in customers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id_type: CustomerIdType,
    pub id: String,
    pub name: String,
    pub mobile: String,
}

impl Customer {
    pub fn new(id_type: CustomerIdType, id: impl Into<String>) -> Self {
        Self {
            id_type,
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn mobile(mut self, mobile: impl Into<String>) -> Self {
        self.mobile = mobile.into();
        self
    }
}

/// Header fields of a receipt, supplied verbatim by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptParams {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub tin: String,
    /// `REGID` assigned at registration.
    pub registration_id: String,
    pub efd_serial: String,
    /// `RCTNUM`, equal to the global counter.
    pub receipt_number: u64,
    /// `DC`, resets to 1 every day.
    pub daily_counter: u64,
    /// `GC`, increments over the life of the VFD.
    pub global_counter: u64,
    /// `ZNUM` override. Defaults to the receipt date as `YYYYMMDD`.
    #[serde(default)]
    pub z_number: Option<String>,
    /// `RCTVNUM`, see [`receipt_verification_code`].
    pub verification_code: String,
}

impl ReceiptParams {
    pub fn z_number(&self) -> String {
        self.z_number
            .clone()
            .unwrap_or_else(|| self.date.format("%Y%m%d").to_string())
    }
}

/// `RCTVNUM`: the receipt code from the registration ack followed by the global counter.
pub fn receipt_verification_code(receipt_code: &str, global_counter: u64) -> String {
    format!("{receipt_code}{global_counter}")
}

/// Header fields of a Z report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportParams {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub vrn: String,
    pub tin: String,
    pub tax_office: String,
    pub registration_id: String,
    pub z_number: String,
    pub efd_serial: String,
    pub registration_date: NaiveDate,
}

/// Business address printed in the Z report header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub name: String,
    pub street: String,
    pub mobile: String,
    pub city: String,
    pub country: String,
}

impl Address {
    /// The four `HEADER/LINE` values.
    pub fn lines(&self) -> [String; 4] {
        [
            self.name.to_uppercase(),
            self.street.to_uppercase(),
            format!("MOBILE: {}", self.mobile),
            format!("{},{}", self.city, self.country).to_uppercase(),
        ]
    }
}

/// Daily counters of a Z report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTotals {
    pub daily_total_amount: Decimal,
    pub gross: Decimal,
    pub corrections: Decimal,
    pub discounts: Decimal,
    pub surcharges: Decimal,
    pub tickets_void: u64,
    pub tickets_void_total: Decimal,
    pub tickets_fiscal: u64,
    pub tickets_non_fiscal: u64,
}

/// Registration request (`REGDATA`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub tin: String,
    /// Certificate key issued by the authority, e.g. `10TZ100625`.
    pub cert_key: String,
}

impl Registration {
    pub fn new(tin: impl Into<String>, cert_key: impl Into<String>) -> Self {
        Self {
            tin: tin.into(),
            cert_key: cert_key.into(),
        }
    }
}

/// An item as it appears in the document, with its tax portion attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedItem {
    pub id: String,
    pub description: String,
    pub quantity: Decimal,
    pub tax_code: i64,
    pub category: VatCategory,
    /// `AMT`: price × quantity, VAT inclusive.
    pub amount: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
}

/// Net and tax amounts accumulated for one VAT category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatAggregate {
    pub category: VatCategory,
    pub net_amount: Decimal,
    pub tax_amount: Decimal,
}

impl VatAggregate {
    pub fn new(category: VatCategory) -> Self {
        Self {
            category,
            net_amount: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
        }
    }

    pub fn with_amounts(category: VatCategory, net_amount: Decimal, tax_amount: Decimal) -> Self {
        Self {
            category,
            net_amount,
            tax_amount,
        }
    }

    pub fn add(&mut self, net: Decimal, tax: Decimal) {
        self.net_amount += net;
        self.tax_amount += tax;
    }
}

/// Document-level totals. Always derived from the items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub tax_exclusive: Decimal,
    pub tax_inclusive: Decimal,
    pub discount: Decimal,
}

/// A sales receipt (`RCT`) ready for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub params: ReceiptParams,
    pub customer: Customer,
    pub items: Vec<ProcessedItem>,
    pub totals: Totals,
    pub payments: Vec<Payment>,
    /// Sorted by category id.
    pub vat_totals: Vec<VatAggregate>,
}

/// An end-of-day report (`ZREPORT`) ready for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZReport {
    pub params: ReportParams,
    pub header_lines: [String; 4],
    pub totals: ReportTotals,
    /// Sorted by category id.
    pub vat_totals: Vec<VatAggregate>,
    pub payments: Vec<Payment>,
}

/// Any document that can be signed and submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Document {
    Registration(Registration),
    Receipt(Receipt),
    Report(ZReport),
}

impl Document {
    pub fn kind(&self) -> DocumentKind {
        match self {
            Self::Registration(_) => DocumentKind::Registration,
            Self::Receipt(_) => DocumentKind::Receipt,
            Self::Report(_) => DocumentKind::Report,
        }
    }
}

impl From<Registration> for Document {
    fn from(doc: Registration) -> Self {
        Self::Registration(doc)
    }
}

impl From<Receipt> for Document {
    fn from(doc: Receipt) -> Self {
        Self::Receipt(doc)
    }
}

impl From<ZReport> for Document {
    fn from(doc: ZReport) -> Self {
        Self::Report(doc)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    Registration,
    Receipt,
    Report,
}

impl DocumentKind {
    /// Root element of the signed body.
    pub fn root_element(self) -> &'static str {
        match self {
            Self::Registration => "REGDATA",
            Self::Receipt => "RCT",
            Self::Report => "ZREPORT",
        }
    }

    /// Element carrying the acknowledgement inside the response envelope.
    pub fn ack_element(self) -> &'static str {
        match self {
            Self::Registration => "EFDMSRESP",
            Self::Receipt => "RCTACK",
            Self::Report => "ZACK",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Registration => "registration",
            Self::Receipt => "receipt",
            Self::Report => "report",
        })
    }
}
