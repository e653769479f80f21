use rust_decimal::Decimal;

use super::error::VfdError;
use super::items::{process_items, sorted_vat_totals};
use super::types::*;
use super::validation::{self, round_money};
use super::vat::VatCategory;

/// Builder for sales receipts.
///
/// ```
/// use chrono::{NaiveDate, NaiveTime};
/// use efdms::core::*;
/// use rust_decimal_macros::dec;
///
/// let params = ReceiptParams {
///     date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
///     time: NaiveTime::from_hms_opt(10, 15, 0).unwrap(),
///     tin: "100100100".into(),
///     registration_id: "TZ0100553".into(),
///     efd_serial: "10TZ100625".into(),
///     receipt_number: 12,
///     daily_counter: 3,
///     global_counter: 12,
///     z_number: None,
///     verification_code: receipt_verification_code("A1B2C3", 12),
/// };
/// let receipt = ReceiptBuilder::new(params)
///     .add_item(Item::taxable("1", "Soap", dec!(5), dec!(1000)))
///     .add_payment(Payment::cash(dec!(5000)))
///     .build()
///     .unwrap();
/// assert_eq!(receipt.totals.tax_exclusive, dec!(4237.29));
/// ```
pub struct ReceiptBuilder {
    params: ReceiptParams,
    customer: Customer,
    items: Vec<Item>,
    payments: Vec<Payment>,
}

impl ReceiptBuilder {
    pub fn new(params: ReceiptParams) -> Self {
        Self {
            params,
            customer: Customer::default(),
            items: Vec::new(),
            payments: Vec::new(),
        }
    }

    pub fn customer(mut self, customer: Customer) -> Self {
        self.customer = customer;
        self
    }

    pub fn add_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    pub fn items(mut self, items: impl IntoIterator<Item = Item>) -> Self {
        self.items.extend(items);
        self
    }

    pub fn add_payment(mut self, payment: Payment) -> Self {
        self.payments.push(payment);
        self
    }

    pub fn payments(mut self, payments: impl IntoIterator<Item = Payment>) -> Self {
        self.payments.extend(payments);
        self
    }

    /// Validate the input, aggregate the items and round every monetary field once.
    /// Returns all validation errors (not just the first).
    pub fn build(self) -> Result<Receipt, VfdError> {
        let mut errors = validation::validate_receipt_params(&self.params);
        errors.extend(validation::validate_items(&self.items));
        errors.extend(validation::validate_payments(&self.payments));
        if !errors.is_empty() {
            return Err(VfdError::Validation(errors));
        }

        let result = process_items(&self.items);
        let vat_totals = result.sorted_vat_totals();

        Ok(Receipt {
            params: self.params,
            customer: self.customer,
            items: result.items.into_iter().map(round_item).collect(),
            totals: round_totals(result.totals),
            payments: self.payments.into_iter().map(round_payment).collect(),
            vat_totals: vat_totals.into_iter().map(round_vat).collect(),
        })
    }
}

/// Builder for end-of-day Z reports.
///
/// VAT rows come from items added with [`ZReportBuilder::add_item`], from
/// pre-aggregated rows added with [`ZReportBuilder::add_vat_total`], or both.
/// Rows for the same category are merged.
pub struct ZReportBuilder {
    params: ReportParams,
    address: Address,
    totals: ReportTotals,
    items: Vec<Item>,
    vat_rows: Vec<VatAggregate>,
    payments: Vec<Payment>,
}

impl ZReportBuilder {
    pub fn new(params: ReportParams, address: Address) -> Self {
        Self {
            params,
            address,
            totals: ReportTotals::default(),
            items: Vec::new(),
            vat_rows: Vec::new(),
            payments: Vec::new(),
        }
    }

    pub fn totals(mut self, totals: ReportTotals) -> Self {
        self.totals = totals;
        self
    }

    pub fn add_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    pub fn items(mut self, items: impl IntoIterator<Item = Item>) -> Self {
        self.items.extend(items);
        self
    }

    pub fn add_vat_total(mut self, row: VatAggregate) -> Self {
        self.vat_rows.push(row);
        self
    }

    pub fn add_payment(mut self, payment: Payment) -> Self {
        self.payments.push(payment);
        self
    }

    pub fn payments(mut self, payments: impl IntoIterator<Item = Payment>) -> Self {
        self.payments.extend(payments);
        self
    }

    pub fn build(self) -> Result<ZReport, VfdError> {
        let mut errors = validation::validate_report_params(&self.params);
        errors.extend(validation::validate_report_totals(&self.totals));
        errors.extend(validation::validate_items(&self.items));
        errors.extend(validation::validate_vat_rows(&self.vat_rows));
        errors.extend(validation::validate_payments(&self.payments));
        if !errors.is_empty() {
            return Err(VfdError::Validation(errors));
        }

        let mut merged = process_items(&self.items).vat_totals;
        for row in self.vat_rows {
            merged
                .entry(row.category)
                .or_insert_with(|| VatAggregate::new(row.category))
                .add(row.net_amount, row.tax_amount);
        }

        Ok(ZReport {
            header_lines: self.address.lines(),
            params: self.params,
            totals: round_report_totals(self.totals),
            vat_totals: sorted_vat_totals(&merged)
                .into_iter()
                .map(round_vat)
                .collect(),
            payments: self.payments.into_iter().map(round_payment).collect(),
        })
    }
}

/// Header of a document, one variant per document kind.
#[derive(Debug, Clone)]
pub enum DocumentHeader {
    Registration(Registration),
    Receipt {
        params: ReceiptParams,
        customer: Customer,
    },
    Report {
        params: ReportParams,
        address: Address,
        totals: ReportTotals,
        vat_rows: Vec<VatAggregate>,
    },
}

impl DocumentHeader {
    pub fn kind(&self) -> DocumentKind {
        match self {
            Self::Registration(_) => DocumentKind::Registration,
            Self::Receipt { .. } => DocumentKind::Receipt,
            Self::Report { .. } => DocumentKind::Report,
        }
    }
}

/// Assemble any document from its header, items and payments.
///
/// Deterministic: identical input always yields an identical document. Items and
/// payments are ignored for registrations.
pub fn build_document(
    header: DocumentHeader,
    items: &[Item],
    payments: &[Payment],
) -> Result<Document, VfdError> {
    match header {
        DocumentHeader::Registration(registration) => {
            let errors = validation::validate_registration(&registration);
            if !errors.is_empty() {
                return Err(VfdError::Validation(errors));
            }
            Ok(Document::Registration(registration))
        }
        DocumentHeader::Receipt { params, customer } => ReceiptBuilder::new(params)
            .customer(customer)
            .items(items.iter().cloned())
            .payments(payments.iter().cloned())
            .build()
            .map(Document::Receipt),
        DocumentHeader::Report {
            params,
            address,
            totals,
            vat_rows,
        } => {
            let mut builder = ZReportBuilder::new(params, address)
                .totals(totals)
                .items(items.iter().cloned())
                .payments(payments.iter().cloned());
            for row in vat_rows {
                builder = builder.add_vat_total(row);
            }
            builder.build().map(Document::Report)
        }
    }
}

fn round_item(item: ProcessedItem) -> ProcessedItem {
    ProcessedItem {
        amount: round_money(item.amount),
        tax: round_money(item.tax),
        discount: round_money(item.discount),
        quantity: item.quantity.normalize(),
        ..item
    }
}

fn round_totals(totals: Totals) -> Totals {
    Totals {
        tax_exclusive: round_money(totals.tax_exclusive),
        tax_inclusive: round_money(totals.tax_inclusive),
        discount: round_money(totals.discount),
    }
}

fn round_vat(row: VatAggregate) -> VatAggregate {
    VatAggregate::with_amounts(
        row.category,
        round_money(row.net_amount),
        round_money(row.tax_amount),
    )
}

fn round_payment(payment: Payment) -> Payment {
    Payment::new(payment.payment_type, round_money(payment.amount))
}

fn round_report_totals(totals: ReportTotals) -> ReportTotals {
    ReportTotals {
        daily_total_amount: round_money(totals.daily_total_amount),
        gross: round_money(totals.gross),
        corrections: round_money(totals.corrections),
        discounts: round_money(totals.discounts),
        surcharges: round_money(totals.surcharges),
        tickets_void_total: round_money(totals.tickets_void_total),
        ..totals
    }
}

/// Sum of the VAT rows of a report for one category, zero if absent.
pub fn report_vat_for(report: &ZReport, category: VatCategory) -> (Decimal, Decimal) {
    report
        .vat_totals
        .iter()
        .find(|row| row.category == category)
        .map(|row| (row.net_amount, row.tax_amount))
        .unwrap_or((Decimal::ZERO, Decimal::ZERO))
}
