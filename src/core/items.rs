use std::collections::HashMap;

use rust_decimal::Decimal;

use super::types::{Item, ProcessedItem, Totals, VatAggregate};
use super::vat::VatCategory;

/// Outcome of [`process_items`]. Amounts are not rounded yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemProcessResult {
    pub items: Vec<ProcessedItem>,
    pub vat_totals: HashMap<VatCategory, VatAggregate>,
    pub totals: Totals,
}

impl ItemProcessResult {
    /// VAT aggregates ordered by category id (A before B ...).
    pub fn sorted_vat_totals(&self) -> Vec<VatAggregate> {
        sorted_vat_totals(&self.vat_totals)
    }

    /// Sum of the tax portions of all items.
    pub fn total_tax(&self) -> Decimal {
        self.vat_totals.values().map(|v| v.tax_amount).sum()
    }
}

/// Compute per-item amounts, per-category VAT aggregates and document totals.
///
/// Items keep their input order. Items with a zero quantity or price are listed
/// with a zero amount. The tax-exclusive total is derived once at the end as
/// `tax_inclusive − Σ tax`.
///
/// # Panics
///
/// Panics if an amount overflows `Decimal`. The builders run
/// [`validate_items`](super::validation::validate_items) first, which keeps every
/// amount within [`MAX_AMOUNT`](super::validation::MAX_AMOUNT).
pub fn process_items(items: &[Item]) -> ItemProcessResult {
    let mut processed = Vec::with_capacity(items.len());
    let mut vat_totals: HashMap<VatCategory, VatAggregate> = HashMap::new();
    let mut tax_inclusive = Decimal::ZERO;
    let mut discount = Decimal::ZERO;
    let mut total_tax = Decimal::ZERO;

    for item in items {
        let amount = item.amount();
        let category = item.category();
        let (net, tax) = category.net_and_tax(amount);

        vat_totals
            .entry(category)
            .or_insert_with(|| VatAggregate::new(category))
            .add(net, tax);

        tax_inclusive += amount;
        discount += item.discount;
        total_tax += tax;

        processed.push(ProcessedItem {
            id: item.id.clone(),
            description: item.description.clone(),
            quantity: item.quantity,
            tax_code: item.tax_code,
            category,
            amount,
            tax,
            discount: item.discount,
        });
    }

    ItemProcessResult {
        items: processed,
        vat_totals,
        totals: Totals {
            tax_exclusive: tax_inclusive - total_tax,
            tax_inclusive,
            discount,
        },
    }
}

/// Order aggregates by category id so output never depends on map iteration.
pub fn sorted_vat_totals(map: &HashMap<VatCategory, VatAggregate>) -> Vec<VatAggregate> {
    let mut rows: Vec<VatAggregate> = map.values().copied().collect();
    rows.sort_by_key(|row| row.category);
    rows
}
