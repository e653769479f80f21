use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::error::ValidationError;
use super::types::*;

/// Largest amount accepted for a line, a payment or a document total (10^15).
///
/// Inputs above it are rejected by validation, so aggregation never overflows `Decimal`.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

/// Round a monetary value half away from zero and fix it at two decimals.
///
/// `5000` becomes `5000.00`, `762.711` becomes `762.71`, `0.005` becomes `0.01`.
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Validate receipt header fields.
/// Returns all validation errors found (not just the first).
pub fn validate_receipt_params(params: &ReceiptParams) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    validate_tin(&params.tin, "params.tin", &mut errors);
    require(&params.registration_id, "params.registration_id", &mut errors);
    require(&params.efd_serial, "params.efd_serial", &mut errors);
    require(
        &params.verification_code,
        "params.verification_code",
        &mut errors,
    );

    if params.receipt_number == 0 {
        errors.push(ValidationError::new(
            "params.receipt_number",
            "must be at least 1",
        ));
    }
    if params.daily_counter == 0 {
        errors.push(ValidationError::new(
            "params.daily_counter",
            "must be at least 1",
        ));
    }
    if params.global_counter == 0 {
        errors.push(ValidationError::new(
            "params.global_counter",
            "must be at least 1",
        ));
    }
    if let Some(z) = &params.z_number {
        if z.trim().is_empty() {
            errors.push(ValidationError::new(
                "params.z_number",
                "must not be empty when set",
            ));
        }
    }

    errors
}

/// Validate Z report header fields.
pub fn validate_report_params(params: &ReportParams) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    validate_tin(&params.tin, "params.tin", &mut errors);
    require(&params.registration_id, "params.registration_id", &mut errors);
    require(&params.efd_serial, "params.efd_serial", &mut errors);
    require(&params.z_number, "params.z_number", &mut errors);

    if params.registration_date > params.date {
        errors.push(ValidationError::new(
            "params.registration_date",
            "must not be after the report date",
        ));
    }

    errors
}

/// Validate Z report counters and amounts.
pub fn validate_report_totals(totals: &ReportTotals) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let amounts = [
        ("totals.daily_total_amount", totals.daily_total_amount),
        ("totals.gross", totals.gross),
        ("totals.corrections", totals.corrections),
        ("totals.discounts", totals.discounts),
        ("totals.surcharges", totals.surcharges),
        ("totals.tickets_void_total", totals.tickets_void_total),
    ];
    for (field, value) in amounts {
        non_negative(value, field, &mut errors);
        within_limit(value, field, &mut errors);
    }
    errors
}

/// Validate caller-supplied Z report VAT rows.
pub fn validate_vat_rows(rows: &[VatAggregate]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut net = Decimal::ZERO;
    let mut tax = Decimal::ZERO;
    for (i, row) in rows.iter().enumerate() {
        within_limit(row.net_amount, &format!("vat_totals[{i}].net_amount"), &mut errors);
        within_limit(row.tax_amount, &format!("vat_totals[{i}].tax_amount"), &mut errors);
        if row.net_amount.abs() <= MAX_AMOUNT && row.tax_amount.abs() <= MAX_AMOUNT {
            net += row.net_amount.abs();
            tax += row.tax_amount.abs();
        }
    }
    if net > MAX_AMOUNT || tax > MAX_AMOUNT {
        errors.push(ValidationError::new(
            "vat_totals",
            format!("combined rows exceed {MAX_AMOUNT}"),
        ));
    }
    errors
}

/// Validate a registration request.
pub fn validate_registration(registration: &Registration) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    validate_tin(&registration.tin, "tin", &mut errors);
    require(&registration.cert_key, "cert_key", &mut errors);
    errors
}

/// Validate line items. An empty list is valid.
///
/// Line amounts, discounts and their document sums must stay within [`MAX_AMOUNT`].
pub fn validate_items(items: &[Item]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut total = Decimal::ZERO;
    let mut discount = Decimal::ZERO;

    for (i, item) in items.iter().enumerate() {
        let prefix = format!("items[{i}]");
        require(&item.id, &format!("{prefix}.id"), &mut errors);
        require(
            &item.description,
            &format!("{prefix}.description"),
            &mut errors,
        );
        non_negative(item.quantity, &format!("{prefix}.quantity"), &mut errors);
        non_negative(item.price, &format!("{prefix}.price"), &mut errors);
        non_negative(item.discount, &format!("{prefix}.discount"), &mut errors);
        within_limit(item.discount, &format!("{prefix}.discount"), &mut errors);

        match item.quantity.checked_mul(item.price) {
            Some(amount) if amount.abs() <= MAX_AMOUNT => total += amount.abs(),
            _ => errors.push(ValidationError::new(
                format!("{prefix}.price"),
                format!(
                    "amount {} x {} exceeds {MAX_AMOUNT}",
                    item.quantity, item.price
                ),
            )),
        }
        if item.discount.abs() <= MAX_AMOUNT {
            discount += item.discount.abs();
        }
    }

    if total > MAX_AMOUNT {
        errors.push(ValidationError::new(
            "items",
            format!("document total {total} exceeds {MAX_AMOUNT}"),
        ));
    }
    if discount > MAX_AMOUNT {
        errors.push(ValidationError::new(
            "items",
            format!("total discount {discount} exceeds {MAX_AMOUNT}"),
        ));
    }

    errors
}

/// Validate payments. Amounts must not be negative.
pub fn validate_payments(payments: &[Payment]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for (i, payment) in payments.iter().enumerate() {
        non_negative(payment.amount, &format!("payments[{i}].amount"), &mut errors);
        within_limit(payment.amount, &format!("payments[{i}].amount"), &mut errors);
    }
    errors
}

/// Check the arithmetic of a built receipt.
///
/// - `tax_inclusive` equals the sum of item amounts, up to half a cent per
///   rounded line plus half a cent for the total itself. With whole-cent
///   amounts this is an exact match.
/// - `tax_exclusive + Σ vat tax` equals `tax_inclusive` within 0.01.
/// - every monetary field carries exactly two decimals.
pub fn check_totals(receipt: &Receipt) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let item_sum: Decimal = receipt.items.iter().map(|i| i.amount).sum();
    let line_slack = dec!(0.005) * Decimal::from(receipt.items.len() + 1);
    if (receipt.totals.tax_inclusive - item_sum).abs() > line_slack {
        errors.push(ValidationError::new(
            "totals.tax_inclusive",
            format!(
                "{} does not match sum of item amounts {}",
                receipt.totals.tax_inclusive, item_sum
            ),
        ));
    }

    let tax_sum: Decimal = receipt.vat_totals.iter().map(|v| v.tax_amount).sum();
    let diff = (receipt.totals.tax_exclusive + tax_sum - receipt.totals.tax_inclusive).abs();
    if diff > dec!(0.01) {
        errors.push(ValidationError::new(
            "totals.tax_exclusive",
            format!(
                "tax exclusive {} plus VAT {} differs from tax inclusive {} by {}",
                receipt.totals.tax_exclusive, tax_sum, receipt.totals.tax_inclusive, diff
            ),
        ));
    }

    let mut money = vec![
        ("totals.tax_exclusive".to_string(), receipt.totals.tax_exclusive),
        ("totals.tax_inclusive".to_string(), receipt.totals.tax_inclusive),
        ("totals.discount".to_string(), receipt.totals.discount),
    ];
    for (i, v) in receipt.vat_totals.iter().enumerate() {
        money.push((format!("vat_totals[{i}].net_amount"), v.net_amount));
        money.push((format!("vat_totals[{i}].tax_amount"), v.tax_amount));
    }
    for (i, p) in receipt.payments.iter().enumerate() {
        money.push((format!("payments[{i}].amount"), p.amount));
    }
    for (field, value) in money {
        if value.scale() != 2 {
            errors.push(ValidationError::new(
                field,
                format!("{value} is not rounded to 2 decimal places"),
            ));
        }
    }

    errors
}

fn require(value: &str, field: &str, errors: &mut Vec<ValidationError>) {
    if value.trim().is_empty() {
        errors.push(ValidationError::new(field, "must not be empty"));
    }
}

fn non_negative(value: Decimal, field: &str, errors: &mut Vec<ValidationError>) {
    if value.is_sign_negative() && !value.is_zero() {
        errors.push(ValidationError::new(
            field,
            format!("must not be negative, got {value}"),
        ));
    }
}

fn within_limit(value: Decimal, field: &str, errors: &mut Vec<ValidationError>) {
    if value.abs() > MAX_AMOUNT {
        errors.push(ValidationError::new(
            field,
            format!("{value} exceeds {MAX_AMOUNT}"),
        ));
    }
}

fn validate_tin(tin: &str, field: &str, errors: &mut Vec<ValidationError>) {
    if tin.trim().is_empty() {
        errors.push(ValidationError::new(field, "must not be empty"));
    } else if !tin.chars().all(|c| c.is_ascii_digit()) {
        errors.push(ValidationError::new(
            field,
            format!("TIN '{tin}' must contain digits only"),
        ));
    }
}
