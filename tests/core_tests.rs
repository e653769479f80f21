use chrono::{NaiveDate, NaiveTime};
use efdms::core::vat::rate_for;
use efdms::core::*;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn time(h: u32, m: u32, s: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, s).unwrap()
}

fn receipt_params() -> ReceiptParams {
    ReceiptParams {
        date: date(2024, 3, 1),
        time: time(10, 15, 0),
        tin: "100100100".into(),
        registration_id: "TZ0100553".into(),
        efd_serial: "10TZ100625".into(),
        receipt_number: 380,
        daily_counter: 1,
        global_counter: 380,
        z_number: None,
        verification_code: receipt_verification_code("MFT7AB", 380),
    }
}

fn report_params() -> ReportParams {
    ReportParams {
        date: date(2024, 3, 1),
        time: time(23, 59, 0),
        vrn: "40005334W".into(),
        tin: "100100100".into(),
        tax_office: "Kinondoni".into(),
        registration_id: "TZ0100553".into(),
        z_number: "20240301".into(),
        efd_serial: "10TZ100625".into(),
        registration_date: date(2023, 11, 20),
    }
}

fn address() -> Address {
    Address {
        name: "Duka la Mama".into(),
        street: "Morogoro Road".into(),
        mobile: "0712000000".into(),
        city: "Dar es Salaam".into(),
        country: "Tanzania".into(),
    }
}

// --- Receipts ---

#[test]
fn single_standard_item() {
    let receipt = ReceiptBuilder::new(receipt_params())
        .add_item(Item::taxable("1", "Soap", dec!(5), dec!(1000)))
        .add_payment(Payment::cash(dec!(5000)))
        .build()
        .unwrap();

    assert_eq!(receipt.totals.tax_inclusive, dec!(5000.00));
    assert_eq!(receipt.totals.tax_exclusive, dec!(4237.29));
    assert_eq!(receipt.totals.discount, dec!(0.00));
    assert_eq!(receipt.vat_totals.len(), 1);

    let a = &receipt.vat_totals[0];
    assert_eq!(a.category, VatCategory::Standard);
    assert_eq!(a.net_amount, dec!(4237.29));
    assert_eq!(a.tax_amount, dec!(762.71));
    assert_eq!(receipt.items[0].amount, dec!(5000.00));
    assert!(check_totals(&receipt).is_empty());
}

#[test]
fn single_non_taxable_item() {
    let receipt = ReceiptBuilder::new(receipt_params())
        .add_item(Item::non_taxable("2", "Maize flour", dec!(3), dec!(3000)))
        .add_payment(Payment::cash(dec!(9000)))
        .build()
        .unwrap();

    assert_eq!(receipt.totals.tax_inclusive, dec!(9000.00));
    assert_eq!(receipt.totals.tax_exclusive, dec!(9000.00));
    let tax: rust_decimal::Decimal = receipt.vat_totals.iter().map(|v| v.tax_amount).sum();
    assert_eq!(tax, dec!(0));
    assert_eq!(receipt.vat_totals[0].category, VatCategory::Zero);
    assert_eq!(receipt.vat_totals[0].net_amount, dec!(9000.00));
}

#[test]
fn empty_receipt() {
    let receipt = ReceiptBuilder::new(receipt_params()).build().unwrap();
    assert!(receipt.items.is_empty());
    assert!(receipt.vat_totals.is_empty());
    assert_eq!(receipt.totals.tax_inclusive, dec!(0.00));
    assert_eq!(receipt.totals.tax_exclusive, dec!(0.00));
    assert_eq!(receipt.totals.discount, dec!(0.00));
}

#[test]
fn mixed_categories_sorted_by_id() {
    let receipt = ReceiptBuilder::new(receipt_params())
        .add_item(Item::non_taxable("2", "Rice", dec!(2), dec!(2500)))
        .add_item(Item::new("3", "Fuel", 2, dec!(1), dec!(1100)))
        .add_item(Item::taxable("1", "Soap", dec!(1), dec!(1180)))
        .build()
        .unwrap();

    let ids: Vec<char> = receipt.vat_totals.iter().map(|v| v.category.id()).collect();
    assert_eq!(ids, vec!['A', 'B', 'C']);
    assert_eq!(receipt.vat_totals[0].tax_amount, dec!(180.00));
    assert_eq!(receipt.vat_totals[1].tax_amount, dec!(100.00));
    assert_eq!(receipt.totals.tax_inclusive, dec!(7280.00));
    assert_eq!(receipt.totals.tax_exclusive, dec!(7000.00));
    // items keep input order
    assert_eq!(receipt.items[0].id, "2");
}

#[test]
fn zero_quantity_item_is_listed() {
    let receipt = ReceiptBuilder::new(receipt_params())
        .add_item(Item::taxable("1", "Sample", dec!(0), dec!(1000)))
        .build()
        .unwrap();
    assert_eq!(receipt.items.len(), 1);
    assert_eq!(receipt.items[0].amount, dec!(0.00));
    assert_eq!(receipt.totals.tax_inclusive, dec!(0.00));
}

#[test]
fn discounts_are_summed() {
    let receipt = ReceiptBuilder::new(receipt_params())
        .add_item(Item::taxable("1", "Soap", dec!(1), dec!(1000)).with_discount(dec!(50)))
        .add_item(Item::taxable("2", "Oil", dec!(1), dec!(4000)).with_discount(dec!(12.5)))
        .build()
        .unwrap();
    assert_eq!(receipt.totals.discount, dec!(62.50));
}

#[test]
fn unknown_tax_code_falls_back_to_standard() {
    let receipt = ReceiptBuilder::new(receipt_params())
        .add_item(Item::new("1", "Thing", 42, dec!(1), dec!(118)))
        .build()
        .unwrap();
    assert_eq!(receipt.vat_totals[0].category, VatCategory::Standard);
    assert_eq!(receipt.vat_totals[0].tax_amount, dec!(18.00));
    // the item keeps the code it was given
    assert_eq!(receipt.items[0].tax_code, 42);
}

#[test]
fn z_number_defaults_to_receipt_date() {
    let mut params = receipt_params();
    assert_eq!(params.z_number(), "20240301");
    params.z_number = Some("20240229".into());
    assert_eq!(params.z_number(), "20240229");
}

#[test]
fn verification_code_appends_global_counter() {
    assert_eq!(receipt_verification_code("MFT7AB", 380), "MFT7AB380");
}

// --- Validation ---

#[test]
fn validation_collects_all_errors() {
    let mut params = receipt_params();
    params.tin = "10010A100".into();
    params.registration_id = String::new();
    params.daily_counter = 0;

    let err = ReceiptBuilder::new(params)
        .add_item(Item::taxable("", "Soap", dec!(-1), dec!(1000)))
        .add_payment(Payment::cash(dec!(-5)))
        .build()
        .unwrap_err();

    let fields: Vec<&str> = err
        .validation_errors()
        .iter()
        .map(|e| e.field.as_str())
        .collect();
    assert!(fields.contains(&"params.tin"));
    assert!(fields.contains(&"params.registration_id"));
    assert!(fields.contains(&"params.daily_counter"));
    assert!(fields.contains(&"items[0].id"));
    assert!(fields.contains(&"items[0].quantity"));
    assert!(fields.contains(&"payments[0].amount"));
    assert!(err.to_string().starts_with("validation failed:"));
}

#[test]
fn registration_requires_numeric_tin() {
    let err = build_document(
        DocumentHeader::Registration(Registration::new("", "10TZ100625")),
        &[],
        &[],
    )
    .unwrap_err();
    assert_eq!(err.validation_errors()[0].field, "tin");

    let doc = build_document(
        DocumentHeader::Registration(Registration::new("100100100", "10TZ100625")),
        &[],
        &[],
    )
    .unwrap();
    assert_eq!(doc.kind(), DocumentKind::Registration);
}

// --- Z reports ---

#[test]
fn report_merges_item_and_supplied_vat_rows() {
    let report = ZReportBuilder::new(report_params(), address())
        .totals(ReportTotals {
            daily_total_amount: dec!(6180),
            gross: dec!(1250000),
            tickets_fiscal: 3,
            ..ReportTotals::default()
        })
        .add_item(Item::taxable("1", "Soap", dec!(1), dec!(1180)))
        .add_vat_total(VatAggregate::with_amounts(
            VatCategory::Standard,
            dec!(4237.29),
            dec!(762.71),
        ))
        .add_vat_total(VatAggregate::with_amounts(VatCategory::Exempted, dec!(5), dec!(0)))
        .add_payment(Payment::cash(dec!(6180)))
        .build()
        .unwrap();

    assert_eq!(report.vat_totals.len(), 2);
    assert_eq!(
        report_vat_for(&report, VatCategory::Standard),
        (dec!(5237.29), dec!(942.71))
    );
    assert_eq!(
        report_vat_for(&report, VatCategory::Special),
        (dec!(0), dec!(0))
    );
    assert_eq!(report.totals.gross, dec!(1250000.00));
    assert_eq!(report.totals.tickets_fiscal, 3);
    assert_eq!(report.vat_totals[0].category.report_rate(), "A-18.00");
    assert_eq!(report.vat_totals[1].category.report_rate(), "E-0.00");
}

#[test]
fn report_header_lines_are_upper_cased() {
    let report = ZReportBuilder::new(report_params(), address()).build().unwrap();
    assert_eq!(
        report.header_lines,
        [
            "DUKA LA MAMA".to_string(),
            "MOROGORO ROAD".to_string(),
            "MOBILE: 0712000000".to_string(),
            "DAR ES SALAAM,TANZANIA".to_string(),
        ]
    );
}

#[test]
fn report_rejects_registration_after_report_date() {
    let mut params = report_params();
    params.registration_date = date(2024, 3, 2);
    let err = ZReportBuilder::new(params, address()).build().unwrap_err();
    assert_eq!(
        err.validation_errors()[0].field,
        "params.registration_date"
    );
}

#[test]
fn build_document_is_deterministic() {
    let header = DocumentHeader::Receipt {
        params: receipt_params(),
        customer: Customer::new(CustomerIdType::TaxIdNumber, "111222333").name("Juma"),
    };
    let items = [
        Item::taxable("1", "Soap", dec!(3), dec!(999.99)),
        Item::new("2", "Bread", 2, dec!(2), dec!(1500)),
    ];
    let payments = [Payment::new(PaymentType::EMoney, dec!(5999.97))];

    let a = build_document(header.clone(), &items, &payments).unwrap();
    let b = build_document(header, &items, &payments).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.kind(), DocumentKind::Receipt);
}

// --- Tax table ---

#[test]
fn tax_table_lookups() {
    assert_eq!(rate_for(1), dec!(18));
    assert_eq!(rate_for(2), dec!(10));
    assert_eq!(rate_for(99), dec!(18));
    assert_eq!(VatCategory::try_from_id('D'), Some(VatCategory::SpecialRelief));
    assert_eq!(VatCategory::try_from_id('Z'), None);
}
