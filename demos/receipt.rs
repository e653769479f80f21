use chrono::{NaiveDate, NaiveTime};
use efdms::client::{Environment, receipt_link};
use efdms::core::*;
use efdms::envelope::{SigningCredentials, seal};
use rust_decimal_macros::dec;

fn main() {
    let params = ReceiptParams {
        date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        time: NaiveTime::from_hms_opt(10, 15, 0).unwrap(),
        tin: "100100100".into(),
        registration_id: "TZ0100553".into(),
        efd_serial: "10TZ100625".into(),
        receipt_number: 380,
        daily_counter: 1,
        global_counter: 380,
        z_number: None,
        verification_code: receipt_verification_code("MFT7AB", 380),
    };

    let receipt = ReceiptBuilder::new(params)
        .customer(Customer::new(CustomerIdType::TaxIdNumber, "111222333").name("Juma Hamisi"))
        .add_item(Item::taxable("1", "Soap", dec!(5), dec!(1000)))
        .add_item(Item::non_taxable("2", "Maize flour", dec!(3), dec!(3000)))
        .add_payment(Payment::cash(dec!(10000)))
        .add_payment(Payment::new(PaymentType::EMoney, dec!(4000)))
        .build()
        .expect("receipt should be valid");

    println!("Receipt {}", receipt.params.receipt_number);
    for item in &receipt.items {
        println!(
            "  {:<12} {:>4} x  {:>10}  [{}]",
            item.description, item.quantity, item.amount, item.category
        );
    }
    println!("  Tax exclusive: {}", receipt.totals.tax_exclusive);
    println!("  Tax inclusive: {}", receipt.totals.tax_inclusive);
    for row in &receipt.vat_totals {
        println!(
            "  VAT {} ({}%): net {} tax {}",
            row.category,
            row.category.rate(),
            row.net_amount,
            row.tax_amount
        );
    }

    let link = receipt_link(
        Environment::Staging,
        &receipt.params.verification_code,
        receipt.params.time,
    );
    println!("  Verify: {link}");

    let credentials = SigningCredentials::from_pem(
        include_str!("../tests/fixtures/vfd_key.pem"),
        include_str!("../tests/fixtures/vfd_cert.pem"),
    )
    .expect("fixture credentials load");
    let envelope = seal(&receipt, &credentials).expect("receipt signs");

    println!("\n=== Signed envelope ({} bytes) ===\n", envelope.to_bytes().len());
    println!("{}", String::from_utf8_lossy(&envelope.to_bytes()));
}
