use chrono::{NaiveDate, NaiveTime};
use efdms::core::*;
use efdms::envelope::to_canonical_bytes;
use rust_decimal_macros::dec;

fn main() {
    let params = ReportParams {
        date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        time: NaiveTime::from_hms_opt(23, 59, 0).unwrap(),
        vrn: "NOT REGISTERED".into(),
        tin: "100100100".into(),
        tax_office: "Ilala".into(),
        registration_id: "TZ0100553".into(),
        z_number: "20240301".into(),
        efd_serial: "10TZ100625".into(),
        registration_date: NaiveDate::from_ymd_opt(2023, 11, 20).unwrap(),
    };
    let address = Address {
        name: "Duka la Mama".into(),
        street: "Samora Avenue".into(),
        mobile: "0713000000".into(),
        city: "Dar es Salaam".into(),
        country: "Tanzania".into(),
    };

    // Day's sales already aggregated by the point of sale, plus one late item.
    let report = ZReportBuilder::new(params, address)
        .totals(ReportTotals {
            daily_total_amount: dec!(14000),
            gross: dec!(2350000),
            tickets_fiscal: 2,
            ..ReportTotals::default()
        })
        .add_vat_total(VatAggregate::with_amounts(
            VatCategory::Standard,
            dec!(4237.29),
            dec!(762.71),
        ))
        .add_item(Item::non_taxable("2", "Maize flour", dec!(3), dec!(3000)))
        .add_payment(Payment::cash(dec!(14000)))
        .build()
        .expect("report should be valid");

    for category in VatCategory::ALL {
        let (net, tax) = report_vat_for(&report, category);
        println!("  {:<8} net {:>10} tax {:>8}", category.report_rate(), net, tax);
    }

    let body = to_canonical_bytes(&report).expect("report serializes");
    println!("\n{}", String::from_utf8_lossy(&body));
}
