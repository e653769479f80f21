//! Property-based tests for aggregation and rounding.
//!
//! Run with: `cargo test --test proptest_tests`

use chrono::{NaiveDate, NaiveTime};
use efdms::core::*;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn params() -> ReceiptParams {
    ReceiptParams {
        date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        tin: "100100100".into(),
        registration_id: "TZ0100553".into(),
        efd_serial: "10TZ100625".into(),
        receipt_number: 1,
        daily_counter: 1,
        global_counter: 1,
        z_number: None,
        verification_code: "MFT7AB1".into(),
    }
}

/// Integer quantity, price in whole cents, one of the five tax codes.
fn item_strategy() -> impl Strategy<Value = Item> {
    (1u32..=100, 0i64..=10_000_000, 1i64..=5).prop_map(|(qty, cents, code)| {
        Item::new(
            "1",
            "Item",
            code,
            Decimal::from(qty),
            Decimal::new(cents, 2),
        )
    })
}

/// Quantity with three decimals (0.001 to 100.000), e.g. weighed goods.
fn fractional_item_strategy() -> impl Strategy<Value = Item> {
    (1i64..=100_000, 0i64..=1_000_000, 1i64..=5).prop_map(|(milli, cents, code)| {
        Item::new(
            "1",
            "Item",
            code,
            Decimal::new(milli, 3),
            Decimal::new(cents, 2),
        )
    })
}

fn build(items: Vec<Item>) -> Receipt {
    ReceiptBuilder::new(params()).items(items).build().unwrap()
}

proptest! {
    #[test]
    fn tax_inclusive_is_exact_sum(items in prop::collection::vec(item_strategy(), 0..20)) {
        let expected: Decimal = items.iter().map(|i| i.price * i.quantity).sum();
        let receipt = build(items);
        prop_assert_eq!(receipt.totals.tax_inclusive, expected);
    }

    #[test]
    fn exclusive_plus_tax_within_one_cent(items in prop::collection::vec(item_strategy(), 0..20)) {
        let receipt = build(items);
        let tax: Decimal = receipt.vat_totals.iter().map(|v| v.tax_amount).sum();
        let diff = (receipt.totals.tax_exclusive + tax - receipt.totals.tax_inclusive).abs();
        prop_assert!(diff <= dec!(0.01), "diff {} too large", diff);
        prop_assert!(check_totals(&receipt).is_empty());
    }

    #[test]
    fn fractional_tax_inclusive_is_rounded_sum(
        items in prop::collection::vec(fractional_item_strategy(), 0..20),
    ) {
        let exact: Decimal = items.iter().map(|i| i.price * i.quantity).sum();
        let receipt = build(items);
        prop_assert_eq!(receipt.totals.tax_inclusive, round_money(exact));
        prop_assert_eq!(receipt.totals.tax_inclusive.scale(), 2);
    }

    #[test]
    fn fractional_exclusive_plus_tax_within_one_cent(
        items in prop::collection::vec(fractional_item_strategy(), 0..20),
    ) {
        let receipt = build(items);
        let tax: Decimal = receipt.vat_totals.iter().map(|v| v.tax_amount).sum();
        let diff = (receipt.totals.tax_exclusive + tax - receipt.totals.tax_inclusive).abs();
        prop_assert!(diff <= dec!(0.01), "diff {} too large", diff);
        prop_assert!(check_totals(&receipt).is_empty());
    }

    #[test]
    fn aggregation_ignores_item_order(
        items in prop::collection::vec(item_strategy(), 1..12),
        seed in any::<u64>(),
    ) {
        let mut shuffled = items.clone();
        // deterministic Fisher-Yates driven by the seed
        let mut state = seed;
        for i in (1..shuffled.len()).rev() {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let j = (state >> 33) as usize % (i + 1);
            shuffled.swap(i, j);
        }

        let a = build(items);
        let b = build(shuffled);
        prop_assert_eq!(a.vat_totals, b.vat_totals);
        prop_assert_eq!(a.totals, b.totals);
    }

    #[test]
    fn monetary_fields_have_two_decimals(items in prop::collection::vec(item_strategy(), 0..10)) {
        let receipt = build(items);
        prop_assert_eq!(receipt.totals.tax_inclusive.scale(), 2);
        prop_assert_eq!(receipt.totals.tax_exclusive.scale(), 2);
        for row in &receipt.vat_totals {
            prop_assert_eq!(row.net_amount.scale(), 2);
            prop_assert_eq!(row.tax_amount.scale(), 2);
        }
    }

    #[test]
    fn unknown_codes_use_standard_rate(code in 6i64..1000, cents in 1i64..1_000_000) {
        let amount = Decimal::new(cents, 2);
        prop_assert_eq!(
            VatCategory::from_code(code).net_and_tax(amount),
            VatCategory::Standard.net_and_tax(amount)
        );
    }
}
