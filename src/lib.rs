//! # efdms
//!
//! Fiscal documents for the Tanzania Revenue Authority's Virtual Fiscal Device
//! (VFD) web API: device registration, access tokens, sales receipts and
//! end-of-day Z reports.
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//! Amounts are rounded half away from zero to 2 decimals exactly once, when a
//! document is built.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{NaiveDate, NaiveTime};
//! use efdms::core::*;
//! use rust_decimal_macros::dec;
//!
//! let params = ReceiptParams {
//!     date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
//!     time: NaiveTime::from_hms_opt(10, 15, 0).unwrap(),
//!     tin: "100100100".into(),
//!     registration_id: "TZ0100553".into(),
//!     efd_serial: "10TZ100625".into(),
//!     receipt_number: 380,
//!     daily_counter: 1,
//!     global_counter: 380,
//!     z_number: None,
//!     verification_code: receipt_verification_code("MFT7AB", 380),
//! };
//!
//! let receipt = ReceiptBuilder::new(params)
//!     .add_item(Item::taxable("1", "Soap", dec!(5), dec!(1000)))
//!     .add_payment(Payment::cash(dec!(5000)))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(receipt.totals.tax_inclusive, dec!(5000.00));
//! assert_eq!(receipt.vat_totals[0].tax_amount, dec!(762.71));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Document types, VAT table, aggregation, validation |
//! | `envelope` (default) | Canonical XML, RSA-SHA1 signing, acknowledgement parsing |
//! | `client` (default) | Async client with a `reqwest` transport |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "envelope")]
pub mod envelope;

#[cfg(feature = "client")]
pub mod client;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
