//! Core fiscal document types, VAT rules, aggregation and validation.
//!
//! Everything in this module is pure: no I/O, no clock, no logging.

mod ack_code;
mod builder;
mod error;
mod items;
mod types;
mod validation;
pub mod vat;

pub use ack_code::AckCode;
pub use builder::*;
pub use error::*;
pub use items::*;
pub use types::*;
pub use validation::*;
pub use vat::VatCategory;
