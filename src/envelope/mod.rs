//! Canonical XML, RSA-SHA1 signing and acknowledgement parsing.
//!
//! ```no_run
//! use efdms::core::*;
//! use efdms::envelope::*;
//!
//! # fn run(credentials: SigningCredentials) -> Result<(), VfdError> {
//! let registration = Registration::new("100100100", "10TZ100625");
//! let envelope = seal(&registration, &credentials)?;
//! let bytes = envelope.to_bytes();
//! # let _ = bytes;
//! # Ok(())
//! # }
//! ```

mod ack;
mod canonical;
mod sign;
pub mod xml_utils;

pub use ack::*;
pub use canonical::*;
pub use sign::*;
