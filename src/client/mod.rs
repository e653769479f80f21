//! Async client for the VFD web API.
//!
//! Each call seals the document, posts it with the headers the service
//! expects and interprets the acknowledgement.
//!
//! ```no_run
//! use efdms::client::*;
//! use efdms::core::*;
//! use efdms::envelope::SigningCredentials;
//!
//! # async fn run(credentials: SigningCredentials, receipt: Receipt) -> Result<(), VfdError> {
//! let client = VfdClient::from_config(ClientConfig::new(Environment::Staging))?;
//! let token = client
//!     .fetch_token(&TokenRequest::new("babaTRA", "Pa55w0rd"))
//!     .await?;
//! let ack = client
//!     .submit_receipt(&receipt, &credentials, &token.access_token)
//!     .await?;
//! println!("accepted receipt {}", ack.number);
//! # Ok(())
//! # }
//! ```

mod api;
mod config;
mod token;
mod transport;

pub use api::*;
pub use config::*;
pub use token::*;
pub use transport::*;
