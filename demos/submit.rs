//! Full flow against the staging service.
//!
//! Needs a key and certificate issued by the authority:
//! `VFD_KEY=key.pem VFD_CERT=cert.pem VFD_TIN=... VFD_CERTKEY=... cargo run --example submit`

use std::env;

use chrono::Local;
use efdms::client::*;
use efdms::core::*;
use efdms::envelope::SigningCredentials;
use rust_decimal_macros::dec;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let key = std::fs::read_to_string(env::var("VFD_KEY")?)?;
    let cert = std::fs::read_to_string(env::var("VFD_CERT")?)?;
    let credentials = SigningCredentials::from_pem(&key, &cert)?;
    let registration = Registration::new(env::var("VFD_TIN")?, env::var("VFD_CERTKEY")?);

    let environment: Environment = env::var("VFD_ENV")
        .unwrap_or_else(|_| "staging".into())
        .parse()?;
    let client = VfdClient::from_config(ClientConfig::new(environment))?;

    let profile = client.register(&registration, &credentials).await?;
    println!("Registered {} ({})", profile.registration_id, profile.name);

    let token = client
        .fetch_token(&TokenRequest::new(&profile.username, &profile.password))
        .await?;
    println!("Token valid for {} s", token.expires_in);

    let now = Local::now().naive_local();
    let counter = profile.global_counter + 1;
    let params = ReceiptParams {
        date: now.date(),
        time: now.time(),
        tin: profile.tin.clone(),
        registration_id: profile.registration_id.clone(),
        efd_serial: profile.serial.clone(),
        receipt_number: counter,
        daily_counter: 1,
        global_counter: counter,
        z_number: None,
        verification_code: receipt_verification_code(&profile.receipt_code, counter),
    };
    let receipt = ReceiptBuilder::new(params)
        .add_item(Item::taxable("1", "Soap", dec!(1), dec!(1000)))
        .add_payment(Payment::cash(dec!(1000)))
        .build()?;

    match client
        .submit_receipt(&receipt, &credentials, &token.access_token)
        .await
    {
        Ok(ack) => {
            println!("Accepted receipt {} at {} {}", ack.number, ack.date, ack.time);
            println!(
                "Verify: {}",
                receipt_link(
                    environment,
                    &receipt.params.verification_code,
                    receipt.params.time
                )
            );
        }
        Err(VfdError::BusinessRejection { code, message }) => {
            println!("Rejected ({code}): {message}");
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
