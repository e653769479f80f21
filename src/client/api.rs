use std::future::Future;

use crate::core::{DocumentKind, Receipt, Registration, ValidationError, VfdError, ZReport};
use crate::envelope::{
    AckResult, RegistrationAck, SignedEnvelope, SigningCredentials, interpret,
    interpret_registration, seal, seal_raw,
};

use super::config::{
    CONTENT_TYPE_FORM, CONTENT_TYPE_XML, ClientConfig, Endpoints, ROUTING_KEY_RECEIPT,
    ROUTING_KEY_REPORT,
};
use super::token::{TokenRequest, TokenResponse, interpret_token};
use super::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

/// Registers the device and returns the taxpayer profile.
pub trait Registrar {
    fn register(
        &self,
        registration: &Registration,
        credentials: &SigningCredentials,
    ) -> impl Future<Output = Result<RegistrationAck, VfdError>> + Send;
}

/// Exchanges the registration username/password for a bearer token.
pub trait TokenFetcher {
    fn fetch_token(
        &self,
        request: &TokenRequest,
    ) -> impl Future<Output = Result<TokenResponse, VfdError>> + Send;
}

/// Submits receipts (`RCT`).
pub trait ReceiptSubmitter {
    fn submit_receipt(
        &self,
        receipt: &Receipt,
        credentials: &SigningCredentials,
        token: &str,
    ) -> impl Future<Output = Result<AckResult, VfdError>> + Send;
}

/// Submits end-of-day Z reports (`ZREPORT`).
pub trait ReportSubmitter {
    fn submit_report(
        &self,
        report: &ZReport,
        credentials: &SigningCredentials,
        token: &str,
    ) -> impl Future<Output = Result<AckResult, VfdError>> + Send;
}

/// Client for the VFD web API.
///
/// Built once and shared; every method is safe to call concurrently.
/// Nothing is retried: a failed submission is reported once and the
/// caller decides what to do, since a blind retry can duplicate a fiscal record.
#[derive(Debug, Clone)]
pub struct VfdClient<T> {
    config: ClientConfig,
    endpoints: Endpoints,
    transport: T,
}

impl VfdClient<ReqwestTransport> {
    /// Client with a pooled `reqwest` transport using `config.timeout_secs`.
    pub fn from_config(config: ClientConfig) -> Result<Self, VfdError> {
        let transport = ReqwestTransport::from_config(&config)?;
        Self::new(config, transport)
    }
}

impl<T: Transport> VfdClient<T> {
    pub fn new(config: ClientConfig, transport: T) -> Result<Self, VfdError> {
        let endpoints = config.resolve_endpoints()?;
        Ok(Self {
            config,
            endpoints,
            transport,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sign an already-marshaled receipt or report body and submit it.
    ///
    /// The body is canonicalized first, so `PAYMENTS`/`VATTOTALS` item
    /// wrappers produced by generic marshalers are accepted.
    pub async fn submit_raw(
        &self,
        kind: DocumentKind,
        body: &[u8],
        credentials: &SigningCredentials,
        token: &str,
    ) -> Result<AckResult, VfdError> {
        let routing_key = match kind {
            DocumentKind::Receipt => ROUTING_KEY_RECEIPT,
            DocumentKind::Report => ROUTING_KEY_REPORT,
            DocumentKind::Registration => {
                return Err(VfdError::Validation(vec![ValidationError::new(
                    "kind",
                    "registrations are submitted with register()",
                )]));
            }
        };
        let envelope = seal_raw(body, credentials)?;
        tracing::info!(kind = %kind, "submitting raw document");
        self.submit_signed(kind, routing_key, envelope, credentials, token)
            .await
    }

    async fn submit_signed(
        &self,
        kind: DocumentKind,
        routing_key: &str,
        envelope: SignedEnvelope,
        credentials: &SigningCredentials,
        token: &str,
    ) -> Result<AckResult, VfdError> {
        let url = match kind {
            DocumentKind::Report => self.endpoints.report.clone(),
            _ => self.endpoints.receipt.clone(),
        };
        let request = HttpRequest::new(url, envelope.into_bytes())
            .header("Content-Type", CONTENT_TYPE_XML)
            .header("Routing-Key", routing_key)
            .header("Cert-Serial", credentials.cert_serial_header())
            .header("Authorization", format!("bearer {token}"));

        let response = self.send(kind, request).await?;
        let result = interpret(response.status, &response.body, kind);
        log_outcome(kind, &result);
        result
    }

    async fn send(&self, kind: DocumentKind, request: HttpRequest) -> Result<HttpResponse, VfdError> {
        let response = self.transport.post(request).await.inspect_err(|e| {
            tracing::warn!(kind = %kind, error = %e, "request failed");
        })?;
        tracing::debug!(kind = %kind, status = response.status, "response received");
        Ok(response)
    }
}

fn log_outcome<R>(kind: DocumentKind, result: &Result<R, VfdError>) {
    if let Err(e) = result {
        tracing::warn!(kind = %kind, code = ?e.ack_code(), error = %e, "submission rejected");
    }
}

impl<T: Transport> Registrar for VfdClient<T> {
    async fn register(
        &self,
        registration: &Registration,
        credentials: &SigningCredentials,
    ) -> Result<RegistrationAck, VfdError> {
        let envelope = seal(registration, credentials)?;
        tracing::info!(kind = "registration", tin = %registration.tin, "registering device");

        let request = HttpRequest::new(self.endpoints.register.clone(), envelope.into_bytes())
            .header("Content-Type", CONTENT_TYPE_XML)
            .header("Cert-Serial", credentials.cert_serial_header())
            .header("Client", self.config.client_name.as_str());

        let response = self.send(DocumentKind::Registration, request).await?;
        let result = interpret_registration(response.status, &response.body);
        log_outcome(DocumentKind::Registration, &result);
        result
    }
}

impl<T: Transport> TokenFetcher for VfdClient<T> {
    async fn fetch_token(&self, request: &TokenRequest) -> Result<TokenResponse, VfdError> {
        tracing::info!(username = %request.username, "requesting access token");
        let http = HttpRequest::new(self.endpoints.token.clone(), request.form_body().into_bytes())
            .header("Content-Type", CONTENT_TYPE_FORM);

        let response = self.transport.post(http).await?;
        tracing::debug!(status = response.status, "token response received");
        interpret_token(&response).inspect_err(|e| {
            tracing::warn!(error = %e, "token request rejected");
        })
    }
}

impl<T: Transport> ReceiptSubmitter for VfdClient<T> {
    async fn submit_receipt(
        &self,
        receipt: &Receipt,
        credentials: &SigningCredentials,
        token: &str,
    ) -> Result<AckResult, VfdError> {
        let envelope = seal(receipt, credentials)?;
        tracing::info!(
            kind = "receipt",
            number = receipt.params.receipt_number,
            "submitting document"
        );
        self.submit_signed(
            DocumentKind::Receipt,
            ROUTING_KEY_RECEIPT,
            envelope,
            credentials,
            token,
        )
        .await
    }
}

impl<T: Transport> ReportSubmitter for VfdClient<T> {
    async fn submit_report(
        &self,
        report: &ZReport,
        credentials: &SigningCredentials,
        token: &str,
    ) -> Result<AckResult, VfdError> {
        let envelope = seal(report, credentials)?;
        tracing::info!(
            kind = "report",
            number = %report.params.z_number,
            "submitting document"
        );
        self.submit_signed(
            DocumentKind::Report,
            ROUTING_KEY_REPORT,
            envelope,
            credentials,
            token,
        )
        .await
    }
}
