use thiserror::Error;

use super::ack_code::AckCode;

/// Errors that can occur while preparing, signing or submitting a fiscal document.
///
/// Nothing in this crate retries on any of these. A failed tax submission that is
/// retried blindly can produce duplicate fiscal records, so the caller decides.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VfdError {
    /// Input was rejected before serialization; nothing was sent.
    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    /// The document could not be rendered as XML.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Key material or the signature algorithm failed while signing.
    #[error("signing error: {0}")]
    Signing(String),

    /// A freshly produced signature did not verify against its own bytes.
    ///
    /// Signals a broken key, a key that does not belong to the certificate,
    /// or a defect in the environment.
    #[error("signature self-verification failed: {0}")]
    SelfVerification(String),

    /// The private key or certificate could not be loaded.
    #[error("credentials error: {0}")]
    Credentials(String),

    /// The remote service could not be reached or answered with something unusable.
    #[error("transport error{}: {message}", status_suffix(.status))]
    Transport {
        /// HTTP status, when a response was received at all.
        status: Option<u16>,
        message: String,
    },

    /// HTTP 500 with a structured error payload.
    #[error("remote rejection: {message}")]
    RemoteRejection { message: String },

    /// The service acknowledged the request with a non-zero ack code.
    #[error("rejected by tax authority (code {code}): {}", .code.description())]
    BusinessRejection {
        code: AckCode,
        /// `ACKMSG` as sent by the service.
        message: String,
    },

    /// A success response whose acknowledgement could not be decoded.
    #[error("invalid acknowledgement: {0}")]
    InvalidResponse(String),
}

impl VfdError {
    /// The authority's ack code, for business rejections.
    pub fn ack_code(&self) -> Option<AckCode> {
        match self {
            Self::BusinessRejection { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Validation problems, if this is a validation error.
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            Self::Validation(errors) => errors,
            _ => &[],
        }
    }

    #[cfg_attr(not(feature = "envelope"), allow(dead_code))]
    pub(crate) fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: message.into(),
        }
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

/// A single validation error with field path and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dot-separated path to the invalid field (e.g. "params.tin", "items[2].quantity").
    pub field: String,
    /// Human-readable error description.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_lists_every_field() {
        let err = VfdError::Validation(vec![
            ValidationError::new("params.tin", "must not be empty"),
            ValidationError::new("items[0].quantity", "must not be negative"),
        ]);
        assert_eq!(
            err.to_string(),
            "validation failed: params.tin: must not be empty; items[0].quantity: must not be negative"
        );
        assert_eq!(err.validation_errors().len(), 2);
    }

    #[test]
    fn business_rejection_uses_documented_message() {
        let err = VfdError::BusinessRejection {
            code: AckCode::InvalidClientHeader,
            message: "FAIL".into(),
        };
        assert_eq!(
            err.to_string(),
            "rejected by tax authority (code 7): Invalid client header"
        );
        assert_eq!(err.ack_code(), Some(AckCode::InvalidClientHeader));
    }

    #[test]
    fn transport_error_mentions_status_when_known() {
        let err = VfdError::transport(Some(502), "bad gateway");
        assert_eq!(err.to_string(), "transport error (HTTP 502): bad gateway");
        let err = VfdError::transport(None, "connection refused");
        assert_eq!(err.to_string(), "transport error: connection refused");
    }
}
