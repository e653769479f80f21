//! Access token request (`/vfdtoken`).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::{AckCode, VfdError};

use super::transport::HttpResponse;

pub const GRANT_TYPE_PASSWORD: &str = "password";

/// Credentials issued with the registration acknowledgement.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
    pub grant_type: String,
}

impl fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("grant_type", &self.grant_type)
            .finish()
    }
}

impl TokenRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            grant_type: GRANT_TYPE_PASSWORD.to_string(),
        }
    }

    pub fn grant_type(mut self, grant_type: impl Into<String>) -> Self {
        self.grant_type = grant_type.into();
        self
    }

    /// `application/x-www-form-urlencoded` body.
    pub fn form_body(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("username", &self.username)
            .append_pair("password", &self.password)
            .append_pair("grant_type", &self.grant_type)
            .finish()
    }
}

/// Token endpoint answer. `code` and `message` come from the
/// `ACKCODE`/`ACKMSG` response headers, the rest from the JSON body.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(skip)]
    pub code: String,
    #[serde(skip)]
    pub message: String,
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default)]
    pub error: String,
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("code", &self.code)
            .field("message", &self.message)
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("error", &self.error)
            .finish()
    }
}

/// Interpret a token endpoint response. Anything but HTTP 200 is an error.
pub fn interpret_token(response: &HttpResponse) -> Result<TokenResponse, VfdError> {
    let code = response.header("ACKCODE").unwrap_or_default().trim().to_string();
    let message = response.header("ACKMSG").unwrap_or_default().trim().to_string();
    let decoded = serde_json::from_slice::<TokenResponse>(&response.body);

    if response.status != 200 {
        let error = decoded.map(|t| t.error).unwrap_or_default();
        return Err(match AckCode::parse(&code).filter(|c| !c.is_success()) {
            Some(ack) => VfdError::BusinessRejection {
                code: ack,
                message: if message.is_empty() { error } else { message },
            },
            None => VfdError::transport(
                Some(response.status),
                format!("token request failed: code=[{code}], message=[{message}], error=[{error}]"),
            ),
        });
    }

    let mut token = decoded
        .map_err(|e| VfdError::InvalidResponse(format!("cannot decode token response: {e}")))?;
    if token.access_token.is_empty() {
        return Err(VfdError::InvalidResponse(format!(
            "token response carries no access_token (error=[{}])",
            token.error
        )));
    }
    token.code = code;
    token.message = message;
    Ok(token)
}
