use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::core::VfdError;

/// `Routing-Key` for receipt submissions.
pub const ROUTING_KEY_RECEIPT: &str = "vfdrct";
/// `Routing-Key` for Z report submissions.
pub const ROUTING_KEY_REPORT: &str = "vfdzreport";
pub const CONTENT_TYPE_XML: &str = "application/xml";
pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";
/// Value of the `Client` header sent with registrations.
pub const DEFAULT_CLIENT_NAME: &str = "webapi";
pub const DEFAULT_TIMEOUT_SECS: u64 = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Staging,
    Production,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown environment '{0}', expected staging or production")]
pub struct EnvironmentParseError(String);

impl FromStr for Environment {
    type Err = EnvironmentParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "staging" | "test" | "testing" | "dev" | "development" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(EnvironmentParseError(s.to_string())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Staging => "staging",
            Self::Production => "production",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Register,
    Token,
    Receipt,
    Report,
    Verify,
}

impl Environment {
    /// Published endpoint for `action`.
    pub fn url(self, action: Action) -> &'static str {
        match (self, action) {
            (Self::Production, Action::Register) => "https://vfd.tra.go.tz/api/vfdRegReq",
            (Self::Production, Action::Token) => "https://vfd.tra.go.tz/vfdtoken",
            (Self::Production, Action::Receipt) => "https://vfd.tra.go.tz/api/efdmsRctInfo",
            (Self::Production, Action::Report) => "https://vfd.tra.go.tz/api/efdmszreport",
            (Self::Production, Action::Verify) => "https://verify.tra.go.tz/",
            (Self::Staging, Action::Register) => {
                "https://virtual.tra.go.tz/efdmsRctApi/api/vfdRegReq"
            }
            (Self::Staging, Action::Token) => "https://virtual.tra.go.tz/efdmsRctApi/vfdtoken",
            (Self::Staging, Action::Receipt) => {
                "https://virtual.tra.go.tz/efdmsRctApi/api/efdmsRctInfo"
            }
            (Self::Staging, Action::Report) => {
                "https://virtual.tra.go.tz/efdmsRctApi/api/efdmszreport"
            }
            (Self::Staging, Action::Verify) => "https://virtual.tra.go.tz/efdmsRctVerify/",
        }
    }
}

/// Link printed on receipts (usually as a QR code): `<verify-url><code>_<HHMMSS>`.
pub fn receipt_link(environment: Environment, verification_code: &str, time: NaiveTime) -> String {
    format!(
        "{}{}_{}",
        environment.url(Action::Verify),
        verification_code,
        time.format("%H%M%S")
    )
}

/// Endpoint set used by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub register: Url,
    pub token: Url,
    pub receipt: Url,
    pub report: Url,
}

impl Endpoints {
    pub fn for_environment(environment: Environment) -> Result<Self, VfdError> {
        Ok(Self {
            register: parse_url(environment.url(Action::Register))?,
            token: parse_url(environment.url(Action::Token))?,
            receipt: parse_url(environment.url(Action::Receipt))?,
            report: parse_url(environment.url(Action::Report))?,
        })
    }

    /// Same paths as production, below another base URL (gateways, mock servers).
    pub fn with_base(base: &str) -> Result<Self, VfdError> {
        let mut base = parse_url(base)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let join = |path: &str| {
            base.join(path)
                .map_err(|e| VfdError::transport(None, format!("invalid endpoint '{path}': {e}")))
        };
        Ok(Self {
            register: join("api/vfdRegReq")?,
            token: join("vfdtoken")?,
            receipt: join("api/efdmsRctInfo")?,
            report: join("api/efdmszreport")?,
        })
    }

    pub fn get(&self, action: Action) -> Option<&Url> {
        match action {
            Action::Register => Some(&self.register),
            Action::Token => Some(&self.token),
            Action::Receipt => Some(&self.receipt),
            Action::Report => Some(&self.report),
            Action::Verify => None,
        }
    }
}

fn parse_url(url: &str) -> Result<Url, VfdError> {
    Url::parse(url).map_err(|e| VfdError::transport(None, format!("invalid URL '{url}': {e}")))
}

/// Client settings. Deserializable from any serde format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub environment: Environment,
    /// Request timeout in seconds (default: 70).
    pub timeout_secs: u64,
    /// `Client` header for registrations.
    pub client_name: String,
    /// Overrides the published endpoints of `environment`.
    pub endpoints: Option<Endpoints>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Staging,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            endpoints: None,
        }
    }
}

impl ClientConfig {
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            ..Self::default()
        }
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = Some(endpoints);
        self
    }

    pub fn resolve_endpoints(&self) -> Result<Endpoints, VfdError> {
        match &self.endpoints {
            Some(endpoints) => Ok(endpoints.clone()),
            None => Endpoints::for_environment(self.environment),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_aliases() {
        assert_eq!("prod".parse::<Environment>(), Ok(Environment::Production));
        assert_eq!(" Testing ".parse::<Environment>(), Ok(Environment::Staging));
        let err = "qa".parse::<Environment>().unwrap_err();
        assert!(err.to_string().contains("'qa'"));
    }

    #[test]
    fn published_urls() {
        assert_eq!(
            Environment::Production.url(Action::Receipt),
            "https://vfd.tra.go.tz/api/efdmsRctInfo"
        );
        assert_eq!(
            Environment::Staging.url(Action::Token),
            "https://virtual.tra.go.tz/efdmsRctApi/vfdtoken"
        );
    }

    #[test]
    fn receipt_link_strips_colons() {
        let time = NaiveTime::from_hms_opt(8, 36, 2).unwrap();
        assert_eq!(
            receipt_link(Environment::Production, "MFT7AB380", time),
            "https://verify.tra.go.tz/MFT7AB380_083602"
        );
        assert_eq!(
            receipt_link(Environment::Staging, "MFT7AB380", time),
            "https://virtual.tra.go.tz/efdmsRctVerify/MFT7AB380_083602"
        );
    }

    #[test]
    fn endpoints_below_custom_base() {
        let endpoints = Endpoints::with_base("http://127.0.0.1:8080/gateway").unwrap();
        assert_eq!(
            endpoints.receipt.as_str(),
            "http://127.0.0.1:8080/gateway/api/efdmsRctInfo"
        );
        assert_eq!(endpoints.token.as_str(), "http://127.0.0.1:8080/gateway/vfdtoken");
        assert!(endpoints.get(Action::Verify).is_none());
    }

    #[test]
    fn config_defaults() {
        let config: ClientConfig = serde_json::from_str(r#"{"environment":"production"}"#).unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.timeout_secs, 70);
        assert_eq!(config.client_name, "webapi");
        assert_eq!(
            config.resolve_endpoints().unwrap().report.as_str(),
            "https://vfd.tra.go.tz/api/efdmszreport"
        );
    }
}
