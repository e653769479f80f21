//! Acknowledgement codes returned by the EFDMS service.
//!
//! Every acknowledgement (`RCTACK`, `ZACK`, `EFDMSRESP`, token headers) carries a
//! numeric `ACKCODE`. Zero is the only success value.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Numeric acknowledgement code of the tax authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum AckCode {
    /// 0: accepted.
    Success,
    /// 1: signature did not verify.
    InvalidSignature,
    /// 3: TIN unknown to the authority.
    InvalidTaxId,
    /// 4: the VFD registration has not been approved yet.
    ApprovalRequired,
    /// 5: server-side failure.
    UnhandledException,
    /// 6: serial unknown or not registered to this TIN.
    InvalidSerial,
    /// 7: `Client` header missing or wrong.
    InvalidClientHeader,
    /// 8: certificate does not match the registration.
    WrongCertificate,
    /// Any code outside the documented set.
    Other(i64),
}

impl AckCode {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Success,
            1 => Self::InvalidSignature,
            3 => Self::InvalidTaxId,
            4 => Self::ApprovalRequired,
            5 => Self::UnhandledException,
            6 => Self::InvalidSerial,
            7 => Self::InvalidClientHeader,
            8 => Self::WrongCertificate,
            other => Self::Other(other),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::Success => 0,
            Self::InvalidSignature => 1,
            Self::InvalidTaxId => 3,
            Self::ApprovalRequired => 4,
            Self::UnhandledException => 5,
            Self::InvalidSerial => 6,
            Self::InvalidClientHeader => 7,
            Self::WrongCertificate => 8,
            Self::Other(code) => code,
        }
    }

    /// Parse the textual `ACKCODE` of an acknowledgement.
    ///
    /// Surrounding whitespace is ignored. Returns `None` for non-numeric text.
    pub fn parse(text: &str) -> Option<Self> {
        text.trim().parse::<i64>().ok().map(Self::from_code)
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }

    /// The message the authority documents for this code.
    pub fn description(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::InvalidSignature => "Invalid signature",
            Self::InvalidTaxId => "Invalid TIN",
            Self::ApprovalRequired => "VFD Registration Approval required",
            Self::UnhandledException => "Unhandled Exception",
            Self::InvalidSerial => "Invalid Serial or Serial not Registered to Web API/TIN",
            Self::InvalidClientHeader => "Invalid client header",
            Self::WrongCertificate => "Wrong Certificate used to Register Web API",
            Self::Other(_) => "Unknown acknowledgement code",
        }
    }
}

impl fmt::Display for AckCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<i64> for AckCode {
    fn from(code: i64) -> Self {
        Self::from_code(code)
    }
}

impl From<AckCode> for i64 {
    fn from(code: AckCode) -> Self {
        code.code()
    }
}
