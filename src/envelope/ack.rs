//! Interpretation of the service's HTTP answers.
//!
//! - `500` carries an error payload (`<Error><Message>..</Message></Error>` or
//!   `{"Message": ".."}`) and becomes [`VfdError::RemoteRejection`].
//! - `2xx` carries a kind-specific acknowledgement inside `<EFDMS>`:
//!   `RCTACK` for receipts, `ZACK` for reports and `EFDMSRESP` for registrations.
//!   `ACKCODE` 0 is success, anything else is [`VfdError::BusinessRejection`].
//! - Any other status is a rejection when the body can be decoded and a
//!   [`VfdError::Transport`] error otherwise.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::core::{AckCode, DocumentKind, VfdError};

/// Decoded acknowledgement of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckResult {
    /// `RCTNUM`, `ZNUMBER` or `REGID` depending on the document kind.
    pub number: String,
    pub date: String,
    pub time: String,
    pub code: AckCode,
    pub message: String,
}

/// VAT category codes assigned to the taxpayer (`TAXCODES`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxCodes {
    #[serde(rename = "CODEA", default)]
    pub code_a: String,
    #[serde(rename = "CODEB", default)]
    pub code_b: String,
    #[serde(rename = "CODEC", default)]
    pub code_c: String,
    #[serde(rename = "CODED", default)]
    pub code_d: String,
}

/// Registration acknowledgement (`EFDMSRESP`) with the taxpayer profile.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationAck {
    #[serde(rename = "ACKCODE", default)]
    pub ack_code: String,
    #[serde(rename = "ACKMSG", default)]
    pub ack_message: String,
    #[serde(rename = "REGID", default)]
    pub registration_id: String,
    #[serde(rename = "SERIAL", default)]
    pub serial: String,
    #[serde(rename = "UIN", default)]
    pub uin: String,
    #[serde(rename = "TIN", default)]
    pub tin: String,
    #[serde(rename = "VRN", default)]
    pub vrn: String,
    #[serde(rename = "MOBILE", default)]
    pub mobile: String,
    #[serde(rename = "ADDRESS", default)]
    pub address: String,
    #[serde(rename = "STREET", default)]
    pub street: String,
    #[serde(rename = "CITY", default)]
    pub city: String,
    #[serde(rename = "COUNTRY", default)]
    pub country: String,
    #[serde(rename = "NAME", default)]
    pub name: String,
    /// Prefix of `RCTVNUM`.
    #[serde(rename = "RECEIPTCODE", default)]
    pub receipt_code: String,
    #[serde(rename = "REGION", default)]
    pub region: String,
    #[serde(rename = "ROUTINGKEY", default)]
    pub routing_key: String,
    /// Global counter to continue from. Blank in rejections, decoded as 0.
    #[serde(rename = "GC", default, deserialize_with = "counter_or_zero")]
    pub global_counter: u64,
    #[serde(rename = "TAXOFFICE", default)]
    pub tax_office: String,
    #[serde(rename = "USERNAME", default)]
    pub username: String,
    #[serde(rename = "PASSWORD", default)]
    pub password: String,
    #[serde(rename = "TOKENPATH", default)]
    pub token_path: String,
    #[serde(rename = "TAXCODES", default)]
    pub tax_codes: TaxCodes,
}

fn counter_or_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let text = String::deserialize(deserializer)?;
    let text = text.trim();
    if text.is_empty() {
        return Ok(0);
    }
    text.parse().map_err(serde::de::Error::custom)
}

impl fmt::Debug for RegistrationAck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationAck")
            .field("ack_code", &self.ack_code)
            .field("ack_message", &self.ack_message)
            .field("registration_id", &self.registration_id)
            .field("serial", &self.serial)
            .field("uin", &self.uin)
            .field("tin", &self.tin)
            .field("vrn", &self.vrn)
            .field("name", &self.name)
            .field("receipt_code", &self.receipt_code)
            .field("routing_key", &self.routing_key)
            .field("global_counter", &self.global_counter)
            .field("tax_office", &self.tax_office)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("token_path", &self.token_path)
            .finish_non_exhaustive()
    }
}

impl RegistrationAck {
    pub fn code(&self) -> Option<AckCode> {
        AckCode::parse(&self.ack_code)
    }

    pub fn to_ack_result(&self) -> Option<AckResult> {
        Some(AckResult {
            number: self.registration_id.clone(),
            date: String::new(),
            time: String::new(),
            code: self.code()?,
            message: self.ack_message.clone(),
        })
    }
}

#[derive(Deserialize)]
struct RawAck {
    #[serde(rename = "RCTNUM", alias = "ZNUMBER", default)]
    number: String,
    #[serde(rename = "DATE", default)]
    date: String,
    #[serde(rename = "TIME", default)]
    time: String,
    #[serde(rename = "ACKCODE")]
    code: String,
    #[serde(rename = "ACKMSG", default)]
    message: String,
}

#[derive(Deserialize)]
struct ReceiptAckEnvelope {
    #[serde(rename = "RCTACK")]
    ack: RawAck,
}

#[derive(Deserialize)]
struct ReportAckEnvelope {
    #[serde(rename = "ZACK")]
    ack: RawAck,
}

#[derive(Deserialize)]
struct RegistrationAckEnvelope {
    #[serde(rename = "EFDMSRESP")]
    ack: RegistrationAck,
}

#[derive(Deserialize)]
struct ErrorPayload {
    #[serde(rename = "Message", alias = "message")]
    message: String,
}

/// Decode the error payload sent with HTTP 500, as XML or JSON.
pub fn decode_error_payload(body: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(body).ok()?.trim();
    let payload: ErrorPayload = if text.starts_with('{') {
        serde_json::from_str(text).ok()?
    } else if text.starts_with('<') {
        quick_xml::de::from_str(text).ok()?
    } else {
        return None;
    };
    Some(payload.message)
}

fn decode_ack(kind: DocumentKind, body: &[u8]) -> Result<AckResult, String> {
    let text = std::str::from_utf8(body).map_err(|e| format!("body is not UTF-8: {e}"))?;
    let raw = match kind {
        DocumentKind::Receipt => quick_xml::de::from_str::<ReceiptAckEnvelope>(text)
            .map(|e| e.ack)
            .map_err(|e| format!("cannot decode RCTACK: {e}"))?,
        DocumentKind::Report => quick_xml::de::from_str::<ReportAckEnvelope>(text)
            .map(|e| e.ack)
            .map_err(|e| format!("cannot decode ZACK: {e}"))?,
        DocumentKind::Registration => {
            let ack = decode_registration_ack(text)?;
            return ack
                .to_ack_result()
                .ok_or_else(|| format!("ACKCODE '{}' is not a number", ack.ack_code));
        }
    };
    let code = AckCode::parse(&raw.code)
        .ok_or_else(|| format!("ACKCODE '{}' is not a number", raw.code))?;
    Ok(AckResult {
        number: raw.number.trim().to_string(),
        date: raw.date.trim().to_string(),
        time: raw.time.trim().to_string(),
        code,
        message: raw.message,
    })
}

fn decode_registration_ack(text: &str) -> Result<RegistrationAck, String> {
    quick_xml::de::from_str::<RegistrationAckEnvelope>(text)
        .map(|e| e.ack)
        .map_err(|e| format!("cannot decode EFDMSRESP: {e}"))
}

fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status)
}

fn classify(ack: AckResult) -> Result<AckResult, VfdError> {
    if ack.code.is_success() {
        Ok(ack)
    } else {
        Err(VfdError::BusinessRejection {
            code: ack.code,
            message: ack.message,
        })
    }
}

fn non_success(status: u16, body: &[u8], ack: Option<AckResult>) -> VfdError {
    if status == 500 {
        return match decode_error_payload(body) {
            Some(message) => VfdError::RemoteRejection { message },
            None => VfdError::transport(Some(status), "undecodable error payload"),
        };
    }
    if let Some(ack) = ack.filter(|a| !a.code.is_success()) {
        return VfdError::BusinessRejection {
            code: ack.code,
            message: ack.message,
        };
    }
    match decode_error_payload(body) {
        Some(message) => VfdError::RemoteRejection { message },
        None => VfdError::transport(
            Some(status),
            format!("unexpected response: {}", String::from_utf8_lossy(body).trim()),
        ),
    }
}

/// Interpret a response to a submission of `kind`.
pub fn interpret(status: u16, body: &[u8], kind: DocumentKind) -> Result<AckResult, VfdError> {
    if !is_success_status(status) {
        let ack = if status == 500 {
            None
        } else {
            decode_ack(kind, body).ok()
        };
        return Err(non_success(status, body, ack));
    }
    let ack = decode_ack(kind, body).map_err(VfdError::InvalidResponse)?;
    classify(ack)
}

/// Interpret a registration response, keeping the full taxpayer profile.
pub fn interpret_registration(status: u16, body: &[u8]) -> Result<RegistrationAck, VfdError> {
    let text = std::str::from_utf8(body).ok();
    let decoded = text.map(decode_registration_ack);

    if !is_success_status(status) {
        let ack = match (status, decoded) {
            (500, _) => None,
            (_, Some(Ok(ack))) => ack.to_ack_result(),
            _ => None,
        };
        return Err(non_success(status, body, ack));
    }

    let ack = match decoded {
        Some(result) => result.map_err(VfdError::InvalidResponse)?,
        None => return Err(VfdError::InvalidResponse("body is not UTF-8".into())),
    };
    let result = ack.to_ack_result().ok_or_else(|| {
        VfdError::InvalidResponse(format!("ACKCODE '{}' is not a number", ack.ack_code))
    })?;
    classify(result)?;
    Ok(ack)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RCT_OK: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?><EFDMS><RCTACK><RCTNUM>380</RCTNUM>\
        <DATE>2019-08-27</DATE><TIME>08:36:02</TIME><ACKCODE>0</ACKCODE><ACKMSG>Success</ACKMSG>\
        </RCTACK><EFDMSSIGNATURE>abc=</EFDMSSIGNATURE></EFDMS>";

    #[test]
    fn receipt_success() {
        let ack = interpret(200, RCT_OK.as_bytes(), DocumentKind::Receipt).unwrap();
        assert_eq!(ack.number, "380");
        assert_eq!(ack.date, "2019-08-27");
        assert_eq!(ack.time, "08:36:02");
        assert_eq!(ack.code, AckCode::Success);
        assert_eq!(ack.message, "Success");
    }

    #[test]
    fn report_ack_uses_znumber() {
        let body = "<EFDMS><ZACK><ZNUMBER>20190827</ZNUMBER><DATE>2019-08-27</DATE>\
            <TIME>23:59:00</TIME><ACKCODE>0</ACKCODE><ACKMSG>Success</ACKMSG></ZACK></EFDMS>";
        let ack = interpret(200, body.as_bytes(), DocumentKind::Report).unwrap();
        assert_eq!(ack.number, "20190827");
    }

    #[test]
    fn wrong_ack_element_is_invalid_response() {
        let err = interpret(200, RCT_OK.as_bytes(), DocumentKind::Report).unwrap_err();
        assert!(matches!(err, VfdError::InvalidResponse(_)));
    }

    #[test]
    fn non_numeric_ack_code_is_invalid_response() {
        let body = "<EFDMS><RCTACK><RCTNUM>1</RCTNUM><ACKCODE>OK</ACKCODE></RCTACK></EFDMS>";
        let err = interpret(200, body.as_bytes(), DocumentKind::Receipt).unwrap_err();
        assert!(matches!(err, VfdError::InvalidResponse(_)));
    }

    #[test]
    fn xml_error_payload_on_500() {
        let body = b"<Error><Message>Certificate not found</Message></Error>";
        let err = interpret(500, body, DocumentKind::Receipt).unwrap_err();
        match err {
            VfdError::RemoteRejection { message } => assert_eq!(message, "Certificate not found"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn undecodable_500_is_transport() {
        let err = interpret(500, b"Internal Server Error", DocumentKind::Receipt).unwrap_err();
        assert!(matches!(err, VfdError::Transport { status: Some(500), .. }));
    }

    #[test]
    fn bad_gateway_html_is_transport() {
        let err = interpret(502, b"Bad Gateway", DocumentKind::Report).unwrap_err();
        assert!(matches!(err, VfdError::Transport { status: Some(502), .. }));
    }

    #[test]
    fn registration_profile_is_decoded() {
        let body = "<EFDMS><EFDMSRESP><ACKCODE>0</ACKCODE><ACKMSG>Registration Successful</ACKMSG>\
            <REGID>TZ0100553</REGID><SERIAL>10TZ100625</SERIAL><UIN>09VFDWEBAPI-1</UIN>\
            <TIN>100100100</TIN><VRN>NOT REGISTERED</VRN><MOBILE>0713000000</MOBILE>\
            <STREET>Samora</STREET><CITY>Dar es Salaam</CITY><COUNTRY>TANZANIA</COUNTRY>\
            <NAME>TEST TAXPAYER</NAME><RECEIPTCODE>A1B2C3</RECEIPTCODE><REGION>Ilala</REGION>\
            <ROUTINGKEY>vfdrct</ROUTINGKEY><GC>1</GC><TAXOFFICE>Ilala</TAXOFFICE>\
            <USERNAME>user</USERNAME><PASSWORD>secret</PASSWORD><TOKENPATH>vfdtoken</TOKENPATH>\
            <TAXCODES><CODEA>1</CODEA><CODEB>2</CODEB><CODEC>3</CODEC><CODED>4</CODED></TAXCODES>\
            </EFDMSRESP><EFDMSSIGNATURE>sig</EFDMSSIGNATURE></EFDMS>";
        let ack = interpret_registration(200, body.as_bytes()).unwrap();
        assert_eq!(ack.registration_id, "TZ0100553");
        assert_eq!(ack.receipt_code, "A1B2C3");
        assert_eq!(ack.global_counter, 1);
        assert_eq!(ack.tax_codes.code_c, "3");
        assert!(!format!("{ack:?}").contains("secret"));

        let generic = interpret(200, body.as_bytes(), DocumentKind::Registration).unwrap();
        assert_eq!(generic.number, "TZ0100553");
    }

    const REG_INVALID_SERIAL: &str = "<EFDMS><EFDMSRESP><ACKCODE>6</ACKCODE>\
        <ACKMSG>Invalid Serial</ACKMSG><REGID></REGID><SERIAL></SERIAL><UIN></UIN><TIN></TIN>\
        <VRN></VRN><MOBILE></MOBILE><STREET></STREET><CITY></CITY><COUNTRY></COUNTRY><NAME></NAME>\
        <RECEIPTCODE></RECEIPTCODE><REGION></REGION><ROUTINGKEY></ROUTINGKEY><GC></GC>\
        <TAXOFFICE></TAXOFFICE><USERNAME></USERNAME><PASSWORD></PASSWORD><TOKENPATH></TOKENPATH>\
        <TAXCODES><CODEA></CODEA><CODEB></CODEB><CODEC></CODEC><CODED></CODED></TAXCODES>\
        </EFDMSRESP><EFDMSSIGNATURE>sig</EFDMSSIGNATURE></EFDMS>";

    #[test]
    fn blank_profile_rejection_keeps_ack_code() {
        let err = interpret_registration(200, REG_INVALID_SERIAL.as_bytes()).unwrap_err();
        match err {
            VfdError::BusinessRejection { code, message } => {
                assert_eq!(code, AckCode::InvalidSerial);
                assert_eq!(message, "Invalid Serial");
            }
            other => panic!("unexpected {other:?}"),
        }

        let err = interpret(200, REG_INVALID_SERIAL.as_bytes(), DocumentKind::Registration)
            .unwrap_err();
        assert_eq!(err.ack_code(), Some(AckCode::InvalidSerial));
    }

    #[test]
    fn global_counter_tolerates_whitespace_and_self_closing_tags() {
        let body = "<EFDMS><EFDMSRESP><ACKCODE>0</ACKCODE><ACKMSG>OK</ACKMSG>\
            <REGID>TZ1</REGID><GC> 42 </GC></EFDMSRESP></EFDMS>";
        let ack = interpret_registration(200, body.as_bytes()).unwrap();
        assert_eq!(ack.global_counter, 42);

        let body = "<EFDMS><EFDMSRESP><ACKCODE>0</ACKCODE><ACKMSG>OK</ACKMSG>\
            <REGID>TZ1</REGID><GC/></EFDMSRESP></EFDMS>";
        let ack = interpret_registration(200, body.as_bytes()).unwrap();
        assert_eq!(ack.global_counter, 0);
    }

    #[test]
    fn non_numeric_global_counter_is_invalid_response() {
        let body = "<EFDMS><EFDMSRESP><ACKCODE>0</ACKCODE><GC>many</GC></EFDMSRESP></EFDMS>";
        let err = interpret_registration(200, body.as_bytes()).unwrap_err();
        assert!(matches!(err, VfdError::InvalidResponse(_)));
    }

    #[test]
    fn registration_rejection_carries_code() {
        let body = "<EFDMS><EFDMSRESP><ACKCODE>6</ACKCODE><ACKMSG>Invalid Serial</ACKMSG></EFDMSRESP></EFDMS>";
        let err = interpret_registration(200, body.as_bytes()).unwrap_err();
        assert_eq!(err.ack_code(), Some(AckCode::InvalidSerial));
    }
}
