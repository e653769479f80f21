//! RSA-SHA1 signing of canonical bodies and envelope assembly.
//!
//! The service verifies RSASSA-PKCS1-v1_5 signatures over SHA-1, which is
//! deterministic: the same bytes and key always give the same signature.

use std::fmt;

use base64ct::{Base64, Encoding};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use x509_cert::{
    Certificate,
    der::{DecodePem, Encode},
};

use crate::core::{Document, VfdError};

use super::canonical::{ToXml, canonicalize_bytes, to_canonical_bytes};

/// Declaration placed in front of every envelope.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Private key plus the certificate registered with the authority.
#[derive(Clone)]
pub struct SigningCredentials {
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
    cert_serial: String,
}

impl fmt::Debug for SigningCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningCredentials")
            .field("cert_serial", &self.cert_serial)
            .finish_non_exhaustive()
    }
}

impl SigningCredentials {
    /// Load a PKCS#8 or PKCS#1 PEM private key and a PEM X.509 certificate.
    pub fn from_pem(private_key_pem: &str, certificate_pem: &str) -> Result<Self, VfdError> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(private_key_pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(private_key_pem))
            .map_err(|e| VfdError::Credentials(format!("private key parse error: {e}")))?;

        let cert = Certificate::from_pem(certificate_pem.as_bytes())
            .map_err(|e| VfdError::Credentials(format!("certificate parse error: {e}")))?;
        let spki = cert
            .tbs_certificate
            .subject_public_key_info
            .to_der()
            .map_err(|e| VfdError::Credentials(format!("certificate key encoding error: {e}")))?;
        let public_key = RsaPublicKey::from_public_key_der(&spki).map_err(|e| {
            VfdError::Credentials(format!("certificate does not hold an RSA key: {e}"))
        })?;
        let cert_serial = serial_hex(cert.tbs_certificate.serial_number.as_bytes());

        Ok(Self {
            private_key,
            public_key,
            cert_serial,
        })
    }

    /// Build from already-loaded keys, e.g. after PKCS#12 extraction elsewhere.
    pub fn from_parts(
        private_key: RsaPrivateKey,
        public_key: RsaPublicKey,
        cert_serial: impl Into<String>,
    ) -> Self {
        Self {
            private_key,
            public_key,
            cert_serial: cert_serial.into(),
        }
    }

    /// Certificate serial as upper-case hex, e.g. `4F2A19C3`.
    pub fn cert_serial(&self) -> &str {
        &self.cert_serial
    }

    /// `Cert-Serial` header value: base64 of the serial string.
    pub fn cert_serial_header(&self) -> String {
        Base64::encode_string(self.cert_serial.as_bytes())
    }

    /// Public key of the certificate.
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }
}

fn serial_hex(bytes: &[u8]) -> String {
    let significant = match bytes.iter().position(|b| *b != 0) {
        Some(start) => &bytes[start..],
        None => &bytes[bytes.len().saturating_sub(1)..],
    };
    significant.iter().map(|b| format!("{b:02X}")).collect()
}

/// Sign `bytes` and return the base64 signature.
pub fn sign(bytes: &[u8], private_key: &RsaPrivateKey) -> Result<String, VfdError> {
    let signing_key = SigningKey::<Sha1>::new(private_key.clone());
    let signature = signing_key
        .try_sign(bytes)
        .map_err(|e| VfdError::Signing(e.to_string()))?;
    Ok(Base64::encode_string(&signature.to_bytes()))
}

/// Verify a base64 signature over `bytes`.
pub fn verify(bytes: &[u8], public_key: &RsaPublicKey, signature_b64: &str) -> Result<(), VfdError> {
    let raw = Base64::decode_vec(signature_b64)
        .map_err(|e| VfdError::SelfVerification(format!("signature is not base64: {e}")))?;
    let signature = Signature::try_from(raw.as_slice())
        .map_err(|e| VfdError::SelfVerification(format!("malformed signature: {e}")))?;
    VerifyingKey::<Sha1>::new(public_key.clone())
        .verify(bytes, &signature)
        .map_err(|_| {
            VfdError::SelfVerification("signature does not match the certificate key".into())
        })
}

/// Sign, then verify against the certificate key before anything is sent.
pub fn sign_and_verify(bytes: &[u8], credentials: &SigningCredentials) -> Result<String, VfdError> {
    let signature = sign(bytes, &credentials.private_key)?;
    verify(bytes, &credentials.public_key, &signature)?;
    Ok(signature)
}

/// Canonical body, its signature and the envelope built from both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    body: Vec<u8>,
    signature: String,
}

impl SignedEnvelope {
    /// Bytes that were signed.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// `<?xml ...?><EFDMS>body<EFDMSSIGNATURE>sig</EFDMSSIGNATURE></EFDMS>`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(XML_DECLARATION.len() + self.body.len() + self.signature.len() + 48);
        out.extend_from_slice(XML_DECLARATION.as_bytes());
        out.extend_from_slice(b"<EFDMS>");
        out.extend_from_slice(&self.body);
        out.extend_from_slice(b"<EFDMSSIGNATURE>");
        out.extend_from_slice(self.signature.as_bytes());
        out.extend_from_slice(b"</EFDMSSIGNATURE></EFDMS>");
        out
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.to_bytes()
    }
}

fn seal_body(body: Vec<u8>, credentials: &SigningCredentials) -> Result<SignedEnvelope, VfdError> {
    let signature = sign_and_verify(&body, credentials)?;
    Ok(SignedEnvelope { body, signature })
}

/// Serialize, sign and wrap a document.
pub fn seal<T: ToXml + ?Sized>(
    document: &T,
    credentials: &SigningCredentials,
) -> Result<SignedEnvelope, VfdError> {
    seal_body(to_canonical_bytes(document)?, credentials)
}

/// Serialize, sign and wrap any [`Document`].
pub fn seal_document(
    document: &Document,
    credentials: &SigningCredentials,
) -> Result<SignedEnvelope, VfdError> {
    seal(document, credentials)
}

/// Canonicalize an already-marshaled body, then sign and wrap it.
pub fn seal_raw(body: &[u8], credentials: &SigningCredentials) -> Result<SignedEnvelope, VfdError> {
    seal_body(canonicalize_bytes(body)?, credentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_hex_strips_sign_padding() {
        assert_eq!(serial_hex(&[0x00, 0x8F, 0x01]), "8F01");
        assert_eq!(serial_hex(&[0x4F, 0x2A, 0x19, 0xC3]), "4F2A19C3");
        assert_eq!(serial_hex(&[0x00]), "00");
    }

    #[test]
    fn envelope_layout() {
        let envelope = SignedEnvelope {
            body: b"<REGDATA><TIN>1</TIN></REGDATA>".to_vec(),
            signature: "c2ln".into(),
        };
        assert_eq!(
            String::from_utf8(envelope.to_bytes()).unwrap(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><EFDMS><REGDATA><TIN>1</TIN></REGDATA>\
             <EFDMSSIGNATURE>c2ln</EFDMSSIGNATURE></EFDMS>"
        );
    }

    #[test]
    fn verify_rejects_garbage() {
        let key = RsaPublicKey::from_public_key_pem(include_str!("../../tests/fixtures/vfd_pub.pem"))
            .unwrap();
        let err = verify(b"x", &key, "not base64!").unwrap_err();
        assert!(matches!(err, VfdError::SelfVerification(_)));
    }
}
