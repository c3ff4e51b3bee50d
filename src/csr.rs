//! Certificate signing request parsing, validation and creation.
//!
//! Parsing is deliberately two-staged: [`CertificationRequest::parse_pem`] only
//! checks that the input is a well-formed PKCS#10 document, and
//! [`CertificationRequest::verify_signature`] turns it into a [`VerifiedCsr`]
//! once the requester has proven possession of the private key. Only a
//! `VerifiedCsr` can be turned into a certificate request for the issuer.
//!
//! No policy is applied to the subject or the key beyond that: any name is
//! accepted, and any key the verifier understands.

use der::asn1::BitString;
use der::{Decode, Encode, EncodePem};
use x509_cert::name::Name;
use x509_cert::request::{CertReq, CertReqInfo, Version};
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::params::CertificationRequestInfo;
use crate::error::{Result, SignError};
use crate::key::{KeyPair, PublicKey};

pub const CSR_BEGIN_MARKER: &str = "-----BEGIN CERTIFICATE REQUEST-----";
pub const CSR_END_MARKER: &str = "-----END CERTIFICATE REQUEST-----";

/// A decoded but not yet verified PKCS#10 request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CertificationRequest {
    inner: CertReq,
}

impl CertificationRequest {
    /// Decodes a PEM CSR.
    ///
    /// Input without both the begin and end marker is rejected before any
    /// decoding is attempted. Text around the PEM block is ignored.
    pub fn parse_pem(input: &str) -> Result<Self> {
        let Some(begin) = input.find(CSR_BEGIN_MARKER) else {
            return Err(SignError::InvalidFormat(
                "missing CERTIFICATE REQUEST PEM markers".to_string(),
            ));
        };
        let Some(end) = input[begin..].find(CSR_END_MARKER).map(|end| begin + end) else {
            return Err(SignError::InvalidFormat(
                "missing CERTIFICATE REQUEST PEM end marker".to_string(),
            ));
        };

        let block = &input[begin..end + CSR_END_MARKER.len()];
        let parsed = pem::parse(block).map_err(|e| SignError::InvalidFormat(e.to_string()))?;
        Self::from_der(parsed.contents())
    }

    /// Decodes a DER CSR.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = CertReq::from_der(der).map_err(|e| SignError::InvalidFormat(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Creates a CSR for `subject` and self-signs it with `key`.
    pub fn new_signed(subject: Name, key: &KeyPair) -> Result<Self> {
        let info = CertReqInfo {
            version: Version::V1,
            subject,
            public_key: key.as_spki()?,
            attributes: Default::default(),
        };
        let signature = key.sign_data(&info.to_der()?)?;

        Ok(Self {
            inner: CertReq {
                info,
                algorithm: key.signature_algorithm().into(),
                signature: BitString::from_bytes(&signature)?,
            },
        })
    }

    pub fn to_pem(&self) -> Result<String> {
        self.inner
            .to_pem(pkcs8::LineEnding::LF)
            .map_err(|e| SignError::EncodingError(e.to_string()))
    }

    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| SignError::EncodingError(e.to_string()))
    }

    pub fn subject(&self) -> &Name {
        &self.inner.info.subject
    }

    pub fn public_key_info(&self) -> &SubjectPublicKeyInfoOwned {
        &self.inner.info.public_key
    }

    /// Checks the self-signature against the embedded public key.
    ///
    /// Every failure here, including keys or algorithms this service cannot
    /// verify, is reported as [`SignError::InvalidSignature`].
    pub fn verify_signature(self) -> Result<VerifiedCsr> {
        let invalid = |err: SignError| match err {
            SignError::InvalidSignature(_) => err,
            other => SignError::InvalidSignature(other.to_string()),
        };

        let message = self.inner.info.to_der().map_err(|e| invalid(e.into()))?;
        let signature = self.inner.signature.as_bytes().ok_or_else(|| {
            SignError::InvalidSignature("signature has unused bits".to_string())
        })?;
        let public_key = PublicKey::from_x509spki(&self.inner.info.public_key).map_err(invalid)?;
        public_key
            .verify(&self.inner.algorithm, &message, signature)
            .map_err(invalid)?;

        Ok(VerifiedCsr { inner: self.inner })
    }
}

/// A CSR whose self-signature has been verified.
#[derive(Clone, Debug)]
pub struct VerifiedCsr {
    inner: CertReq,
}

impl VerifiedCsr {
    pub fn subject(&self) -> &Name {
        &self.inner.info.subject
    }

    pub fn public_key_info(&self) -> &SubjectPublicKeyInfoOwned {
        &self.inner.info.public_key
    }

    /// What the issuer needs from the request. Requested extensions are not
    /// carried over and the result is never a CA.
    pub fn to_request_info(&self) -> CertificationRequestInfo {
        CertificationRequestInfo::builder()
            .subject(self.inner.info.subject.clone())
            .subject_public_key(self.inner.info.public_key.clone())
            .is_ca(false)
            .build()
    }
}

/// Parses and verifies a PEM CSR in one step.
pub fn load_csr_from_str(csr_pem: &str) -> Result<VerifiedCsr> {
    CertificationRequest::parse_pem(csr_pem)?.verify_signature()
}
