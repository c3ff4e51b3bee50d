pub mod extensions;
pub mod params;

use der::{Decode, Encode, EncodePem};
use params::{CertificationRequestInfo, Validity};
use time::OffsetDateTime;
use x509_cert::certificate::CertificateInner;
use x509_cert::name::Name;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::error::{Result, SignError};
use crate::issuer::Issuer;
use crate::key::{KeyPair, PublicKey};

/// PEM label of an X.509 certificate.
pub const CERTIFICATE_PEM_LABEL: &str = "CERTIFICATE";

/// Represents the supported signature algorithms for certificates.
///
/// This enum provides a mapping to the corresponding OIDs for each algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// SHA-256 with RSA encryption (PKCS#1 v1.5).
    Sha256WithRSA,
    /// SHA-256 with ECDSA.
    Sha256WithECDSA,
    /// SHA-384 with ECDSA.
    Sha384WithECDSA,
    /// Ed25519 (pure EdDSA, digest is part of the scheme).
    Ed25519,
}

impl From<SignatureAlgorithm> for x509_cert::spki::AlgorithmIdentifierOwned {
    /// Converts a `SignatureAlgorithm` into an `AlgorithmIdentifierOwned`.
    ///
    /// RSA identifiers carry an explicit NULL parameter, the others none.
    fn from(value: SignatureAlgorithm) -> Self {
        match value {
            SignatureAlgorithm::Sha256WithRSA => x509_cert::spki::AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
                parameters: Some(der::asn1::AnyRef::NULL.into()),
            },
            SignatureAlgorithm::Sha256WithECDSA => x509_cert::spki::AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::ECDSA_WITH_SHA_256,
                parameters: None,
            },
            SignatureAlgorithm::Sha384WithECDSA => x509_cert::spki::AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::ECDSA_WITH_SHA_384,
                parameters: None,
            },
            SignatureAlgorithm::Ed25519 => x509_cert::spki::AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc8410::ID_ED_25519,
                parameters: None,
            },
        }
    }
}

/// Represents an X.509 certificate.
///
/// This struct provides methods to encode the certificate into DER or PEM
/// formats and to read back the fields the signing service sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: CertificateInner,
}

impl Certificate {
    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| SignError::EncodingError(e.to_string()))
    }

    /// Encodes the certificate into PEM format.
    pub fn to_pem(&self) -> Result<String> {
        self.inner
            .to_pem(pkcs8::LineEnding::LF)
            .map_err(|e| SignError::EncodingError(e.to_string()))
    }

    /// Decodes a DER certificate.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        Ok(Self {
            inner: CertificateInner::from_der(der)?,
        })
    }

    /// Decodes the first `CERTIFICATE` block of a PEM document.
    pub fn from_pem(pem_str: &str) -> Result<Self> {
        let block = pem::parse_many(pem_str)
            .map_err(|e| SignError::DecodingError(e.to_string()))?
            .into_iter()
            .find(|block| block.tag() == CERTIFICATE_PEM_LABEL)
            .ok_or_else(|| {
                SignError::DecodingError(format!("no {CERTIFICATE_PEM_LABEL} PEM block found"))
            })?;
        Self::from_der(block.contents())
    }

    pub fn subject(&self) -> &Name {
        &self.inner.tbs_certificate.subject
    }

    pub fn issuer(&self) -> &Name {
        &self.inner.tbs_certificate.issuer
    }

    /// Big-endian serial number bytes.
    pub fn serial_number(&self) -> &[u8] {
        self.inner.tbs_certificate.serial_number.as_bytes()
    }

    pub fn subject_public_key_info(&self) -> &SubjectPublicKeyInfoOwned {
        &self.inner.tbs_certificate.subject_public_key_info
    }

    /// Reads the validity window back as `OffsetDateTime`s.
    pub fn validity(&self) -> Result<Validity> {
        let validity = &self.inner.tbs_certificate.validity;
        Ok(Validity {
            not_before: offset_date_time(&validity.not_before)?,
            not_after: offset_date_time(&validity.not_after)?,
        })
    }

    /// Checks that this certificate was signed by the holder of `issuer_key`.
    pub fn verify_signed_by(&self, issuer_key: &PublicKey) -> Result<()> {
        let tbs = self.inner.tbs_certificate.to_der()?;
        let signature = self.inner.signature.as_bytes().ok_or_else(|| {
            SignError::InvalidSignature("signature has unused bits".to_string())
        })?;
        issuer_key.verify(&self.inner.signature_algorithm, &tbs, signature)
    }

    /// Creates a new self-signed CA certificate.
    ///
    /// # Arguments
    /// * `cert_info` - The certification request information.
    /// * `key` - The key pair used to sign the certificate.
    /// * `validity` - The validity window of the certificate.
    pub fn new_self_signed(
        cert_info: &CertificationRequestInfo,
        key: &KeyPair,
        validity: &Validity,
    ) -> Result<Self> {
        // For self-signed certificates, the issuer is the same as the subject
        let self_issuer = SelfIssuer {
            name: cert_info.subject.clone(),
            key,
        };
        self_issuer.issue(cert_info, validity)
    }
}

fn offset_date_time(time: &x509_cert::time::Time) -> Result<OffsetDateTime> {
    let since_epoch = time.to_unix_duration();
    let seconds = i64::try_from(since_epoch.as_secs())
        .map_err(|e| SignError::DecodingError(e.to_string()))?;
    OffsetDateTime::from_unix_timestamp(seconds)
        .map_err(|e| SignError::DecodingError(e.to_string()))
}

// Helper struct for self-signed certificates
struct SelfIssuer<'a> {
    name: Name,
    key: &'a KeyPair,
}

impl Issuer for SelfIssuer<'_> {
    fn issuer_name(&self) -> Name {
        self.name.clone()
    }

    fn signing_key(&self) -> &KeyPair {
        self.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::params::DistinguishedName;

    #[test]
    fn test_self_signed_certificate_round_trips_through_pem() {
        let key = KeyPair::generate_ecdsa_p256();
        let subject = DistinguishedName::builder()
            .common_name("Test CA".to_string())
            .build()
            .as_x509_name()
            .unwrap();
        let cert_info = CertificationRequestInfo::builder()
            .subject(subject.clone())
            .subject_public_key(key.as_spki().unwrap())
            .is_ca(true)
            .build();
        let validity = Validity::for_days(30).unwrap();

        let cert = Certificate::new_self_signed(&cert_info, &key, &validity).unwrap();
        let decoded = Certificate::from_pem(&cert.to_pem().unwrap()).unwrap();

        assert_eq!(decoded, cert);
        assert_eq!(decoded.subject(), &subject);
        assert_eq!(decoded.issuer(), &subject);
        assert_eq!(decoded.validity().unwrap(), validity);
        decoded
            .verify_signed_by(&PublicKey::from_key_pair(&key))
            .unwrap();
    }

    #[test]
    fn test_from_pem_requires_certificate_block() {
        let err = Certificate::from_pem("no pem here").unwrap_err();
        assert!(matches!(err, SignError::DecodingError(_)));
    }
}
