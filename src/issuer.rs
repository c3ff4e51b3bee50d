use der::Encode;
use der::asn1::BitString;
use rand::RngCore;
use x509_cert::certificate::CertificateInner;
use x509_cert::name::Name;

use crate::cert::Certificate;
use crate::cert::extensions::{
    AuthorityKeyIdentifier, BasicConstraints, KeyUsage, KeyUsages, SubjectKeyIdentifier,
};
use crate::cert::params::{CertificationRequestInfo, ExtensionParam, Validity};
use crate::error::{Result, SignError};
use crate::key::KeyPair;
use crate::tbs_certificate::TbsCertificate;

/// Length of generated serial numbers, the RFC 5280 maximum.
pub const SERIAL_NUMBER_LEN: usize = 20;

/// Draws a fresh positive serial number from the thread-local CSPRNG.
///
/// The top bit is cleared so the INTEGER stays positive and the next one is set
/// so the encoding keeps its full length, leaving 158 random bits.
pub fn random_serial_number() -> Vec<u8> {
    let mut serial = vec![0u8; SERIAL_NUMBER_LEN];
    rand::rng().fill_bytes(&mut serial);
    serial[0] = (serial[0] & 0x7f) | 0x40;
    serial
}

/// Represents an entity capable of issuing certificates.
///
/// This trait provides methods to retrieve issuer details and issue certificates.
pub trait Issuer {
    /// Returns the distinguished name of the issuer.
    fn issuer_name(&self) -> Name;

    /// Returns the signing key of the issuer.
    fn signing_key(&self) -> &KeyPair;

    /// Issues a certificate based on the provided certification request information.
    ///
    /// # Arguments
    /// * `cert_request` - Subject, public key and CA flag of the certificate to issue.
    /// * `validity` - The validity window of the certificate.
    ///
    /// # Returns
    /// The signed `Certificate`. Any failure is reported as
    /// [`SignError::IssuanceFailure`].
    fn issue(
        &self,
        cert_request: &CertificationRequestInfo,
        validity: &Validity,
    ) -> Result<Certificate> {
        build_and_sign(self, cert_request, validity).map_err(|err| match err {
            SignError::IssuanceFailure(_) => err,
            other => SignError::IssuanceFailure(other.to_string()),
        })
    }
}

fn build_and_sign<I: Issuer + ?Sized>(
    issuer: &I,
    cert_request: &CertificationRequestInfo,
    validity: &Validity,
) -> Result<Certificate> {
    let signing_key = issuer.signing_key();
    let signature_algorithm = signing_key.signature_algorithm();
    let issuer_public_key = signing_key.as_spki()?;

    let basic_constraints = BasicConstraints {
        is_ca: cert_request.is_ca,
        max_path_length: None,
    };

    let mut extensions = vec![
        ExtensionParam::from_extension(&basic_constraints, true)?,
        ExtensionParam::from_extension(
            &SubjectKeyIdentifier::from_spki(&cert_request.subject_public_key),
            false,
        )?,
        ExtensionParam::from_extension(
            &AuthorityKeyIdentifier::from_spki(&issuer_public_key),
            false,
        )?,
    ];

    if cert_request.is_ca {
        let key_usage = KeyUsage(KeyUsages::KeyCertSign | KeyUsages::CRLSign);
        extensions.push(ExtensionParam::from_extension(&key_usage, true)?);
    }

    let tbs_cert = TbsCertificate {
        serial_number: random_serial_number(),
        signature_algorithm,
        issuer: issuer.issuer_name(),
        validity: validity.clone(),
        subject: cert_request.subject.clone(),
        subject_public_key: cert_request.subject_public_key.clone(),
        extensions,
    };

    let tbs_cert_inner = tbs_cert.to_tbs_certificate_inner()?;
    let signature = signing_key.sign_data(&tbs_cert_inner.to_der()?)?;

    let cert_inner = CertificateInner {
        tbs_certificate: tbs_cert_inner,
        signature_algorithm: signature_algorithm.into(),
        signature: BitString::from_bytes(&signature)?,
    };

    Ok(Certificate { inner: cert_inner })
}
