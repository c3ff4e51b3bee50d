use der::asn1::{GeneralizedTime, OctetString, UtcTime};
use der::DateTime;
use time::OffsetDateTime;
use x509_cert::Version;
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::SignatureAlgorithm;
use crate::cert::params::{ExtensionParam, Validity};
use crate::error::{Result, SignError};

/// Represents the "To Be Signed" (TBS) portion of an X.509 certificate.
///
/// Every field is supplied up front; there is no partially built state.
///
/// # Fields
/// * `serial_number` - The unique identifier for the certificate.
/// * `signature_algorithm` - The algorithm used to sign the certificate.
/// * `issuer` - The distinguished name of the certificate issuer.
/// * `validity` - The certificate's validity window.
/// * `subject` - The distinguished name of the certificate subject.
/// * `subject_public_key` - The public key of the certificate subject.
/// * `extensions` - Additional X.509 extensions for the certificate.
#[derive(Clone, Debug)]
pub struct TbsCertificate {
    pub serial_number: Vec<u8>,
    pub signature_algorithm: SignatureAlgorithm,
    pub issuer: Name,
    pub validity: Validity,
    pub subject: Name,
    pub subject_public_key: SubjectPublicKeyInfoOwned,
    pub extensions: Vec<ExtensionParam>,
}

impl TbsCertificate {
    /// Converts the `TbsCertificate` into a `TbsCertificateInner` for DER encoding.
    pub fn to_tbs_certificate_inner(&self) -> Result<TbsCertificateInner> {
        let extensions = self
            .extensions
            .iter()
            .map(|ext| -> Result<x509_cert::ext::Extension> {
                Ok(x509_cert::ext::Extension {
                    extn_id: ext.oid,
                    critical: ext.critical,
                    extn_value: OctetString::new(ext.value.clone())?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let validity = x509_cert::time::Validity {
            not_before: x509_time(self.validity.not_before)?,
            not_after: x509_time(self.validity.not_after)?,
        };

        let serial_number = SerialNumber::new(self.serial_number.as_slice())?;

        Ok(TbsCertificateInner {
            version: Version::V3,
            serial_number,
            signature: self.signature_algorithm.into(),
            issuer: self.issuer.clone(),
            validity,
            subject: self.subject.clone(),
            subject_public_key_info: self.subject_public_key.clone(),
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: if extensions.is_empty() {
                None
            } else {
                Some(extensions)
            },
        })
    }
}

/// UTCTime through 2049, GeneralizedTime from 2050 on (RFC 5280 section 4.1.2.5).
fn x509_time(at: OffsetDateTime) -> Result<x509_cert::time::Time> {
    let seconds = u64::try_from(at.unix_timestamp())
        .map_err(|_| SignError::IssuanceFailure(format!("{at} predates the unix epoch")))?;
    let date_time = DateTime::from_unix_duration(std::time::Duration::from_secs(seconds))
        .map_err(|e| SignError::IssuanceFailure(e.to_string()))?;

    if at.year() < 2050 {
        Ok(x509_cert::time::Time::UtcTime(
            UtcTime::from_date_time(date_time)
                .map_err(|e| SignError::IssuanceFailure(e.to_string()))?,
        ))
    } else {
        Ok(x509_cert::time::Time::GeneralTime(
            GeneralizedTime::from_date_time(date_time),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyPair;

    fn tbs_with_validity(validity: Validity) -> TbsCertificate {
        let name = crate::cert::params::DistinguishedName::builder()
            .common_name("tbs".to_string())
            .build()
            .as_x509_name()
            .unwrap();
        TbsCertificate {
            serial_number: vec![0x42, 0x01],
            signature_algorithm: SignatureAlgorithm::Ed25519,
            issuer: name.clone(),
            validity,
            subject: name,
            subject_public_key: KeyPair::generate_ed25519().as_spki().unwrap(),
            extensions: vec![],
        }
    }

    #[test]
    fn test_times_switch_to_generalized_in_2050() {
        let start = OffsetDateTime::from_unix_timestamp(2_524_000_000).unwrap(); // late 2049
        let validity = Validity::starting_at(start, 30).unwrap();
        let inner = tbs_with_validity(validity).to_tbs_certificate_inner().unwrap();

        assert!(matches!(
            inner.validity.not_before,
            x509_cert::time::Time::UtcTime(_)
        ));
        assert!(matches!(
            inner.validity.not_after,
            x509_cert::time::Time::GeneralTime(_)
        ));
    }

    #[test]
    fn test_no_extensions_encodes_without_extension_field() {
        let validity = Validity::starting_at(OffsetDateTime::now_utc(), 1).unwrap();
        let inner = tbs_with_validity(validity).to_tbs_certificate_inner().unwrap();
        assert!(inner.extensions.is_none());
        assert_eq!(
            inner.validity.not_after.to_unix_duration() - inner.validity.not_before.to_unix_duration(),
            std::time::Duration::from_secs(86_400)
        );
    }
}
