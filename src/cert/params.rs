use core::str::FromStr;

use bon::Builder;
use const_oid::ObjectIdentifier;
use time::{Duration, OffsetDateTime};
use x509_cert::name::Name;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use super::extensions::ToAndFromX509Extension;
use crate::error::{Result, SignError};

/// Parameters for building an X.509 certificate.
///
/// # Fields
/// * `subject` - The distinguished name of the certificate subject.
/// * `subject_public_key` - The public key of the certificate subject.
/// * `is_ca` - Indicates if the certificate is a CA.
#[derive(Clone, Debug, Builder)]
pub struct CertificationRequestInfo {
    pub subject: Name,
    pub subject_public_key: SubjectPublicKeyInfoOwned,
    #[builder(default)]
    pub is_ca: bool,
}

/// Distinguished name parameters for building an X.509 name.
///
/// # Fields
/// * `common_name` - The common name (CN).
/// * `country` - The country (C).
/// * `state` - The state or province (ST).
/// * `locality` - The locality or city (L).
/// * `organization` - The organization (O).
/// * `organization_unit` - The organizational unit (OU).
#[derive(Clone, Debug, Builder, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    pub common_name: String,
    pub country: Option<String>,
    pub state: Option<String>,
    pub locality: Option<String>,
    pub organization: Option<String>,
    pub organization_unit: Option<String>,
}

impl DistinguishedName {
    /// Converts the distinguished name to an X.509 name.
    ///
    /// Only the components that are set end up in the name.
    pub fn as_x509_name(&self) -> Result<Name> {
        let mut components = vec![format!("CN={}", escape_rfc4514(&self.common_name))];
        let optional = [
            ("OU", &self.organization_unit),
            ("O", &self.organization),
            ("L", &self.locality),
            ("ST", &self.state),
            ("C", &self.country),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                components.push(format!("{key}={}", escape_rfc4514(value)));
            }
        }

        Name::from_str(&components.join(","))
            .map_err(|e| SignError::EncodingError(format!("distinguished name: {e}")))
    }
}

fn escape_rfc4514(value: &str) -> String {
    let last = value.chars().count().saturating_sub(1);
    let mut escaped = String::with_capacity(value.len());
    for (i, c) in value.chars().enumerate() {
        let special = matches!(c, ',' | '+' | '"' | '\\' | '<' | '>' | ';')
            || (i == 0 && matches!(c, '#' | ' '))
            || (i == last && c == ' ');
        if special {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Certificate validity period.
///
/// # Fields
/// * `not_before` - The start of the validity period.
/// * `not_after` - The end of the validity period.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// Creates a validity period starting now for the given number of days.
    pub fn for_days(days: u32) -> Result<Self> {
        Self::starting_at(OffsetDateTime::now_utc(), days)
    }

    /// Creates a validity period of `days` days starting at `not_before`.
    ///
    /// X.509 times carry whole seconds, so `not_before` is truncated to keep the
    /// encoded window an exact number of days.
    pub fn starting_at(not_before: OffsetDateTime, days: u32) -> Result<Self> {
        let not_before = not_before
            .replace_nanosecond(0)
            .map_err(|e| SignError::IssuanceFailure(e.to_string()))?;
        let not_after = not_before
            .checked_add(Duration::days(i64::from(days)))
            .ok_or_else(|| SignError::IssuanceFailure(format!("{days} days overflows")))?;
        Ok(Self {
            not_before,
            not_after,
        })
    }

    /// Length of the window.
    pub fn duration(&self) -> Duration {
        self.not_after - self.not_before
    }
}

/// Represents an X.509 extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Creates an `ExtensionParam` from a specific extension.
    pub fn from_extension<E: ToAndFromX509Extension>(extension: &E, critical: bool) -> Result<Self> {
        Ok(Self {
            oid: E::OID,
            critical,
            value: extension.to_x509_extension_value()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinguished_name_components() {
        let dn = DistinguishedName::builder()
            .common_name("user1".to_string())
            .organization("Example Inc".to_string())
            .country("US".to_string())
            .build();

        let name = dn.as_x509_name().unwrap();
        assert_eq!(name.0.len(), 3);
        let rendered = name.to_string();
        for part in ["CN=user1", "O=Example Inc", "C=US"] {
            assert!(rendered.contains(part), "{rendered}");
        }
    }

    #[test]
    fn test_unset_components_are_left_out() {
        let dn = DistinguishedName::builder()
            .common_name("user1".to_string())
            .build();
        let name = dn.as_x509_name().unwrap();
        assert_eq!(name.0.len(), 1);
        assert_eq!(name.to_string(), "CN=user1");
    }

    #[test]
    fn test_validity_is_whole_days() {
        let start = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap()
            + Duration::milliseconds(750);
        let validity = Validity::starting_at(start, 3).unwrap();
        assert_eq!(validity.not_before.nanosecond(), 0);
        assert_eq!(validity.duration(), Duration::days(3));
    }
}
