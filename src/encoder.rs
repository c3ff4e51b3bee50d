use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::cert::Certificate;
use crate::error::{Result, SignError};

/// Wire format of issued certificates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// PEM text with `CERTIFICATE` markers.
    #[default]
    Pem,
    /// DER bytes, base64 encoded so they fit in a JSON string.
    Der,
}

/// Renders a certificate in `format`.
pub fn encode_certificate(cert: &Certificate, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Pem => cert.to_pem(),
        OutputFormat::Der => Ok(STANDARD.encode(cert.to_der()?)),
    }
}

/// Inverse of [`encode_certificate`].
pub fn decode_certificate(encoded: &str, format: OutputFormat) -> Result<Certificate> {
    match format {
        OutputFormat::Pem => Certificate::from_pem(encoded),
        OutputFormat::Der => {
            let der = STANDARD
                .decode(encoded.trim())
                .map_err(|e| SignError::DecodingError(e.to_string()))?;
            Certificate::from_der(&der)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ca::CaIdentity;
    use crate::cert::params::DistinguishedName;
    use crate::key::KeyPair;

    fn sample_certificate() -> Certificate {
        let subject = DistinguishedName::builder()
            .common_name("encoder".to_string())
            .build();
        CaIdentity::generate_self_signed(&subject, KeyPair::generate_ed25519(), 1)
            .unwrap()
            .certificate()
            .clone()
    }

    #[test]
    fn test_pem_output_has_markers() {
        let pem = encode_certificate(&sample_certificate(), OutputFormat::Pem).unwrap();
        assert!(pem.starts_with("-----BEGIN CERTIFICATE-----\n"));
        assert!(pem.trim_end().ends_with("-----END CERTIFICATE-----"));
    }

    #[test]
    fn test_der_output_is_base64_of_der() {
        let cert = sample_certificate();
        let encoded = encode_certificate(&cert, OutputFormat::Der).unwrap();
        assert_eq!(STANDARD.decode(&encoded).unwrap(), cert.to_der().unwrap());
        assert_eq!(decode_certificate(&encoded, OutputFormat::Der).unwrap(), cert);
    }
}
