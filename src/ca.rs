//! CA material loading.
//!
//! The CA certificate and private key are read once at startup into a
//! [`CaIdentity`] that is only ever borrowed afterwards.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use x509_cert::name::Name;

use crate::cert::Certificate;
use crate::cert::params::{CertificationRequestInfo, DistinguishedName, Validity};
use crate::error::{Result, SignError};
use crate::issuer::Issuer;
use crate::key::KeyPair;

/// Where to find the CA certificate and key.
///
/// Each file is looked up independently: the primary path when it is a
/// file, the fallback otherwise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaPaths {
    pub cert: PathBuf,
    pub cert_fallback: Option<PathBuf>,
    pub key: PathBuf,
    pub key_fallback: Option<PathBuf>,
}

impl CaPaths {
    /// Paths used by the container image, falling back to a checkout's
    /// `certs` directory.
    pub fn with_default_fallbacks() -> Self {
        Self {
            cert: PathBuf::from("./public.crt"),
            cert_fallback: Some(PathBuf::from("../certs/public.crt")),
            key: PathBuf::from("./privatekey.pem"),
            key_fallback: Some(PathBuf::from("../certs/privatekey.pem")),
        }
    }

    /// The certificate and key paths that will actually be read.
    pub fn resolve(&self) -> (PathBuf, PathBuf) {
        (
            resolve_path(&self.cert, self.cert_fallback.as_deref()),
            resolve_path(&self.key, self.key_fallback.as_deref()),
        )
    }
}

fn resolve_path(primary: &Path, fallback: Option<&Path>) -> PathBuf {
    match fallback {
        Some(fallback) if !primary.is_file() => fallback.to_path_buf(),
        _ => primary.to_path_buf(),
    }
}

/// The certificate and private key the service signs with.
#[derive(Clone, Debug)]
pub struct CaIdentity {
    cert: Certificate,
    key: KeyPair,
}

impl CaIdentity {
    /// Pairs a CA certificate with its private key.
    ///
    /// The key is expected to match the certificate's public key; a mismatch
    /// is logged but not rejected.
    pub fn new(cert: Certificate, key: KeyPair) -> Self {
        match key.as_spki() {
            Ok(spki) if &spki == cert.subject_public_key_info() => {}
            _ => warn!(
                subject = %cert.subject(),
                "CA private key does not match the CA certificate public key"
            ),
        }
        Self { cert, key }
    }

    /// Reads the CA material from disk. Every failure is a
    /// [`SignError::StartupFailure`].
    pub fn load(paths: &CaPaths) -> Result<Self> {
        let (cert_path, key_path) = paths.resolve();
        let cert_pem = read_file(&cert_path, "CA certificate")?;
        let key_pem = read_file(&key_path, "CA private key")?;

        let identity = Self::from_pem(&cert_pem, &key_pem)?;
        info!(
            cert = %cert_path.display(),
            key = %key_path.display(),
            subject = %identity.subject(),
            algorithm = identity.key.algorithm_name(),
            "loaded CA material"
        );
        Ok(identity)
    }

    /// Parses a PEM certificate and an unencrypted PEM private key.
    pub fn from_pem(cert_pem: &str, key_pem: &str) -> Result<Self> {
        let cert = Certificate::from_pem(cert_pem)
            .map_err(|e| SignError::StartupFailure(format!("CA certificate: {e}")))?;
        let key = KeyPair::import_from_pem(key_pem)
            .map_err(|e| SignError::StartupFailure(format!("CA private key: {e}")))?;
        Ok(Self::new(cert, key))
    }

    /// Creates a self-signed CA, for bootstrapping test and development setups.
    pub fn generate_self_signed(
        subject: &DistinguishedName,
        key: KeyPair,
        days: u32,
    ) -> Result<Self> {
        let cert_info = CertificationRequestInfo::builder()
            .subject(subject.as_x509_name()?)
            .subject_public_key(key.as_spki()?)
            .is_ca(true)
            .build();
        let cert = Certificate::new_self_signed(&cert_info, &key, &Validity::for_days(days)?)?;
        Ok(Self { cert, key })
    }

    pub fn certificate(&self) -> &Certificate {
        &self.cert
    }

    pub fn key(&self) -> &KeyPair {
        &self.key
    }

    pub fn subject(&self) -> &Name {
        self.cert.subject()
    }
}

impl Issuer for CaIdentity {
    fn issuer_name(&self) -> Name {
        // The name of the issuer is the subject of the certificate
        self.cert.subject().clone()
    }

    fn signing_key(&self) -> &KeyPair {
        &self.key
    }
}

fn read_file(path: &Path, what: &str) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        SignError::StartupFailure(format!("failed to read {what} {}: {e}", path.display()))
    })
}
