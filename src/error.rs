//! Errors raised while loading CA material and issuing certificates.

use thiserror::Error;

/// Represents errors that can occur while issuing certificates.
///
/// The first five variants are the failure taxonomy of the signing pipeline; the
/// remaining ones are raised by the lower-level codecs and are folded into
/// [`SignError::IssuanceFailure`] or [`SignError::StartupFailure`] at the
/// pipeline boundaries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignError {
    /// The CSR lacks the PEM markers or its body does not decode.
    #[error("Invalid CSR PEM content: {0}")]
    InvalidFormat(String),

    /// The CSR decodes but its self-signature does not verify.
    #[error("Invalid CSR signature: {0}")]
    InvalidSignature(String),

    /// The requested validity is zero or negative.
    #[error("Invalid validity: {0} days, must be at least 1")]
    InvalidValidity(i64),

    /// Building or signing the certificate failed despite valid input.
    #[error("Certificate issuance failed: {0}")]
    IssuanceFailure(String),

    /// CA material is missing or unusable.
    #[error("Startup failure: {0}")]
    StartupFailure(String),

    /// A key or signature algorithm this service does not handle.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// Error during data decoding.
    #[error("Failed to decode data: {0}")]
    DecodingError(String),
}

impl SignError {
    /// Whether the failure was caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SignError::InvalidFormat(_)
                | SignError::InvalidSignature(_)
                | SignError::InvalidValidity(_)
                | SignError::UnsupportedAlgorithm(_)
        )
    }
}

impl From<der::Error> for SignError {
    /// Converts a `der::Error` into a `SignError`.
    fn from(err: der::Error) -> Self {
        SignError::DecodingError(err.to_string())
    }
}

impl From<rsa::Error> for SignError {
    fn from(err: rsa::Error) -> Self {
        SignError::IssuanceFailure(err.to_string())
    }
}

impl From<pkcs8::spki::Error> for SignError {
    fn from(err: pkcs8::spki::Error) -> Self {
        SignError::EncodingError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SignError>;
