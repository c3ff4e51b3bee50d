//! The per-request signing pipeline.
//!
//! `Received → Parsed → SignatureVerified → ValidityResolved → Signed → Encoded`,
//! with early rejection after `Received` (format) or `Parsed` (signature).
//! Requests share nothing but the read-only [`CaIdentity`], so a
//! [`SigningService`] can be used from any number of threads at once.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::ca::CaIdentity;
use crate::cert::Certificate;
use crate::cert::params::Validity;
use crate::csr::CertificationRequest;
use crate::encoder::{OutputFormat, encode_certificate};
use crate::error::{Result, SignError};
use crate::issuer::Issuer;
use crate::policy::ValidityPolicy;

/// Inbound signing request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignRequest {
    /// Opaque requester identifier, echoed back.
    pub name: String,
    /// PEM-encoded CSR.
    pub csr: String,
    /// Requested validity in days.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validity: Option<i64>,
}

/// Outbound signing response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignResponse {
    #[serde(rename = "Request from")]
    pub name: String,
    /// The encoded certificate.
    #[serde(rename = "Result")]
    pub result: String,
    pub node: String,
}

#[derive(Debug)]
pub struct SigningService {
    ca: CaIdentity,
    policy: ValidityPolicy,
    output_format: OutputFormat,
    node_name: String,
}

impl SigningService {
    pub fn new(
        ca: CaIdentity,
        policy: ValidityPolicy,
        output_format: OutputFormat,
        node_name: impl Into<String>,
    ) -> Self {
        Self {
            ca,
            policy,
            output_format,
            node_name: node_name.into(),
        }
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    /// Validates `csr_pem` and issues a certificate for it.
    pub fn issue(&self, csr_pem: &str, requested_validity: Option<i64>) -> Result<Certificate> {
        let parsed = CertificationRequest::parse_pem(csr_pem).inspect_err(|err| {
            debug!(error = %err, csr = csr_pem, "rejecting CSR with invalid PEM content");
        })?;

        let verified = parsed.verify_signature().inspect_err(|err| {
            debug!(error = %err, csr = csr_pem, "rejecting CSR with invalid signature");
        })?;

        let days = self.policy.resolve(requested_validity)?;
        let validity = Validity::for_days(days)?;

        let cert = self
            .ca
            .issue(&verified.to_request_info(), &validity)
            .inspect_err(|err| error!(error = %err, "certificate issuance failed"))?;

        info!(
            subject = %cert.subject(),
            serial = %hex(cert.serial_number()),
            days,
            "issued certificate"
        );
        Ok(cert)
    }

    /// Runs the full pipeline for one request, including encoding.
    pub fn sign(&self, request: &SignRequest) -> Result<SignResponse> {
        debug!(name = %request.name, "signing request received");
        let cert = self.issue(&request.csr, request.validity)?;
        let result = encode_certificate(&cert, self.output_format)
            .map_err(|e| SignError::IssuanceFailure(e.to_string()))?;

        Ok(SignResponse {
            name: request.name.clone(),
            result,
            node: self.node_name.clone(),
        })
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
