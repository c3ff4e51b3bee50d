//! # signsrv - A Minimal Certificate Authority Signing Service
//!
//! signsrv accepts PEM certificate signing requests, checks that the requester
//! holds the private key, and issues short-lived X.509 certificates signed by a
//! locally held CA key. It is built entirely on the rustcrypto libraries.
//!
//! ## Supported Key Types
//!
//! For the CA key and for CSR keys:
//! - **RSA**: PKCS#1 v1.5 signatures
//! - **ECDSA**: P-256 and P-384 curves
//! - **Ed25519**: Edwards curve digital signature algorithm
//!
//! The CA signs with SHA-256 (RSA, P-256), SHA-384 (P-384) or Ed25519.
//!
//! ## Issuing a Certificate
//!
//! ```rust,no_run
//! use signsrv::{
//!     ca::{CaIdentity, CaPaths},
//!     encoder::OutputFormat,
//!     policy::ValidityPolicy,
//!     service::{SignRequest, SigningService},
//! };
//!
//! # fn main() -> Result<(), signsrv::error::SignError> {
//! let ca = CaIdentity::load(&CaPaths::with_default_fallbacks())?;
//! let service = SigningService::new(ca, ValidityPolicy::new(3)?, OutputFormat::Pem, "node-1");
//!
//! let response = service.sign(&SignRequest {
//!     name: "client-1".to_string(),
//!     csr: std::fs::read_to_string("client.csr").unwrap(),
//!     validity: Some(30),
//! })?;
//! println!("{}", response.result);
//! # Ok(())
//! # }
//! ```
//!
//! ## Creating a CSR
//!
//! ```rust
//! use signsrv::{cert::params::DistinguishedName, csr::CertificationRequest, key::KeyPair};
//!
//! # fn main() -> Result<(), signsrv::error::SignError> {
//! let key = KeyPair::generate_ecdsa_p256();
//! let subject = DistinguishedName::builder()
//!     .common_name("user1".to_string())
//!     .build();
//! let csr = CertificationRequest::new_signed(subject.as_x509_name()?, &key)?;
//! assert!(csr.to_pem()?.starts_with("-----BEGIN CERTIFICATE REQUEST-----"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use signsrv::{csr::load_csr_from_str, error::SignError};
//!
//! match load_csr_from_str("not-a-csr") {
//!     Err(SignError::InvalidFormat(msg)) => println!("rejected: {}", msg),
//!     Err(SignError::InvalidSignature(msg)) => println!("bad signature: {}", msg),
//!     Err(e) => println!("Other error: {}", e),
//!     Ok(_) => unreachable!(),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`ca`]: CA material loading and the CA identity
//! - [`csr`]: CSR parsing, signature verification and creation
//! - [`policy`]: Validity period resolution
//! - [`issuer`]: Certificate issuing and serial numbers
//! - [`encoder`]: PEM / DER output
//! - [`service`]: The per-request signing pipeline
//! - [`cert`]: Certificate type, parameters and extensions
//! - [`key`]: Key import/export, signing and verification
//! - [`tbs_certificate`]: Low-level certificate structure
//! - [`config`], [`http`], [`logging`]: The server shell

pub mod ca;
pub mod cert;
pub mod config;
pub mod csr;
pub mod encoder;
pub mod error;
pub mod http;
pub mod issuer;
pub mod key;
pub mod logging;
pub mod policy;
pub mod service;
pub mod tbs_certificate;
