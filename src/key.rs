use const_oid::AssociatedOid;
use const_oid::db::{rfc5912, rfc8410};
use der::{Decode, Encode};
use ecdsa::signature::hazmat::PrehashVerifier;
use ecdsa::signature::{SignatureEncoding, Signer, Verifier};
use ed25519_dalek::{SigningKey as Ed25519SigningKey, VerifyingKey as Ed25519VerifyingKey};
use p256::ecdsa::{SigningKey as P256SigningKey, VerifyingKey as P256VerifyingKey};
use p384::ecdsa::{SigningKey as P384SigningKey, VerifyingKey as P384VerifyingKey};
use pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256, Sha384, Sha512};
use x509_cert::spki::{AlgorithmIdentifierOwned, ObjectIdentifier, SubjectPublicKeyInfoOwned};

use crate::cert::SignatureAlgorithm;
use crate::error::{Result, SignError};

/// Private keys a CA can sign with.
#[derive(Clone)]
pub enum KeyPair {
    Rsa {
        private: Box<RsaPrivateKey>,
        public: RsaPublicKey,
    },
    EcdsaP256 {
        signing_key: P256SigningKey,
    },
    EcdsaP384 {
        signing_key: P384SigningKey,
    },
    Ed25519 {
        signing_key: Ed25519SigningKey,
    },
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("KeyPair").field(&self.algorithm_name()).finish()
    }
}

impl KeyPair {
    /// Generate an RSA key pair with the specified number of bits.
    pub fn generate_rsa(bits: usize) -> Result<Self> {
        let mut rng = rand_core::OsRng;
        let private = RsaPrivateKey::new(&mut rng, bits)?;
        Ok(Self::from_rsa(private))
    }

    /// Generate an ECDSA P-256 key pair.
    pub fn generate_ecdsa_p256() -> Self {
        let mut rng = rand_core::OsRng;
        KeyPair::EcdsaP256 {
            signing_key: P256SigningKey::random(&mut rng),
        }
    }

    /// Generate an ECDSA P-384 key pair.
    pub fn generate_ecdsa_p384() -> Self {
        let mut rng = rand_core::OsRng;
        KeyPair::EcdsaP384 {
            signing_key: P384SigningKey::random(&mut rng),
        }
    }

    /// Generate an Ed25519 key pair.
    pub fn generate_ed25519() -> Self {
        let mut rng = rand_core::OsRng;
        KeyPair::Ed25519 {
            signing_key: Ed25519SigningKey::generate(&mut rng),
        }
    }

    fn from_rsa(private: RsaPrivateKey) -> Self {
        let public = RsaPublicKey::from(&private);
        KeyPair::Rsa {
            private: Box::new(private),
            public,
        }
    }

    /// Short human readable name of the key algorithm.
    pub fn algorithm_name(&self) -> &'static str {
        match self {
            KeyPair::Rsa { .. } => "RSA",
            KeyPair::EcdsaP256 { .. } => "ECDSA P-256",
            KeyPair::EcdsaP384 { .. } => "ECDSA P-384",
            KeyPair::Ed25519 { .. } => "Ed25519",
        }
    }

    /// Imports an unencrypted private key from PEM.
    ///
    /// Accepts PKCS#8 (`PRIVATE KEY`), PKCS#1 (`RSA PRIVATE KEY`) and
    /// SEC1 (`EC PRIVATE KEY`) documents.
    pub fn import_from_pem(pem_str: &str) -> Result<Self> {
        let parsed = pem::parse(pem_str).map_err(|e| SignError::DecodingError(e.to_string()))?;
        let der = parsed.contents();
        match parsed.tag() {
            "PRIVATE KEY" => Self::import_from_pkcs8_der(der),
            "RSA PRIVATE KEY" => {
                let private = RsaPrivateKey::from_pkcs1_der(der)
                    .map_err(|e| SignError::DecodingError(e.to_string()))?;
                Ok(Self::from_rsa(private))
            }
            "EC PRIVATE KEY" => Self::import_from_sec1_der(der),
            "ENCRYPTED PRIVATE KEY" => Err(SignError::DecodingError(
                "encrypted private keys are not supported".to_string(),
            )),
            other => Err(SignError::DecodingError(format!(
                "unexpected PEM label {other:?}"
            ))),
        }
    }

    /// Imports an unencrypted PKCS#8 DER private key.
    pub fn import_from_pkcs8_der(der: &[u8]) -> Result<Self> {
        let info = pkcs8::PrivateKeyInfo::try_from(der)
            .map_err(|e| SignError::DecodingError(e.to_string()))?;
        let decoding = |e: pkcs8::Error| SignError::DecodingError(e.to_string());

        match info.algorithm.oid {
            rfc5912::RSA_ENCRYPTION => {
                let private = RsaPrivateKey::from_pkcs8_der(der).map_err(decoding)?;
                Ok(Self::from_rsa(private))
            }
            rfc5912::ID_EC_PUBLIC_KEY => match info.algorithm.parameters_oid() {
                Ok(rfc5912::SECP_256_R_1) => Ok(KeyPair::EcdsaP256 {
                    signing_key: P256SigningKey::from_pkcs8_der(der).map_err(decoding)?,
                }),
                Ok(rfc5912::SECP_384_R_1) => Ok(KeyPair::EcdsaP384 {
                    signing_key: P384SigningKey::from_pkcs8_der(der).map_err(decoding)?,
                }),
                Ok(curve) => Err(SignError::UnsupportedAlgorithm(format!(
                    "elliptic curve {curve}"
                ))),
                Err(e) => Err(SignError::DecodingError(e.to_string())),
            },
            rfc8410::ID_ED_25519 => Ok(KeyPair::Ed25519 {
                signing_key: Ed25519SigningKey::from_pkcs8_der(der).map_err(decoding)?,
            }),
            oid => Err(SignError::UnsupportedAlgorithm(format!("private key {oid}"))),
        }
    }

    fn import_from_sec1_der(der: &[u8]) -> Result<Self> {
        if let Ok(secret) = p256::SecretKey::from_sec1_der(der) {
            return Ok(KeyPair::EcdsaP256 {
                signing_key: P256SigningKey::from(secret),
            });
        }
        let secret = p384::SecretKey::from_sec1_der(der)
            .map_err(|e| SignError::DecodingError(format!("EC private key: {e}")))?;
        Ok(KeyPair::EcdsaP384 {
            signing_key: P384SigningKey::from(secret),
        })
    }

    /// Exports the private key as an unencrypted PKCS#8 PEM document.
    pub fn to_pkcs8_pem(&self) -> Result<String> {
        let pem = match self {
            KeyPair::Rsa { private, .. } => private.to_pkcs8_pem(LineEnding::LF),
            KeyPair::EcdsaP256 { signing_key } => signing_key.to_pkcs8_pem(LineEnding::LF),
            KeyPair::EcdsaP384 { signing_key } => signing_key.to_pkcs8_pem(LineEnding::LF),
            KeyPair::Ed25519 { signing_key } => signing_key.to_pkcs8_pem(LineEnding::LF),
        }
        .map_err(|e| SignError::EncodingError(e.to_string()))?;
        Ok(String::from(pem.as_str()))
    }

    /// Returns the SubjectPublicKeyInfo of the public half.
    pub fn as_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        PublicKey::from_key_pair(self).to_spki()
    }

    /// The algorithm [`KeyPair::sign_data`] produces signatures for.
    ///
    /// ECDSA keys use the digest matching their curve size.
    pub fn signature_algorithm(&self) -> SignatureAlgorithm {
        match self {
            KeyPair::Rsa { .. } => SignatureAlgorithm::Sha256WithRSA,
            KeyPair::EcdsaP256 { .. } => SignatureAlgorithm::Sha256WithECDSA,
            KeyPair::EcdsaP384 { .. } => SignatureAlgorithm::Sha384WithECDSA,
            KeyPair::Ed25519 { .. } => SignatureAlgorithm::Ed25519,
        }
    }

    /// Signs `data` and returns the signature in the encoding X.509 expects
    /// (DER `Ecdsa-Sig-Value` for ECDSA, raw bytes otherwise).
    pub fn sign_data(&self, data: &[u8]) -> Result<Vec<u8>> {
        let failed = |e: ecdsa::signature::Error| SignError::IssuanceFailure(e.to_string());
        match self {
            KeyPair::Rsa { private, .. } => {
                let signing_key = rsa::pkcs1v15::SigningKey::<Sha256>::new(*private.clone());
                let signature = signing_key.try_sign(data).map_err(failed)?;
                Ok(signature.to_vec())
            }
            KeyPair::EcdsaP256 { signing_key } => {
                let signature: p256::ecdsa::Signature =
                    signing_key.try_sign(data).map_err(failed)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            KeyPair::EcdsaP384 { signing_key } => {
                let signature: p384::ecdsa::Signature =
                    signing_key.try_sign(data).map_err(failed)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            KeyPair::Ed25519 { signing_key } => {
                let signature: ed25519_dalek::Signature =
                    signing_key.try_sign(data).map_err(failed)?;
                Ok(signature.to_bytes().to_vec())
            }
        }
    }
}

/// Public keys found in CSRs and certificates.
#[derive(Clone, Debug)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    EcdsaP256(P256VerifyingKey),
    EcdsaP384(P384VerifyingKey),
    Ed25519(Ed25519VerifyingKey),
}

impl PublicKey {
    pub fn from_key_pair(key_pair: &KeyPair) -> Self {
        match key_pair {
            KeyPair::Rsa { public, .. } => PublicKey::Rsa(public.clone()),
            KeyPair::EcdsaP256 { signing_key } => PublicKey::EcdsaP256(*signing_key.verifying_key()),
            KeyPair::EcdsaP384 { signing_key } => PublicKey::EcdsaP384(*signing_key.verifying_key()),
            KeyPair::Ed25519 { signing_key } => PublicKey::Ed25519(signing_key.verifying_key()),
        }
    }

    /// Decodes a SubjectPublicKeyInfo into one of the supported key types.
    pub fn from_x509spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self> {
        let der = spki.to_der()?;
        let decoding = |e: pkcs8::spki::Error| SignError::DecodingError(e.to_string());

        match spki.algorithm.oid {
            rfc5912::RSA_ENCRYPTION => RsaPublicKey::from_public_key_der(&der)
                .map(PublicKey::Rsa)
                .map_err(decoding),
            // The curve OID in the parameters is checked by each decoder.
            rfc5912::ID_EC_PUBLIC_KEY => P256VerifyingKey::from_public_key_der(&der)
                .map(PublicKey::EcdsaP256)
                .or_else(|_| P384VerifyingKey::from_public_key_der(&der).map(PublicKey::EcdsaP384))
                .map_err(|_| {
                    SignError::UnsupportedAlgorithm(
                        "only P-256 and P-384 elliptic curve keys are supported".to_string(),
                    )
                }),
            rfc8410::ID_ED_25519 => Ed25519VerifyingKey::from_public_key_der(&der)
                .map(PublicKey::Ed25519)
                .map_err(decoding),
            oid => Err(SignError::UnsupportedAlgorithm(format!("public key {oid}"))),
        }
    }

    pub fn to_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        let document = match self {
            PublicKey::Rsa(key) => key.to_public_key_der()?,
            PublicKey::EcdsaP256(key) => key.to_public_key_der()?,
            PublicKey::EcdsaP384(key) => key.to_public_key_der()?,
            PublicKey::Ed25519(key) => key.to_public_key_der()?,
        };
        Ok(SubjectPublicKeyInfoOwned::from_der(document.as_bytes())?)
    }

    /// Verifies `signature` over `message` made with `algorithm`.
    ///
    /// A signature that does not verify yields [`SignError::InvalidSignature`];
    /// an algorithm that does not fit this key yields
    /// [`SignError::UnsupportedAlgorithm`].
    pub fn verify(
        &self,
        algorithm: &AlgorithmIdentifierOwned,
        message: &[u8],
        signature: &[u8],
    ) -> Result<()> {
        match self {
            PublicKey::Rsa(key) => match algorithm.oid {
                rfc5912::SHA_256_WITH_RSA_ENCRYPTION => {
                    verify_rsa::<Sha256>(key, message, signature)
                }
                rfc5912::SHA_384_WITH_RSA_ENCRYPTION => {
                    verify_rsa::<Sha384>(key, message, signature)
                }
                rfc5912::SHA_512_WITH_RSA_ENCRYPTION => {
                    verify_rsa::<Sha512>(key, message, signature)
                }
                oid => Err(mismatch("RSA", oid)),
            },
            PublicKey::EcdsaP256(key) => {
                let prehash = ecdsa_prehash("ECDSA P-256", &algorithm.oid, message)?;
                let signature =
                    p256::ecdsa::Signature::from_der(signature).map_err(invalid_signature)?;
                key.verify_prehash(&prehash, &signature)
                    .map_err(invalid_signature)
            }
            PublicKey::EcdsaP384(key) => {
                let prehash = ecdsa_prehash("ECDSA P-384", &algorithm.oid, message)?;
                let signature =
                    p384::ecdsa::Signature::from_der(signature).map_err(invalid_signature)?;
                key.verify_prehash(&prehash, &signature)
                    .map_err(invalid_signature)
            }
            PublicKey::Ed25519(key) => {
                if algorithm.oid != rfc8410::ID_ED_25519 {
                    return Err(mismatch("Ed25519", algorithm.oid));
                }
                let signature =
                    ed25519_dalek::Signature::from_slice(signature).map_err(invalid_signature)?;
                key.verify_strict(message, &signature)
                    .map_err(invalid_signature)
            }
        }
    }
}

fn verify_rsa<D>(key: &RsaPublicKey, message: &[u8], signature: &[u8]) -> Result<()>
where
    D: Digest + AssociatedOid,
{
    let verifying_key = rsa::pkcs1v15::VerifyingKey::<D>::new(key.clone());
    let signature = rsa::pkcs1v15::Signature::try_from(signature).map_err(invalid_signature)?;
    verifying_key
        .verify(message, &signature)
        .map_err(invalid_signature)
}

fn ecdsa_prehash(key_name: &str, oid: &ObjectIdentifier, message: &[u8]) -> Result<Vec<u8>> {
    match *oid {
        rfc5912::ECDSA_WITH_SHA_256 => Ok(Sha256::digest(message).to_vec()),
        rfc5912::ECDSA_WITH_SHA_384 => Ok(Sha384::digest(message).to_vec()),
        rfc5912::ECDSA_WITH_SHA_512 => Ok(Sha512::digest(message).to_vec()),
        other => Err(mismatch(key_name, other)),
    }
}

fn invalid_signature(err: ecdsa::signature::Error) -> SignError {
    SignError::InvalidSignature(err.to_string())
}

fn mismatch(key_name: &str, oid: ObjectIdentifier) -> SignError {
    SignError::UnsupportedAlgorithm(format!(
        "signature algorithm {oid} cannot be used with an {key_name} key"
    ))
}
