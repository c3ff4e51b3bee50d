#![allow(dead_code)]

use signsrv::ca::CaIdentity;
use signsrv::cert::params::DistinguishedName;
use signsrv::csr::CertificationRequest;
use signsrv::encoder::OutputFormat;
use signsrv::key::KeyPair;
use signsrv::policy::ValidityPolicy;
use signsrv::service::SigningService;
use x509_cert::name::Name;

pub fn name(common_name: &str) -> Name {
    DistinguishedName::builder()
        .common_name(common_name.to_string())
        .build()
        .as_x509_name()
        .unwrap()
}

pub fn generate_ca_cert(ca_key: KeyPair) -> CaIdentity {
    let subject_dn = DistinguishedName::builder()
        .common_name("myca.local".to_string())
        .organization("Sign Service Test".to_string())
        .build();

    CaIdentity::generate_self_signed(&subject_dn, ca_key, 365).unwrap()
}

pub fn csr_pem(common_name: &str, key: &KeyPair) -> String {
    CertificationRequest::new_signed(name(common_name), key)
        .unwrap()
        .to_pem()
        .unwrap()
}

pub fn signing_service(ca: CaIdentity, ceiling_days: u32) -> SigningService {
    SigningService::new(
        ca,
        ValidityPolicy::new(ceiling_days).unwrap(),
        OutputFormat::Pem,
        "test-node",
    )
}
