use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;

use crate::ca::CaPaths;
use crate::encoder::OutputFormat;
use crate::error::Result;
use crate::policy::{DEFAULT_VALIDITY_DAYS, MAX_VALIDITY_DAYS, ValidityPolicy};

/// signsrv: issue short-lived X.509 certificates for PEM CSRs.
///
/// Every flag can also be set through the environment variable named in its
/// help text.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "signsrv", author, version, about, long_about = None)]
pub struct Settings {
    /// Maximum validity of issued certificates, in days.
    #[arg(
        long,
        env = "CERT_VALIDITY_DAYS",
        default_value_t = DEFAULT_VALIDITY_DAYS,
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_VALIDITY_DAYS))
    )]
    pub cert_validity_days: u32,

    /// CA certificate (PEM).
    #[arg(long = "ca-cert", env = "CA_CERT_PATH", default_value = "./public.crt")]
    pub ca_cert_path: PathBuf,

    /// CA certificate used when `--ca-cert` is not a file.
    #[arg(
        long = "ca-cert-fallback",
        env = "CA_CERT_FALLBACK_PATH",
        default_value = "../certs/public.crt"
    )]
    pub ca_cert_fallback_path: PathBuf,

    /// Unencrypted CA private key (PEM).
    #[arg(long = "ca-key", env = "CA_KEY_PATH", default_value = "./privatekey.pem")]
    pub ca_key_path: PathBuf,

    /// CA private key used when `--ca-key` is not a file.
    #[arg(
        long = "ca-key-fallback",
        env = "CA_KEY_FALLBACK_PATH",
        default_value = "../certs/privatekey.pem"
    )]
    pub ca_key_fallback_path: PathBuf,

    /// Address to listen on.
    #[arg(long, env = "SIGNSRV_BIND", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,

    /// Port to listen on.
    #[arg(long, env = "SIGNSRV_PORT", default_value_t = 80)]
    pub port: u16,

    /// Encoding of the issued certificate in responses.
    #[arg(long, env = "SIGNSRV_OUTPUT_FORMAT", value_enum, default_value_t = OutputFormat::Pem)]
    pub output_format: OutputFormat,

    /// Name reported as `node` in responses. Defaults to `$HOSTNAME`.
    #[arg(long, env = "NODE_NAME")]
    pub node_name: Option<String>,
}

impl Settings {
    pub fn ca_paths(&self) -> CaPaths {
        CaPaths {
            cert: self.ca_cert_path.clone(),
            cert_fallback: Some(self.ca_cert_fallback_path.clone()),
            key: self.ca_key_path.clone(),
            key_fallback: Some(self.ca_key_fallback_path.clone()),
        }
    }

    pub fn validity_policy(&self) -> Result<ValidityPolicy> {
        ValidityPolicy::new(self.cert_validity_days)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn resolved_node_name(&self) -> String {
        self.node_name
            .clone()
            .or_else(|| std::env::var("HOSTNAME").ok())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "localhost".to_string())
    }
}
