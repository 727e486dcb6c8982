//! Self-signed TLS material for the HTTPS listener
//!
//! The h2c client negotiates HTTP/2 through ALPN and does not verify the
//! server certificate, so a certificate generated at startup is enough.

use axum_server::tls_rustls::RustlsConfig;

use crate::error::{FixtureError, FixtureResult};

/// A certificate and its private key, both PEM encoded.
#[derive(Debug, Clone)]
pub struct TlsMaterial {
    cert_pem: String,
    key_pem: String,
}

impl TlsMaterial {
    /// Generate a self-signed certificate for `localhost`, `127.0.0.1` and
    /// `host` when it names a concrete address.
    pub fn self_signed(host: &str) -> FixtureResult<Self> {
        let mut names = vec!["localhost".to_string(), "127.0.0.1".to_string()];
        if !host.is_empty() && host != "0.0.0.0" && host != "::" && !names.iter().any(|n| n == host) {
            names.push(host.to_string());
        }

        let certified = rcgen::generate_simple_self_signed(names)
            .map_err(|e| FixtureError::Tls(format!("Failed to generate certificate: {e}")))?;

        Ok(Self {
            cert_pem: certified.cert.pem(),
            key_pem: certified.key_pair.serialize_pem(),
        })
    }

    /// Certificate in PEM form, for clients that want to trust it
    pub fn cert_pem(&self) -> &str {
        &self.cert_pem
    }

    /// Server configuration advertising `h2` and `http/1.1` through ALPN.
    pub async fn rustls_config(&self) -> FixtureResult<RustlsConfig> {
        install_crypto_provider();
        RustlsConfig::from_pem(self.cert_pem.clone().into_bytes(), self.key_pem.clone().into_bytes())
            .await
            .map_err(|e| FixtureError::Tls(format!("Invalid certificate or key: {e}")))
    }
}

/// Install ring as the process-wide provider unless one is already set.
fn install_crypto_provider() {
    if rustls::crypto::CryptoProvider::get_default().is_none() {
        // Losing a race to another installer is fine.
        rustls::crypto::ring::default_provider().install_default().ok();
    }
}
