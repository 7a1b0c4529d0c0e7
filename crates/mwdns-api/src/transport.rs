// Shared transport configuration for building reqwest::Client instances
// and the rustls config of the request stream.
//
// The HTTP client and the request stream share TLS, timeout, and identity
// settings through this module.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::{DigitallySignedStruct, RootCertStore, SignatureScheme};
use rustls_pki_types::pem::PemObject;
use rustls_pki_types::{CertificateDer, ServerName, UnixTime};
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

/// Name of the cookie carrying the opaque session identity.
pub const IDENTITY_COOKIE: &str = "username";

const USER_AGENT: &str = concat!("mwdns/", env!("CARGO_PKG_VERSION"));

/// TLS verification mode.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (local development servers).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone, Default)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Per-request timeout. `None` leaves requests unbounded.
    pub timeout: Option<Duration>,
    /// Opaque identity token, sent as the `username` cookie.
    pub identity: Option<SecretString>,
}

impl TransportConfig {
    /// The `Cookie` header value for the identity, if one is configured.
    pub fn cookie_header(&self) -> Option<String> {
        self.identity
            .as_ref()
            .map(|id| format!("{IDENTITY_COOKIE}={}", id.expose_secret()))
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        if let Some(cookie) = self.cookie_header() {
            let mut value = HeaderValue::from_str(&cookie)
                .map_err(|e| Error::Tls(format!("identity is not a valid header value: {e}")))?;
            value.set_sensitive(true);
            let mut headers = HeaderMap::new();
            headers.insert(COOKIE, value);
            builder = builder.default_headers(headers);
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    /// Build the rustls config used for `wss` request streams.
    ///
    /// Mirrors [`build_client`](Self::build_client): a custom CA is added
    /// on top of the bundled web roots, and `DangerAcceptInvalid` skips
    /// certificate verification while still checking handshake signatures.
    pub fn build_rustls_config(&self) -> Result<Arc<rustls::ClientConfig>, Error> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let builder = rustls::ClientConfig::builder_with_provider(Arc::clone(&provider))
            .with_safe_default_protocol_versions()
            .map_err(|e| Error::Tls(format!("unsupported TLS configuration: {e}")))?;

        let config = match &self.tls {
            TlsMode::DangerAcceptInvalid => builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(AcceptAnyCert(provider)))
                .with_no_client_auth(),
            TlsMode::System => builder
                .with_root_certificates(web_roots())
                .with_no_client_auth(),
            TlsMode::CustomCa(path) => {
                let mut roots = web_roots();
                add_pem_roots(&mut roots, path)?;
                builder.with_root_certificates(roots).with_no_client_auth()
            }
        };
        Ok(Arc::new(config))
    }
}

fn web_roots() -> RootCertStore {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    roots
}

fn add_pem_roots(roots: &mut RootCertStore, path: &Path) -> Result<(), Error> {
    let pem = std::fs::read(path).map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
    let mut added = 0usize;
    for cert in CertificateDer::pem_slice_iter(&pem) {
        let cert = cert.map_err(|e| Error::Tls(format!("invalid CA cert: {e:?}")))?;
        roots
            .add(cert)
            .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
        added += 1;
    }
    if added == 0 {
        return Err(Error::Tls(format!(
            "no certificates found in {}",
            path.display()
        )));
    }
    Ok(())
}

/// Verifier for `TlsMode::DangerAcceptInvalid`: any certificate chain is
/// accepted, signatures are still checked against the presented key.
#[derive(Debug)]
struct AcceptAnyCert(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn cookie_header_absent_without_identity() {
        assert!(TransportConfig::default().cookie_header().is_none());
    }

    #[test]
    fn cookie_header_uses_username_cookie() {
        let config = TransportConfig {
            identity: Some(SecretString::from("orange-tiger".to_string())),
            ..TransportConfig::default()
        };
        assert_eq!(config.cookie_header().as_deref(), Some("username=orange-tiger"));
    }

    #[test]
    fn default_has_no_timeout() {
        assert!(TransportConfig::default().timeout.is_none());
    }

    #[test]
    fn rustls_config_builds_for_system_and_insecure() {
        assert!(TransportConfig::default().build_rustls_config().is_ok());
        let insecure = TransportConfig {
            tls: TlsMode::DangerAcceptInvalid,
            ..TransportConfig::default()
        };
        assert!(insecure.build_rustls_config().is_ok());
    }

    #[test]
    fn rustls_config_rejects_missing_ca_file() {
        let config = TransportConfig {
            tls: TlsMode::CustomCa(PathBuf::from("/nonexistent/mwdns-ca.pem")),
            ..TransportConfig::default()
        };
        assert!(matches!(
            config.build_rustls_config(),
            Err(Error::Tls(msg)) if msg.contains("failed to read CA cert")
        ));
    }

    #[test]
    fn rustls_config_rejects_pem_without_certificates() {
        let path = std::env::temp_dir().join(format!("mwdns-empty-ca-{}.pem", std::process::id()));
        std::fs::write(&path, "not a certificate\n").unwrap();
        let config = TransportConfig {
            tls: TlsMode::CustomCa(path.clone()),
            ..TransportConfig::default()
        };
        let result = config.build_rustls_config();
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(Error::Tls(msg)) if msg.contains("no certificates")));
    }
}
