//! TLS connection probe and fingerprint matching
//!
//! The verifier opens one TLS connection per request, extracts the leaf
//! certificate from the peer chain, and compares its digest against the
//! request's allow-list. The probe is handshake-only: no application data
//! is sent or read. Chain validation is intentionally out of scope —
//! pinning replaces it, so the handshake accepts any server certificate
//! in order to read the leaf.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, SignatureScheme};
use tokio::net::{lookup_host, TcpStream};
use tokio_rustls::TlsConnector;
use tracing::{debug, warn};
use url::{Host, Url};

use crate::error::{PinningError, Result, VerificationOutcome};
use crate::fingerprint::{Fingerprint, HashAlgorithm};

/// One pinning check against one URL.
///
/// Immutable once constructed. `timeout` is the connect-phase bound in
/// seconds; `0` means no bound. `headers` are carried for bridge-contract
/// parity; the handshake-only probe never transmits them.
#[derive(Debug, Clone)]
pub struct VerificationRequest {
    pub url: String,
    pub fingerprints: Vec<String>,
    pub headers: HashMap<String, String>,
    pub timeout: u64,
    pub algorithm: String,
}

/// Stateless fingerprint-pinning verifier.
///
/// Each `verify` call is a single attempt with one outbound connection and
/// no retries; retry policy belongs to the caller.
pub struct PinningVerifier;

impl PinningVerifier {
    /// Run one verification attempt and classify the result.
    ///
    /// Every fault is folded into a [`VerificationOutcome::Failure`] with
    /// exactly one [`ErrorKind`](crate::ErrorKind); nothing escapes.
    pub async fn verify(request: &VerificationRequest) -> VerificationOutcome {
        match Self::check(request).await {
            Ok(()) => {
                debug!(url = %request.url, "certificate fingerprint matched allow-list");
                VerificationOutcome::Secure
            }
            Err(err) => {
                warn!(url = %request.url, error = %err, "pinning verification failed");
                // An unrecognized digest name is an unexpected fault at this
                // boundary, not a distinct wire outcome.
                let err = match err {
                    PinningError::UnsupportedAlgorithm(name) => {
                        PinningError::Unknown(format!("unsupported digest algorithm: {}", name))
                    }
                    other => other,
                };
                VerificationOutcome::from(err)
            }
        }
    }

    async fn check(request: &VerificationRequest) -> Result<()> {
        let url = Self::parse_https_url(&request.url)?;
        debug!(
            url = %url,
            algorithm = %request.algorithm,
            headers = request.headers.len(),
            "starting pinning probe"
        );

        let leaf = Self::leaf_certificate(&url, request.timeout).await?;
        let algorithm: HashAlgorithm = request.algorithm.parse()?;
        let computed = algorithm.digest(&leaf);

        let matched = request
            .fingerprints
            .iter()
            .any(|pin| Fingerprint::normalize(pin) == computed);
        if matched {
            Ok(())
        } else {
            Err(PinningError::NotSecure)
        }
    }

    fn parse_https_url(raw: &str) -> Result<Url> {
        let url = Url::parse(raw).map_err(|e| PinningError::Url(e.to_string()))?;
        if url.scheme() != "https" {
            return Err(PinningError::Url(format!(
                "expected https scheme, got {}",
                url.scheme()
            )));
        }
        Ok(url)
    }

    /// Connect, handshake, and return the DER encoding of chain element 0.
    async fn leaf_certificate(url: &Url, timeout_secs: u64) -> Result<Vec<u8>> {
        let host = match url.host() {
            Some(Host::Domain(domain)) => domain.to_string(),
            Some(Host::Ipv4(ip)) => ip.to_string(),
            Some(Host::Ipv6(ip)) => ip.to_string(),
            None => return Err(PinningError::Url("URL has no host".into())),
        };
        let port = url.port_or_known_default().unwrap_or(443);

        let addrs: Vec<SocketAddr> = lookup_host((host.as_str(), port))
            .await
            .map_err(|e| PinningError::NoInternet(e.to_string()))?
            .collect();
        let stream = Self::connect_any(&addrs, timeout_secs).await?;

        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
        let config = rustls::ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(LeafExtractionVerifier))
            .with_no_client_auth();
        let connector = TlsConnector::from(Arc::new(config));

        let server_name = ServerName::try_from(host.clone())
            .map_err(|_| PinningError::Url(format!("invalid server name: {}", host)))?;

        // Handshake only; no request is written and no response is read.
        let tls = connector
            .connect(server_name, stream)
            .await
            .map_err(|e| PinningError::Network(format!("TLS handshake failed: {}", e)))?;

        let (_, session) = tls.get_ref();
        let certs = session
            .peer_certificates()
            .ok_or_else(|| PinningError::Network("no peer certificates".into()))?;
        let leaf = certs
            .first()
            .ok_or_else(|| PinningError::Network("empty certificate chain".into()))?;
        Ok(leaf.as_ref().to_vec())
    }

    /// Try each resolved address in order. A configured timeout bounds each
    /// connect attempt separately, so a host resolving to N addresses may
    /// spend up to N x timeout in the connect phase. The handshake itself is
    /// never bounded.
    async fn connect_any(addrs: &[SocketAddr], timeout_secs: u64) -> Result<TcpStream> {
        let mut last_err: Option<std::io::Error> = None;
        for addr in addrs {
            let attempt = TcpStream::connect(addr);
            let connected = if timeout_secs > 0 {
                match tokio::time::timeout(Duration::from_secs(timeout_secs), attempt).await {
                    Ok(result) => result,
                    Err(_) => return Err(PinningError::Timeout),
                }
            } else {
                attempt.await
            };
            match connected {
                Ok(stream) => return Ok(stream),
                Err(e) => last_err = Some(e),
            }
        }
        match last_err {
            Some(e) => Err(PinningError::Network(e.to_string())),
            None => Err(PinningError::NoInternet(
                "hostname resolved to no addresses".into(),
            )),
        }
    }
}

/// Accepts any server certificate so the handshake completes and the leaf
/// can be read. Trust comes solely from the fingerprint match that follows.
#[derive(Debug)]
struct LeafExtractionVerifier;

impl ServerCertVerifier for LeafExtractionVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        rustls::crypto::aws_lc_rs::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}
