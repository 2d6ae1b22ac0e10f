//! TLS handshake and certificate retrieval.
//!
//! The handshake accepts any certificate so that expired, self-signed or
//! mismatched certificates can still be scored. The real web PKI verdict is
//! computed by a wrapping verifier and recorded next to the chain.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::crypto::{ring::default_provider, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use crate::config::{TCP_CONNECT_TIMEOUT_SECS, TLS_HANDSHAKE_TIMEOUT_SECS};
use crate::error_handling::{categorize_io_error, AnalysisError};

use super::extract::parse_certificate;
use super::types::CertificateChainInfo;

/// Produces the certificate chain served by a host.
#[async_trait]
pub trait CertificateSource: Send + Sync {
    async fn fetch(&self, host: &str, port: u16) -> Result<CertificateChainInfo, AnalysisError>;
}

/// Live TLS handshake over TCP.
pub struct TlsCertificateSource {
    provider: Arc<CryptoProvider>,
    roots: Arc<RootCertStore>,
    connect_timeout: Duration,
    handshake_timeout: Duration,
}

impl Default for TlsCertificateSource {
    fn default() -> Self {
        let mut root_store = RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        Self {
            provider: Arc::new(default_provider()),
            roots: Arc::new(root_store),
            connect_timeout: Duration::from_secs(TCP_CONNECT_TIMEOUT_SECS),
            handshake_timeout: Duration::from_secs(TLS_HANDSHAKE_TIMEOUT_SECS),
        }
    }
}

impl TlsCertificateSource {
    fn client_config(&self, verifier: Arc<RecordingVerifier>) -> Result<ClientConfig, AnalysisError> {
        let config = ClientConfig::builder_with_provider(self.provider.clone())
            .with_safe_default_protocol_versions()
            .map_err(|e| AnalysisError::unknown(format!("TLS configuration error: {e}")))?
            .dangerous()
            .with_custom_certificate_verifier(verifier)
            .with_no_client_auth();
        Ok(config)
    }

    fn recording_verifier(&self) -> Result<Arc<RecordingVerifier>, AnalysisError> {
        let inner =
            WebPkiServerVerifier::builder_with_provider(self.roots.clone(), self.provider.clone())
                .build()
                .map_err(|e| AnalysisError::unknown(format!("TLS verifier error: {e}")))?;
        Ok(Arc::new(RecordingVerifier {
            inner,
            outcome: Mutex::new(None),
        }))
    }
}

#[async_trait]
impl CertificateSource for TlsCertificateSource {
    async fn fetch(&self, host: &str, port: u16) -> Result<CertificateChainInfo, AnalysisError> {
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| AnalysisError::invalid_domain(format!("Invalid server name {host}: {e}")))?;

        let verifier = self.recording_verifier()?;
        let connector = TlsConnector::from(Arc::new(self.client_config(verifier.clone())?));

        debug!("Connecting to {host}:{port} for certificate inspection");
        let sock = tokio::time::timeout(self.connect_timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| {
                AnalysisError::timeout(format!(
                    "TCP connection timeout for {host}:{port} ({}s)",
                    self.connect_timeout.as_secs()
                ))
            })?
            .map_err(|e| categorize_io_error(&e, &format!("Failed to connect to {host}:{port}")))?;

        let tls_stream = tokio::time::timeout(self.handshake_timeout, connector.connect(server_name, sock))
            .await
            .map_err(|_| {
                AnalysisError::timeout(format!(
                    "TLS handshake timeout for {host}:{port} ({}s)",
                    self.handshake_timeout.as_secs()
                ))
            })?
            .map_err(|e| AnalysisError::network(format!("TLS handshake failed for {host}:{port}: {e}")))?;

        let connection = tls_stream.get_ref().1;
        let tls_version = connection.protocol_version().map(|v| format!("{v:?}"));
        let cipher_suite = connection
            .negotiated_cipher_suite()
            .map(|cs| format!("{:?}", cs.suite()));

        let certificates = connection
            .peer_certificates()
            .unwrap_or_default()
            .iter()
            .map(|der| parse_certificate(der.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        let (chain_verified, verification_error) = match verifier.take_outcome() {
            Some(Ok(())) => (true, None),
            Some(Err(reason)) => (false, Some(reason)),
            None => (false, Some("Certificate was not verified".to_string())),
        };

        Ok(CertificateChainInfo {
            certificates,
            chain_verified,
            verification_error,
            tls_version,
            cipher_suite,
        })
    }
}

/// Delegates to the web PKI verifier, records its verdict, and always lets
/// the handshake continue.
#[derive(Debug)]
struct RecordingVerifier {
    inner: Arc<WebPkiServerVerifier>,
    outcome: Mutex<Option<Result<(), String>>>,
}

impl RecordingVerifier {
    fn take_outcome(&self) -> Option<Result<(), String>> {
        match self.outcome.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

impl ServerCertVerifier for RecordingVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let verdict = self
            .inner
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
            .map(|_| ())
            .map_err(|e| e.to_string());
        match self.outcome.lock() {
            Ok(mut guard) => *guard = Some(verdict),
            Err(poisoned) => *poisoned.into_inner() = Some(verdict),
        }
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}
