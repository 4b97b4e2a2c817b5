//! Hub connection stream.
//!
//! Provides a unified stream type for both plaintext and TLS uplinks.

use crate::config::HubConfig;
use crate::error::LinkError;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tracing::{info, warn};

/// Plain or TLS connection to the hub.
pub enum S2SStream {
    Plain(TcpStream),
    TlsClient(TlsStream<TcpStream>),
}

impl S2SStream {
    /// Open a connection as described by the hub config.
    pub async fn connect(hub: &HubConfig) -> Result<Self, LinkError> {
        let tcp = TcpStream::connect(hub.address()).await?;
        if let Err(e) = tcp.set_nodelay(true) {
            warn!(error = %e, "Failed to set TCP_NODELAY");
        }
        if !hub.tls {
            return Ok(Self::Plain(tcp));
        }
        Ok(Self::TlsClient(upgrade_to_tls(tcp, &hub.host).await?))
    }

    pub fn is_tls(&self) -> bool {
        !matches!(self, Self::Plain(_))
    }
}

/// Upgrades a TCP stream to TLS, verifying the hub against the platform roots.
async fn upgrade_to_tls(tcp: TcpStream, hostname: &str) -> Result<TlsStream<TcpStream>, LinkError> {
    use tokio_rustls::TlsConnector;
    use tokio_rustls::rustls::pki_types::ServerName;
    use tokio_rustls::rustls::{ClientConfig, RootCertStore};

    let mut roots = RootCertStore::empty();
    let certs = rustls_native_certs::load_native_certs();
    for cert in certs.certs {
        if let Err(e) = roots.add(cert) {
            warn!(error = %e, "Failed to add root cert");
        }
    }
    for e in &certs.errors {
        warn!(error = %e, "Error loading native certs");
    }
    if roots.is_empty() {
        return Err(LinkError::Tls("no usable root certificates".into()));
    }

    let config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    let connector = TlsConnector::from(Arc::new(config));
    let server_name =
        ServerName::try_from(hostname.to_string()).map_err(|e| LinkError::Tls(e.to_string()))?;

    let stream = connector
        .connect(server_name, tcp)
        .await
        .map_err(|e| LinkError::Tls(e.to_string()))?;
    info!(hostname = %hostname, "TLS handshake completed for hub link");
    Ok(stream)
}

impl AsyncRead for S2SStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            S2SStream::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            S2SStream::TlsClient(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for S2SStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            S2SStream::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            S2SStream::TlsClient(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            S2SStream::Plain(stream) => Pin::new(stream).poll_flush(cx),
            S2SStream::TlsClient(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            S2SStream::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            S2SStream::TlsClient(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}
