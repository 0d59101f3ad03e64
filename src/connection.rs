//! Internal module for establishing the TLS connection to the IMAP server.
//!
//! Supports direct connections and SOCKS5-proxied connections. The stream
//! built here is owned by a single watch session for its whole lifetime.

use crate::error::{Error, Result};
use crate::proxy::Socks5Proxy;
use rustls::ClientConfig;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_socks::tcp::Socks5Stream;
use tracing::{debug, instrument};
use webpki_roots::TLS_SERVER_ROOTS;

/// A TLS stream over TCP, used for IMAP communication.
pub(crate) type TlsStream = tokio_rustls::client::TlsStream<TcpStream>;

/// Establishes a TLS connection to `target_addr`, verifying the certificate
/// against `imap_host`, optionally routed through a SOCKS5 proxy.
#[instrument(
    name = "connection::establish_tls",
    skip_all,
    fields(
        imap_host = %imap_host,
        target_addr = %target_addr,
        proxy_enabled = proxy.is_some()
    )
)]
pub(crate) async fn establish_tls(
    imap_host: &str,
    target_addr: &str,
    proxy: Option<&Socks5Proxy>,
) -> Result<TlsStream> {
    let server_name =
        rustls::ServerName::try_from(imap_host).map_err(|source| Error::InvalidDnsName {
            host: imap_host.to_string(),
            source,
        })?;

    let tcp_stream = match proxy {
        Some(proxy) => connect_via_socks5(target_addr, proxy).await?,
        None => connect_direct(target_addr).await?,
    };

    debug!("Performing TLS handshake");

    tls_connector()
        .connect(server_name, tcp_stream)
        .await
        .map_err(|source| Error::TlsConnect {
            target: target_addr.to_string(),
            source,
        })
}

/// Builds a TLS connector trusting the webpki root set.
fn tls_connector() -> TlsConnector {
    let mut roots = rustls::RootCertStore::empty();
    roots.add_trust_anchors(TLS_SERVER_ROOTS.iter().map(|ta| {
        rustls::OwnedTrustAnchor::from_subject_spki_name_constraints(
            ta.subject,
            ta.spki,
            ta.name_constraints,
        )
    }));

    let config = ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(roots)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}

#[instrument(name = "connection::direct", skip_all, fields(target = %target_addr))]
async fn connect_direct(target_addr: &str) -> Result<TcpStream> {
    debug!("Establishing direct TCP connection");

    TcpStream::connect(target_addr)
        .await
        .map_err(|source| Error::TcpConnect {
            target: target_addr.to_string(),
            source,
        })
}

#[instrument(
    name = "connection::socks5",
    skip_all,
    fields(
        proxy = %proxy,
        target = %target_addr
    )
)]
async fn connect_via_socks5(target_addr: &str, proxy: &Socks5Proxy) -> Result<TcpStream> {
    debug!("Connecting via SOCKS5 proxy");

    let stream = match proxy.auth() {
        Some((username, password)) => {
            Socks5Stream::connect_with_password(proxy.endpoint(), target_addr, username, password)
                .await
        }
        None => Socks5Stream::connect(proxy.endpoint(), target_addr).await,
    };

    stream
        .map(Socks5Stream::into_inner)
        .map_err(|source| Error::Socks5Connect {
            proxy_host: proxy.host().to_string(),
            target: target_addr.to_string(),
            source,
        })
}
