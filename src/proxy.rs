//! SOCKS5 proxy configuration for the IMAP connection.
//!
//! Some mailboxes are only reachable through a proxy (locked-down networks,
//! per-account egress IPs). The watcher routes its single long-lived IMAP
//! connection through SOCKS5 when a proxy is configured.
//!
//! # Example
//!
//! ```
//! use otp_watch::Socks5Proxy;
//!
//! let open = Socks5Proxy::new("proxy.example.com", 1080);
//! let authed = Socks5Proxy::with_auth("proxy.example.com", 1080, "user", "pass");
//! ```

use secrecy::{ExposeSecret, SecretString};

/// SOCKS5 proxy endpoint, with optional username/password authentication.
#[derive(Clone)]
pub struct Socks5Proxy {
    host: String,
    port: u16,
    auth: Option<ProxyAuth>,
}

/// SOCKS5 authentication credentials. The password is held as a
/// [`SecretString`] and never appears in `Debug` or `Display` output.
#[derive(Clone)]
pub struct ProxyAuth {
    username: String,
    password: SecretString,
}

impl Socks5Proxy {
    /// Creates a proxy configuration without authentication.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            auth: None,
        }
    }

    /// Creates a proxy configuration with username/password authentication.
    #[must_use]
    pub fn with_auth(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            auth: Some(ProxyAuth {
                username: username.into(),
                password: SecretString::from(password.into()),
            }),
        }
    }

    /// Returns the proxy hostname.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the proxy address as `(host, port)`, the form
    /// `tokio_socks` connects with.
    #[must_use]
    pub fn endpoint(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }

    /// Returns the authentication credentials, if any.
    #[must_use]
    pub fn auth(&self) -> Option<(&str, &str)> {
        self.auth
            .as_ref()
            .map(|a| (a.username.as_str(), a.password.expose_secret()))
    }

    /// Returns `true` if this proxy requires authentication.
    #[must_use]
    pub fn requires_auth(&self) -> bool {
        self.auth.is_some()
    }
}

impl std::fmt::Display for Socks5Proxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.auth {
            Some(auth) => write!(
                f,
                "socks5://{}:***@{}:{}",
                auth.username, self.host, self.port
            ),
            None => write!(f, "socks5://{}:{}", self.host, self.port),
        }
    }
}

impl std::fmt::Debug for Socks5Proxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Socks5Proxy")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("auth", &self.auth.as_ref().map(|a| a.username.as_str()))
            .finish()
    }
}
