//! Configuration for a mailbox watch session.
//!
//! Use [`WatchConfigBuilder`] to create a configuration with sensible
//! defaults:
//!
//! ```
//! use otp_watch::WatchConfig;
//!
//! let config = WatchConfig::builder()
//!     .mailbox("user@example.com")
//!     .credential("app-password")
//!     .build()
//!     .expect("valid config");
//! ```

use crate::error::{Error, Result};
use crate::matcher::DEFAULT_KEYWORDS;
use crate::proxy::Socks5Proxy;
use crate::servers::ServerRegistry;
use email_address::EmailAddress;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

/// Configuration for watching one mailbox.
///
/// Create using [`WatchConfig::builder()`]. The `credential` is stored as a
/// [`SecretString`] and is redacted from `Debug` output; the `mailbox` is a
/// validated [`EmailAddress`].
#[derive(Clone)]
pub struct WatchConfig {
    /// Mailbox address, used for login and IMAP server discovery.
    mailbox: EmailAddress,
    /// Account password or app-specific password.
    credential: SecretString,
    /// IMAP server hostname (discovered from the mailbox domain if unset).
    pub imap_host: Option<String>,
    /// IMAP server port (default: 993 for IMAPS).
    pub imap_port: u16,
    /// Optional SOCKS5 proxy for the connection.
    pub proxy: Option<Socks5Proxy>,
    /// Interval between poll ticks while no unread message matches.
    pub poll_interval: Duration,
    /// Optional overall deadline for the watch; `None` polls until stopped.
    pub max_wait: Option<Duration>,
    /// Keyword priority list for the passcode matcher.
    pub keywords: Vec<String>,
    /// Per-operation transport timeouts.
    pub timeouts: TimeoutConfig,
}

impl std::fmt::Debug for WatchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchConfig")
            .field("mailbox", &self.mailbox.as_str())
            .field("credential", &"[REDACTED]")
            .field("imap_host", &self.imap_host)
            .field("imap_port", &self.imap_port)
            .field("proxy", &self.proxy)
            .field("poll_interval", &self.poll_interval)
            .field("max_wait", &self.max_wait)
            .field("keywords", &self.keywords)
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

impl WatchConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> WatchConfigBuilder {
        WatchConfigBuilder::default()
    }

    /// Returns the mailbox address as a string slice.
    #[must_use]
    pub fn mailbox(&self) -> &str {
        self.mailbox.as_str()
    }

    /// Returns the credential for authentication.
    ///
    /// Intentionally the only way to reach the secret, so it cannot end up
    /// in logs by accident.
    #[must_use]
    pub fn credential(&self) -> &str {
        self.credential.expose_secret()
    }

    /// Returns the effective IMAP host, explicit or discovered from the
    /// mailbox domain.
    #[must_use]
    pub fn effective_imap_host(&self) -> String {
        self.imap_host.clone().unwrap_or_else(|| {
            ServerRegistry::with_defaults()
                .discover(self.mailbox.as_str())
                .into_owned()
        })
    }

    /// Returns the full IMAP server address as `host:port`.
    #[must_use]
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.effective_imap_host(), self.imap_port)
    }
}

/// Per-operation timeouts for the IMAP transport.
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Timeout for establishing the TCP/TLS connection.
    pub connect: Duration,
    /// Timeout for IMAP authentication.
    pub auth: Duration,
    /// Timeout for selecting the mailbox folder.
    pub select: Duration,
    /// Timeout for the unread-message search.
    pub search: Duration,
    /// Timeout for fetching one message body.
    pub fetch: Duration,
    /// Timeout for logout.
    pub logout: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(30),
            auth: Duration::from_secs(30),
            select: Duration::from_secs(10),
            search: Duration::from_secs(10),
            fetch: Duration::from_secs(30),
            logout: Duration::from_secs(5),
        }
    }
}

/// Builder for [`WatchConfig`].
#[derive(Debug, Default)]
pub struct WatchConfigBuilder {
    mailbox: Option<String>,
    credential: Option<String>,
    imap_host: Option<String>,
    imap_port: Option<u16>,
    proxy: Option<Socks5Proxy>,
    poll_interval: Option<Duration>,
    max_wait: Option<Duration>,
    keywords: Option<Vec<String>>,
    timeouts: Option<TimeoutConfig>,
    server_registry: Option<ServerRegistry>,
}

impl WatchConfigBuilder {
    /// Sets the mailbox address (required).
    ///
    /// The domain is used to discover the IMAP server if no explicit host is
    /// set.
    #[must_use]
    pub fn mailbox(mut self, mailbox: impl Into<String>) -> Self {
        self.mailbox = Some(mailbox.into());
        self
    }

    /// Sets the credential (required). For Gmail/Outlook this is an
    /// app-specific password.
    #[must_use]
    pub fn credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    /// Sets the IMAP server hostname explicitly, skipping discovery.
    #[must_use]
    pub fn imap_host(mut self, host: impl Into<String>) -> Self {
        self.imap_host = Some(host.into());
        self
    }

    /// Sets the IMAP server port. Default is 993 (IMAPS).
    #[must_use]
    pub fn imap_port(mut self, port: u16) -> Self {
        self.imap_port = Some(port);
        self
    }

    /// Routes the connection through a SOCKS5 proxy.
    #[must_use]
    pub fn proxy(mut self, proxy: Socks5Proxy) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Sets the interval between poll ticks. Default is 1 second.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Sets an overall deadline for the watch. Default is none: the watch
    /// polls until a passcode is found or the caller stops it.
    #[must_use]
    pub fn max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Replaces the keyword priority list used by the passcode matcher.
    ///
    /// Order matters: earlier keywords win ties. Default is
    /// `otp, code, pin, password, verification`.
    #[must_use]
    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = Some(keywords.into_iter().map(Into::into).collect());
        self
    }

    /// Sets per-operation transport timeouts.
    #[must_use]
    pub fn timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = Some(timeouts);
        self
    }

    /// Sets the connection timeout, keeping other timeouts at their
    /// defaults.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts
            .get_or_insert_with(TimeoutConfig::default)
            .connect = timeout;
        self
    }

    /// Sets a custom server registry for IMAP host discovery, used during
    /// [`build()`](Self::build) when no explicit host is set.
    #[must_use]
    pub fn server_registry(mut self, registry: ServerRegistry) -> Self {
        self.server_registry = Some(registry);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the mailbox or credential is
    /// missing, the mailbox is not a valid address, the credential is empty,
    /// or the keyword list is present but unusable (empty, or containing an
    /// empty keyword).
    pub fn build(self) -> Result<WatchConfig> {
        let mailbox_raw = self.mailbox.ok_or_else(|| Error::InvalidConfig {
            message: "mailbox address is required".into(),
        })?;

        let mailbox = EmailAddress::parse_with_options(&mailbox_raw, email_address::Options::default())
            .map_err(|_| Error::InvalidMailbox {
                mailbox: mailbox_raw.clone(),
            })?;

        let credential_raw = self.credential.ok_or_else(|| Error::InvalidConfig {
            message: "credential is required".into(),
        })?;
        if credential_raw.is_empty() {
            return Err(Error::InvalidConfig {
                message: "credential must not be empty".into(),
            });
        }

        let keywords = self
            .keywords
            .unwrap_or_else(|| DEFAULT_KEYWORDS.iter().map(ToString::to_string).collect());
        if keywords.is_empty() {
            return Err(Error::InvalidConfig {
                message: "keyword list must not be empty".into(),
            });
        }
        if keywords.iter().any(String::is_empty) {
            return Err(Error::InvalidConfig {
                message: "keywords must not be empty strings".into(),
            });
        }

        // Resolve the IMAP host now: explicit beats registry, registry beats
        // built-in discovery at connect time
        let imap_host = self.imap_host.or_else(|| {
            self.server_registry
                .map(|registry| registry.discover(mailbox.as_str()).into_owned())
        });

        Ok(WatchConfig {
            mailbox,
            credential: SecretString::from(credential_raw),
            imap_host,
            imap_port: self.imap_port.unwrap_or(993),
            proxy: self.proxy,
            poll_interval: self.poll_interval.unwrap_or(Duration::from_secs(1)),
            max_wait: self.max_wait,
            keywords,
            timeouts: self.timeouts.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_minimal() {
        let config = WatchConfig::builder()
            .mailbox("user@example.com")
            .credential("secret")
            .build()
            .unwrap();

        assert_eq!(config.mailbox(), "user@example.com");
        assert_eq!(config.credential(), "secret");
        assert_eq!(config.imap_port, 993);
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert!(config.max_wait.is_none());
        assert_eq!(config.keywords, DEFAULT_KEYWORDS);
        assert!(config.proxy.is_none());
    }

    #[test]
    fn test_builder_full() {
        let config = WatchConfig::builder()
            .mailbox("user@example.com")
            .credential("secret")
            .imap_host("mail.example.com")
            .imap_port(994)
            .proxy(Socks5Proxy::new("proxy.local", 1080))
            .poll_interval(Duration::from_secs(5))
            .max_wait(Duration::from_secs(120))
            .keywords(["token", "code"])
            .connect_timeout(Duration::from_secs(60))
            .build()
            .unwrap();

        assert_eq!(config.imap_host, Some("mail.example.com".into()));
        assert_eq!(config.imap_port, 994);
        assert!(config.proxy.is_some());
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.max_wait, Some(Duration::from_secs(120)));
        assert_eq!(config.keywords, vec!["token", "code"]);
        assert_eq!(config.timeouts.connect, Duration::from_secs(60));
    }

    #[test]
    fn test_builder_missing_mailbox() {
        let result = WatchConfig::builder().credential("secret").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_missing_credential() {
        let result = WatchConfig::builder().mailbox("user@example.com").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_empty_credential() {
        let result = WatchConfig::builder()
            .mailbox("user@example.com")
            .credential("")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_invalid_mailbox() {
        let result = WatchConfig::builder()
            .mailbox("not-an-address")
            .credential("secret")
            .build();
        assert!(matches!(result, Err(Error::InvalidMailbox { .. })));
    }

    #[test]
    fn test_builder_empty_keyword_list() {
        let result = WatchConfig::builder()
            .mailbox("user@example.com")
            .credential("secret")
            .keywords(Vec::<String>::new())
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_blank_keyword() {
        let result = WatchConfig::builder()
            .mailbox("user@example.com")
            .credential("secret")
            .keywords(["code", ""])
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_credential_not_in_debug() {
        let config = WatchConfig::builder()
            .mailbox("user@example.com")
            .credential("super-secret-password")
            .build()
            .unwrap();

        let debug_str = format!("{config:?}");
        assert!(!debug_str.contains("super-secret-password"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_host_discovery_from_domain() {
        let config = WatchConfig::builder()
            .mailbox("user@gmail.com")
            .credential("secret")
            .build()
            .unwrap();

        assert_eq!(config.effective_imap_host(), "imap.gmail.com");
        assert_eq!(config.server_address(), "imap.gmail.com:993");
    }

    #[test]
    fn test_explicit_host_overrides_discovery() {
        let config = WatchConfig::builder()
            .mailbox("user@gmail.com")
            .credential("secret")
            .imap_host("custom.host.com")
            .build()
            .unwrap();

        assert_eq!(config.effective_imap_host(), "custom.host.com");
    }

    #[test]
    fn test_builder_with_server_registry() {
        let mut registry = ServerRegistry::new();
        registry.register("mycompany.com", "mail.internal.mycompany.com");

        let config = WatchConfig::builder()
            .mailbox("user@mycompany.com")
            .credential("secret")
            .server_registry(registry)
            .build()
            .unwrap();

        assert_eq!(config.effective_imap_host(), "mail.internal.mycompany.com");
    }
}
