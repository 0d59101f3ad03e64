//! Error types for the otp-watch crate.
//!
//! All errors implement [`std::error::Error`] and carry context about what
//! went wrong. The split the watcher cares about is fatal vs. non-fatal:
//! configuration and transport failures end the watch session, while a
//! requested stop is reported as [`Error::WatchStopped`] and is not a
//! failure of the session itself. See [`Error::is_fatal`].

use std::time::Duration;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while watching a mailbox.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────
    // Configuration errors — reported before any connection is attempted
    // ─────────────────────────────────────────────────────────────────────────
    /// Invalid or incomplete configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what is missing or malformed.
        message: String,
    },

    /// The mailbox address is not a valid email address.
    #[error("invalid mailbox address: {mailbox}")]
    InvalidMailbox {
        /// The rejected mailbox address.
        mailbox: String,
    },

    /// The IMAP hostname is not a valid DNS name for TLS.
    #[error("invalid DNS name for host '{host}'")]
    InvalidDnsName {
        /// The invalid hostname.
        host: String,
        /// The underlying DNS name error.
        #[source]
        source: rustls::client::InvalidDnsNameError,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Transport errors — fatal to the watch session, surfaced to the caller
    // ─────────────────────────────────────────────────────────────────────────
    /// Failed to establish the TCP connection.
    #[error("failed to connect to {target}")]
    TcpConnect {
        /// The target address that failed.
        target: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to establish the TLS session.
    #[error("failed to establish TLS connection to {target}")]
    TlsConnect {
        /// The target address that failed.
        target: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to connect through the SOCKS5 proxy.
    #[error("failed to connect via SOCKS5 proxy {proxy_host} to {target}")]
    Socks5Connect {
        /// The SOCKS5 proxy hostname.
        proxy_host: String,
        /// The target address.
        target: String,
        /// The underlying SOCKS5 error.
        #[source]
        source: tokio_socks::Error,
    },

    /// IMAP login was rejected.
    #[error("IMAP login failed for {mailbox}")]
    ImapLogin {
        /// The mailbox used for login.
        mailbox: String,
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// Failed to select the watched mailbox folder.
    #[error("failed to select mailbox '{mailbox}'")]
    SelectMailbox {
        /// The mailbox folder name.
        mailbox: String,
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// IMAP NOOP failed.
    #[error("IMAP NOOP command failed")]
    ImapNoop {
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// The unread-message search failed.
    #[error("IMAP search for unread messages failed")]
    ImapSearch {
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// Fetching a message body failed.
    #[error("IMAP fetch failed for UID {uid}")]
    ImapFetch {
        /// The UID that failed.
        uid: u32,
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// The fetch stream yielded an error mid-message.
    #[error("failed to read fetched message from stream")]
    FetchMessage {
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// The server returned no body for a UID it previously listed.
    #[error("server returned no message body for UID {uid}")]
    MissingMessage {
        /// The UID with no body.
        uid: u32,
    },

    /// IMAP logout failed.
    #[error("IMAP logout failed")]
    ImapLogout {
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Timeouts — each transport phase has its own deadline
    // ─────────────────────────────────────────────────────────────────────────
    /// Connection timeout.
    #[error("connection timeout to {target} after {timeout:?}")]
    ConnectTimeout {
        /// The target address.
        target: String,
        /// The timeout that was exceeded.
        timeout: Duration,
    },

    /// Authentication timeout.
    #[error("authentication timeout for {mailbox} after {timeout:?}")]
    AuthTimeout {
        /// The mailbox used for authentication.
        mailbox: String,
        /// The timeout that was exceeded.
        timeout: Duration,
    },

    /// Mailbox selection timeout.
    #[error("mailbox selection timeout for '{mailbox}' after {timeout:?}")]
    SelectTimeout {
        /// The mailbox folder name.
        mailbox: String,
        /// The timeout that was exceeded.
        timeout: Duration,
    },

    /// Unread-search timeout.
    #[error("unread search timeout after {timeout:?}")]
    SearchTimeout {
        /// The timeout that was exceeded.
        timeout: Duration,
    },

    /// Message fetch timeout.
    #[error("message fetch timeout for UID {uid} after {timeout:?}")]
    FetchTimeout {
        /// The UID being fetched.
        uid: u32,
        /// The timeout that was exceeded.
        timeout: Duration,
    },

    /// Logout timeout (not critical, the connection is dropped anyway).
    #[error("logout timeout after {timeout:?}")]
    LogoutTimeout {
        /// The timeout that was exceeded.
        timeout: Duration,
    },

    /// The optional overall watch deadline elapsed without a candidate.
    #[error("no passcode found within {timeout:?}")]
    WaitTimeout {
        /// The deadline that was exceeded.
        timeout: Duration,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Cancellation — not a failure of the session
    // ─────────────────────────────────────────────────────────────────────────
    /// The watch was stopped before a candidate was found.
    #[error("watch stopped before a passcode was found")]
    WatchStopped,
}

impl Error {
    /// Returns `true` if this error represents a real failure of the watch
    /// session (configuration or transport), as opposed to a requested stop.
    ///
    /// ```
    /// use otp_watch::Error;
    ///
    /// assert!(!Error::WatchStopped.is_fatal());
    /// assert!(Error::InvalidConfig { message: "credential is required".into() }.is_fatal());
    /// ```
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::WatchStopped)
    }

    /// Returns the error category for logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidConfig { .. }
            | Error::InvalidMailbox { .. }
            | Error::InvalidDnsName { .. } => ErrorCategory::Configuration,

            Error::TcpConnect { .. } | Error::TlsConnect { .. } | Error::Socks5Connect { .. } => {
                ErrorCategory::Network
            }

            Error::ImapLogin { .. }
            | Error::SelectMailbox { .. }
            | Error::ImapNoop { .. }
            | Error::ImapSearch { .. }
            | Error::ImapFetch { .. }
            | Error::FetchMessage { .. }
            | Error::MissingMessage { .. }
            | Error::ImapLogout { .. } => ErrorCategory::Protocol,

            Error::ConnectTimeout { .. }
            | Error::AuthTimeout { .. }
            | Error::SelectTimeout { .. }
            | Error::SearchTimeout { .. }
            | Error::FetchTimeout { .. }
            | Error::LogoutTimeout { .. }
            | Error::WaitTimeout { .. } => ErrorCategory::Timeout,

            Error::WatchStopped => ErrorCategory::Cancelled,
        }
    }
}

/// Error categories for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Configuration or validation errors.
    Configuration,
    /// Network connectivity errors.
    Network,
    /// IMAP protocol errors.
    Protocol,
    /// Timeout errors.
    Timeout,
    /// The watch was stopped by the caller.
    Cancelled,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Network => write!(f, "network"),
            ErrorCategory::Protocol => write!(f, "protocol"),
            ErrorCategory::Timeout => write!(f, "timeout"),
            ErrorCategory::Cancelled => write!(f, "cancelled"),
        }
    }
}
