//! Mailbox transport: the seam between the poller and the mail server.
//!
//! [`MailTransport`] is what the poller drives: list the unread messages,
//! fetch one of them. The production implementation is [`ImapTransport`], a
//! long-lived authenticated IMAP session over TLS. Tests drive the poller
//! with in-memory implementations instead.
//!
//! Transport failures are fatal to a watch session; they surface through
//! the poller's result, never retried behind the caller's back.

use crate::config::{TimeoutConfig, WatchConfig};
use crate::connection;
use crate::error::{Error, Result};
use crate::session::{self, ImapSession};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mailparse::MailHeaderMap;
use tokio::time::timeout;
use tracing::{debug, instrument};

/// Identifier of one message on the server (IMAP UID).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub u32);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One fetched mail message: raw RFC 822 bytes plus the send timestamp
/// parsed once at construction.
///
/// The timestamp comes from the `Date` header; a missing or unparseable
/// header leaves it `None`, which the poller orders as oldest. The bytes are
/// immutable; decoding derives text from them without consuming them.
#[derive(Debug, Clone)]
pub struct RawMessage {
    id: MessageId,
    bytes: Vec<u8>,
    sent_at: Option<DateTime<Utc>>,
}

impl RawMessage {
    /// Wraps raw message bytes, parsing the send timestamp from the `Date`
    /// header. Timestamp parse failures are recovered here, never surfaced.
    #[must_use]
    pub fn new(id: MessageId, bytes: Vec<u8>) -> Self {
        let sent_at = parse_sent_at(&bytes);
        if sent_at.is_none() {
            debug!(id = %id, "No usable Date header, message will sort as oldest");
        }
        Self { id, bytes, sent_at }
    }

    /// Returns the message identifier.
    #[must_use]
    pub fn id(&self) -> MessageId {
        self.id
    }

    /// Returns the raw message bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the parsed send timestamp, if the message carried one.
    #[must_use]
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        self.sent_at
    }
}

/// Parses the `Date` header into a UTC timestamp, best-effort.
fn parse_sent_at(bytes: &[u8]) -> Option<DateTime<Utc>> {
    let parsed = mailparse::parse_mail(bytes).ok()?;
    let date = parsed.headers.get_first_value("Date")?;
    let epoch = mailparse::dateparse(&date).ok()?;
    DateTime::from_timestamp(epoch, 0)
}

/// Mailbox access as the poller sees it.
///
/// A transport owns one authenticated session for the lifetime of a watch;
/// the poller is its only user.
#[async_trait]
pub trait MailTransport: Send {
    /// Returns the identifiers of all currently unread messages.
    async fn list_unread(&mut self) -> Result<Vec<MessageId>>;

    /// Fetches the full raw message for one identifier.
    async fn fetch(&mut self, id: MessageId) -> Result<RawMessage>;
}

/// IMAP-backed [`MailTransport`] over a TLS connection.
///
/// Created with [`ImapTransport::connect`]; holds the authenticated session
/// with `INBOX` selected. Fetching a message with `BODY[]` marks it read on
/// the server, which is what lets the unread search converge across ticks.
pub struct ImapTransport {
    session: Box<ImapSession>,
    timeouts: TimeoutConfig,
}

impl ImapTransport {
    /// Connects, authenticates, and selects `INBOX`.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the connection, TLS handshake, login, or
    /// mailbox selection fails or times out.
    #[instrument(
        name = "ImapTransport::connect",
        skip_all,
        fields(
            mailbox = %config.mailbox(),
            imap_host = %config.effective_imap_host(),
            proxy_enabled = config.proxy.is_some()
        )
    )]
    pub async fn connect(config: &WatchConfig) -> Result<Self> {
        let imap_host = config.effective_imap_host();
        let target_addr = config.server_address();
        let timeouts = config.timeouts.clone();

        let tls_stream = timeout(
            timeouts.connect,
            connection::establish_tls(&imap_host, &target_addr, config.proxy.as_ref()),
        )
        .await
        .map_err(|_| Error::ConnectTimeout {
            target: target_addr.clone(),
            timeout: timeouts.connect,
        })??;

        debug!("TLS connection established");

        let mut imap_session = timeout(
            timeouts.auth,
            session::authenticate(tls_stream, config.mailbox(), config.credential()),
        )
        .await
        .map_err(|_| Error::AuthTimeout {
            mailbox: config.mailbox().to_string(),
            timeout: timeouts.auth,
        })??;

        debug!("Authenticated");

        timeout(
            timeouts.select,
            session::select_mailbox(&mut imap_session, "INBOX"),
        )
        .await
        .map_err(|_| Error::SelectTimeout {
            mailbox: "INBOX".to_string(),
            timeout: timeouts.select,
        })??;

        debug!("Selected INBOX, transport ready");

        Ok(Self {
            session: Box::new(imap_session),
            timeouts,
        })
    }

    /// Logs out and drops the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the logout command fails or times out; the
    /// connection is dropped either way.
    pub async fn close(mut self) -> Result<()> {
        timeout(self.timeouts.logout, session::logout(&mut self.session))
            .await
            .map_err(|_| Error::LogoutTimeout {
                timeout: self.timeouts.logout,
            })?
    }
}

#[async_trait]
impl MailTransport for ImapTransport {
    async fn list_unread(&mut self) -> Result<Vec<MessageId>> {
        let uids = timeout(self.timeouts.search, session::search_unseen(&mut self.session))
            .await
            .map_err(|_| Error::SearchTimeout {
                timeout: self.timeouts.search,
            })??;

        Ok(uids.into_iter().map(MessageId).collect())
    }

    async fn fetch(&mut self, id: MessageId) -> Result<RawMessage> {
        let body = timeout(self.timeouts.fetch, session::fetch_raw(&mut self.session, id.0))
            .await
            .map_err(|_| Error::FetchTimeout {
                uid: id.0,
                timeout: self.timeouts.fetch,
            })??;

        let bytes = body.ok_or(Error::MissingMessage { uid: id.0 })?;
        Ok(RawMessage::new(id, bytes))
    }
}

impl std::fmt::Debug for ImapTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImapTransport")
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}
