//! Internal IMAP session plumbing.
//!
//! Thin wrappers over async-imap commands, mapping protocol failures to the
//! crate's error types. The watcher only needs four verbs: authenticate,
//! select, list unread, fetch one body.

use crate::connection::TlsStream;
use crate::error::{Error, Result};
use async_imap::Session;
use futures::StreamExt;
use tracing::{debug, instrument};

/// Type alias for an IMAP session over TLS.
pub(crate) type ImapSession = Session<TlsStream>;

/// Logs in and returns an authenticated session.
#[instrument(name = "session::authenticate", skip_all, fields(mailbox = %mailbox))]
pub(crate) async fn authenticate(
    tls_stream: TlsStream,
    mailbox: &str,
    credential: &str,
) -> Result<ImapSession> {
    debug!("Authenticating to IMAP server");

    async_imap::Client::new(tls_stream)
        .login(mailbox, credential)
        .await
        .map_err(|e| Error::ImapLogin {
            mailbox: mailbox.to_string(),
            source: e.0,
        })
}

/// Selects the mailbox folder to watch (typically "INBOX").
#[instrument(name = "session::select", skip(session), fields(mailbox = %mailbox))]
pub(crate) async fn select_mailbox(session: &mut ImapSession, mailbox: &str) -> Result<()> {
    debug!("Selecting mailbox");

    session
        .select(mailbox)
        .await
        .map_err(|source| Error::SelectMailbox {
            mailbox: mailbox.to_string(),
            source,
        })?;

    Ok(())
}

/// Returns the UIDs of all unread messages in the selected mailbox.
#[instrument(name = "session::search_unseen", skip(session))]
pub(crate) async fn search_unseen(session: &mut ImapSession) -> Result<Vec<u32>> {
    // NOOP first so the search sees messages delivered since the last tick
    session
        .noop()
        .await
        .map_err(|source| Error::ImapNoop { source })?;

    let uids = session
        .uid_search("UNSEEN")
        .await
        .map_err(|source| Error::ImapSearch { source })?;

    let uids: Vec<u32> = uids.into_iter().collect();

    debug!(unread = uids.len(), "Searched for unread messages");

    Ok(uids)
}

/// Fetches the full raw body of one message by UID.
///
/// Returns `None` if the server lists the UID but yields no body for it.
/// The fetch stream is always drained fully before the session is reused.
#[instrument(name = "session::fetch_raw", skip(session), fields(uid = uid))]
pub(crate) async fn fetch_raw(session: &mut ImapSession, uid: u32) -> Result<Option<Vec<u8>>> {
    let uid_set = uid.to_string();

    let mut stream = session
        .uid_fetch(&uid_set, "BODY[]")
        .await
        .map_err(|source| Error::ImapFetch { uid, source })?;

    let mut body = None;
    while let Some(item) = stream.next().await {
        let fetched = item.map_err(|source| Error::FetchMessage { source })?;
        if body.is_none() {
            body = fetched.body().map(<[u8]>::to_vec);
        }
    }

    debug!(found = body.is_some(), "Fetched message body");

    Ok(body)
}

/// Logs out, ending the session cleanly.
#[instrument(name = "session::logout", skip(session))]
pub(crate) async fn logout(session: &mut ImapSession) -> Result<()> {
    debug!("Logging out");

    session
        .logout()
        .await
        .map_err(|source| Error::ImapLogout { source })?;

    Ok(())
}
