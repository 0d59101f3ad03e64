//! The inbox poller: fetch unread, decode the newest, match, repeat.
//!
//! [`InboxPoller`] drives a [`MailTransport`] through poll ticks until the
//! matcher finds a passcode or the caller stops the watch. It is usually
//! spawned onto a background task with [`InboxPoller::spawn`], which returns
//! a [`WatchHandle`] the caller can await or stop; [`watch`] wires the whole
//! thing up from a [`WatchConfig`].
//!
//! One tick runs strictly in order: fetch completes before decoding starts,
//! decoding completes before matching. Only the single newest unread message
//! is examined per tick; older unread messages stay unread and are
//! re-considered on later ticks for as long as the server reports them
//! unseen.
//!
//! # Example
//!
//! ```no_run
//! use otp_watch::{WatchConfig, watcher};
//!
//! # async fn example() -> otp_watch::Result<()> {
//! let config = WatchConfig::builder()
//!     .mailbox("user@gmail.com")
//!     .credential("app-password")
//!     .build()?;
//!
//! let handle = watcher::watch(config).await?;
//! let candidate = handle.wait().await?;
//! println!("passcode: {candidate}");
//! # Ok(())
//! # }
//! ```

use crate::config::WatchConfig;
use crate::decoder;
use crate::delivery::Delivery;
use crate::error::{Error, Result};
use crate::matcher::{OtpCandidate, OtpMatcher};
use crate::transport::{ImapTransport, MailTransport};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch as watch_channel};
use tokio::time::Instant;
use tracing::{debug, info, instrument};

/// Where the poller is within one tick. Logged, not load-bearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// No unread messages known.
    Idle,
    /// Listing and retrieving unread messages.
    Fetching,
    /// Normalizing the newest message's body.
    Decoding,
    /// Scanning the normalized text for a passcode.
    Matching,
    /// A candidate was found; the watch is over.
    Found,
    /// No match this tick; sleeping until the next one.
    Waiting,
}

impl std::fmt::Display for PollState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PollState::Idle => "idle",
            PollState::Fetching => "fetching",
            PollState::Decoding => "decoding",
            PollState::Matching => "matching",
            PollState::Found => "found",
            PollState::Waiting => "waiting",
        };
        write!(f, "{name}")
    }
}

/// Polls a mailbox until a passcode is found or the watch is stopped.
///
/// Owns its transport exclusively for the lifetime of the watch. Built with
/// [`new`](Self::new) plus the `with_*` methods, then either awaited
/// directly via [`run`](Self::run) or spawned with [`spawn`](Self::spawn).
pub struct InboxPoller<T> {
    transport: T,
    matcher: OtpMatcher,
    poll_interval: Duration,
    max_wait: Option<Duration>,
    delivery: Option<Arc<dyn Delivery>>,
}

impl<T: MailTransport> InboxPoller<T> {
    /// Creates a poller with the default matcher and a 1 second interval.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            matcher: OtpMatcher::default(),
            poll_interval: Duration::from_secs(1),
            max_wait: None,
            delivery: None,
        }
    }

    /// Replaces the passcode matcher.
    #[must_use]
    pub fn with_matcher(mut self, matcher: OtpMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Sets the interval between poll ticks.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Gives up with [`Error::WaitTimeout`] after this overall deadline.
    #[must_use]
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Sends the found passcode to a delivery collaborator, from the worker
    /// context, before the watch result resolves.
    #[must_use]
    pub fn with_delivery(mut self, delivery: Arc<dyn Delivery>) -> Self {
        self.delivery = Some(delivery);
        self
    }

    /// Runs the poll loop on the current task until a candidate is found,
    /// the `stop` channel fires, or the transport fails.
    ///
    /// # Errors
    ///
    /// - any transport error, verbatim — fatal to the session
    /// - [`Error::WatchStopped`] when stopped via the channel (or the sender
    ///   was dropped)
    /// - [`Error::WaitTimeout`] when a configured `max_wait` elapses
    #[instrument(
        name = "InboxPoller::run",
        skip_all,
        fields(poll_interval = ?self.poll_interval)
    )]
    pub async fn run(
        mut self,
        mut stop: watch_channel::Receiver<bool>,
    ) -> Result<OtpCandidate> {
        let deadline = self.max_wait.map(|d| Instant::now() + d);

        loop {
            if *stop.borrow() {
                return Err(Error::WatchStopped);
            }
            if let (Some(deadline), Some(max_wait)) = (deadline, self.max_wait) {
                if Instant::now() >= deadline {
                    return Err(Error::WaitTimeout { timeout: max_wait });
                }
            }

            debug!(state = %PollState::Fetching, "Listing unread messages");
            let ids = self.transport.list_unread().await?;
            if ids.is_empty() {
                debug!(state = %PollState::Idle, "No unread messages");
                self.pause(&mut stop).await?;
                continue;
            }

            let mut batch = Vec::with_capacity(ids.len());
            for id in ids {
                batch.push(self.transport.fetch(id).await?);
            }

            // Newest first; messages without a parseable Date sort oldest.
            // Stable sort keeps delivery order among equal timestamps.
            batch.sort_by(|a, b| b.sent_at().cmp(&a.sent_at()));
            let newest = &batch[0];

            debug!(state = %PollState::Decoding, uid = %newest.id(), "Decoding newest message");
            let text = decoder::decode(newest);

            debug!(state = %PollState::Matching, uid = %newest.id(), "Matching");
            if let Some(candidate) = self.matcher.find(&text) {
                info!(
                    state = %PollState::Found,
                    uid = %newest.id(),
                    provenance = %candidate.provenance(),
                    "Passcode found"
                );
                if let Some(delivery) = &self.delivery {
                    delivery.deliver(candidate.code()).await;
                }
                return Ok(candidate);
            }

            debug!(state = %PollState::Waiting, uid = %newest.id(), "No match this tick");
            self.pause(&mut stop).await?;
        }
    }

    /// Sleeps one poll interval, waking early if the watch is stopped.
    async fn pause(&self, stop: &mut watch_channel::Receiver<bool>) -> Result<()> {
        tokio::select! {
            () = tokio::time::sleep(self.poll_interval) => Ok(()),
            // fires on stop(); a dropped sender means the handle is gone,
            // which also ends the watch
            _ = stop.changed() => Err(Error::WatchStopped),
        }
    }
}

impl<T: MailTransport + Sync + 'static> InboxPoller<T> {
    /// Spawns the poll loop onto a background task and returns its handle.
    ///
    /// The caller stays responsive; the worker owns the transport until the
    /// watch ends. The result is handed over exactly once, through the
    /// handle.
    #[must_use]
    pub fn spawn(self) -> WatchHandle {
        let (stop_tx, stop_rx) = watch_channel::channel(false);
        let (result_tx, result_rx) = oneshot::channel();

        tokio::spawn(async move {
            let result = self.run(stop_rx).await;
            // the receiver may be gone if the caller dropped the handle
            let _ = result_tx.send(result);
        });

        WatchHandle {
            stop: stop_tx,
            result: result_rx,
        }
    }
}

impl<T> std::fmt::Debug for InboxPoller<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboxPoller")
            .field("matcher", &self.matcher)
            .field("poll_interval", &self.poll_interval)
            .field("max_wait", &self.max_wait)
            .field("delivery", &self.delivery.as_ref().map(|_| "..."))
            .finish_non_exhaustive()
    }
}

/// Handle to a spawned watch session.
///
/// Await the outcome with [`wait`](Self::wait); request cancellation with
/// [`stop`](Self::stop). Dropping the handle also stops the worker at its
/// next tick boundary.
#[derive(Debug)]
pub struct WatchHandle {
    stop: watch_channel::Sender<bool>,
    result: oneshot::Receiver<Result<OtpCandidate>>,
}

impl WatchHandle {
    /// Asks the worker to stop. The worker notices at its next cancellation
    /// check; [`wait`](Self::wait) then resolves to
    /// [`Error::WatchStopped`].
    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }

    /// Waits for the watch to end, returning the found candidate or the
    /// error that ended the session.
    ///
    /// # Errors
    ///
    /// Whatever ended the watch: a transport error, `WatchStopped`, or
    /// `WaitTimeout`.
    pub async fn wait(self) -> Result<OtpCandidate> {
        self.result.await.unwrap_or(Err(Error::WatchStopped))
    }
}

/// Connects to the configured mailbox and spawns a watch session.
///
/// This is the high-level entry point: server discovery, TLS, login, and
/// poller setup, all from one [`WatchConfig`].
///
/// # Errors
///
/// Returns a transport error if connecting or authenticating fails; the
/// error is reported here, before any polling starts.
pub async fn watch(config: WatchConfig) -> Result<WatchHandle> {
    let transport = ImapTransport::connect(&config).await?;

    let mut poller = InboxPoller::new(transport)
        .with_matcher(OtpMatcher::new(&config.keywords))
        .with_poll_interval(config.poll_interval);
    if let Some(max_wait) = config.max_wait {
        poller = poller.with_max_wait(max_wait);
    }

    Ok(poller.spawn())
}
