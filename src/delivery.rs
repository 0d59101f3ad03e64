//! Delivery of a found passcode to the outside world.
//!
//! The watcher hands the final digit string to a [`Delivery`] exactly once,
//! from the worker task, right before the watch result resolves. Delivery is
//! fire-and-forget: it has no return value and must not fail the watch.
//!
//! The caller who only wants the code back can skip delivery entirely and
//! read it from [`WatchHandle::wait`](crate::watcher::WatchHandle::wait).

use async_trait::async_trait;

/// Receives the found passcode from the worker task.
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Called once with the passcode's digit string.
    async fn deliver(&self, code: &str);
}

/// Delivery that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDelivery;

#[async_trait]
impl Delivery for NullDelivery {
    async fn deliver(&self, _code: &str) {}
}

/// Delivery backed by a plain closure.
///
/// # Example
///
/// ```
/// use otp_watch::delivery::FnDelivery;
///
/// let delivery = FnDelivery::new(|code| println!("passcode: {code}"));
/// ```
pub struct FnDelivery<F>
where
    F: Fn(&str) + Send + Sync,
{
    deliver_fn: F,
}

impl<F> FnDelivery<F>
where
    F: Fn(&str) + Send + Sync,
{
    /// Creates a delivery from a closure.
    #[must_use]
    pub fn new(deliver_fn: F) -> Self {
        Self { deliver_fn }
    }
}

#[async_trait]
impl<F> Delivery for FnDelivery<F>
where
    F: Fn(&str) + Send + Sync,
{
    async fn deliver(&self, code: &str) {
        (self.deliver_fn)(code);
    }
}

impl<F> std::fmt::Debug for FnDelivery<F>
where
    F: Fn(&str) + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnDelivery").finish_non_exhaustive()
    }
}

/// Desktop-notification delivery via `notify-rust`.
///
/// Requires the `notifications` feature.
#[cfg(feature = "notifications")]
#[derive(Debug, Clone)]
pub struct NotifyDelivery {
    summary: String,
}

#[cfg(feature = "notifications")]
impl NotifyDelivery {
    /// Creates a notification delivery with the given title.
    #[must_use]
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
        }
    }
}

#[cfg(feature = "notifications")]
impl Default for NotifyDelivery {
    fn default() -> Self {
        Self::new("Passcode received")
    }
}

#[cfg(feature = "notifications")]
#[async_trait]
impl Delivery for NotifyDelivery {
    async fn deliver(&self, code: &str) {
        let summary = self.summary.clone();
        let body = format!("Your code is: {code}");

        // show() blocks on some platforms; keep it off the worker task
        let shown = tokio::task::spawn_blocking(move || {
            notify_rust::Notification::new()
                .summary(&summary)
                .body(&body)
                .show()
                .map(|_| ())
        })
        .await;

        match shown {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "Desktop notification failed"),
            Err(e) => tracing::warn!(error = %e, "Notification task panicked"),
        }
    }
}
