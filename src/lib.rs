//! # otp-watch
//!
//! Async IMAP inbox watcher that extracts one-time passcodes from incoming
//! email.
//!
//! The crate polls a mailbox for unread messages, decodes the newest one
//! (multi-part MIME, HTML stripping, charset degradation all handled), and
//! scans the normalized text with a deterministic keyword-proximity matcher
//! plus a standalone 6-digit fallback. The watch runs on its own background
//! task and hands the passcode back exactly once through a handle the caller
//! can await or stop.
//!
//! ## Features
//!
//! - **`notifications`**: desktop-notification delivery via `notify-rust`.
//! - **`observability`**: OpenTelemetry integration for distributed tracing.
//!   Without it, tracing spans are still emitted but require no OTEL
//!   dependencies.
//! - **`integration-tests`**: enables tests that need a real IMAP server.
//!
//! ## Quick Start
//!
//! ```no_run
//! use otp_watch::{watcher, WatchConfig};
//!
//! # async fn example() -> otp_watch::Result<()> {
//! // Configure the watch; the IMAP host is discovered from the domain
//! let config = WatchConfig::builder()
//!     .mailbox("user@gmail.com")
//!     .credential("app-password")  // app-specific password for Gmail
//!     .build()?;
//!
//! // Connect and start polling on a background task
//! let handle = watcher::watch(config).await?;
//!
//! // The handle resolves once, when a passcode is found
//! let candidate = handle.wait().await?;
//! println!("Got passcode: {candidate}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Stopping a Watch
//!
//! ```no_run
//! # use otp_watch::{watcher, WatchConfig};
//! # async fn example() -> otp_watch::Result<()> {
//! # let config = WatchConfig::builder().mailbox("a@b.c").credential("x").build()?;
//! let handle = watcher::watch(config).await?;
//! handle.stop();
//! // wait() now resolves to Error::WatchStopped
//! assert!(handle.wait().await.is_err());
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom Keywords
//!
//! The matcher scans keywords in priority order; the first one with a 4-8
//! digit run within 30 characters wins:
//!
//! ```
//! use otp_watch::matcher::OtpMatcher;
//!
//! let matcher = OtpMatcher::new(["token", "access code"]);
//! let found = matcher.find("Your token: 48120").unwrap();
//! assert_eq!(found.code(), "48120");
//! ```
//!
//! ## Using the Matcher and Decoder Standalone
//!
//! Both extraction stages are pure and usable without any IMAP connection:
//!
//! ```
//! use otp_watch::decoder;
//! use otp_watch::matcher::OtpMatcher;
//! use otp_watch::transport::{MessageId, RawMessage};
//!
//! let raw = b"From: no-reply@example.com\r\n\r\nYour verification pin is: 483920.".to_vec();
//! let message = RawMessage::new(MessageId(1), raw);
//!
//! let text = decoder::decode(&message);
//! let found = OtpMatcher::default().find(&text).unwrap();
//! assert_eq!(found.code(), "483920");
//! assert_eq!(found.provenance().to_string(), "matched-keyword:pin");
//! ```
//!
//! ## Error Handling
//!
//! Configuration and transport failures end the watch session and surface
//! through the handle; decode degradation and unparseable timestamps are
//! recovered internally and never surface. [`Error::is_fatal`] separates
//! real failures from a requested stop:
//!
//! ```
//! use otp_watch::Error;
//!
//! fn report(error: &Error) {
//!     if error.is_fatal() {
//!         eprintln!("watch failed ({}): {error}", error.category());
//!     }
//! }
//! ```
//!
//! ## Observability
//!
//! All major operations emit `tracing` spans with structured fields
//! (`mailbox`, `imap_host`, `uid`, `state`, `provenance`). Credentials never
//! appear in spans or `Debug` output.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Public modules
pub mod config;
pub mod decoder;
pub mod delivery;
pub mod error;
pub mod matcher;
pub mod proxy;
pub mod servers;
pub mod transport;
pub mod watcher;

// Internal modules
mod connection;
mod session;

// Re-exports for ergonomic API
pub use config::{TimeoutConfig, WatchConfig, WatchConfigBuilder};
pub use delivery::Delivery;
pub use email_address::EmailAddress;
pub use error::{Error, ErrorCategory, Result};
pub use matcher::{OtpCandidate, OtpMatcher, Provenance};
pub use proxy::Socks5Proxy;
pub use servers::ServerRegistry;
pub use transport::{ImapTransport, MailTransport, MessageId, RawMessage};
pub use watcher::{watch, InboxPoller, WatchHandle};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        // Ensure all public types are accessible
        let _ = WatchConfig::builder();
        let _ = Socks5Proxy::new("localhost", 1080);
        let _ = OtpMatcher::default();
        let _ = ServerRegistry::with_defaults();
    }
}
