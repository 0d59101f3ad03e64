//! Demo: pop a desktop notification when the passcode arrives.
//!
//! Requires the `notifications` feature.
//!
//! # Usage
//!
//! ```bash
//! export OTP_WATCH_MAILBOX="your@email.com"
//! export OTP_WATCH_CREDENTIAL="your-app-password"
//! cargo run --example desktop_notify --features notifications
//! ```

use otp_watch::delivery::NotifyDelivery;
use otp_watch::matcher::OtpMatcher;
use otp_watch::{ImapTransport, InboxPoller, WatchConfig};
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> otp_watch::Result<()> {
    let mailbox =
        env::var("OTP_WATCH_MAILBOX").expect("OTP_WATCH_MAILBOX environment variable required");
    let credential = env::var("OTP_WATCH_CREDENTIAL")
        .expect("OTP_WATCH_CREDENTIAL environment variable required");

    let config = WatchConfig::builder()
        .mailbox(&mailbox)
        .credential(credential)
        .build()?;

    // Wire the poller by hand to attach a delivery collaborator
    let transport = ImapTransport::connect(&config).await?;
    let handle = InboxPoller::new(transport)
        .with_matcher(OtpMatcher::new(&config.keywords))
        .with_poll_interval(config.poll_interval)
        .with_delivery(Arc::new(NotifyDelivery::default()))
        .spawn();

    println!("Watching {mailbox}; a notification will pop when a passcode arrives.");

    let candidate = handle.wait().await?;
    println!("Passcode: {candidate}");

    Ok(())
}
