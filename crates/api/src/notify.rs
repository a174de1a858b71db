// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Outbound notifications.
//!
//! Notifications are fire-and-forget: a delivery failure is logged and
//! never blocks or rolls back the state transition that triggered it.

use tracing::{info, warn};

/// A notification about a signup or payment event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// The recipient email address.
    pub recipient: String,
    /// The subject line.
    pub subject: String,
    /// The message body.
    pub body: String,
}

/// A transport for outbound notifications.
pub trait NotificationSender {
    /// Attempts delivery of a notification.
    ///
    /// # Errors
    ///
    /// Returns a human-readable description of the delivery failure.
    fn send(&self, notification: &Notification) -> Result<(), String>;
}

/// Delivers a notification, downgrading failure to a warning.
pub fn send_best_effort(sender: &dyn NotificationSender, notification: &Notification) {
    match sender.send(notification) {
        Ok(()) => {
            info!(recipient = %notification.recipient, subject = %notification.subject,
                "Notification sent");
        }
        Err(reason) => {
            warn!(recipient = %notification.recipient, subject = %notification.subject,
                %reason, "Notification delivery failed");
        }
    }
}

/// The default sender: logs the notification instead of delivering it.
///
/// Deployments wire a real transport here; tests and local runs get the
/// log line.
pub struct LogNotifier;

impl NotificationSender for LogNotifier {
    fn send(&self, notification: &Notification) -> Result<(), String> {
        info!(recipient = %notification.recipient, subject = %notification.subject,
            "Notification (log only): {}", notification.body);
        Ok(())
    }
}
