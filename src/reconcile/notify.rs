//! User-facing notifications raised on claim state changes.

use std::time::Duration;

use tokio::sync::broadcast;

const NOTIFICATION_CHANNEL_CAPACITY: usize = 64;
const AUTO_DISMISS: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Info,
}

/// A toast for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub severity: Severity,
    /// Auto-dismiss delay.
    pub duration: Duration,
    pub closable: bool,
}

impl Notification {
    fn new(title: &str, description: &str, severity: Severity) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            severity,
            duration: AUTO_DISMISS,
            closable: true,
        }
    }

    /// The queue broadcast a settlement transaction.
    pub fn delivery_in_progress() -> Self {
        Self::new(
            "Delivery in process!",
            "The POAP token is on its way to your wallet",
            Severity::Success,
        )
    }

    /// The queue gave up on the claim.
    pub fn delivery_failed() -> Self {
        Self::new(
            "Couldn't deliver your POAP!",
            "There was an error processing your POAP token. Please try again",
            Severity::Error,
        )
    }

    /// The settlement transaction was mined successfully.
    pub fn delivered() -> Self {
        Self::new(
            "POAP delivered!",
            "The POAP token has arrived in your wallet",
            Severity::Success,
        )
    }

    /// The settlement transaction was mined but reverted.
    pub fn delivery_reverted() -> Self {
        Self::new(
            "Delivery transaction reverted",
            "The delivery transaction failed on-chain. Please try again",
            Severity::Error,
        )
    }
}

/// Fan-out of notifications to whoever is displaying them.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(NOTIFICATION_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    /// Publish to current subscribers. Dropped silently when nobody listens.
    pub fn publish(&self, notification: Notification) {
        let _ = self.tx.send(notification);
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let notifier = Notifier::new();
        notifier.publish(Notification::delivered());

        let mut rx = notifier.subscribe();
        notifier.publish(Notification::delivery_failed());

        let received = rx.recv().await.unwrap();
        assert_eq!(received.title, "Couldn't deliver your POAP!");
        assert_eq!(received.severity, Severity::Error);
        assert_eq!(received.duration, Duration::from_millis(5000));
    }
}
