//! Fire-and-forget user notifications (toasts).

use tokio::sync::mpsc;
use tracing::{info, warn};

pub const TODO_ADDED: &str = "Todo added.";
pub const TODO_UPDATED: &str = "Todo updated.";
pub const TODO_COMPLETED: &str = "Todo marked as completed.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Error(String),
}

impl Notification {
    pub fn message(&self) -> &str {
        match self {
            Notification::Success(msg) | Notification::Error(msg) => msg,
        }
    }
}

/// Sink for notifications. Must not block.
pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification {
            Notification::Success(msg) => info!(%msg, "notification"),
            Notification::Error(msg) => warn!(%msg, "notification"),
        }
    }
}

/// Forwards notifications to a channel drained by the presentation layer.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        // Receiver gone means nobody is showing toasts any more.
        let _ = self.tx.send(notification);
    }
}
